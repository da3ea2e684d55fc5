//! User domain entity and related types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::config::{ROLE_ADMIN, ROLE_USER};

/// User role.
///
/// Carried for authorization context only; this crate does not enforce it.
/// Roles other than `user` and `admin` are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    User,
    Admin,
    Other(String),
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn as_str(&self) -> &str {
        match self {
            UserRole::Admin => ROLE_ADMIN,
            UserRole::User => ROLE_USER,
            UserRole::Other(role) => role,
        }
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => UserRole::Admin,
            ROLE_USER => UserRole::User,
            other => UserRole::Other(other.to_string()),
        }
    }
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        UserRole::from(s.as_str())
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Other(role) => role,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User domain entity
///
/// `password_hash` and `token` are part of the stored record. Use
/// [`UserResponse`] before exposing a user outside the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub role: UserRole,
    pub phone: String,
    pub saldo: Decimal,
    pub token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Registration payload
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewUser {
    /// Unique login name
    #[serde(default)]
    #[schema(example = "alice")]
    pub username: String,
    /// Plain-text password, hashed before it is stored
    #[serde(default)]
    #[schema(example = "secret")]
    pub password: String,
    /// Display name
    #[serde(default)]
    #[schema(example = "Alice Liddell")]
    pub name: String,
    /// Role, defaults to "user"
    #[schema(example = "user")]
    pub role: Option<String>,
    /// Contact phone number
    #[serde(default, alias = "nomerWA")]
    #[schema(example = "628123456789")]
    pub phone: String,
}

/// Full replacement of the editable profile fields
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UserReplace {
    #[validate(length(min = 1, message = "Some fields are missing"))]
    #[schema(example = "Alice L.")]
    pub name: String,
    #[validate(length(min = 1, message = "Some fields are missing"))]
    #[schema(example = "user")]
    pub role: String,
    #[serde(alias = "nomerWA")]
    #[validate(length(min = 1, message = "Some fields are missing"))]
    #[schema(example = "628123456789")]
    pub phone: String,
}

/// Partial profile update; only supplied fields are overwritten
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UserPatch {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub role: Option<String>,
    #[serde(alias = "nomerWA")]
    pub phone: Option<String>,
}

/// Balance top-up payload
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TopUp {
    /// Amount added to the current balance
    #[schema(value_type = String, example = "100.00")]
    pub saldo: Decimal,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "Alice Liddell")]
    pub name: String,
    #[schema(example = "user")]
    pub role: String,
    #[schema(example = "628123456789")]
    pub phone: String,
    #[schema(value_type = String, example = "150.00")]
    pub saldo: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            role: user.role.to_string(),
            phone: user.phone,
            saldo: user.saldo,
            created_at: user.created_at,
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Signed bearer token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[schema(example = "user")]
    pub role: String,
    #[schema(example = "alice")]
    pub username: String,
}
