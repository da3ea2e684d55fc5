//! Token collaborator - signs identity claims into bearer tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and checks bearer tokens.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait TokenService: Send + Sync {
    /// Sign `{ userId, role }` into a token
    fn issue(&self, user_id: Uuid, role: &str) -> AppResult<String>;

    /// Check signature and expiry, returning the claims
    fn verify(&self, token: &str) -> AppResult<Claims>;
}

/// HS256 JWT implementation
pub struct JwtTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtTokens {
    pub fn new(secret: &[u8], expiration_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(expiration_hours),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.jwt_secret_bytes(), config.jwt_expiration_hours)
    }
}

impl TokenService for JwtTokens {
    fn issue(&self, user_id: Uuid, role: &str) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    fn verify(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}
