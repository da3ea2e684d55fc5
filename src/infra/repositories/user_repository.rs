//! User repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{User, UserPatch, UserReplace};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Row to insert for a new account. The password is already hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUserRecord {
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub phone: String,
}

/// User repository trait for dependency injection.
///
/// Users are addressed by their unique username.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn list(&self) -> AppResult<Vec<User>>;

    async fn create(&self, record: NewUserRecord) -> AppResult<User>;

    /// Overwrite name, role and phone
    async fn replace(&self, username: &str, data: UserReplace) -> AppResult<User>;

    /// Overwrite only the supplied profile fields
    async fn patch(&self, username: &str, data: UserPatch) -> AppResult<User>;

    /// Store the last issued token
    async fn set_token(&self, username: &str, token: String) -> AppResult<()>;

    /// Atomically add `delta` to the stored balance
    async fn add_saldo(&self, username: &str, delta: Decimal) -> AppResult<User>;
}

/// SeaORM-backed user repository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, username: &str) -> AppResult<user::Model> {
        UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or_else(|| user_not_found(username))
    }
}

fn user_not_found(username: &str) -> AppError {
    AppError::not_found(format!("User {} not found", username))
}

/// The unique index on `username` rejects a second account with the same name.
fn map_insert_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict("User"),
        _ => AppError::from(err),
    }
}

/// `RecordNotUpdated` means the row vanished after it was read.
fn map_update_err(err: DbErr, username: &str) -> AppError {
    match err {
        DbErr::RecordNotUpdated => user_not_found(username),
        other => AppError::from(other),
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;

        Ok(result.map(User::from))
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find().all(&self.db).await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    async fn create(&self, record: NewUserRecord) -> AppResult<User> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(record.username),
            name: Set(record.name),
            password_hash: Set(record.password_hash),
            role: Set(record.role),
            phone: Set(record.phone),
            saldo: Set(Decimal::ZERO),
            token: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await.map_err(map_insert_err)?;
        Ok(User::from(model))
    }

    async fn replace(&self, username: &str, data: UserReplace) -> AppResult<User> {
        let mut models = UserEntity::update_many()
            .col_expr(user::Column::Name, Expr::value(data.name))
            .col_expr(user::Column::Role, Expr::value(data.role))
            .col_expr(user::Column::Phone, Expr::value(data.phone))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Username.eq(username))
            .exec_with_returning(&self.db)
            .await?;

        models
            .pop()
            .map(User::from)
            .ok_or_else(|| user_not_found(username))
    }

    async fn patch(&self, username: &str, data: UserPatch) -> AppResult<User> {
        let model = self.find_model(username).await?;
        let mut active: ActiveModel = model.into();

        if let Some(name) = data.name {
            active.name = Set(name);
        }
        if let Some(role) = data.role {
            active.role = Set(role);
        }
        if let Some(phone) = data.phone {
            active.phone = Set(phone);
        }
        active.updated_at = Set(Utc::now());

        let model = active
            .update(&self.db)
            .await
            .map_err(|e| map_update_err(e, username))?;
        Ok(User::from(model))
    }

    async fn set_token(&self, username: &str, token: String) -> AppResult<()> {
        UserEntity::update_many()
            .col_expr(user::Column::Token, Expr::value(Some(token)))
            .filter(user::Column::Username.eq(username))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    async fn add_saldo(&self, username: &str, delta: Decimal) -> AppResult<User> {
        let mut models = UserEntity::update_many()
            .col_expr(user::Column::Saldo, Expr::col(user::Column::Saldo).add(delta))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Username.eq(username))
            .exec_with_returning(&self.db)
            .await?;

        models
            .pop()
            .map(User::from)
            .ok_or_else(|| user_not_found(username))
    }
}
