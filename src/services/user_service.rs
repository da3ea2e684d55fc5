//! User service - account lifecycle, login and balance.
//!
//! Hashing and token signing are delegated to the credential and token
//! collaborators so both can be swapped in tests.

use async_trait::async_trait;
use std::sync::Arc;

use super::{CredentialService, TokenService};
use crate::config::{MSG_USERNAME_REQUIRED, MSG_USER_NOT_FOUND, ROLE_USER};
use crate::domain::{LoginResponse, NewUser, TopUp, User, UserPatch, UserReplace};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{NewUserRecord, UnitOfWork};

/// User service trait for dependency injection.
///
/// Users are addressed by username.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Register an account. The password is hashed before it is stored.
    /// A taken username is a `Conflict`.
    async fn create_user(&self, data: NewUser) -> AppResult<User>;

    /// Check credentials and issue a bearer token
    async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse>;

    /// Replace name, role and phone
    async fn edit_user(&self, username: &str, data: UserReplace) -> AppResult<User>;

    /// Merge the supplied profile fields
    async fn patch_user(&self, username: &str, data: UserPatch) -> AppResult<User>;

    /// Stored record, password hash included
    async fn get_user(&self, username: &str) -> AppResult<User>;

    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Add the top-up amount to the current balance
    async fn add_balance(&self, username: &str, top_up: TopUp) -> AppResult<User>;
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
    credentials: Arc<dyn CredentialService>,
    tokens: Arc<dyn TokenService>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(
        uow: Arc<U>,
        credentials: Arc<dyn CredentialService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            uow,
            credentials,
            tokens,
        }
    }
}

fn user_not_found(username: &str) -> AppError {
    AppError::not_found(format!("User {} not found", username))
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn create_user(&self, data: NewUser) -> AppResult<User> {
        let username = data.username.trim();
        if username.is_empty() {
            return Err(AppError::validation(MSG_USERNAME_REQUIRED));
        }

        // The unique index still guards the race between this check and the insert
        if self.uow.users().find_by_username(username).await?.is_some() {
            return Err(AppError::conflict("User"));
        }

        let record = NewUserRecord {
            username: username.to_string(),
            name: data.name,
            password_hash: self.credentials.hash(&data.password)?,
            role: data
                .role
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| ROLE_USER.to_string()),
            phone: data.phone,
        };

        let user = self.uow.users().create(record).await?;
        tracing::info!(username = %user.username, "User registered");
        Ok(user)
    }

    async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse> {
        let user = self
            .uow
            .users()
            .find_by_username(username)
            .await?
            .ok_or_not_found(MSG_USER_NOT_FOUND)?;

        if !self.credentials.verify(password, &user.password_hash)? {
            tracing::debug!(username, "Login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let role = user.role.to_string();
        let token = self.tokens.issue(user.id, &role)?;

        // Login succeeds even when the token cannot be stored
        if let Err(e) = self.uow.users().set_token(&user.username, token.clone()).await {
            tracing::error!(username = %user.username, "Error storing token: {:?}", e);
        }

        Ok(LoginResponse {
            token,
            role,
            username: user.username,
        })
    }

    async fn edit_user(&self, username: &str, data: UserReplace) -> AppResult<User> {
        self.get_user(username).await?;
        self.uow.users().replace(username, data).await
    }

    async fn patch_user(&self, username: &str, data: UserPatch) -> AppResult<User> {
        self.get_user(username).await?;
        self.uow.users().patch(username, data).await
    }

    async fn get_user(&self, username: &str) -> AppResult<User> {
        self.uow
            .users()
            .find_by_username(username)
            .await?
            .ok_or_else(|| user_not_found(username))
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.uow.users().list().await
    }

    async fn add_balance(&self, username: &str, top_up: TopUp) -> AppResult<User> {
        self.get_user(username).await?;
        let user = self.uow.users().add_saldo(username, top_up.saldo).await?;
        tracing::info!(username, saldo = %user.saldo, "Balance topped up");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    use crate::domain::UserRole;
    use crate::infra::{
        FavoriteRepository, MockFavoriteRepository, MockProductRepository, MockUserRepository,
        ProductRepository, UserRepository,
    };
    use crate::services::{Argon2Credentials, MockCredentialService, MockTokenService};

    /// UnitOfWork over a mock user repository
    struct TestUnitOfWork {
        users: Arc<MockUserRepository>,
        products: Arc<MockProductRepository>,
        favorites: Arc<MockFavoriteRepository>,
    }

    impl TestUnitOfWork {
        fn new(users: MockUserRepository) -> Self {
            Self {
                users: Arc::new(users),
                products: Arc::new(MockProductRepository::new()),
                favorites: Arc::new(MockFavoriteRepository::new()),
            }
        }
    }

    impl UnitOfWork for TestUnitOfWork {
        fn products(&self) -> Arc<dyn ProductRepository> {
            self.products.clone()
        }

        fn users(&self) -> Arc<dyn UserRepository> {
            self.users.clone()
        }

        fn favorites(&self) -> Arc<dyn FavoriteRepository> {
            self.favorites.clone()
        }
    }

    fn create_test_user(username: &str, password_hash: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            name: "Test User".to_string(),
            password_hash: password_hash.to_string(),
            role: UserRole::User,
            phone: "0812".to_string(),
            saldo: Decimal::ZERO,
            token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service_with(
        users: MockUserRepository,
        credentials: impl CredentialService + 'static,
        tokens: impl TokenService + 'static,
    ) -> UserManager<TestUnitOfWork> {
        UserManager::new(
            Arc::new(TestUnitOfWork::new(users)),
            Arc::new(credentials),
            Arc::new(tokens),
        )
    }

    fn service(users: MockUserRepository) -> UserManager<TestUnitOfWork> {
        service_with(users, MockCredentialService::new(), MockTokenService::new())
    }

    fn new_user(username: &str, password: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: password.to_string(),
            name: "Alice".to_string(),
            role: None,
            phone: "0812".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_requires_username() {
        let mut users = MockUserRepository::new();
        users.expect_create().never();

        let err = service(users)
            .create_user(new_user("  ", "secret"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(ref m) if m == MSG_USERNAME_REQUIRED));
    }

    #[tokio::test]
    async fn test_create_user_stores_hash_not_plain_text() {
        let mut credentials = MockCredentialService::new();
        credentials
            .expect_hash()
            .withf(|plain| plain == "p")
            .times(1)
            .returning(|_| Ok("$argon2id$hashed".to_string()));

        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|record| {
                record.username == "u" && record.password_hash != "p" && record.role == ROLE_USER
            })
            .times(1)
            .returning(|record| Ok(create_test_user(&record.username, &record.password_hash)));

        let user = service_with(users, credentials, MockTokenService::new())
            .create_user(new_user("u", "p"))
            .await
            .unwrap();

        assert_eq!(user.password_hash, "$argon2id$hashed");
    }

    #[tokio::test]
    async fn test_create_user_keeps_requested_role() {
        let mut credentials = MockCredentialService::new();
        credentials.expect_hash().returning(|_| Ok("h".to_string()));

        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|record| record.role == "admin")
            .times(1)
            .returning(|record| {
                let mut user = create_test_user(&record.username, &record.password_hash);
                user.role = UserRole::from(record.role.as_str());
                Ok(user)
            });

        let mut data = new_user("root", "pw");
        data.role = Some("admin".to_string());

        let user = service_with(users, credentials, MockTokenService::new())
            .create_user(data)
            .await
            .unwrap();
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn test_create_user_rejects_taken_username() {
        let mut credentials = MockCredentialService::new();
        credentials.expect_hash().never();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .withf(|name| name == "alice")
            .returning(|name| Ok(Some(create_test_user(name, "h"))));
        users.expect_create().never();

        let err = service_with(users, credentials, MockTokenService::new())
            .create_user(new_user("alice", "pw"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "User already exists");
    }

    #[tokio::test]
    async fn test_login_missing_user() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));

        let err = service(users).login("ghost", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == MSG_USER_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .returning(|name| Ok(Some(create_test_user(name, "stored"))));
        users.expect_set_token().never();

        let mut credentials = MockCredentialService::new();
        credentials.expect_verify().returning(|_, _| Ok(false));
        let mut tokens = MockTokenService::new();
        tokens.expect_issue().never();

        let err = service_with(users, credentials, tokens)
            .login("alice", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
        assert_eq!(err.to_string(), "Invalid password");
    }

    #[tokio::test]
    async fn test_login_returns_issued_token() {
        let user = create_test_user("alice", "stored");
        let user_id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .withf(|name| name == "alice")
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_set_token()
            .withf(|name, token| name == "alice" && token == "tok-123")
            .times(1)
            .returning(|_, _| Ok(()));

        let mut credentials = MockCredentialService::new();
        credentials
            .expect_verify()
            .withf(|plain, hash| plain == "secret" && hash == "stored")
            .returning(|_, _| Ok(true));

        let mut tokens = MockTokenService::new();
        tokens
            .expect_issue()
            .withf(move |id, role| *id == user_id && role == "user")
            .times(1)
            .returning(|_, _| Ok("tok-123".to_string()));

        let response = service_with(users, credentials, tokens)
            .login("alice", "secret")
            .await
            .unwrap();

        assert_eq!(
            response,
            LoginResponse {
                token: "tok-123".to_string(),
                role: "user".to_string(),
                username: "alice".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_login_survives_token_storage_failure() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .returning(|name| Ok(Some(create_test_user(name, "stored"))));
        users
            .expect_set_token()
            .returning(|_, _| Err(AppError::internal("write failed")));

        let mut credentials = MockCredentialService::new();
        credentials.expect_verify().returning(|_, _| Ok(true));
        let mut tokens = MockTokenService::new();
        tokens.expect_issue().returning(|_, _| Ok("tok".to_string()));

        let response = service_with(users, credentials, tokens)
            .login("alice", "secret")
            .await
            .unwrap();
        assert_eq!(response.token, "tok");
    }

    #[tokio::test]
    async fn test_edit_missing_user_names_username() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));
        users.expect_replace().never();

        let data = UserReplace {
            name: "Bob".to_string(),
            role: "user".to_string(),
            phone: "1".to_string(),
        };
        let err = service(users).edit_user("bob", data).await.unwrap_err();

        assert_eq!(err.to_string(), "User bob not found");
    }

    #[tokio::test]
    async fn test_patch_existing_user() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .returning(|name| Ok(Some(create_test_user(name, "h"))));
        users
            .expect_patch()
            .withf(|name, data| name == "alice" && data.phone.as_deref() == Some("0999"))
            .times(1)
            .returning(|name, data| {
                let mut user = create_test_user(name, "h");
                user.phone = data.phone.unwrap_or_default();
                Ok(user)
            });

        let patch = UserPatch {
            phone: Some("0999".to_string()),
            ..Default::default()
        };
        let user = service(users).patch_user("alice", patch).await.unwrap();
        assert_eq!(user.phone, "0999");
        assert_eq!(user.name, "Test User");
    }

    #[tokio::test]
    async fn test_add_balance_missing_user() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));
        users.expect_add_saldo().never();

        let err = service(users)
            .add_balance("ghost", TopUp { saldo: Decimal::from(5) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    /// In-memory user table shared by the mock closures
    type Table = Arc<Mutex<HashMap<String, User>>>;

    fn stateful_users(table: &Table) -> MockUserRepository {
        let mut users = MockUserRepository::new();

        let t = table.clone();
        users.expect_create().returning(move |record| {
            let mut user = create_test_user(&record.username, &record.password_hash);
            user.name = record.name;
            user.phone = record.phone;
            user.role = UserRole::from(record.role.as_str());
            t.lock().unwrap().insert(user.username.clone(), user.clone());
            Ok(user)
        });

        let t = table.clone();
        users
            .expect_find_by_username()
            .returning(move |name| Ok(t.lock().unwrap().get(name).cloned()));

        let t = table.clone();
        users.expect_set_token().returning(move |name, token| {
            if let Some(user) = t.lock().unwrap().get_mut(name) {
                user.token = Some(token);
            }
            Ok(())
        });

        let t = table.clone();
        users.expect_patch().returning(move |name, data| {
            let mut table = t.lock().unwrap();
            let user = table
                .get_mut(name)
                .ok_or_else(|| AppError::not_found("missing"))?;
            if let Some(role) = data.role {
                user.role = UserRole::from(role);
            }
            Ok(user.clone())
        });

        let t = table.clone();
        users.expect_add_saldo().returning(move |name, delta| {
            let mut table = t.lock().unwrap();
            let user = table
                .get_mut(name)
                .ok_or_else(|| AppError::not_found("missing"))?;
            user.saldo += delta;
            Ok(user.clone())
        });

        users
    }

    #[tokio::test]
    async fn test_balance_accumulates() {
        let table: Table = Arc::default();
        let mut credentials = MockCredentialService::new();
        credentials.expect_hash().returning(|_| Ok("h".to_string()));
        let service = service_with(stateful_users(&table), credentials, MockTokenService::new());

        let user = service.create_user(new_user("alice", "pw")).await.unwrap();
        assert_eq!(user.saldo, Decimal::ZERO);

        let user = service
            .add_balance("alice", TopUp { saldo: Decimal::from(100) })
            .await
            .unwrap();
        assert_eq!(user.saldo, Decimal::from(100));

        let user = service
            .add_balance("alice", TopUp { saldo: Decimal::from(50) })
            .await
            .unwrap();
        assert_eq!(user.saldo, Decimal::from(150));
    }

    #[tokio::test]
    async fn test_register_then_login_with_real_hashing() {
        let table: Table = Arc::default();
        let mut tokens = MockTokenService::new();
        tokens
            .expect_issue()
            .returning(|id, role| Ok(format!("{}:{}", id, role)));
        let service = service_with(stateful_users(&table), Argon2Credentials, tokens);

        service.create_user(new_user("alice", "secret")).await.unwrap();
        let stored = table.lock().unwrap().get("alice").cloned().unwrap();
        assert_ne!(stored.password_hash, "secret");

        let response = service.login("alice", "secret").await.unwrap();
        assert_eq!(response.username, "alice");
        assert_eq!(response.role, "user");
        assert_eq!(
            table.lock().unwrap()["alice"].token.as_deref(),
            Some(response.token.as_str())
        );

        let err = service.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let err = service.login("bob", "secret").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_custom_role_survives_register_login_and_lookup() {
        let table: Table = Arc::default();
        let mut tokens = MockTokenService::new();
        tokens
            .expect_issue()
            .withf(|_, role| role == "seller")
            .returning(|id, role| Ok(format!("{}:{}", id, role)));
        let service = service_with(stateful_users(&table), Argon2Credentials, tokens);

        let mut data = new_user("sam", "secret");
        data.role = Some("seller".to_string());
        let user = service.create_user(data).await.unwrap();
        assert_eq!(user.role.to_string(), "seller");

        let response = service.login("sam", "secret").await.unwrap();
        assert_eq!(response.role, "seller");

        let user = service.get_user("sam").await.unwrap();
        assert_eq!(user.role, UserRole::Other("seller".to_string()));
    }

    #[tokio::test]
    async fn test_patched_custom_role_is_kept() {
        let table: Table = Arc::default();
        let mut credentials = MockCredentialService::new();
        credentials.expect_hash().returning(|_| Ok("h".to_string()));
        let service = service_with(stateful_users(&table), credentials, MockTokenService::new());

        service.create_user(new_user("sam", "pw")).await.unwrap();
        let patch = UserPatch {
            role: Some("moderator".to_string()),
            ..Default::default()
        };
        service.patch_user("sam", patch).await.unwrap();

        let user = service.get_user("sam").await.unwrap();
        assert_eq!(user.role.to_string(), "moderator");
    }
}
