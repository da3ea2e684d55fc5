//! Service Container - centralized service access.
//!
//! Built once at startup and shared by the HTTP layer.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::{
    Argon2Credentials, JwtTokens, ProductManager, ProductService, TokenService, UserManager,
    UserService,
};
use crate::config::Config;
use crate::infra::Persistence;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn products(&self) -> Arc<dyn ProductService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn tokens(&self) -> Arc<dyn TokenService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    product_service: Arc<dyn ProductService>,
    user_service: Arc<dyn UserService>,
    token_service: Arc<dyn TokenService>,
}

impl Services {
    pub fn new(
        product_service: Arc<dyn ProductService>,
        user_service: Arc<dyn UserService>,
        token_service: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            product_service,
            user_service,
            token_service,
        }
    }

    /// Wire every service over one connection pool
    pub fn from_connection(db: DatabaseConnection, config: &Config) -> Self {
        let uow = Arc::new(Persistence::new(db));
        let token_service: Arc<dyn TokenService> = Arc::new(JwtTokens::from_config(config));

        Self {
            product_service: Arc::new(ProductManager::new(uow.clone())),
            user_service: Arc::new(UserManager::new(
                uow,
                Arc::new(Argon2Credentials),
                token_service.clone(),
            )),
            token_service,
        }
    }
}

impl ServiceContainer for Services {
    fn products(&self) -> Arc<dyn ProductService> {
        self.product_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn tokens(&self) -> Arc<dyn TokenService> {
        self.token_service.clone()
    }
}
