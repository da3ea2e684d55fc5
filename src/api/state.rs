//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::Database;
use crate::services::{ProductService, ServiceContainer, Services, TokenService, UserService};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Catalog service
    pub product_service: Arc<dyn ProductService>,
    /// Account service
    pub user_service: Arc<dyn UserService>,
    /// Bearer token verification
    pub token_service: Arc<dyn TokenService>,
    /// Database connection, absent when services are injected by hand
    pub database: Option<Arc<Database>>,
}

impl AppState {
    /// Create application state from database connection and config.
    pub fn from_config(database: Arc<Database>, config: &Config) -> Self {
        let container = Services::from_connection(database.get_connection(), config);
        Self::from_container(&container, Some(database))
    }

    /// Take every service from a container
    pub fn from_container(container: &dyn ServiceContainer, database: Option<Arc<Database>>) -> Self {
        Self {
            product_service: container.products(),
            user_service: container.users(),
            token_service: container.tokens(),
            database,
        }
    }

    /// Create new application state with manually injected services.
    pub fn new(
        product_service: Arc<dyn ProductService>,
        user_service: Arc<dyn UserService>,
        token_service: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            product_service,
            user_service,
            token_service,
            database: None,
        }
    }
}
