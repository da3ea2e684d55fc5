//! Unit of Work - centralized repository access.
//!
//! Services receive one `UnitOfWork` and reach every repository through it,
//! so a test can swap the whole persistence layer with mocks in one place.
//! Multi-statement atomicity lives inside the individual repository methods
//! (conditional updates, `UPDATE ... RETURNING`, row locks).

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::repositories::{
    FavoriteRepository, FavoriteStore, ProductRepository, ProductStore, UserRepository, UserStore,
};

/// Unit of Work trait for dependency injection.
pub trait UnitOfWork: Send + Sync {
    fn products(&self) -> Arc<dyn ProductRepository>;

    fn users(&self) -> Arc<dyn UserRepository>;

    fn favorites(&self) -> Arc<dyn FavoriteRepository>;
}

/// Concrete implementation of UnitOfWork over one connection pool
pub struct Persistence {
    product_repo: Arc<ProductStore>,
    user_repo: Arc<UserStore>,
    favorite_repo: Arc<FavoriteStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            product_repo: Arc::new(ProductStore::new(db.clone())),
            user_repo: Arc::new(UserStore::new(db.clone())),
            favorite_repo: Arc::new(FavoriteStore::new(db)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn products(&self) -> Arc<dyn ProductRepository> {
        self.product_repo.clone()
    }

    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn favorites(&self) -> Arc<dyn FavoriteRepository> {
        self.favorite_repo.clone()
    }
}
