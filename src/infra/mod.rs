//! Infrastructure layer - External systems integration
//!
//! - Database connection and migrations
//! - Repositories (products, users, favorites)
//! - Unit of Work for centralized repository access

pub mod db;
pub mod repositories;
pub mod unit_of_work;

pub use db::{Database, Migrator};
pub use repositories::{
    FavoriteRepository, FavoriteStore, NewUserRecord, ProductRepository, ProductStore,
    UserRepository, UserStore,
};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{MockFavoriteRepository, MockProductRepository, MockUserRepository};
