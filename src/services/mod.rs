//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion and reach persistence through a Unit of Work.

pub mod container;
mod credentials;
mod product_service;
mod tokens;
mod user_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Collaborators
pub use credentials::{Argon2Credentials, CredentialService};
pub use tokens::{Claims, JwtTokens, TokenService};

// Service traits and implementations
pub use product_service::{ProductManager, ProductService};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use credentials::MockCredentialService;
#[cfg(any(test, feature = "test-utils"))]
pub use tokens::MockTokenService;
