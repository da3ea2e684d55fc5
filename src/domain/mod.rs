//! Domain layer - Core business entities and value objects
//!
//! Products with their embedded reviews, user accounts, and the password
//! value object. No infrastructure dependencies beyond serialization.

pub mod password;
pub mod product;
pub mod user;

pub use password::Password;
pub use product::{
    Product, ProductFilter, ProductInput, ProductPatch, ProductSort, Review, ReviewInput,
    SortDirection, SortField,
};
pub use user::{
    LoginResponse, NewUser, TopUp, User, UserPatch, UserReplace, UserResponse, UserRole,
};
