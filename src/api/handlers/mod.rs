//! HTTP request handlers.

pub mod product_handler;
pub mod user_handler;

pub use product_handler::{favorite_routes, product_routes};
pub use user_handler::user_routes;
