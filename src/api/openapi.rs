//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{product_handler, user_handler};
use crate::domain::{
    LoginResponse, NewUser, Product, ProductInput, ProductPatch, Review, ReviewInput, TopUp,
    UserPatch, UserReplace, UserResponse,
};
use crate::types::PaginationMeta;

/// OpenAPI documentation for the shop API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shop API",
        version = "0.1.0",
        description = "Product catalog and user accounts",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Product endpoints
        product_handler::list_products,
        product_handler::list_products_page,
        product_handler::search_products,
        product_handler::get_product,
        product_handler::create_product,
        product_handler::replace_product,
        product_handler::patch_product,
        product_handler::delete_product,
        product_handler::update_stock,
        product_handler::list_reviews,
        product_handler::add_review,
        product_handler::list_favorites,
        product_handler::add_favorite,
        product_handler::remove_favorite,
        // User endpoints
        user_handler::register,
        user_handler::login,
        user_handler::list_users,
        user_handler::get_user,
        user_handler::replace_user,
        user_handler::patch_user,
        user_handler::top_up,
    ),
    components(
        schemas(
            Product,
            ProductInput,
            ProductPatch,
            Review,
            ReviewInput,
            PaginationMeta,
            product_handler::StockUpdate,
            UserResponse,
            NewUser,
            UserReplace,
            UserPatch,
            TopUp,
            LoginResponse,
            user_handler::LoginRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Products", description = "Catalog management"),
        (name = "Reviews", description = "Product reviews"),
        (name = "Favorites", description = "Per-user favorite products"),
        (name = "Users", description = "Registration, login and profiles")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /users/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/products/{id}"));
        assert!(paths.contains_key("/products/favorites"));
        assert!(paths.contains_key("/users/{username}/saldo"));
    }
}
