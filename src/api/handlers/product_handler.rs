//! Product catalog handlers.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, patch, post},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{
    Product, ProductFilter, ProductInput, ProductPatch, ProductSort, Review, ReviewInput,
    SortDirection, SortField,
};
use crate::errors::AppResult;
use crate::types::{ApiResponse, Created, Paginated, PaginationParams};

/// Listing order query
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// `name` or `price`
    pub sort: Option<String>,
    /// `asc` or `desc`
    pub order: Option<String>,
}

impl ListQuery {
    fn into_sort(self) -> AppResult<ProductSort> {
        let field = match self.sort.as_deref() {
            Some(s) => s.parse::<SortField>()?,
            None => SortField::default(),
        };
        let direction = match self.order.as_deref() {
            Some(s) => s.parse::<SortDirection>()?,
            None => SortDirection::default(),
        };
        Ok(ProductSort::new(field, direction))
    }
}

/// Stock adjustment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct StockUpdate {
    /// Added to the current quantity; negative values remove stock
    #[schema(example = -2)]
    pub delta: i32,
}

/// Public catalog routes
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/page", get(list_products_page))
        .route("/search", get(search_products))
        .route(
            "/:id",
            get(get_product)
                .put(replace_product)
                .patch(patch_product)
                .delete(delete_product),
        )
        .route("/:id/stock", patch(update_stock))
        .route("/:id/reviews", get(list_reviews).post(add_review))
}

/// Routes scoped to the authenticated user
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(list_favorites))
        .route("/:id/favorite", post(add_favorite).delete(remove_favorite))
}

/// List all products
#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    params(ListQuery),
    responses(
        (status = 200, description = "Products in the requested order", body = [Product]),
        (status = 400, description = "Unsupported sort field or direction")
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<Product>>> {
    let products = state.product_service.list_products(query.into_sort()?).await?;
    Ok(ApiResponse::success(products))
}

/// List one page of products
#[utoipa::path(
    get,
    path = "/products/page",
    tag = "Products",
    params(PaginationParams),
    responses(
        (status = 200, description = "Requested page with paging metadata", body = [Product])
    )
)]
pub async fn list_products_page(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Product>>> {
    let page = state.product_service.list_products_page(params).await?;
    Ok(Json(page))
}

/// Search products
#[utoipa::path(
    get,
    path = "/products/search",
    tag = "Products",
    params(
        ("name" = Option<String>, Query, description = "Case-insensitive name substring"),
        ("category" = Option<String>, Query, description = "Exact category"),
        ("minPrice" = Option<String>, Query, description = "Inclusive lower price bound"),
        ("maxPrice" = Option<String>, Query, description = "Inclusive upper price bound")
    ),
    responses(
        (status = 200, description = "Matching products", body = [Product]),
        (status = 400, description = "Search failed")
    )
)]
pub async fn search_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> AppResult<ApiResponse<Vec<Product>>> {
    let products = state.product_service.search_products(filter).await?;
    Ok(ApiResponse::success(products))
}

/// Get product by ID
#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 404, description = "Product not found")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<Product>> {
    let product = state.product_service.get_product(id).await?;
    Ok(ApiResponse::success(product))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/products",
    tag = "Products",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Validation error")
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ProductInput>,
) -> AppResult<Created<Product>> {
    let product = state.product_service.create_product(payload).await?;
    Ok(Created(product, "Product created successfully"))
}

/// Replace every field of a product
#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product replaced", body = Product),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn replace_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ProductInput>,
) -> AppResult<ApiResponse<Product>> {
    let product = state.product_service.replace_product(id, payload).await?;
    Ok(ApiResponse::with_message(product, "Product updated successfully"))
}

/// Update the supplied fields of a product
#[utoipa::path(
    patch,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = ProductPatch,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn patch_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ProductPatch>,
) -> AppResult<ApiResponse<Product>> {
    let product = state.product_service.patch_product(id, payload).await?;
    Ok(ApiResponse::with_message(product, "Product updated successfully"))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    state.product_service.delete_product(id).await?;
    Ok(ApiResponse::message("Product deleted successfully"))
}

/// Adjust stock by a signed delta
#[utoipa::path(
    patch,
    path = "/products/{id}/stock",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = StockUpdate,
    responses(
        (status = 200, description = "Stock adjusted", body = Product),
        (status = 404, description = "Product not found")
    )
)]
pub async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockUpdate>,
) -> AppResult<ApiResponse<Product>> {
    let product = state.product_service.update_stock(id, payload.delta).await?;
    Ok(ApiResponse::success(product))
}

/// List reviews of a product
#[utoipa::path(
    get,
    path = "/products/{id}/reviews",
    tag = "Reviews",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Reviews, oldest first", body = [Review]),
        (status = 404, description = "Product not found")
    )
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<Vec<Review>>> {
    let reviews = state.product_service.list_reviews(id).await?;
    Ok(ApiResponse::success(reviews))
}

/// Review a product
#[utoipa::path(
    post,
    path = "/products/{id}/reviews",
    tag = "Reviews",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = ReviewInput,
    responses(
        (status = 201, description = "Review added", body = Product),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn add_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReviewInput>,
) -> AppResult<Created<Product>> {
    let product = state.product_service.add_review(id, payload).await?;
    Ok(Created(product, "Review added successfully"))
}

/// Favorites of the current user
#[utoipa::path(
    get,
    path = "/products/favorites",
    tag = "Favorites",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Favorite products", body = [Product]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<ApiResponse<Vec<Product>>> {
    let products = state.product_service.list_favorites(current_user.id).await?;
    Ok(ApiResponse::success(products))
}

/// Mark a product as favorite
#[utoipa::path(
    post,
    path = "/products/{id}/favorite",
    tag = "Favorites",
    params(("id" = Uuid, Path, description = "Product ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Added, or already a favorite"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    state.product_service.add_favorite(current_user.id, id).await?;
    Ok(ApiResponse::message("Product added to favorites"))
}

/// Unmark a favorite
#[utoipa::path(
    delete,
    path = "/products/{id}/favorite",
    tag = "Favorites",
    params(("id" = Uuid, Path, description = "Product ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Removed, or was not a favorite"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    state.product_service.remove_favorite(current_user.id, id).await?;
    Ok(ApiResponse::message("Product removed from favorites"))
}
