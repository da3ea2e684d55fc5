//! Product service - catalog business rules.
//!
//! Every by-id mutation looks the product up first and fails with `NotFound`
//! before touching the store. The repositories then apply the mutation
//! conditionally, so a row removed between the two steps is still reported
//! as missing instead of silently "updated".

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::MSG_PRODUCT_NOT_FOUND;
use crate::domain::{Product, ProductFilter, ProductInput, ProductPatch, ProductSort, Review, ReviewInput};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

/// Product service trait for dependency injection.
#[async_trait]
pub trait ProductService: Send + Sync {
    /// All products ordered in memory by `sort`
    async fn list_products(&self, sort: ProductSort) -> AppResult<Vec<Product>>;

    async fn list_products_page(&self, params: PaginationParams) -> AppResult<Paginated<Product>>;

    async fn get_product(&self, id: Uuid) -> AppResult<Product>;

    async fn create_product(&self, input: ProductInput) -> AppResult<Product>;

    async fn delete_product(&self, id: Uuid) -> AppResult<()>;

    /// Overwrite every writable field
    async fn replace_product(&self, id: Uuid, input: ProductInput) -> AppResult<Product>;

    /// Overwrite only the supplied fields
    async fn patch_product(&self, id: Uuid, patch: ProductPatch) -> AppResult<Product>;

    async fn search_products(&self, filter: ProductFilter) -> AppResult<Vec<Product>>;

    /// Add `delta` to the stock. Negative results are allowed.
    async fn update_stock(&self, id: Uuid, delta: i32) -> AppResult<Product>;

    async fn add_favorite(&self, user_id: Uuid, product_id: Uuid) -> AppResult<()>;

    async fn remove_favorite(&self, user_id: Uuid, product_id: Uuid) -> AppResult<()>;

    async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<Product>>;

    async fn add_review(&self, id: Uuid, review: ReviewInput) -> AppResult<Product>;

    async fn list_reviews(&self, id: Uuid) -> AppResult<Vec<Review>>;
}

/// Concrete implementation of ProductService using Unit of Work.
pub struct ProductManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> ProductManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn ensure_exists(&self, id: Uuid) -> AppResult<()> {
        self.get_product(id).await.map(|_| ())
    }
}

#[async_trait]
impl<U: UnitOfWork> ProductService for ProductManager<U> {
    async fn list_products(&self, sort: ProductSort) -> AppResult<Vec<Product>> {
        let mut products = self.uow.products().find_all().await?;
        sort.apply(&mut products);
        Ok(products)
    }

    async fn list_products_page(&self, params: PaginationParams) -> AppResult<Paginated<Product>> {
        params.check()?;
        let (products, total) = self
            .uow
            .products()
            .find_page(params.offset(), params.limit())
            .await?;

        Ok(Paginated::new(products, params.page, params.limit(), total))
    }

    async fn get_product(&self, id: Uuid) -> AppResult<Product> {
        self.uow
            .products()
            .find_by_id(id)
            .await?
            .ok_or_not_found(MSG_PRODUCT_NOT_FOUND)
    }

    async fn create_product(&self, input: ProductInput) -> AppResult<Product> {
        let product = self.uow.products().create(input).await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<()> {
        self.ensure_exists(id).await?;
        self.uow.products().delete(id).await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn replace_product(&self, id: Uuid, input: ProductInput) -> AppResult<Product> {
        self.ensure_exists(id).await?;
        self.uow.products().replace(id, input).await
    }

    async fn patch_product(&self, id: Uuid, patch: ProductPatch) -> AppResult<Product> {
        let current = self.get_product(id).await?;
        if patch.is_empty() {
            return Ok(current);
        }
        self.uow.products().patch(id, patch).await
    }

    async fn search_products(&self, filter: ProductFilter) -> AppResult<Vec<Product>> {
        tracing::debug!(?filter, "Searching products");
        self.uow
            .products()
            .search(filter)
            .await
            .map_err(|e| match e {
                AppError::Database(err) => AppError::SearchFailed(err.to_string()),
                other => AppError::SearchFailed(other.to_string()),
            })
    }

    async fn update_stock(&self, id: Uuid, delta: i32) -> AppResult<Product> {
        self.ensure_exists(id).await?;
        let product = self.uow.products().adjust_quantity(id, delta).await?;
        tracing::debug!(product_id = %id, delta, quantity = product.quantity, "Stock adjusted");
        Ok(product)
    }

    async fn add_favorite(&self, user_id: Uuid, product_id: Uuid) -> AppResult<()> {
        self.ensure_exists(product_id).await?;
        self.uow.favorites().add(user_id, product_id).await
    }

    async fn remove_favorite(&self, user_id: Uuid, product_id: Uuid) -> AppResult<()> {
        self.uow.favorites().remove(user_id, product_id).await
    }

    async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<Product>> {
        let ids = self.uow.favorites().product_ids(user_id).await?;
        let mut products = self.uow.products().find_by_ids(ids.clone()).await?;
        // Keep the order the favorites were added in
        products.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
        Ok(products)
    }

    async fn add_review(&self, id: Uuid, review: ReviewInput) -> AppResult<Product> {
        self.ensure_exists(id).await?;
        self.uow.products().push_review(id, review.into_review()).await
    }

    async fn list_reviews(&self, id: Uuid) -> AppResult<Vec<Review>> {
        Ok(self.get_product(id).await?.reviews)
    }
}
