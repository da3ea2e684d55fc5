//! Product repository - persistence for the catalog.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, QueryTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use super::entities::product::{self, ActiveModel, Entity as ProductEntity, ReviewList};
use crate::config::MSG_PRODUCT_NOT_FOUND;
use crate::domain::{Product, ProductFilter, ProductInput, ProductPatch, Review};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Product repository trait for dependency injection.
///
/// Mutations address a row by id and report `NotFound` when no row matched,
/// so a product deleted concurrently is never silently "updated".
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products, unordered
    async fn find_all(&self) -> AppResult<Vec<Product>>;

    /// `limit` products starting at `offset`, plus the total count
    async fn find_page(&self, offset: u64, limit: u64) -> AppResult<(Vec<Product>, u64)>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;

    /// Bulk lookup; missing ids are skipped
    async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<Product>>;

    async fn search(&self, filter: ProductFilter) -> AppResult<Vec<Product>>;

    async fn create(&self, input: ProductInput) -> AppResult<Product>;

    /// Overwrite every writable field
    async fn replace(&self, id: Uuid, input: ProductInput) -> AppResult<Product>;

    /// Overwrite only the supplied fields
    async fn patch(&self, id: Uuid, patch: ProductPatch) -> AppResult<Product>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Atomically add `delta` to the stored quantity
    async fn adjust_quantity(&self, id: Uuid, delta: i32) -> AppResult<Product>;

    /// Append a review under a row lock
    async fn push_review(&self, id: Uuid, review: Review) -> AppResult<Product>;
}

/// SeaORM-backed product repository
pub struct ProductStore {
    db: DatabaseConnection,
}

impl ProductStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn not_found() -> AppError {
    AppError::not_found(MSG_PRODUCT_NOT_FOUND)
}

/// `RecordNotUpdated` means the primary key matched no row.
fn map_update_err(err: DbErr) -> AppError {
    match err {
        DbErr::RecordNotUpdated => not_found(),
        other => AppError::from(other),
    }
}

/// `LOWER(name) LIKE '%term%'` with the term's wildcards taken literally,
/// matching [`ProductFilter::matches`].
fn name_contains(term: &str) -> SimpleExpr {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');

    Expr::expr(Func::lower(Expr::col(product::Column::Name)))
        .like(LikeExpr::new(pattern).escape('\\'))
}

#[async_trait]
impl ProductRepository for ProductStore {
    async fn find_all(&self) -> AppResult<Vec<Product>> {
        let models = ProductEntity::find().all(&self.db).await?;
        Ok(models.into_iter().map(Product::from).collect())
    }

    async fn find_page(&self, offset: u64, limit: u64) -> AppResult<(Vec<Product>, u64)> {
        let total = ProductEntity::find().count(&self.db).await?;
        let models = ProductEntity::find()
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((models.into_iter().map(Product::from).collect(), total))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        let result = ProductEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Product::from))
    }

    async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let models = ProductEntity::find()
            .filter(product::Column::Id.is_in(ids))
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Product::from).collect())
    }

    async fn search(&self, filter: ProductFilter) -> AppResult<Vec<Product>> {
        let models = ProductEntity::find()
            .apply_if(filter.name, |query, name| query.filter(name_contains(&name)))
            .apply_if(filter.category, |query, category| {
                query.filter(product::Column::Category.eq(category))
            })
            .apply_if(filter.min_price, |query, min| {
                query.filter(product::Column::Price.gte(min))
            })
            .apply_if(filter.max_price, |query, max| {
                query.filter(product::Column::Price.lte(max))
            })
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Product::from).collect())
    }

    async fn create(&self, input: ProductInput) -> AppResult<Product> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            image: Set(input.image),
            price: Set(input.price),
            quantity: Set(input.quantity),
            category: Set(input.category),
            reviews: Set(ReviewList::default()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(Product::from(model))
    }

    async fn replace(&self, id: Uuid, input: ProductInput) -> AppResult<Product> {
        let active = ActiveModel {
            id: Unchanged(id),
            name: Set(input.name),
            description: Set(input.description),
            image: Set(input.image),
            price: Set(input.price),
            quantity: Set(input.quantity),
            category: Set(input.category),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = active.update(&self.db).await.map_err(map_update_err)?;
        Ok(Product::from(model))
    }

    async fn patch(&self, id: Uuid, patch: ProductPatch) -> AppResult<Product> {
        let mut active = ActiveModel {
            id: Unchanged(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(image) = patch.image {
            active.image = Set(image);
        }
        if let Some(price) = patch.price {
            active.price = Set(price);
        }
        if let Some(quantity) = patch.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(category) = patch.category {
            active.category = Set(Some(category));
        }

        let model = active.update(&self.db).await.map_err(map_update_err)?;
        Ok(Product::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = ProductEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(not_found());
        }

        Ok(())
    }

    async fn adjust_quantity(&self, id: Uuid, delta: i32) -> AppResult<Product> {
        // Single UPDATE ... RETURNING, no read-modify-write
        let mut models = ProductEntity::update_many()
            .col_expr(
                product::Column::Quantity,
                Expr::col(product::Column::Quantity).add(delta),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(id))
            .exec_with_returning(&self.db)
            .await?;

        models.pop().map(Product::from).ok_or_not_found(MSG_PRODUCT_NOT_FOUND)
    }

    async fn push_review(&self, id: Uuid, review: Review) -> AppResult<Product> {
        let txn = self.db.begin().await?;

        let model = ProductEntity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_not_found(MSG_PRODUCT_NOT_FOUND)?;

        let mut reviews = model.reviews.clone();
        reviews.0.push(review);

        let mut active: ActiveModel = model.into();
        active.reviews = Set(reviews);
        active.updated_at = Set(Utc::now());

        let model = active.update(&txn).await.map_err(map_update_err)?;
        txn.commit().await?;

        Ok(Product::from(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, Value};

    fn search_statement(term: &str) -> sea_orm::Statement {
        ProductEntity::find()
            .filter(name_contains(term))
            .build(DbBackend::Postgres)
    }

    fn bound_pattern(term: &str) -> Value {
        search_statement(term)
            .values
            .and_then(|values| values.0.into_iter().next())
            .unwrap()
    }

    #[test]
    fn test_name_search_is_lowercased_substring() {
        let statement = search_statement("Lamp");
        assert!(statement.sql.contains(r#"LOWER("name") LIKE"#));
        assert!(statement.sql.contains("ESCAPE"));
        assert_eq!(bound_pattern("Lamp"), Value::from("%lamp%"));
    }

    #[test]
    fn test_name_search_escapes_wildcards() {
        assert_eq!(bound_pattern("50%_"), Value::from(r"%50\%\_%"));
        assert_eq!(bound_pattern(r"a\b"), Value::from(r"%a\\b%"));
    }
}
