//! Favorite repository - per-user set of product ids.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::favorite::{self, ActiveModel, Entity as FavoriteEntity};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Favorite repository trait for dependency injection.
///
/// Set semantics: adding twice and removing an absent entry are no-ops.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    async fn add(&self, user_id: Uuid, product_id: Uuid) -> AppResult<()>;

    async fn remove(&self, user_id: Uuid, product_id: Uuid) -> AppResult<()>;

    /// Favorite product ids of a user, oldest first
    async fn product_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;
}

/// SeaORM-backed favorite repository
pub struct FavoriteStore {
    db: DatabaseConnection,
}

impl FavoriteStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FavoriteRepository for FavoriteStore {
    async fn add(&self, user_id: Uuid, product_id: Uuid) -> AppResult<()> {
        let row = ActiveModel {
            user_id: Set(user_id),
            product_id: Set(product_id),
            created_at: Set(Utc::now()),
        };

        let result = FavoriteEntity::insert(row)
            .on_conflict(
                OnConflict::columns([favorite::Column::UserId, favorite::Column::ProductId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.db)
            .await;

        match result {
            // Conflict: already a favorite
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, user_id: Uuid, product_id: Uuid) -> AppResult<()> {
        FavoriteEntity::delete_many()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::ProductId.eq(product_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    async fn product_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        use sea_orm::QueryOrder;

        let ids = FavoriteEntity::find()
            .select_only()
            .column(favorite::Column::ProductId)
            .filter(favorite::Column::UserId.eq(user_id))
            .order_by_asc(favorite::Column::CreatedAt)
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await?;

        Ok(ids)
    }
}
