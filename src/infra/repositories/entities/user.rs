//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{User, UserRole};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub phone: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub saldo: Decimal,
    /// Last token issued at login
    pub token: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::favorite::Entity")]
    Favorite,
}

impl Related<super::favorite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorite.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            username: model.username,
            name: model.name,
            password_hash: model.password_hash,
            role: UserRole::from(model.role.as_str()),
            phone: model.phone,
            saldo: model.saldo,
            token: model.token,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
