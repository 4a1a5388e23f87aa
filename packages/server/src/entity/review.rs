use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One user's review of one cafe. Immutable after creation; uniqueness of
/// `(cafe_id, user_id)` is enforced by an index created at startup.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Integer star rating, 1-5.
    pub rating: i32,
    pub comment: String,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub cafe_id: i32,
    #[sea_orm(belongs_to, from = "cafe_id", to = "id")]
    pub cafe: HasOne<super::cafe::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
