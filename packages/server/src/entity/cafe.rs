use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::schedule::WeeklyHours;

/// Free-text amenity tags, stored as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Amenities(pub Vec<String>);

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cafe")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    pub description: Option<String>,
    /// Image URL reference; storage itself lives elsewhere.
    pub image: Option<String>,
    /// Price tier symbol: $, $$, $$$, $$$$, ₹, ₹₹ or ₹₹₹.
    pub price_range: String,

    pub street: String,
    pub city: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,

    #[sea_orm(column_type = "JsonBinary")]
    pub amenities: Amenities,

    /// Derived: rounded mean of this cafe's review ratings. Written only by
    /// the rating aggregator, never by a client.
    pub avg_rating: f64,
    /// Derived: number of reviews. Same ownership as `avg_rating`.
    pub review_count: i32,

    /// Typed weekly schedule, serialized in the text-map wire shape.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub opening_hours: Option<WeeklyHours>,

    #[sea_orm(has_many)]
    pub reviews: HasMany<super::review::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
