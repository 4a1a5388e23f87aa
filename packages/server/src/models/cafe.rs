use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::availability::{self, OpenStatus};
use crate::domain::schedule::WeeklyHours;
use crate::entity::cafe;
use crate::error::AppError;

pub use super::shared::escape_like;
use super::shared::double_option;

/// Accepted price tier symbols.
pub const PRICE_RANGES: &[&str] = &["$", "$$", "$$$", "$$$$", "₹", "₹₹", "₹₹₹"];

/// Price tier assigned when a cafe is created without one.
pub const DEFAULT_PRICE_RANGE: &str = "₹";

/// Country assigned when a cafe is created without one.
pub const DEFAULT_COUNTRY: &str = "Nepal";

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCafeRequest {
    pub name: String,
    pub description: Option<String>,
    /// URL reference to an externally hosted image.
    pub image: Option<String>,
    /// One of $, $$, $$$, $$$$, ₹, ₹₹, ₹₹₹. Defaults to ₹.
    pub price_range: Option<String>,
    pub street: String,
    pub city: String,
    /// Defaults to Nepal.
    pub country: Option<String>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Map of lowercase weekday names to `"H:MM AM - H:MM PM"` text or the
    /// literal `"closed"`. Parsed and validated at data entry.
    #[schema(value_type = Option<Object>)]
    pub opening_hours: Option<WeeklyHours>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateCafeRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image: Option<Option<String>>,
    pub price_range: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub amenities: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Object>)]
    pub opening_hours: Option<Option<WeeklyHours>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CafeResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price_range: String,
    pub address: Address,
    pub amenities: Vec<String>,
    /// Derived mean rating, one decimal place. 0 when unreviewed.
    pub avg_rating: f64,
    pub review_count: i32,
    #[schema(value_type = Option<Object>)]
    pub opening_hours: Option<WeeklyHours>,
    /// True/false when a schedule exists for today, null when unknown.
    pub open_now: Option<bool>,
    /// Today's hours as display text.
    #[schema(example = "7:00 AM - 9:00 PM")]
    pub today_hours: String,
    /// Distance from the query point, present only on proximity searches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    /// Display form of `distance_km`, e.g. `"850m"` or `"1.2km"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "1.2km")]
    pub distance_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CafeResponse {
    /// Build a response from a row, evaluating availability at `now`
    /// (the server's local wall-clock time, passed in by the handler).
    pub fn from_model(model: cafe::Model, now: NaiveDateTime) -> Self {
        let open_now: OpenStatus = availability::open_status(model.opening_hours.as_ref(), now);
        let today_hours = availability::today_hours(model.opening_hours.as_ref(), now);

        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            image: model.image,
            price_range: model.price_range,
            address: Address {
                street: model.street,
                city: model.city,
                country: model.country,
                lat: model.lat,
                lng: model.lng,
            },
            amenities: model.amenities.0,
            avg_rating: model.avg_rating,
            review_count: model.review_count,
            opening_hours: model.opening_hours,
            open_now: open_now.as_bool(),
            today_hours,
            distance_km: None,
            distance_text: None,
            created_at: model.created_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct CafeListQuery {
    /// Case-insensitive name substring.
    pub search: Option<String>,
    /// Case-insensitive city substring.
    pub city: Option<String>,
    /// Exact price tier symbol.
    pub price_range: Option<String>,
    /// Cafes tagged with this amenity.
    pub amenity: Option<String>,
    /// Proximity filter origin; requires `lng` and `radius_km`.
    pub lat: Option<f64>,
    /// Proximity filter origin; requires `lat` and `radius_km`.
    pub lng: Option<f64>,
    /// Proximity filter radius; requires `lat` and `lng`.
    pub radius_km: Option<f64>,
}

/// The proximity filter, when requested at all, needs all three parameters.
pub struct GeoFilter {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
}

pub fn validate_list_query(query: &CafeListQuery) -> Result<Option<GeoFilter>, AppError> {
    match (query.lat, query.lng, query.radius_km) {
        (None, None, None) => Ok(None),
        (Some(lat), Some(lng), Some(radius_km)) => {
            validate_coordinates(lat, lng)?;
            if radius_km <= 0.0 || !radius_km.is_finite() {
                return Err(AppError::Validation("radius_km must be positive".into()));
            }
            Ok(Some(GeoFilter {
                lat,
                lng,
                radius_km,
            }))
        }
        _ => Err(AppError::Validation(
            "Proximity search requires lat, lng and radius_km together".into(),
        )),
    }
}

pub fn validate_create_cafe(payload: &CreateCafeRequest) -> Result<(), AppError> {
    validate_name(&payload.name)?;
    if let Some(ref price_range) = payload.price_range {
        validate_price_range(price_range)?;
    }
    validate_coordinates(payload.lat, payload.lng)?;
    validate_amenities(&payload.amenities)?;
    if let Some(ref hours) = payload.opening_hours {
        validate_weekly_hours(hours)?;
    }
    Ok(())
}

pub fn validate_update_cafe(payload: &UpdateCafeRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_name(name)?;
    }
    if let Some(ref price_range) = payload.price_range {
        validate_price_range(price_range)?;
    }
    if let Some(lat) = payload.lat {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::Validation("lat must be within [-90, 90]".into()));
        }
    }
    if let Some(lng) = payload.lng {
        if !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::Validation("lng must be within [-180, 180]".into()));
        }
    }
    if let Some(ref amenities) = payload.amenities {
        validate_amenities(amenities)?;
    }
    if let Some(Some(ref hours)) = payload.opening_hours {
        validate_weekly_hours(hours)?;
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 256 {
        return Err(AppError::Validation("Name must be 1-256 characters".into()));
    }
    Ok(())
}

fn validate_price_range(price_range: &str) -> Result<(), AppError> {
    if !PRICE_RANGES.contains(&price_range) {
        return Err(AppError::Validation(format!(
            "price_range must be one of: {}",
            PRICE_RANGES.join(", ")
        )));
    }
    Ok(())
}

fn validate_coordinates(lat: f64, lng: f64) -> Result<(), AppError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::Validation("lat must be within [-90, 90]".into()));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(AppError::Validation("lng must be within [-180, 180]".into()));
    }
    Ok(())
}

fn validate_amenities(amenities: &[String]) -> Result<(), AppError> {
    if amenities.iter().any(|a| a.trim().is_empty()) {
        return Err(AppError::Validation("Amenity tags must not be empty".into()));
    }
    Ok(())
}

/// Overnight ranges (end not after start) are refused at data entry: the
/// evaluator would silently read them as closed after midnight.
fn validate_weekly_hours(hours: &WeeklyHours) -> Result<(), AppError> {
    for (day, sched) in hours.days() {
        if sched.is_overnight() {
            return Err(AppError::Validation(format!(
                "{day}: closing time must be after opening time (overnight hours are not supported)"
            )));
        }
    }
    Ok(())
}
