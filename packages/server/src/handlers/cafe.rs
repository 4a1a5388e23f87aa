use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::domain::geo;
use crate::entity::{cafe, review};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::cafe::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Cafes",
    operation_id = "listCafes",
    summary = "List cafes with filtering",
    description = "Returns cafes ordered by average rating (best first). Supports case-insensitive name and city search, exact price tier, amenity membership, and proximity filtering (lat/lng/radius_km, which also attaches distance_km to each result).",
    params(CafeListQuery),
    responses(
        (status = 200, description = "Matching cafes", body = Vec<CafeResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_cafes(
    State(state): State<AppState>,
    Query(query): Query<CafeListQuery>,
) -> Result<Json<Vec<CafeResponse>>, AppError> {
    let geo_filter = validate_list_query(&query)?;

    let mut select = cafe::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(cafe::Column::Name)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    if let Some(ref city) = query.city {
        let term = escape_like(city.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(cafe::Column::City)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    if let Some(ref price_range) = query.price_range {
        select = select.filter(cafe::Column::PriceRange.eq(price_range));
    }

    let rows = select
        .order_by_desc(cafe::Column::AvgRating)
        .all(&state.db)
        .await?;

    // Amenity membership and proximity are filtered here rather than in SQL:
    // amenities live in a JSON array and the distance needs the haversine.
    let now = chrono::Local::now().naive_local();
    let mut cafes = Vec::with_capacity(rows.len());
    for model in rows {
        if let Some(ref amenity) = query.amenity {
            let tagged = model
                .amenities
                .0
                .iter()
                .any(|a| a.eq_ignore_ascii_case(amenity.trim()));
            if !tagged {
                continue;
            }
        }

        let distance_km = match geo_filter {
            Some(ref origin) => {
                let d = geo::haversine_km(origin.lat, origin.lng, model.lat, model.lng);
                if d > origin.radius_km {
                    continue;
                }
                Some(d)
            }
            None => None,
        };

        let mut response = CafeResponse::from_model(model, now);
        response.distance_text = distance_km.map(geo::format_distance);
        response.distance_km = distance_km;
        cafes.push(response);
    }

    Ok(Json(cafes))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Cafes",
    operation_id = "getCafe",
    summary = "Get a cafe by ID",
    params(("id" = i32, Path, description = "Cafe ID")),
    responses(
        (status = 200, description = "Cafe details", body = CafeResponse),
        (status = 404, description = "Cafe not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_cafe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CafeResponse>, AppError> {
    let model = find_cafe(&state.db, id).await?;
    let now = chrono::Local::now().naive_local();
    Ok(Json(CafeResponse::from_model(model, now)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Cafes",
    operation_id = "createCafe",
    summary = "Create a new cafe",
    description = "Admin only. Opening hours text is parsed and validated here; malformed or overnight ranges are rejected.",
    request_body = CreateCafeRequest,
    responses(
        (status = 201, description = "Cafe created", body = CafeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_cafe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCafeRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_cafe(&payload)?;

    let new_cafe = cafe::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        image: Set(payload.image),
        price_range: Set(payload
            .price_range
            .unwrap_or_else(|| DEFAULT_PRICE_RANGE.to_string())),
        street: Set(payload.street.trim().to_string()),
        city: Set(payload.city.trim().to_string()),
        country: Set(payload
            .country
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string())),
        lat: Set(payload.lat),
        lng: Set(payload.lng),
        amenities: Set(cafe::Amenities(
            payload
                .amenities
                .into_iter()
                .map(|a| a.trim().to_string())
                .collect(),
        )),
        // A fresh cafe has no reviews; the aggregator owns these from here on.
        avg_rating: Set(0.0),
        review_count: Set(0),
        opening_hours: Set(payload.opening_hours),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_cafe.insert(&state.db).await?;
    let now = chrono::Local::now().naive_local();

    Ok((StatusCode::CREATED, Json(CafeResponse::from_model(model, now))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Cafes",
    operation_id = "updateCafe",
    summary = "Update an existing cafe",
    description = "Admin only. PATCH semantics: only provided fields change. `description`, `image` and `opening_hours` accept null to clear. The derived rating fields are not writable.",
    params(("id" = i32, Path, description = "Cafe ID")),
    request_body = UpdateCafeRequest,
    responses(
        (status = 200, description = "Cafe updated", body = CafeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Cafe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_cafe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCafeRequest>,
) -> Result<Json<CafeResponse>, AppError> {
    auth_user.require_admin()?;
    validate_update_cafe(&payload)?;

    let now = chrono::Local::now().naive_local();

    if payload == UpdateCafeRequest::default() {
        let existing = find_cafe(&state.db, id).await?;
        return Ok(Json(CafeResponse::from_model(existing, now)));
    }

    let txn = state.db.begin().await?;

    let existing = find_cafe(&txn, id).await?;
    let mut active: cafe::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(image) = payload.image {
        active.image = Set(image);
    }
    if let Some(price_range) = payload.price_range {
        active.price_range = Set(price_range);
    }
    if let Some(ref street) = payload.street {
        active.street = Set(street.trim().to_string());
    }
    if let Some(ref city) = payload.city {
        active.city = Set(city.trim().to_string());
    }
    if let Some(country) = payload.country {
        active.country = Set(country);
    }
    if let Some(lat) = payload.lat {
        active.lat = Set(lat);
    }
    if let Some(lng) = payload.lng {
        active.lng = Set(lng);
    }
    if let Some(amenities) = payload.amenities {
        active.amenities = Set(cafe::Amenities(
            amenities.into_iter().map(|a| a.trim().to_string()).collect(),
        ));
    }
    if let Some(opening_hours) = payload.opening_hours {
        active.opening_hours = Set(opening_hours);
    }

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(CafeResponse::from_model(model, now)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Cafes",
    operation_id = "deleteCafe",
    summary = "Delete a cafe",
    description = "Admin only. Deletes the cafe and all of its reviews in one transaction, so no review outlives the cafe it aggregates into.",
    params(("id" = i32, Path, description = "Cafe ID")),
    responses(
        (status = 204, description = "Cafe deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Cafe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_cafe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let txn = state.db.begin().await?;

    find_cafe_for_update(&txn, id).await?;

    review::Entity::delete_many()
        .filter(review::Column::CafeId.eq(id))
        .exec(&txn)
        .await?;
    cafe::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_cafe<C: ConnectionTrait>(db: &C, id: i32) -> Result<cafe::Model, AppError> {
    cafe::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Cafe not found".into()))
}

/// Fetch a cafe inside a transaction with its row locked, serializing
/// writers that will touch the derived aggregate.
pub(crate) async fn find_cafe_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<cafe::Model, AppError> {
    use sea_orm::sea_query::LockType;
    cafe::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Cafe not found".into()))
}
