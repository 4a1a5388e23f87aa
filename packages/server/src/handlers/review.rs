use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::domain::rating;
use crate::entity::{cafe, review, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::cafe::{find_cafe, find_cafe_for_update};
use crate::models::review::{CreateReviewRequest, ReviewResponse, validate_create_review};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/cafe/{cafe_id}",
    tag = "Reviews",
    operation_id = "listCafeReviews",
    summary = "List a cafe's reviews",
    description = "Returns all reviews for a cafe, newest first, each with the reviewer's display name.",
    params(("cafe_id" = i32, Path, description = "Cafe ID")),
    responses(
        (status = 200, description = "Reviews for the cafe", body = Vec<ReviewResponse>),
        (status = 404, description = "Cafe not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(cafe_id))]
pub async fn list_cafe_reviews(
    State(state): State<AppState>,
    Path(cafe_id): Path<i32>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    find_cafe(&state.db, cafe_id).await?;

    let reviews = review::Entity::find()
        .filter(review::Column::CafeId.eq(cafe_id))
        .order_by_desc(review::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let user_ids: Vec<i32> = reviews.iter().map(|r| r.user_id).collect();
    let names: HashMap<i32, String> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();

    let items = reviews
        .into_iter()
        .map(|r| {
            let name = names.get(&r.user_id).cloned().unwrap_or_default();
            ReviewResponse::from_model(r, name)
        })
        .collect();

    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Reviews",
    operation_id = "createReview",
    summary = "Submit a review",
    description = "Creates a review and recomputes the cafe's derived avg_rating/review_count. One review per user per cafe; a second attempt returns 409 DUPLICATE_REVIEW.",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Cafe not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already reviewed (DUPLICATE_REVIEW)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, cafe_id = payload.cafe_id))]
pub async fn create_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_review(&payload)?;

    // Insert and aggregate recomputation share one transaction, with the
    // cafe row locked up front. Concurrent submissions for the same cafe
    // serialize here instead of losing one another's update, and a review
    // can never become visible with a stale aggregate.
    let txn = state.db.begin().await?;

    let cafe = find_cafe_for_update(&txn, payload.cafe_id).await?;

    let already_reviewed = review::Entity::find()
        .filter(review::Column::CafeId.eq(cafe.id))
        .filter(review::Column::UserId.eq(auth_user.user_id))
        .count(&txn)
        .await?
        > 0;
    if already_reviewed {
        return Err(AppError::DuplicateReview);
    }

    let new_review = review::ActiveModel {
        rating: Set(payload.rating),
        comment: Set(payload.comment.trim().to_string()),
        user_id: Set(auth_user.user_id),
        cafe_id: Set(cafe.id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    // The unique index is the backstop for writers that bypass the lock.
    let model = new_review.insert(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::DuplicateReview,
        _ => AppError::from(e),
    })?;

    // Re-derive from the full review set rather than nudging a cached
    // average, so any previously missed update cannot drift the aggregate.
    let ratings: Vec<i32> = review::Entity::find()
        .filter(review::Column::CafeId.eq(cafe.id))
        .select_only()
        .column(review::Column::Rating)
        .into_tuple::<i32>()
        .all(&txn)
        .await?;

    let review_count = i32::try_from(ratings.len())
        .map_err(|_| AppError::Internal("Review count overflow".into()))?;

    let mut cafe_active: cafe::ActiveModel = cafe.into();
    cafe_active.avg_rating = Set(rating::average_rating(&ratings));
    cafe_active.review_count = Set(review_count);
    cafe_active.update(&txn).await?;

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(ReviewResponse::from_model(model, auth_user.name)),
    ))
}
