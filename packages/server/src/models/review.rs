use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::review;
use crate::error::AppError;

/// Longest accepted review comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 2000;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateReviewRequest {
    /// Cafe being reviewed.
    pub cafe_id: i32,
    /// Integer star rating, 1-5.
    #[schema(example = 4)]
    pub rating: i32,
    /// Required free-text comment.
    #[schema(example = "Great espresso, spotty wifi.")]
    pub comment: String,
}

pub fn validate_create_review(payload: &CreateReviewRequest) -> Result<(), AppError> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::Validation(
            "Rating must be an integer between 1 and 5".into(),
        ));
    }
    let comment = payload.comment.trim();
    if comment.is_empty() {
        return Err(AppError::Validation("Comment must not be empty".into()));
    }
    if comment.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::Validation(format!(
            "Comment must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(())
}

/// A review with its author's display name attached.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewResponse {
    pub id: i32,
    pub cafe_id: i32,
    pub user_id: i32,
    /// Display name of the reviewing user.
    #[schema(example = "Asha Shrestha")]
    pub user_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl ReviewResponse {
    pub fn from_model(model: review::Model, user_name: String) -> Self {
        Self {
            id: model.id,
            cafe_id: model.cafe_id,
            user_id: model.user_id,
            user_name,
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at,
        }
    }
}
