use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    AuthResponse, LoginRequest, RegisterRequest, UserProfile, validate_login_request,
    validate_register_request,
};
use crate::state::AppState;
use crate::utils::{hash, jwt};

fn issue_token(state: &AppState, user: &user::Model) -> Result<String, AppError> {
    jwt::sign(
        user.id,
        &user.name,
        &user.email,
        user.is_admin,
        &state.config.auth.jwt_secret,
        state.config.auth.token_days,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new user account",
    description = "Creates a regular (non-admin) account and returns a bearer token.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let new_user = user::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        email: Set(payload.email.trim().to_lowercase()),
        password: Set(hash),
        // Registration never grants admin; admin accounts are seeded.
        is_admin: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let user = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Registration race condition: unique constraint caught on insert");
            AppError::EmailTaken
        }
        _ => AppError::from(e),
    })?;

    let token = issue_token(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserProfile::from(user),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in with email and password",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unknown email or wrong password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    validate_login_request(&payload)?;
    let user = authenticate(&state, &payload).await?;
    let token = issue_token(&state, &user)?;

    Ok(Json(AuthResponse {
        token,
        user: UserProfile::from(user),
    }))
}

#[utoipa::path(
    post,
    path = "/admin/login",
    tag = "Auth",
    operation_id = "adminLogin",
    summary = "Log in to an admin account",
    description = "As login, but rejects non-admin accounts with 403.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unknown email or wrong password (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 403, description = "Account is not an admin (PERMISSION_DENIED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn admin_login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    validate_login_request(&payload)?;
    let user = authenticate(&state, &payload).await?;
    if !user.is_admin {
        return Err(AppError::PermissionDenied);
    }
    let token = issue_token(&state, &user)?;

    Ok(Json(AuthResponse {
        token,
        user: UserProfile::from(user),
    }))
}

/// Look up the account and check the password. Unknown email and wrong
/// password are indistinguishable to the caller.
async fn authenticate(state: &AppState, payload: &LoginRequest) -> Result<user::Model, AppError> {
    let email = payload.email.trim().to_lowercase();

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Get the current user's profile",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, AppError> {
    // Re-read instead of echoing claims so a revoked admin flag is fresh.
    let user = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    Ok(Json(UserProfile::from(user)))
}
