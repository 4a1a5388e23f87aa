use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;

/// Request body for user registration. Always creates a non-admin account.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Display name (1-64 characters).
    #[schema(example = "Asha Shrestha")]
    pub name: String,
    /// Unique account email.
    #[schema(example = "asha@example.com")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let name = payload.name.trim();
    if name.is_empty() || name.chars().count() > 64 {
        return Err(AppError::Validation("Name must be 1-64 characters".into()));
    }
    validate_email(&payload.email)?;
    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let well_formed = email.len() <= 254
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    Ok(())
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Account email.
    #[schema(example = "asha@example.com")]
    pub email: String,
    /// Account password.
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Public user profile, embedded in auth responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserProfile {
    /// User ID.
    #[schema(example = 42)]
    pub id: i32,
    /// Display name.
    #[schema(example = "Asha Shrestha")]
    pub name: String,
    /// Account email.
    #[schema(example = "asha@example.com")]
    pub email: String,
    /// Whether the account may manage cafes.
    pub is_admin: bool,
}

impl From<user::Model> for UserProfile {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

/// Successful registration or login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: UserProfile,
}
