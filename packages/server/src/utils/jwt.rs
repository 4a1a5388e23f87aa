use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account email.
    pub sub: String,
    /// User ID.
    pub uid: i32,
    /// Display name.
    pub name: String,
    /// Admin flag at issue time.
    pub admin: bool,
    /// Expiration timestamp.
    pub exp: usize,
}

/// Sign a new JWT token for a user.
pub fn sign(
    user_id: i32,
    name: &str,
    email: &str,
    is_admin: bool,
    secret: &str,
    token_days: i64,
) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(token_days))
        .ok_or_else(|| anyhow::anyhow!("Token expiry out of range"))?
        .timestamp();

    let claims = Claims {
        sub: email.to_owned(),
        uid: user_id,
        name: name.to_owned(),
        admin: is_admin,
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a JWT token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
