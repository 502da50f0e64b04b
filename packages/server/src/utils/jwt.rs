use chrono::{Duration, Utc};
use common::UserRole;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error,
};
use serde::{Deserialize, Serialize};

use crate::entity::user;

/// JWT Claims structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String, // Email
    pub name: String,
    pub role: UserRole,
    pub id: i32,
    pub picture: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Sign a session token for `user`, valid for `ttl_days`.
pub fn sign(user: &user::Model, secret: &str, ttl_days: i64) -> Result<String, Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.email.clone(),
        name: format!("{} {}", user.first_name, user.last_name)
            .trim()
            .to_string(),
        role: user.role,
        id: user.id,
        picture: user.picture.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::days(ttl_days)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify signature and expiry of a session token and return its claims.
pub fn verify(token: &str, secret: &str) -> Result<Claims, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}
