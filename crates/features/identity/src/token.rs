use crate::error::IdentityError;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use vestibule_domain::config::JwtConfig;

/// Claims carried by issued bearer tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User record key.
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

pub(crate) fn issue(user_id: &str, cfg: &JwtConfig) -> Result<String, IdentityError> {
    let now = chrono::Utc::now();
    let ttl = i64::try_from(cfg.ttl_seconds).map_err(|_| IdentityError::Internal {
        message: "JWT TTL out of range".into(),
        context: None,
    })?;
    let claims = Claims {
        sub: user_id.to_owned(),
        iss: cfg.issuer.clone(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::seconds(ttl)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )
    .map_err(|e| IdentityError::Internal {
        message: e.to_string().into(),
        context: Some("Failed to encode token".into()),
    })
}

pub(crate) fn verify(token: &str, cfg: &JwtConfig) -> Result<Claims, IdentityError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&cfg.issuer]);

    decode::<Claims>(token, &DecodingKey::from_secret(cfg.secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| IdentityError::Unauthorized {
            message: e.to_string().into(),
            context: Some("Token rejected".into()),
        })
}
