//! JWT token generation and validation
//!
//! Identity is issued elsewhere; this service only needs to verify bearer tokens
//! and read the actor id and role out of them. `generate_token` exists for local
//! tooling and tests.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Actor, Role};

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// customer, technician or admin
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn actor(&self) -> Result<Actor, JwtError> {
        let id = Uuid::parse_str(&self.sub).map_err(|e| JwtError::InvalidToken(e.to_string()))?;
        let role = Role::parse(&self.role)
            .ok_or_else(|| JwtError::InvalidToken(format!("unknown role '{}'", self.role)))?;
        Ok(Actor::new(id, role))
    }
}

pub fn generate_token(actor: &Actor, secret: &str, ttl_seconds: i64) -> Result<String, JwtError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(ttl_seconds);

    let claims = Claims {
        sub: actor.id.to_string(),
        role: actor.role.as_str().to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::EncodingFailed(e.to_string()))
}

/// Verify and decode a JWT token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::DecodingFailed(e.to_string()),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip_carries_actor() {
        let actor = Actor::new(Uuid::new_v4(), Role::Technician);
        let token = generate_token(&actor, "test-secret-key", 900).unwrap();

        let claims = verify_token(&token, "test-secret-key").unwrap();
        assert_eq!(claims.actor().unwrap(), actor);
    }

    #[test]
    fn test_invalid_token() {
        assert!(verify_token("invalid.token.here", "test-secret-key").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let actor = Actor::new(Uuid::new_v4(), Role::Customer);
        let token = generate_token(&actor, "secret1", 900).unwrap();
        assert!(verify_token(&token, "secret2").is_err());
    }

    #[test]
    fn test_expired_token() {
        let actor = Actor::new(Uuid::new_v4(), Role::Customer);
        // Past the default 60s leeway
        let token = generate_token(&actor, "secret", -3600).unwrap();
        assert!(matches!(
            verify_token(&token, "secret"),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: "oracle".to_string(),
            iat: 0,
            exp: 0,
        };
        assert!(claims.actor().is_err());
    }
}
