//! Authentication middleware
//!
//! Extractors that verify the bearer JWT and hand handlers an [`Actor`].

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{AuthService, JwtError};
use crate::models::Actor;

/// Caller identity taken from a verified JWT
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Actor);

/// Error response for authentication failures
#[derive(Debug, Serialize)]
struct AuthError {
    error: AuthErrorDetails,
}

#[derive(Debug, Serialize)]
struct AuthErrorDetails {
    code: String,
    message: String,
}

impl AuthError {
    fn new(code: &str, message: &str) -> Self {
        Self {
            error: AuthErrorDetails {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }

    fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.with_status(StatusCode::UNAUTHORIZED)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AuthError::new(
                        "MISSING_TOKEN",
                        "Authorization header with Bearer token required",
                    )
                    .into_response()
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let actor = auth_service.authenticate(bearer.token()).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            let (code, message) = match e {
                JwtError::TokenExpired => ("TOKEN_EXPIRED", "Token has expired"),
                _ => ("INVALID_TOKEN", "Invalid token"),
            };
            AuthError::new(code, message).into_response()
        })?;

        Ok(AuthenticatedUser(actor))
    }
}

/// Extractor that additionally requires the admin role
pub struct AdminUser(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(actor) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !actor.is_admin() {
            return Err(AuthError::new("FORBIDDEN", "Admin access required")
                .with_status(StatusCode::FORBIDDEN));
        }

        Ok(AdminUser(actor))
    }
}
