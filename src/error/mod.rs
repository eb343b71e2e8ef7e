//! Error types for FixMate
//!
//! `NegotiationError` is what the booking core returns; `ApiError` maps it (and
//! everything else a handler can hit) onto HTTP status codes and JSON bodies.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::pricing::{PriceRange, ServiceCategory};
use crate::store::StoreError;

/// Failures of the negotiation core. A failed operation leaves stored state untouched.
#[derive(Error, Debug)]
pub enum NegotiationError {
    #[error("Price ₹{price} is outside the allowed range ₹{} - ₹{} for {category}", .range.min, .range.max)]
    PriceOutOfRange {
        category: ServiceCategory,
        price: i64,
        range: PriceRange,
    },

    #[error("Booking {0} not found")]
    BookingNotFound(Uuid),

    #[error("Technician {0} not found")]
    TechnicianNotFound(Uuid),

    #[error("Customers cannot book themselves")]
    SelfBookingForbidden,

    #[error("Not permitted: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type NegotiationResult<T> = Result<T, NegotiationError>;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{message}")]
    PriceOutOfRange { message: String, min: i64, max: i64 },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::PriceOutOfRange { .. } => "PRICE_OUT_OF_RANGE",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PriceOutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::PriceOutOfRange { min, max, .. } => {
                Some(serde_json::json!({ "min": min, "max": max }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, code = %error_code, "Server error occurred");
        } else {
            tracing::debug!(error = %message, code = %error_code, "Client error occurred");
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                details: self.details(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<NegotiationError> for ApiError {
    fn from(err: NegotiationError) -> Self {
        match err {
            NegotiationError::PriceOutOfRange { range, .. } => ApiError::PriceOutOfRange {
                message: err.to_string(),
                min: range.min,
                max: range.max,
            },
            NegotiationError::BookingNotFound(_) | NegotiationError::TechnicianNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            NegotiationError::SelfBookingForbidden => ApiError::Conflict(err.to_string()),
            NegotiationError::Unauthorized(reason) => ApiError::Forbidden(reason),
            NegotiationError::InvalidInput(reason) => ApiError::ValidationError(reason),
            NegotiationError::Storage(store_err) => ApiError::DatabaseError(store_err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_out_of_range_reports_bounds() {
        let err = NegotiationError::PriceOutOfRange {
            category: ServiceCategory::Maid,
            price: 280,
            range: PriceRange { min: 500, max: 800 },
        };
        assert_eq!(
            err.to_string(),
            "Price ₹280 is outside the allowed range ₹500 - ₹800 for Maid"
        );

        let api: ApiError = err.into();
        assert_eq!(api.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.error_code(), "PRICE_OUT_OF_RANGE");
        assert_eq!(
            api.details(),
            Some(serde_json::json!({ "min": 500, "max": 800 }))
        );
    }

    #[test]
    fn test_domain_error_status_codes() {
        let id = Uuid::new_v4();
        let cases: Vec<(NegotiationError, StatusCode)> = vec![
            (NegotiationError::BookingNotFound(id), StatusCode::NOT_FOUND),
            (NegotiationError::TechnicianNotFound(id), StatusCode::NOT_FOUND),
            (NegotiationError::SelfBookingForbidden, StatusCode::CONFLICT),
            (
                NegotiationError::Unauthorized("not a participant".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                NegotiationError::InvalidInput("empty".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }
}
