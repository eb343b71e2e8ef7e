//! Middleware for the FixMate API
//!
//! Request tracing, security headers, and authentication extractors.

pub mod auth;
mod security;
mod tracing;

pub use auth::{AdminUser, AuthenticatedUser};
pub use security::security_headers;
pub use tracing::{request_tracing, REQUEST_ID_HEADER};
