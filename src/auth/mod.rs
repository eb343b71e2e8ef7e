//! Authentication for FixMate
//!
//! Bearer JWTs carry the caller's id and role; see `middleware::auth` for the
//! axum extractors built on top.

mod jwt;
mod service;

pub use jwt::{generate_token, verify_token, Claims, JwtError};
pub use service::AuthService;
