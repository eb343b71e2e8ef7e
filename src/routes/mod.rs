//! Route definitions for the FixMate API

mod admin;
mod bookings;
mod technicians;

pub use admin::admin_routes;
pub use bookings::booking_routes;
pub use technicians::technician_routes;

use axum::{routing::get, Router};

use crate::handlers::{health_check, root};
use crate::middleware;
use crate::state::AppState;

/// Full application router with tracing and security headers. CORS is left to the caller.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(technician_routes())
        .merge(booking_routes())
        .merge(admin_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
}
