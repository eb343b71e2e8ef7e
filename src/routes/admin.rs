//! Admin route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/stats", get(platform_stats))
        .route("/api/admin/technicians", get(list_all_technicians))
        .route(
            "/api/admin/technicians/:id/verify",
            post(verify_technician),
        )
}
