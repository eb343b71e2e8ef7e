//! Technician directory route definitions

use axum::{routing::get, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn technician_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/technicians",
            get(list_technicians).post(register_technician),
        )
        .route("/api/technicians/:id", get(get_technician))
}
