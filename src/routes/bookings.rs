//! Booking and negotiation route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(create_booking))
        .route("/api/bookings/:id", get(get_booking))
        .route(
            "/api/bookings/:id/messages",
            get(list_messages).post(send_message),
        )
        .route("/api/bookings/:id/negotiate", post(propose_price))
        .route("/api/bookings/:id/accept", post(accept_price))
        .route("/api/bookings/:id/payment", post(record_payment))
}
