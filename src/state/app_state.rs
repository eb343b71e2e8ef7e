//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthService;
use crate::booking::BookingService;
use crate::store::NegotiationStore;
use crate::technician::TechnicianService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub booking_service: Arc<BookingService>,
    pub technician_service: Arc<TechnicianService>,
    pub auth_service: Arc<AuthService>,
    pub store: Arc<dyn NegotiationStore>,
}

impl AppState {
    pub fn new(
        booking_service: Arc<BookingService>,
        technician_service: Arc<TechnicianService>,
        auth_service: Arc<AuthService>,
        store: Arc<dyn NegotiationStore>,
    ) -> Self {
        Self {
            booking_service,
            technician_service,
            auth_service,
            store,
        }
    }
}

impl FromRef<AppState> for Arc<BookingService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.booking_service.clone()
    }
}

impl FromRef<AppState> for Arc<TechnicianService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.technician_service.clone()
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn NegotiationStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}
