use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::store::NegotiationStore;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    storage: String,
    version: String,
}

pub async fn root() -> &'static str {
    "FixMate API Server"
}

pub async fn health_check(State(store): State<Arc<dyn NegotiationStore>>) -> Json<HealthResponse> {
    let (status, storage) = match store.health_check().await {
        Ok(()) => ("healthy", "connected".to_string()),
        Err(e) => {
            tracing::error!(error = %e, "Storage health check failed");
            ("unhealthy", format!("error: {}", e))
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        storage,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
