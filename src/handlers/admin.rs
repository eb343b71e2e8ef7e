//! Admin dashboard handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::booking::{BookingService, PlatformStats};
use crate::error::ApiError;
use crate::middleware::AdminUser;
use crate::models::ApiResponse;
use crate::technician::{Technician, TechnicianService};

pub async fn platform_stats(
    State(service): State<Arc<BookingService>>,
    AdminUser(actor): AdminUser,
) -> Result<Json<ApiResponse<PlatformStats>>, ApiError> {
    let stats = service.platform_stats(&actor).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

pub async fn list_all_technicians(
    State(service): State<Arc<TechnicianService>>,
    AdminUser(actor): AdminUser,
) -> Result<Json<ApiResponse<Vec<Technician>>>, ApiError> {
    let technicians = service.list_all(&actor).await?;
    Ok(Json(ApiResponse::ok(technicians)))
}

pub async fn verify_technician(
    State(service): State<Arc<TechnicianService>>,
    AdminUser(actor): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Technician>>, ApiError> {
    let technician = service.verify(&actor, id).await?;
    Ok(Json(ApiResponse::ok(technician)))
}
