use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::technician::{RegisterTechnicianRequest, Technician, TechnicianFilter, TechnicianService};

/// Public directory, verified technicians only
pub async fn list_technicians(
    State(service): State<Arc<TechnicianService>>,
    Query(filter): Query<TechnicianFilter>,
) -> Result<Json<ApiResponse<Vec<Technician>>>, ApiError> {
    let technicians = service.list_verified(filter).await?;
    Ok(Json(ApiResponse::ok(technicians)))
}

pub async fn get_technician(
    State(service): State<Arc<TechnicianService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Technician>>, ApiError> {
    let technician = service.get(id).await?;
    Ok(Json(ApiResponse::ok(technician)))
}

pub async fn register_technician(
    State(service): State<Arc<TechnicianService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(request): Json<RegisterTechnicianRequest>,
) -> Result<Json<ApiResponse<Technician>>, ApiError> {
    request.validate()?;
    let technician = service.register(&actor, request).await?;
    Ok(Json(ApiResponse::ok(technician)))
}
