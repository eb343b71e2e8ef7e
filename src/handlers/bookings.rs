use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::booking::{
    Booking, BookingCreated, BookingDetails, BookingService, CreateBookingRequest, Message,
    MessageSent, NegotiationOutcome, ProposePriceRequest, RecordPaymentRequest,
    SendMessageRequest,
};
use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::ApiResponse;

pub async fn create_booking(
    State(service): State<Arc<BookingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<ApiResponse<BookingCreated>>, ApiError> {
    let created = service.create_booking(&actor, request).await?;
    Ok(Json(ApiResponse::ok(created)))
}

pub async fn get_booking(
    State(service): State<Arc<BookingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingDetails>>, ApiError> {
    let details = service.get_booking(&actor, id).await?;
    Ok(Json(ApiResponse::ok(details)))
}

pub async fn list_messages(
    State(service): State<Arc<BookingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    let messages = service.list_messages(&actor, id).await?;
    Ok(Json(ApiResponse::ok(messages)))
}

pub async fn send_message(
    State(service): State<Arc<BookingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<MessageSent>>, ApiError> {
    request.validate()?;
    let sent = service.send_message(&actor, id, request).await?;
    Ok(Json(ApiResponse::ok(sent)))
}

pub async fn propose_price(
    State(service): State<Arc<BookingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ProposePriceRequest>,
) -> Result<Json<ApiResponse<NegotiationOutcome>>, ApiError> {
    request.validate()?;
    let outcome = service.propose_price(&actor, id, request).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

pub async fn accept_price(
    State(service): State<Arc<BookingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<NegotiationOutcome>>, ApiError> {
    let outcome = service.accept_current_price(&actor, id).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

pub async fn record_payment(
    State(service): State<Arc<BookingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<ApiResponse<Booking>>, ApiError> {
    let booking = service.record_payment(&actor, id, request).await?;
    Ok(Json(ApiResponse::ok(booking)))
}
