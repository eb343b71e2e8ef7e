//! Booking and message models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::pricing::{platform_fee, price_range, PriceRange, ServiceCategory};
use crate::technician::Technician;

/// Booking lifecycle. Only `Negotiating` and `Confirmed` are reached by the
/// negotiation flow; the rest exist for parity with stored data.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Negotiating,
    Confirmed,
    Completed,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Online,
    Cod,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// One customer–technician engagement
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub technician_id: Uuid,
    pub technician_user_id: Uuid,
    pub service_type: ServiceCategory,
    pub status: BookingStatus,
    /// Whole rupees; always inside `price_range(service_type)` when set
    pub negotiated_price: Option<i64>,
    /// Always `platform_fee(negotiated_price)` when set
    pub platform_fee: Option<f64>,
    pub insurance_applied: bool,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    /// Price-setting transitions applied since creation; 0 means the price is
    /// still the technician's seeded base charge.
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which side of a booking an identity is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Customer,
    Technician,
}

impl Booking {
    /// Open a booking in `Negotiating` with the technician's base charge as the
    /// implicit opening quote.
    pub fn open(
        customer_id: Uuid,
        technician: &Technician,
        service_type: ServiceCategory,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            technician_id: technician.id,
            technician_user_id: technician.user_id,
            service_type,
            status: BookingStatus::Negotiating,
            negotiated_price: Some(technician.base_charge),
            platform_fee: Some(platform_fee(technician.base_charge)),
            insurance_applied: true,
            payment_method: None,
            payment_status: PaymentStatus::Pending,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn price_range(&self) -> PriceRange {
        price_range(&self.service_type)
    }

    pub fn side_of(&self, user_id: Uuid) -> Option<Side> {
        if user_id == self.customer_id {
            Some(Side::Customer)
        } else if user_id == self.technician_user_id {
            Some(Side::Technician)
        } else {
            None
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "attachment_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Document,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Attachment {
    pub url: String,
    pub kind: AttachmentKind,
}

/// One immutable utterance in a booking transcript
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub sender_id: Uuid,
    pub content: Option<String>,
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
}

/// Message waiting to be appended; the ledger assigns id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub booking_id: Uuid,
    pub sender_id: Uuid,
    pub content: Option<String>,
    pub attachment: Option<Attachment>,
}

impl NewMessage {
    pub fn text(booking_id: Uuid, sender_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            booking_id,
            sender_id,
            content: Some(content.into()),
            attachment: None,
        }
    }

    pub fn into_message(self, id: Uuid, created_at: DateTime<Utc>) -> Message {
        Message {
            id,
            booking_id: self.booking_id,
            sender_id: self.sender_id,
            content: self.content,
            attachment: self.attachment,
            created_at,
        }
    }
}

/// Request DTO for opening a booking
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub technician_id: Uuid,
    /// Must match the technician's trade when given
    pub service_type: Option<String>,
}

/// Request DTO for posting to a booking's chat
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(max = 4000))]
    pub content: Option<String>,
    #[validate(url)]
    pub attachment_url: Option<String>,
    pub attachment_type: Option<AttachmentKind>,
}

impl SendMessageRequest {
    /// Turn the request into a ledger entry, rejecting empty or half-specified messages.
    pub fn into_new_message(
        self,
        booking_id: Uuid,
        sender_id: Uuid,
    ) -> Result<NewMessage, String> {
        let content = self
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let attachment = match (self.attachment_url, self.attachment_type) {
            (Some(url), Some(kind)) => Some(Attachment { url, kind }),
            (Some(url), None) => Some(Attachment {
                url,
                kind: AttachmentKind::Document,
            }),
            (None, Some(_)) => return Err("attachment_type given without attachment_url".to_string()),
            (None, None) => None,
        };

        if content.is_none() && attachment.is_none() {
            return Err("Message needs content or an attachment".to_string());
        }

        Ok(NewMessage {
            booking_id,
            sender_id,
            content,
            attachment,
        })
    }
}

/// Request DTO for a price proposal from either side
#[derive(Debug, Deserialize, Validate)]
pub struct ProposePriceRequest {
    #[validate(range(min = 0))]
    pub price: i64,
    #[serde(default)]
    pub confirm: bool,
}

/// Request DTO for recording a payment
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub method: PaymentMethod,
    pub paid: bool,
}

/// Booking with the context the chat screen shows next to it
#[derive(Debug, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub technician_name: String,
    pub district: String,
    pub allowed_range: PriceRange,
    pub fee_rate_percent: Option<f64>,
    /// Fee as shown at checkout, e.g. "₹110.00"
    pub platform_fee_display: Option<String>,
}

/// Result of opening a booking
#[derive(Debug, Serialize)]
pub struct BookingCreated {
    pub booking: Booking,
    pub messages: Vec<Message>,
}

/// Booking state after a negotiation step, with any messages it appended
#[derive(Debug, Serialize)]
pub struct NegotiationOutcome {
    pub booking: Booking,
    pub messages: Vec<Message>,
}

/// Result of posting a chat message
#[derive(Debug, Serialize)]
pub struct MessageSent {
    pub message: Message,
    pub replies: Vec<Message>,
    pub booking: Booking,
}

/// Admin dashboard counters
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlatformStats {
    pub booking_count: i64,
    pub confirmed_booking_count: i64,
    pub customer_count: i64,
    pub technician_count: i64,
    pub pending_technicians: i64,
    /// Sum of platform fees over confirmed bookings
    pub revenue: f64,
}
