//! Booking service layer - negotiation operations exposed to handlers
//!
//! Reads and authorization happen here; every write goes through the store as a
//! single `Mutation`, so a failed call never leaves partial state behind.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::model::{
    Booking, BookingCreated, BookingDetails, BookingStatus, CreateBookingRequest, Message,
    MessageSent, NegotiationOutcome, NewMessage, PlatformStats, ProposePriceRequest,
    RecordPaymentRequest, SendMessageRequest, Side,
};
use super::negotiation::{opening_quote_mutation, validate_price, Mutation};
use crate::error::{NegotiationError, NegotiationResult};
use crate::models::Actor;
use crate::pricing::{fee_rate_percent, format_rupees, ServiceCategory};
use crate::responder::AutoResponder;
use crate::store::{Applied, NegotiationStore};
use crate::technician::Technician;

/// Who may perform an operation on a booking, besides admins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Participants,
    CustomerOnly,
}

/// Check `actor` against the booking. Admins pass with no side.
fn authorize(actor: &Actor, booking: &Booking, access: Access) -> NegotiationResult<Option<Side>> {
    if actor.is_admin() {
        return Ok(None);
    }

    match (booking.side_of(actor.id), access) {
        (Some(Side::Customer), _) => Ok(Some(Side::Customer)),
        (Some(Side::Technician), Access::Participants) => Ok(Some(Side::Technician)),
        (Some(Side::Technician), Access::CustomerOnly) => Err(NegotiationError::Unauthorized(
            "only the customer can do this".to_string(),
        )),
        (None, _) => Err(NegotiationError::Unauthorized(format!(
            "not a participant of booking {}",
            booking.id
        ))),
    }
}

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn NegotiationStore>,
    responder: AutoResponder,
}

impl BookingService {
    pub fn new(store: Arc<dyn NegotiationStore>, responder: AutoResponder) -> Self {
        Self { store, responder }
    }

    async fn load(&self, booking_id: Uuid) -> NegotiationResult<Booking> {
        self.store
            .get_booking(booking_id)
            .await?
            .ok_or(NegotiationError::BookingNotFound(booking_id))
    }

    async fn technician_for(&self, booking: &Booking) -> NegotiationResult<Technician> {
        self.store
            .get_technician(booking.technician_id)
            .await?
            .ok_or(NegotiationError::TechnicianNotFound(booking.technician_id))
    }

    /// Open a booking with the technician's base charge as the first price and
    /// the greeting as the first message.
    pub async fn create_booking(
        &self,
        actor: &Actor,
        request: CreateBookingRequest,
    ) -> NegotiationResult<BookingCreated> {
        let technician = self
            .store
            .get_technician(request.technician_id)
            .await?
            .ok_or(NegotiationError::TechnicianNotFound(request.technician_id))?;

        if actor.id == technician.user_id {
            return Err(NegotiationError::SelfBookingForbidden);
        }

        // The price window follows the trade, so a booking cannot pick a looser one
        if let Some(requested) = request.service_type.as_deref() {
            let requested = ServiceCategory::from_name(requested);
            if requested != technician.service_type {
                return Err(NegotiationError::InvalidInput(format!(
                    "{} offers {}, not {}",
                    technician.name, technician.service_type, requested
                )));
            }
        }
        let service_type = technician.service_type.clone();
        validate_price(&service_type, technician.base_charge)?;

        let booking = Booking::open(actor.id, &technician, service_type, Utc::now());
        let greeting = NewMessage::text(
            booking.id,
            technician.user_id,
            self.responder.greeting().message(),
        );
        let messages = self.store.create_booking(&booking, vec![greeting]).await?;

        tracing::info!(
            booking_id = %booking.id,
            customer_id = %actor.id,
            technician_id = %technician.id,
            service = %booking.service_type,
            opening_price = technician.base_charge,
            "Booking opened"
        );

        Ok(BookingCreated { booking, messages })
    }

    pub async fn get_booking(
        &self,
        actor: &Actor,
        booking_id: Uuid,
    ) -> NegotiationResult<BookingDetails> {
        let booking = self.load(booking_id).await?;
        authorize(actor, &booking, Access::Participants)?;
        let technician = self.technician_for(&booking).await?;

        Ok(BookingDetails {
            allowed_range: booking.price_range(),
            fee_rate_percent: booking.negotiated_price.map(fee_rate_percent),
            platform_fee_display: booking.platform_fee.map(format_rupees),
            technician_name: technician.name,
            district: technician.district,
            booking,
        })
    }

    pub async fn list_messages(
        &self,
        actor: &Actor,
        booking_id: Uuid,
    ) -> NegotiationResult<Vec<Message>> {
        let booking = self.load(booking_id).await?;
        authorize(actor, &booking, Access::Participants)?;
        Ok(self.store.list_messages(booking_id).await?)
    }

    /// Append a chat message. The customer's first description of the job, while
    /// the price is still the seeded base charge, gets a scripted quote back.
    pub async fn send_message(
        &self,
        actor: &Actor,
        booking_id: Uuid,
        request: SendMessageRequest,
    ) -> NegotiationResult<MessageSent> {
        let booking = self.load(booking_id).await?;
        let side = authorize(actor, &booking, Access::Participants)?;

        let new_message = request
            .into_new_message(booking_id, actor.id)
            .map_err(NegotiationError::InvalidInput)?;
        let message = self.store.append_message(new_message).await?;

        let wants_quote = self.responder.is_enabled()
            && side == Some(Side::Customer)
            && booking.status == BookingStatus::Negotiating
            && booking.revision == 0;

        let description = match message.content.as_deref() {
            Some(text) if wants_quote => text,
            _ => {
                return Ok(MessageSent {
                    message,
                    replies: Vec::new(),
                    booking,
                })
            }
        };

        let technician = self.technician_for(&booking).await?;
        // Estimator runs outside any lock; the quote is dropped if the price moved meanwhile
        let reply = self
            .responder
            .first_quote(&booking.service_type, description, &technician.district)
            .await;

        let (booking, replies) = match opening_quote_mutation(&reply) {
            Some(mutation) => {
                let applied = self.store.apply_mutation(booking_id, &mutation).await?;
                (applied.booking, applied.messages)
            }
            None => (booking, Vec::new()),
        };

        if !replies.is_empty() {
            tracing::info!(
                booking_id = %booking_id,
                price = ?booking.negotiated_price,
                "Opening quote sent"
            );
        }

        Ok(MessageSent {
            message,
            replies,
            booking,
        })
    }

    /// Put a price on the table.
    ///
    /// For the customer, an unconfirmed proposal equal to the stored price
    /// accepts it, and one below it is a counter-offer the scripted technician
    /// answers in the same step. The comparison happens under the store's lock.
    pub async fn propose_price(
        &self,
        actor: &Actor,
        booking_id: Uuid,
        request: ProposePriceRequest,
    ) -> NegotiationResult<NegotiationOutcome> {
        let booking = self.load(booking_id).await?;
        let side = authorize(actor, &booking, Access::Participants)?;

        let mutation = match side {
            Some(Side::Customer) => {
                let technician = self.technician_for(&booking).await?;
                Mutation::CustomerProposal {
                    price: request.price,
                    confirm: request.confirm,
                    district: technician.district,
                    auto_reply: self.responder.is_enabled(),
                }
            }
            _ => Mutation::Propose {
                price: request.price,
                confirm: request.confirm,
            },
        };

        let Applied { booking, messages } = self.store.apply_mutation(booking_id, &mutation).await?;

        tracing::info!(
            booking_id = %booking_id,
            actor_id = %actor.id,
            proposed = request.price,
            price = ?booking.negotiated_price,
            status = ?booking.status,
            "Price proposed"
        );

        Ok(NegotiationOutcome { booking, messages })
    }

    /// Confirm the booking at its stored price. Repeating it changes nothing.
    pub async fn accept_current_price(
        &self,
        actor: &Actor,
        booking_id: Uuid,
    ) -> NegotiationResult<NegotiationOutcome> {
        let booking = self.load(booking_id).await?;
        authorize(actor, &booking, Access::CustomerOnly)?;

        let Applied { booking, messages } = self
            .store
            .apply_mutation(booking_id, &Mutation::AcceptCurrent)
            .await?;

        tracing::info!(
            booking_id = %booking_id,
            price = ?booking.negotiated_price,
            platform_fee = ?booking.platform_fee,
            "Booking confirmed"
        );

        Ok(NegotiationOutcome { booking, messages })
    }

    pub async fn record_payment(
        &self,
        actor: &Actor,
        booking_id: Uuid,
        request: RecordPaymentRequest,
    ) -> NegotiationResult<Booking> {
        let booking = self.load(booking_id).await?;
        authorize(actor, &booking, Access::CustomerOnly)?;

        let mutation = Mutation::RecordPayment {
            method: request.method,
            paid: request.paid,
        };
        let applied = self.store.apply_mutation(booking_id, &mutation).await?;

        tracing::info!(
            booking_id = %booking_id,
            method = ?request.method,
            paid = request.paid,
            "Payment recorded"
        );

        Ok(applied.booking)
    }

    pub async fn platform_stats(&self, actor: &Actor) -> NegotiationResult<PlatformStats> {
        actor.require_admin()?;
        Ok(self.store.platform_stats().await?)
    }
}
