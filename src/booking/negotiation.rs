//! Negotiation state machine
//!
//! Every booking mutation is described as a [`Mutation`] and turned into a
//! [`Transition`] by [`apply`], a pure function of the current booking. Stores run
//! `apply` inside their own transaction, so validation, fee computation and the
//! write are one atomic step.

use chrono::{DateTime, Utc};

use super::model::{Booking, BookingStatus, NewMessage, PaymentMethod, PaymentStatus};
use crate::error::{NegotiationError, NegotiationResult};
use crate::pricing::{platform_fee, price_range, ServiceCategory};
use crate::responder::{counter_reply, Reply};

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Either side puts `price` on the table; `confirm` finalizes it.
    Propose { price: i64, confirm: bool },
    /// Customer accepts the stored price as is.
    AcceptCurrent,
    /// Customer offers less than the current proposal. With `auto_reply`, the
    /// scripted technician answers in the same step.
    CounterOffer {
        price: i64,
        district: String,
        auto_reply: bool,
    },
    /// Customer proposal, classified against the price stored at the time it is
    /// applied: equal and unconfirmed accepts it, lower and unconfirmed is a
    /// counter-offer, anything else is a plain proposal.
    CustomerProposal {
        price: i64,
        confirm: bool,
        district: String,
        auto_reply: bool,
    },
    /// Scripted first quote. Dropped if the price already moved.
    OpeningQuote { price: i64, content: String },
    RecordPayment { method: PaymentMethod, paid: bool },
}

/// Booking after a mutation plus the messages to append with it
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub booking: Booking,
    pub messages: Vec<NewMessage>,
}

impl Transition {
    fn unchanged(booking: &Booking) -> Self {
        Self {
            booking: booking.clone(),
            messages: Vec::new(),
        }
    }
}

/// Check a proposal against the category window. Bounds are inclusive.
pub fn validate_price(category: &ServiceCategory, price: i64) -> NegotiationResult<()> {
    if price < 0 {
        return Err(NegotiationError::InvalidInput(
            "Price cannot be negative".to_string(),
        ));
    }

    let range = price_range(category);
    if !range.contains(price) {
        return Err(NegotiationError::PriceOutOfRange {
            category: category.clone(),
            price,
            range,
        });
    }

    Ok(())
}

/// Price and fee are only ever written together.
fn set_price(booking: &mut Booking, price: i64) {
    booking.negotiated_price = Some(price);
    booking.platform_fee = Some(platform_fee(price));
}

pub fn apply(
    current: &Booking,
    mutation: &Mutation,
    now: DateTime<Utc>,
) -> NegotiationResult<Transition> {
    let mut booking = current.clone();
    let mut messages = Vec::new();

    match mutation {
        Mutation::Propose { price, confirm } => {
            validate_price(&booking.service_type, *price)?;
            set_price(&mut booking, *price);
            booking.status = if *confirm {
                BookingStatus::Confirmed
            } else {
                BookingStatus::Negotiating
            };
            booking.revision += 1;
        }

        Mutation::AcceptCurrent => {
            let price = booking.negotiated_price.ok_or_else(|| {
                NegotiationError::InvalidInput("There is no price to accept yet".to_string())
            })?;
            validate_price(&booking.service_type, price)?;
            set_price(&mut booking, price);
            booking.status = BookingStatus::Confirmed;
        }

        Mutation::CounterOffer {
            price,
            district,
            auto_reply,
        } => {
            validate_price(&booking.service_type, *price)?;

            messages.push(NewMessage::text(
                booking.id,
                booking.customer_id,
                format!("Can you do it for ₹{}?", price),
            ));

            let agreed = match booking.negotiated_price {
                Some(current_price) if *auto_reply && *price < current_price => {
                    let reply = counter_reply(current_price, *price, district);
                    messages.push(NewMessage::text(
                        booking.id,
                        booking.technician_user_id,
                        reply.message(),
                    ));
                    reply.price().unwrap_or(*price)
                }
                _ => *price,
            };

            set_price(&mut booking, agreed);
            booking.status = BookingStatus::Negotiating;
            booking.revision += 1;
        }

        Mutation::CustomerProposal {
            price,
            confirm,
            district,
            auto_reply,
        } => {
            let resolved = match current.negotiated_price {
                Some(stored) if !*confirm && *price == stored => Mutation::Propose {
                    price: *price,
                    confirm: true,
                },
                Some(stored) if !*confirm && *price < stored => Mutation::CounterOffer {
                    price: *price,
                    district: district.clone(),
                    auto_reply: *auto_reply,
                },
                _ => Mutation::Propose {
                    price: *price,
                    confirm: *confirm,
                },
            };
            return apply(current, &resolved, now);
        }

        Mutation::OpeningQuote { price, content } => {
            if booking.revision != 0 {
                return Ok(Transition::unchanged(current));
            }
            validate_price(&booking.service_type, *price)?;
            set_price(&mut booking, *price);
            booking.status = BookingStatus::Negotiating;
            booking.revision += 1;
            messages.push(NewMessage::text(
                booking.id,
                booking.technician_user_id,
                content.clone(),
            ));
        }

        Mutation::RecordPayment { method, paid } => {
            booking.payment_method = Some(*method);
            booking.payment_status = if *paid {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Pending
            };
        }
    }

    booking.updated_at = now;
    Ok(Transition { booking, messages })
}

/// Opening-quote mutation for a scripted reply.
pub fn opening_quote_mutation(reply: &Reply) -> Option<Mutation> {
    reply.price().map(|price| Mutation::OpeningQuote {
        price,
        content: reply.message(),
    })
}
