//! In-memory store
//!
//! A single `RwLock` guards all maps, so each write-lock section is the
//! equivalent of one database transaction.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{next_timestamp, Applied, NegotiationStore, StoreError, StoreResult};
use crate::booking::{negotiation, Booking, BookingStatus, Message, Mutation, NewMessage, PlatformStats};
use crate::error::{NegotiationError, NegotiationResult};
use crate::technician::{Technician, TechnicianFilter};

#[derive(Default)]
struct Tables {
    technicians: HashMap<Uuid, Technician>,
    bookings: HashMap<Uuid, Booking>,
    messages: HashMap<Uuid, Vec<Message>>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn push_message(ledger: &mut Vec<Message>, message: NewMessage) -> Message {
    let created_at = next_timestamp(ledger.last().map(|m| m.created_at), Utc::now());
    let message = message.into_message(Uuid::new_v4(), created_at);
    ledger.push(message.clone());
    message
}

#[async_trait]
impl NegotiationStore for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_technician(&self, technician: &Technician) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.technicians.insert(technician.id, technician.clone());
        Ok(())
    }

    async fn get_technician(&self, id: Uuid) -> StoreResult<Option<Technician>> {
        let tables = self.tables.read().await;
        Ok(tables.technicians.get(&id).cloned())
    }

    async fn list_technicians(&self, filter: &TechnicianFilter) -> StoreResult<Vec<Technician>> {
        let tables = self.tables.read().await;
        let mut technicians: Vec<Technician> = tables
            .technicians
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        technicians.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(technicians)
    }

    async fn count_technicians_in_district(&self, district: &str) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .technicians
            .values()
            .filter(|t| t.district.eq_ignore_ascii_case(district))
            .count();
        Ok(count as i64)
    }

    async fn set_technician_verified(
        &self,
        id: Uuid,
        verified: bool,
    ) -> StoreResult<Option<Technician>> {
        let mut tables = self.tables.write().await;
        Ok(tables.technicians.get_mut(&id).map(|technician| {
            technician.is_verified = verified;
            technician.clone()
        }))
    }

    async fn create_booking(
        &self,
        booking: &Booking,
        opening: Vec<NewMessage>,
    ) -> StoreResult<Vec<Message>> {
        let mut tables = self.tables.write().await;
        tables.bookings.insert(booking.id, booking.clone());
        let ledger = tables.messages.entry(booking.id).or_default();
        Ok(opening
            .into_iter()
            .map(|message| push_message(ledger, message))
            .collect())
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables.bookings.get(&id).cloned())
    }

    async fn apply_mutation(
        &self,
        booking_id: Uuid,
        mutation: &Mutation,
    ) -> NegotiationResult<Applied> {
        let mut tables = self.tables.write().await;

        let current = tables
            .bookings
            .get(&booking_id)
            .ok_or(NegotiationError::BookingNotFound(booking_id))?;
        let transition = negotiation::apply(current, mutation, Utc::now())?;

        tables
            .bookings
            .insert(booking_id, transition.booking.clone());
        let ledger = tables.messages.entry(booking_id).or_default();
        let messages = transition
            .messages
            .into_iter()
            .map(|message| push_message(ledger, message))
            .collect();

        Ok(Applied {
            booking: transition.booking,
            messages,
        })
    }

    async fn append_message(&self, message: NewMessage) -> StoreResult<Message> {
        let mut tables = self.tables.write().await;
        if !tables.bookings.contains_key(&message.booking_id) {
            return Err(StoreError::NotFound(format!("Booking {}", message.booking_id)));
        }
        let ledger = tables.messages.entry(message.booking_id).or_default();
        Ok(push_message(ledger, message))
    }

    async fn list_messages(&self, booking_id: Uuid) -> StoreResult<Vec<Message>> {
        let tables = self.tables.read().await;
        Ok(tables.messages.get(&booking_id).cloned().unwrap_or_default())
    }

    async fn platform_stats(&self) -> StoreResult<PlatformStats> {
        let tables = self.tables.read().await;

        let confirmed: Vec<&Booking> = tables
            .bookings
            .values()
            .filter(|b| b.status == BookingStatus::Confirmed)
            .collect();
        let customers: HashSet<Uuid> = tables.bookings.values().map(|b| b.customer_id).collect();

        Ok(PlatformStats {
            booking_count: tables.bookings.len() as i64,
            confirmed_booking_count: confirmed.len() as i64,
            customer_count: customers.len() as i64,
            technician_count: tables.technicians.len() as i64,
            pending_technicians: tables
                .technicians
                .values()
                .filter(|t| !t.is_verified)
                .count() as i64,
            revenue: confirmed.iter().filter_map(|b| b.platform_fee).sum(),
        })
    }
}
