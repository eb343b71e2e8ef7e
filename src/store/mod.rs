//! Persistence for technicians, bookings and their message ledgers
//!
//! `NegotiationStore` is the seam between the booking core and storage. Every
//! booking mutation goes through [`NegotiationStore::apply_mutation`], which runs
//! the pure state machine and writes its result as one atomic step. Two backends
//! implement it: PostgreSQL for deployments and an in-memory map for tests and
//! local runs.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::booking::{Booking, Message, Mutation, NewMessage, PlatformStats};
use crate::error::NegotiationResult;
use crate::technician::{Technician, TechnicianFilter};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Stored record is invalid: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Booking after an atomic mutation and the ledger entries it appended
#[derive(Debug, Clone)]
pub struct Applied {
    pub booking: Booking,
    pub messages: Vec<Message>,
}

#[async_trait]
pub trait NegotiationStore: Send + Sync {
    async fn health_check(&self) -> StoreResult<()>;

    async fn insert_technician(&self, technician: &Technician) -> StoreResult<()>;

    async fn get_technician(&self, id: Uuid) -> StoreResult<Option<Technician>>;

    async fn list_technicians(&self, filter: &TechnicianFilter) -> StoreResult<Vec<Technician>>;

    /// Count of all technicians, verified or not, listed in `district`.
    async fn count_technicians_in_district(&self, district: &str) -> StoreResult<i64>;

    async fn set_technician_verified(
        &self,
        id: Uuid,
        verified: bool,
    ) -> StoreResult<Option<Technician>>;

    /// Persist a new booking together with its opening messages.
    async fn create_booking(
        &self,
        booking: &Booking,
        opening: Vec<NewMessage>,
    ) -> StoreResult<Vec<Message>>;

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    /// Lock the booking, run the state machine on it and persist the outcome.
    /// On error nothing is written.
    async fn apply_mutation(
        &self,
        booking_id: Uuid,
        mutation: &Mutation,
    ) -> NegotiationResult<Applied>;

    async fn append_message(&self, message: NewMessage) -> StoreResult<Message>;

    /// Messages in ledger order (ascending `created_at`).
    async fn list_messages(&self, booking_id: Uuid) -> StoreResult<Vec<Message>>;

    async fn platform_stats(&self) -> StoreResult<PlatformStats>;
}

/// Ledger timestamp for the next message after `last`.
///
/// Stored timestamps have microsecond precision, so `now` is truncated first; if
/// that does not land after `last` the result is `last` plus one microsecond.
pub(crate) fn next_timestamp(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    let candidate = now.trunc_subsecs(6);
    match last {
        Some(last) if candidate <= last => last + Duration::microseconds(1),
        _ => candidate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_next_timestamp_uses_clock_when_it_advanced() {
        let last = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let now = last + Duration::milliseconds(5);
        assert_eq!(next_timestamp(Some(last), now), now);
        assert_eq!(next_timestamp(None, now), now);
    }

    #[test]
    fn test_next_timestamp_bumps_when_clock_stalls() {
        let last = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(
            next_timestamp(Some(last), last),
            last + Duration::microseconds(1)
        );
        assert_eq!(
            next_timestamp(Some(last), last - Duration::seconds(3)),
            last + Duration::microseconds(1)
        );
    }

    #[test]
    fn test_next_timestamp_truncates_to_microseconds() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
            + Duration::nanoseconds(1_234_567);
        let next = next_timestamp(None, now);
        assert_eq!(next.timestamp_subsec_nanos(), 1_234_000);
    }
}
