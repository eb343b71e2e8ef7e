//! PostgreSQL store
//!
//! Booking mutations lock the booking row with `SELECT ... FOR UPDATE`, run the
//! state machine and write the booking and its new messages in one transaction.
//! Message appends take the same lock so ledger timestamps stay ordered.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use super::{next_timestamp, Applied, NegotiationStore, StoreError, StoreResult};
use crate::booking::{
    negotiation, Attachment, AttachmentKind, Booking, BookingStatus, Message, Mutation,
    NewMessage, PaymentMethod, PaymentStatus, PlatformStats,
};
use crate::error::{NegotiationError, NegotiationResult};
use crate::pricing::ServiceCategory;
use crate::technician::{Technician, TechnicianFilter};

#[derive(FromRow)]
struct TechnicianRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    service_type: String,
    district: String,
    base_charge: i64,
    experience_years: i32,
    is_verified: bool,
    rating: f64,
    bio: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<TechnicianRow> for Technician {
    fn from(row: TechnicianRow) -> Self {
        Technician {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            service_type: ServiceCategory::from(row.service_type),
            district: row.district,
            base_charge: row.base_charge,
            experience_years: row.experience_years,
            is_verified: row.is_verified,
            rating: row.rating,
            bio: row.bio,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct BookingRow {
    id: Uuid,
    customer_id: Uuid,
    technician_id: Uuid,
    technician_user_id: Uuid,
    service_type: String,
    status: BookingStatus,
    negotiated_price: Option<i64>,
    platform_fee: Option<f64>,
    insurance_applied: bool,
    payment_method: Option<PaymentMethod>,
    payment_status: PaymentStatus,
    revision: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            customer_id: row.customer_id,
            technician_id: row.technician_id,
            technician_user_id: row.technician_user_id,
            service_type: ServiceCategory::from(row.service_type),
            status: row.status,
            negotiated_price: row.negotiated_price,
            platform_fee: row.platform_fee,
            insurance_applied: row.insurance_applied,
            payment_method: row.payment_method,
            payment_status: row.payment_status,
            revision: row.revision,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: Uuid,
    booking_id: Uuid,
    sender_id: Uuid,
    content: Option<String>,
    attachment_url: Option<String>,
    attachment_type: Option<AttachmentKind>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let attachment = match (row.attachment_url, row.attachment_type) {
            (Some(url), Some(kind)) => Some(Attachment { url, kind }),
            (None, None) => None,
            _ => {
                return Err(StoreError::Corrupt(format!(
                    "message {} has a partial attachment",
                    row.id
                )))
            }
        };

        Ok(Message {
            id: row.id,
            booking_id: row.booking_id,
            sender_id: row.sender_id,
            content: row.content,
            attachment,
            created_at: row.created_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, customer_id, technician_id, technician_user_id, service_type, \
     status, negotiated_price, platform_fee, insurance_applied, payment_method, payment_status, \
     revision, created_at, updated_at";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn last_message_at(
    conn: &mut PgConnection,
    booking_id: Uuid,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT MAX(created_at) FROM messages WHERE booking_id = $1",
    )
    .bind(booking_id)
    .fetch_one(conn)
    .await
}

/// Insert messages in order, each strictly after the previous ledger entry.
async fn insert_messages(
    conn: &mut PgConnection,
    booking_id: Uuid,
    messages: Vec<NewMessage>,
) -> StoreResult<Vec<Message>> {
    let mut last = last_message_at(&mut *conn, booking_id).await?;
    let mut inserted = Vec::with_capacity(messages.len());

    for message in messages {
        let created_at = next_timestamp(last, Utc::now());
        let (attachment_url, attachment_type) = match &message.attachment {
            Some(attachment) => (Some(attachment.url.clone()), Some(attachment.kind)),
            None => (None, None),
        };

        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, booking_id, sender_id, content, attachment_url, attachment_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.booking_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(attachment_url)
        .bind(attachment_type)
        .bind(created_at)
        .fetch_one(&mut *conn)
        .await?;

        last = Some(created_at);
        inserted.push(Message::try_from(row)?);
    }

    Ok(inserted)
}

#[async_trait]
impl NegotiationStore for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_technician(&self, technician: &Technician) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO technicians (
                id, user_id, name, service_type, district, base_charge,
                experience_years, is_verified, rating, bio, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(technician.id)
        .bind(technician.user_id)
        .bind(&technician.name)
        .bind(technician.service_type.as_str())
        .bind(&technician.district)
        .bind(technician.base_charge)
        .bind(technician.experience_years)
        .bind(technician.is_verified)
        .bind(technician.rating)
        .bind(&technician.bio)
        .bind(technician.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_technician(&self, id: Uuid) -> StoreResult<Option<Technician>> {
        let row = sqlx::query_as::<_, TechnicianRow>("SELECT * FROM technicians WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Technician::from))
    }

    async fn list_technicians(&self, filter: &TechnicianFilter) -> StoreResult<Vec<Technician>> {
        // Service names are matched leniently in `TechnicianFilter::matches`
        let rows = sqlx::query_as::<_, TechnicianRow>(
            r#"
            SELECT * FROM technicians
            WHERE ($1 OR is_verified)
              AND ($2::TEXT IS NULL OR LOWER(district) = LOWER(TRIM($2)))
            ORDER BY rating DESC, name ASC
            "#,
        )
        .bind(filter.include_unverified)
        .bind(&filter.district)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(Technician::from)
            .filter(|t| filter.matches(t))
            .collect())
    }

    async fn count_technicians_in_district(&self, district: &str) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM technicians WHERE LOWER(district) = LOWER($1)",
        )
        .bind(district)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn set_technician_verified(
        &self,
        id: Uuid,
        verified: bool,
    ) -> StoreResult<Option<Technician>> {
        let row = sqlx::query_as::<_, TechnicianRow>(
            "UPDATE technicians SET is_verified = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(verified)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Technician::from))
    }

    async fn create_booking(
        &self,
        booking: &Booking,
        opening: Vec<NewMessage>,
    ) -> StoreResult<Vec<Message>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO bookings ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
            BOOKING_COLUMNS
        ))
        .bind(booking.id)
        .bind(booking.customer_id)
        .bind(booking.technician_id)
        .bind(booking.technician_user_id)
        .bind(booking.service_type.as_str())
        .bind(booking.status)
        .bind(booking.negotiated_price)
        .bind(booking.platform_fee)
        .bind(booking.insurance_applied)
        .bind(booking.payment_method)
        .bind(booking.payment_status)
        .bind(booking.revision)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        let messages = insert_messages(&mut *tx, booking.id, opening).await?;

        tx.commit().await?;
        Ok(messages)
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Booking::from))
    }

    async fn apply_mutation(
        &self,
        booking_id: Uuid,
        mutation: &Mutation,
    ) -> NegotiationResult<Applied> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        let current = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1 FOR UPDATE",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(StoreError::from)?
        .map(Booking::from)
        .ok_or(NegotiationError::BookingNotFound(booking_id))?;

        // Dropping `tx` on error rolls the lock back without writing
        let transition = negotiation::apply(&current, mutation, Utc::now())?;
        let booking = transition.booking;

        sqlx::query(
            r#"
            UPDATE bookings
            SET status = $2, negotiated_price = $3, platform_fee = $4, payment_method = $5,
                payment_status = $6, revision = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(booking.id)
        .bind(booking.status)
        .bind(booking.negotiated_price)
        .bind(booking.platform_fee)
        .bind(booking.payment_method)
        .bind(booking.payment_status)
        .bind(booking.revision)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        let messages = insert_messages(&mut *tx, booking_id, transition.messages).await?;

        tx.commit().await.map_err(StoreError::from)?;

        Ok(Applied { booking, messages })
    }

    async fn append_message(&self, message: NewMessage) -> StoreResult<Message> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(message.booking_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound(format!("Booking {}", message.booking_id)));
        }

        let booking_id = message.booking_id;
        let mut inserted = insert_messages(&mut *tx, booking_id, vec![message]).await?;
        tx.commit().await?;

        inserted
            .pop()
            .ok_or_else(|| StoreError::Corrupt("message insert returned no row".to_string()))
    }

    async fn list_messages(&self, booking_id: Uuid) -> StoreResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT * FROM messages WHERE booking_id = $1 ORDER BY created_at ASC",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Message::try_from).collect()
    }

    async fn platform_stats(&self) -> StoreResult<PlatformStats> {
        let (
            booking_count,
            confirmed_booking_count,
            customer_count,
            technician_count,
            pending_technicians,
            revenue,
        ) = sqlx::query_as::<_, (i64, i64, i64, i64, i64, f64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM bookings),
                (SELECT COUNT(*) FROM bookings WHERE status = 'confirmed'),
                (SELECT COUNT(DISTINCT customer_id) FROM bookings),
                (SELECT COUNT(*) FROM technicians),
                (SELECT COUNT(*) FROM technicians WHERE NOT is_verified),
                (SELECT COALESCE(SUM(platform_fee), 0)::DOUBLE PRECISION
                   FROM bookings WHERE status = 'confirmed')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(PlatformStats {
            booking_count,
            confirmed_booking_count,
            customer_count,
            technician_count,
            pending_technicians,
            revenue,
        })
    }
}
