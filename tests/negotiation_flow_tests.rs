//! Negotiation flow tests
//!
//! Drive `BookingService` end to end over the in-memory store with a stub cost
//! estimator standing in for the LLM.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use fixmate_server::booking::{
    BookingService, BookingStatus, CreateBookingRequest, PaymentMethod, PaymentStatus,
    ProposePriceRequest, RecordPaymentRequest, SendMessageRequest,
};
use fixmate_server::error::NegotiationError;
use fixmate_server::estimator::{CostEstimator, Estimate, EstimatorError};
use fixmate_server::models::{Actor, Role};
use fixmate_server::pricing::{platform_fee, ServiceCategory};
use fixmate_server::responder::AutoResponder;
use fixmate_server::store::{MemoryStore, NegotiationStore};
use fixmate_server::technician::Technician;

// ============================================================================
// Fixtures
// ============================================================================

enum Behaviour {
    Range(&'static str),
    Fail,
    Hang,
}

struct StubEstimator {
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl StubEstimator {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CostEstimator for StubEstimator {
    async fn estimate(
        &self,
        _category: &ServiceCategory,
        _description: &str,
        _district: &str,
    ) -> Result<Estimate, EstimatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Range(range) => Ok(Estimate {
                estimated_range: range.to_string(),
                explanation: "Covers parts and labour.".to_string(),
                tips: String::new(),
            }),
            Behaviour::Fail => Err(EstimatorError::Api("503 Service Unavailable".to_string())),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(EstimatorError::Timeout)
            }
        }
    }
}

struct Harness {
    service: BookingService,
    store: Arc<MemoryStore>,
    estimator: Arc<StubEstimator>,
}

fn harness_with(behaviour: Behaviour, enabled: bool) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let estimator = StubEstimator::new(behaviour);
    let responder = AutoResponder::new(estimator.clone(), Duration::from_millis(200))
        .with_enabled(enabled);
    let service = BookingService::new(store.clone(), responder);
    Harness {
        service,
        store,
        estimator,
    }
}

fn harness() -> Harness {
    harness_with(Behaviour::Range("₹600 - ₹800"), true)
}

impl Harness {
    async fn technician(&self, service_type: ServiceCategory, base_charge: i64) -> Technician {
        let technician = Technician {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Vikram Gupta".to_string(),
            service_type,
            district: "Patna".to_string(),
            base_charge,
            experience_years: 9,
            is_verified: true,
            rating: 5.0,
            bio: None,
            created_at: Utc::now(),
        };
        self.store.insert_technician(&technician).await.unwrap();
        technician
    }

    async fn open(&self, customer: &Actor, technician: &Technician) -> Uuid {
        self.service
            .create_booking(
                customer,
                CreateBookingRequest {
                    technician_id: technician.id,
                    service_type: None,
                },
            )
            .await
            .unwrap()
            .booking
            .id
    }
}

fn customer() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Customer)
}

fn technician_actor(technician: &Technician) -> Actor {
    Actor::new(technician.user_id, Role::Technician)
}

fn propose(price: i64, confirm: bool) -> ProposePriceRequest {
    ProposePriceRequest { price, confirm }
}

fn text(content: &str) -> SendMessageRequest {
    SendMessageRequest {
        content: Some(content.to_string()),
        attachment_url: None,
        attachment_type: None,
    }
}

// ============================================================================
// Opening a booking
// ============================================================================

#[tokio::test]
async fn test_create_booking_seeds_price_and_greeting() {
    let h = harness();
    let tech = h.technician(ServiceCategory::AcRepair, 1200).await;
    let customer = customer();

    let created = h
        .service
        .create_booking(
            &customer,
            CreateBookingRequest {
                technician_id: tech.id,
                service_type: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(created.booking.status, BookingStatus::Negotiating);
    assert_eq!(created.booking.negotiated_price, Some(1200));
    assert_eq!(created.booking.platform_fee, Some(120.0));
    assert_eq!(created.booking.customer_id, customer.id);
    assert_eq!(created.messages.len(), 1);
    assert_eq!(created.messages[0].sender_id, tech.user_id);
    assert!(created.messages[0]
        .content
        .as_deref()
        .unwrap()
        .starts_with("Namaste"));
}

#[tokio::test]
async fn test_greeting_is_sent_even_with_responder_disabled() {
    let h = harness_with(Behaviour::Range("₹600 - ₹800"), false);
    let tech = h.technician(ServiceCategory::Plumber, 900).await;
    let booking_id = h.open(&customer(), &tech).await;

    assert_eq!(h.store.list_messages(booking_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_self_booking_is_forbidden() {
    let h = harness();
    let tech = h.technician(ServiceCategory::Electrician, 800).await;

    let result = h
        .service
        .create_booking(
            &technician_actor(&tech),
            CreateBookingRequest {
                technician_id: tech.id,
                service_type: None,
            },
        )
        .await;

    assert!(matches!(result, Err(NegotiationError::SelfBookingForbidden)));
}

#[tokio::test]
async fn test_booking_category_must_match_trade() {
    let h = harness();
    let tech = h.technician(ServiceCategory::Electrician, 800).await;
    let customer = customer();

    let result = h
        .service
        .create_booking(
            &customer,
            CreateBookingRequest {
                technician_id: tech.id,
                service_type: Some("Gardening".to_string()),
            },
        )
        .await;
    assert!(matches!(result, Err(NegotiationError::InvalidInput(_))));

    let created = h
        .service
        .create_booking(
            &customer,
            CreateBookingRequest {
                technician_id: tech.id,
                service_type: Some("electrician".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.booking.service_type, ServiceCategory::Electrician);

    // The trade's 500 floor still applies
    let result = h
        .service
        .propose_price(
            &customer,
            created.booking.id,
            ProposePriceRequest {
                price: 300,
                confirm: true,
            },
        )
        .await;
    assert!(matches!(result, Err(NegotiationError::PriceOutOfRange { .. })));
}

#[tokio::test]
async fn test_unknown_technician_and_booking() {
    let h = harness();
    let missing = Uuid::new_v4();

    let result = h
        .service
        .create_booking(
            &customer(),
            CreateBookingRequest {
                technician_id: missing,
                service_type: None,
            },
        )
        .await;
    assert!(matches!(result, Err(NegotiationError::TechnicianNotFound(id)) if id == missing));

    let result = h.service.get_booking(&customer(), missing).await;
    assert!(matches!(result, Err(NegotiationError::BookingNotFound(id)) if id == missing));
}

// ============================================================================
// Negotiation
// ============================================================================

#[tokio::test]
async fn test_ac_repair_counter_offer_then_accept() {
    let h = harness();
    let tech = h.technician(ServiceCategory::AcRepair, 1200).await;
    let customer = customer();
    let booking_id = h.open(&customer, &tech).await;

    // 1000 is 16.7% below 1200, so the technician meets in the middle
    let outcome = h
        .service
        .propose_price(&customer, booking_id, propose(1000, false))
        .await
        .unwrap();
    assert_eq!(outcome.booking.negotiated_price, Some(1100));
    assert_eq!(outcome.booking.status, BookingStatus::Negotiating);
    assert_eq!(outcome.messages.len(), 2);
    assert_eq!(outcome.messages[1].sender_id, tech.user_id);
    assert!(outcome.messages[1]
        .content
        .as_deref()
        .unwrap()
        .contains("₹1100"));

    let accepted = h
        .service
        .accept_current_price(&customer, booking_id)
        .await
        .unwrap();
    assert_eq!(accepted.booking.status, BookingStatus::Confirmed);
    assert_eq!(accepted.booking.negotiated_price, Some(1100));
    assert_eq!(accepted.booking.platform_fee, Some(110.0));

    let messages = h.service.list_messages(&customer, booking_id).await.unwrap();
    assert_eq!(messages.len(), 3);
    assert!(messages
        .windows(2)
        .all(|pair| pair[0].created_at < pair[1].created_at));
}

#[tokio::test]
async fn test_small_counter_offer_is_agreed() {
    let h = harness();
    let tech = h.technician(ServiceCategory::Electrician, 1000).await;
    let customer = customer();
    let booking_id = h.open(&customer, &tech).await;

    let outcome = h
        .service
        .propose_price(&customer, booking_id, propose(900, false))
        .await
        .unwrap();
    assert_eq!(outcome.booking.negotiated_price, Some(900));
    assert_eq!(outcome.booking.platform_fee, Some(72.0));
}

#[tokio::test]
async fn test_counter_offer_without_responder_keeps_customer_price() {
    let h = harness_with(Behaviour::Range("₹600 - ₹800"), false);
    let tech = h.technician(ServiceCategory::Electrician, 1000).await;
    let customer = customer();
    let booking_id = h.open(&customer, &tech).await;

    let outcome = h
        .service
        .propose_price(&customer, booking_id, propose(700, false))
        .await
        .unwrap();
    assert_eq!(outcome.booking.negotiated_price, Some(700));
    assert_eq!(outcome.messages.len(), 1);
    assert_eq!(outcome.messages[0].sender_id, customer.id);
}

#[tokio::test]
async fn test_maid_280_is_rejected_and_state_untouched() {
    let h = harness();
    let tech = h.technician(ServiceCategory::Maid, 600).await;
    let customer = customer();
    let booking_id = h.open(&customer, &tech).await;
    let before = h.store.get_booking(booking_id).await.unwrap();

    let result = h
        .service
        .propose_price(&customer, booking_id, propose(280, true))
        .await;

    match result {
        Err(NegotiationError::PriceOutOfRange { price, range, .. }) => {
            assert_eq!(price, 280);
            assert_eq!((range.min, range.max), (500, 800));
        }
        other => panic!("expected PriceOutOfRange, got {:?}", other),
    }
    assert_eq!(h.store.get_booking(booking_id).await.unwrap(), before);
    assert_eq!(h.store.list_messages(booking_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_customer_proposing_current_price_confirms() {
    let h = harness();
    let tech = h.technician(ServiceCategory::Painter, 900).await;
    let customer = customer();
    let booking_id = h.open(&customer, &tech).await;

    let outcome = h
        .service
        .propose_price(&customer, booking_id, propose(900, false))
        .await
        .unwrap();
    assert_eq!(outcome.booking.status, BookingStatus::Confirmed);
    assert_eq!(outcome.booking.platform_fee, Some(72.0));
}

#[tokio::test]
async fn test_technician_proposal_and_confirm() {
    let h = harness();
    let tech = h.technician(ServiceCategory::Carpenter, 800).await;
    let booking_id = h.open(&customer(), &tech).await;
    let tech_actor = technician_actor(&tech);

    let outcome = h
        .service
        .propose_price(&tech_actor, booking_id, propose(950, false))
        .await
        .unwrap();
    assert_eq!(outcome.booking.status, BookingStatus::Negotiating);
    assert!(outcome.messages.is_empty());

    let outcome = h
        .service
        .propose_price(&tech_actor, booking_id, propose(950, true))
        .await
        .unwrap();
    assert_eq!(outcome.booking.status, BookingStatus::Confirmed);
    assert_eq!(outcome.booking.platform_fee, Some(76.0));
}

#[tokio::test]
async fn test_accept_is_idempotent() {
    let h = harness();
    let tech = h.technician(ServiceCategory::Haircut, 200).await;
    let customer = customer();
    let booking_id = h.open(&customer, &tech).await;

    let first = h
        .service
        .accept_current_price(&customer, booking_id)
        .await
        .unwrap();
    let second = h
        .service
        .accept_current_price(&customer, booking_id)
        .await
        .unwrap();

    assert_eq!(first.booking.status, BookingStatus::Confirmed);
    assert_eq!(second.booking.status, BookingStatus::Confirmed);
    assert_eq!(second.booking.negotiated_price, Some(200));
    assert_eq!(second.booking.platform_fee, Some(5.0));
}

// ============================================================================
// Auto-responder opening quote
// ============================================================================

#[tokio::test]
async fn test_first_customer_message_gets_estimated_quote() {
    let h = harness();
    let tech = h.technician(ServiceCategory::Plumber, 900).await;
    let customer = customer();
    let booking_id = h.open(&customer, &tech).await;

    let sent = h
        .service
        .send_message(&customer, booking_id, text("Kitchen tap is leaking"))
        .await
        .unwrap();
    assert_eq!(sent.replies.len(), 1);
    assert_eq!(sent.replies[0].sender_id, tech.user_id);
    assert_eq!(sent.booking.negotiated_price, Some(700));
    assert_eq!(sent.booking.platform_fee, Some(35.0));
    assert_eq!(sent.booking.revision, 1);

    let second = h
        .service
        .send_message(&customer, booking_id, text("It is under the sink"))
        .await
        .unwrap();
    assert!(second.replies.is_empty());
    assert_eq!(h.estimator.calls(), 1);
}

#[tokio::test]
async fn test_technician_message_does_not_trigger_quote() {
    let h = harness();
    let tech = h.technician(ServiceCategory::Plumber, 900).await;
    let booking_id = h.open(&customer(), &tech).await;

    let sent = h
        .service
        .send_message(&technician_actor(&tech), booking_id, text("I am nearby"))
        .await
        .unwrap();
    assert!(sent.replies.is_empty());
    assert_eq!(h.estimator.calls(), 0);
}

#[tokio::test]
async fn test_estimator_failure_quotes_category_minimum() {
    let h = harness_with(Behaviour::Fail, true);
    let tech = h.technician(ServiceCategory::AcRepair, 1300).await;
    let customer = customer();
    let booking_id = h.open(&customer, &tech).await;

    let sent = h
        .service
        .send_message(&customer, booking_id, text("AC not cooling"))
        .await
        .unwrap();
    assert_eq!(sent.replies.len(), 1);
    assert_eq!(sent.booking.negotiated_price, Some(1000));
}

#[tokio::test]
async fn test_estimator_timeout_quotes_category_minimum() {
    let h = harness_with(Behaviour::Hang, true);
    let tech = h.technician(ServiceCategory::Electrician, 1200).await;
    let customer = customer();
    let booking_id = h.open(&customer, &tech).await;

    let sent = h
        .service
        .send_message(&customer, booking_id, text("Fan stopped working"))
        .await
        .unwrap();
    assert_eq!(sent.booking.negotiated_price, Some(500));
}

#[tokio::test]
async fn test_quote_skipped_after_price_moved() {
    let h = harness();
    let tech = h.technician(ServiceCategory::Plumber, 900).await;
    let customer = customer();
    let booking_id = h.open(&customer, &tech).await;

    h.service
        .propose_price(&technician_actor(&tech), booking_id, propose(850, false))
        .await
        .unwrap();

    let sent = h
        .service
        .send_message(&customer, booking_id, text("Bathroom pipe burst"))
        .await
        .unwrap();
    assert!(sent.replies.is_empty());
    assert_eq!(sent.booking.negotiated_price, Some(850));
}

// ============================================================================
// Authorization and admin
// ============================================================================

#[tokio::test]
async fn test_strangers_cannot_read_or_negotiate() {
    let h = harness();
    let tech = h.technician(ServiceCategory::Painter, 700).await;
    let booking_id = h.open(&customer(), &tech).await;
    let stranger = customer();

    assert!(matches!(
        h.service.get_booking(&stranger, booking_id).await,
        Err(NegotiationError::Unauthorized(_))
    ));
    assert!(matches!(
        h.service
            .propose_price(&stranger, booking_id, propose(700, true))
            .await,
        Err(NegotiationError::Unauthorized(_))
    ));
    assert!(matches!(
        h.service
            .accept_current_price(&technician_actor(&tech), booking_id)
            .await,
        Err(NegotiationError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_get_booking_reports_context() {
    let h = harness();
    let tech = h.technician(ServiceCategory::Maid, 650).await;
    let customer = customer();
    let booking_id = h.open(&customer, &tech).await;

    let details = h.service.get_booking(&customer, booking_id).await.unwrap();
    assert_eq!(details.technician_name, "Vikram Gupta");
    assert_eq!(details.district, "Patna");
    assert_eq!((details.allowed_range.min, details.allowed_range.max), (500, 800));
    assert_eq!(details.fee_rate_percent, Some(5.0));
}

#[tokio::test]
async fn test_payment_and_platform_stats() {
    let h = harness();
    let tech = h.technician(ServiceCategory::AcRepair, 1100).await;
    let customer = customer();
    let booking_id = h.open(&customer, &tech).await;
    let admin = Actor::new(Uuid::new_v4(), Role::Admin);

    h.service
        .accept_current_price(&customer, booking_id)
        .await
        .unwrap();
    let booking = h
        .service
        .record_payment(
            &customer,
            booking_id,
            RecordPaymentRequest {
                method: PaymentMethod::Cod,
                paid: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(booking.payment_method, Some(PaymentMethod::Cod));
    assert_eq!(booking.payment_status, PaymentStatus::Paid);
    assert_eq!(booking.status, BookingStatus::Confirmed);

    let stats = h.service.platform_stats(&admin).await.unwrap();
    assert_eq!(stats.booking_count, 1);
    assert_eq!(stats.confirmed_booking_count, 1);
    assert_eq!(stats.customer_count, 1);
    assert!((stats.revenue - 110.0).abs() < 1e-9);

    assert!(matches!(
        h.service.platform_stats(&customer).await,
        Err(NegotiationError::Unauthorized(_))
    ));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_proposals_keep_fee_consistent() {
    let h = harness();
    let tech = h.technician(ServiceCategory::Electrician, 1000).await;
    let customer = customer();
    let booking_id = h.open(&customer, &tech).await;
    let service = Arc::new(h.service.clone());
    let tech_actor = technician_actor(&tech);

    let mut tasks = Vec::new();
    for i in 0..20 {
        let service = service.clone();
        let (actor, price) = if i % 2 == 0 {
            (customer, 600 + i * 10)
        } else {
            (tech_actor, 1000 + i * 10)
        };
        tasks.push(tokio::spawn(async move {
            service
                .propose_price(&actor, booking_id, propose(price, false))
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let booking = h.store.get_booking(booking_id).await.unwrap().unwrap();
    let price = booking.negotiated_price.unwrap();
    assert_eq!(booking.platform_fee, Some(platform_fee(price)));
    assert_eq!(booking.revision, 20);

    let messages = h.store.list_messages(booking_id).await.unwrap();
    assert!(messages
        .windows(2)
        .all(|pair| pair[0].created_at < pair[1].created_at));
}

// ============================================================================
// Interleaved writes
// ============================================================================

/// Memory store that applies a technician re-quote right before the next
/// mutation, as if it landed between the service's read and its write.
struct RequoteFirst {
    inner: MemoryStore,
    requote: std::sync::Mutex<Option<i64>>,
}

#[async_trait]
impl NegotiationStore for RequoteFirst {
    async fn health_check(&self) -> fixmate_server::store::StoreResult<()> {
        self.inner.health_check().await
    }

    async fn insert_technician(
        &self,
        technician: &Technician,
    ) -> fixmate_server::store::StoreResult<()> {
        self.inner.insert_technician(technician).await
    }

    async fn get_technician(
        &self,
        id: Uuid,
    ) -> fixmate_server::store::StoreResult<Option<Technician>> {
        self.inner.get_technician(id).await
    }

    async fn list_technicians(
        &self,
        filter: &fixmate_server::technician::TechnicianFilter,
    ) -> fixmate_server::store::StoreResult<Vec<Technician>> {
        self.inner.list_technicians(filter).await
    }

    async fn count_technicians_in_district(
        &self,
        district: &str,
    ) -> fixmate_server::store::StoreResult<i64> {
        self.inner.count_technicians_in_district(district).await
    }

    async fn set_technician_verified(
        &self,
        id: Uuid,
        verified: bool,
    ) -> fixmate_server::store::StoreResult<Option<Technician>> {
        self.inner.set_technician_verified(id, verified).await
    }

    async fn create_booking(
        &self,
        booking: &fixmate_server::booking::Booking,
        opening: Vec<fixmate_server::booking::NewMessage>,
    ) -> fixmate_server::store::StoreResult<Vec<fixmate_server::booking::Message>> {
        self.inner.create_booking(booking, opening).await
    }

    async fn get_booking(
        &self,
        id: Uuid,
    ) -> fixmate_server::store::StoreResult<Option<fixmate_server::booking::Booking>> {
        self.inner.get_booking(id).await
    }

    async fn apply_mutation(
        &self,
        booking_id: Uuid,
        mutation: &fixmate_server::booking::Mutation,
    ) -> fixmate_server::error::NegotiationResult<fixmate_server::store::Applied> {
        let requote = self.requote.lock().unwrap().take();
        if let Some(price) = requote {
            let technician_quote = fixmate_server::booking::Mutation::Propose {
                price,
                confirm: false,
            };
            self.inner.apply_mutation(booking_id, &technician_quote).await?;
        }
        self.inner.apply_mutation(booking_id, mutation).await
    }

    async fn append_message(
        &self,
        message: fixmate_server::booking::NewMessage,
    ) -> fixmate_server::store::StoreResult<fixmate_server::booking::Message> {
        self.inner.append_message(message).await
    }

    async fn list_messages(
        &self,
        booking_id: Uuid,
    ) -> fixmate_server::store::StoreResult<Vec<fixmate_server::booking::Message>> {
        self.inner.list_messages(booking_id).await
    }

    async fn platform_stats(
        &self,
    ) -> fixmate_server::store::StoreResult<fixmate_server::booking::PlatformStats> {
        self.inner.platform_stats().await
    }
}

#[tokio::test]
async fn test_customer_accept_does_not_confirm_a_replaced_quote() {
    let store = Arc::new(RequoteFirst {
        inner: MemoryStore::new(),
        requote: std::sync::Mutex::new(None),
    });
    let responder = AutoResponder::new(
        StubEstimator::new(Behaviour::Fail),
        Duration::from_millis(200),
    );
    let service = BookingService::new(store.clone(), responder);

    let technician = Technician {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        name: "Manoj Paswan".to_string(),
        service_type: ServiceCategory::AcRepair,
        district: "Darbhanga".to_string(),
        base_charge: 1000,
        experience_years: 7,
        is_verified: true,
        rating: 5.0,
        bio: None,
        created_at: Utc::now(),
    };
    store.insert_technician(&technician).await.unwrap();

    let customer = customer();
    let booking_id = service
        .create_booking(
            &customer,
            CreateBookingRequest {
                technician_id: technician.id,
                service_type: None,
            },
        )
        .await
        .unwrap()
        .booking
        .id;

    // Customer sees 1000 and agrees to it; the technician re-quotes 1400 first
    *store.requote.lock().unwrap() = Some(1400);
    let outcome = service
        .propose_price(
            &customer,
            booking_id,
            ProposePriceRequest {
                price: 1000,
                confirm: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.booking.status, BookingStatus::Negotiating);
    assert_eq!(outcome.booking.negotiated_price, Some(1200));
    assert_eq!(outcome.booking.platform_fee, Some(platform_fee(1200)));
    assert_eq!(outcome.messages.len(), 2);
}
