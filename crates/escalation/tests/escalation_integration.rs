//! Integration tests for the gate flow and billing escalation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::AggregateId;
use domain::{
    Aggregate, AttendanceError, AttendanceService, CampCatalog, CampType, CheckIn, CheckOut,
    ChildDraft, CreateRegistration, DomainError, GuardianContact, Money, PaymentMethod,
    PaymentStatus, Registration, RegistrationDraft, RegistrationService, SessionCatalog,
    SessionRates, UpdatePaymentStatus,
};
use escalation::{
    ActionItemStatus, ActionType, BillingNotice, BillingNotifier, BillingQueue, Escalation,
    EscalationError, GateCoordinator, GateScan, InMemoryBillingNotifier,
};
use event_store::{
    AppendOptions, EventEnvelope, EventQuery, EventStore, EventStoreError, EventStream,
    InMemoryEventStore, Version,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, d).unwrap()
}

fn catalog() -> Arc<CampCatalog> {
    let sessions = (1..=12).fold(SessionCatalog::new(), |c, d| {
        c.with_date(
            day(d),
            SessionRates::new(Money::from_units(1500), Money::from_units(2500)),
        )
    });
    Arc::new(CampCatalog::new().with_offering(CampType::HolidayCamp, sessions))
}

fn draft() -> RegistrationDraft {
    RegistrationDraft::new(
        CampType::HolidayCamp,
        GuardianContact::new("Grace Mutua", "grace@example.com", "0744555666"),
    )
    .with_child(
        ChildDraft::new("Kito", NaiveDate::from_ymd_opt(2017, 2, 14).unwrap(), "8-10")
            .with_dates([day(8), day(9), day(10)]),
    )
    .with_child(
        ChildDraft::new("Lulu", NaiveDate::from_ymd_opt(2019, 11, 3).unwrap(), "5-7")
            .with_dates([day(8), day(9)]),
    )
    .with_consent(true)
}

struct TestHarness {
    gate: GateCoordinator<InMemoryEventStore, InMemoryBillingNotifier>,
    notifier: InMemoryBillingNotifier,
}

impl TestHarness {
    fn new() -> Self {
        let notifier = InMemoryBillingNotifier::new();
        let gate = GateCoordinator::new(InMemoryEventStore::new(), catalog(), notifier.clone());
        Self { gate, notifier }
    }

    async fn register(&self) -> Registration {
        self.gate
            .registrations()
            .create(CreateRegistration::new(draft()))
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn unpaid_check_ins_raise_one_item_per_child() {
    let h = TestHarness::new();
    let registration = h.register().await;
    let id = registration.id().unwrap();

    let kito = h
        .gate
        .check_in(CheckIn::new(id, "Kito", "gate-1").on(day(8)))
        .await
        .unwrap();
    let Escalation::Created(kito_item) = &kito.billing else {
        panic!("expected a new billing item, got {:?}", kito.billing);
    };
    assert_eq!(kito_item.action_type(), ActionType::InvoiceNeeded);
    assert_eq!(kito_item.amount_due(), registration.total_amount());
    assert_eq!(kito_item.amount_due(), Money::from_units(12_500));

    let lulu = h
        .gate
        .check_in(CheckIn::new(id, "Lulu", "gate-1").on(day(8)))
        .await
        .unwrap();
    let lulu_item = lulu.billing.item().unwrap();
    assert!(lulu.billing.is_created());
    assert_ne!(lulu_item.id(), kito_item.id());
    assert_eq!(lulu_item.child_name(), "Lulu");

    let items = h.gate.queue().items_for_registration(id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(h.notifier.notice_count().await, 2);
}

#[tokio::test]
async fn next_day_check_in_reuses_the_pending_item() {
    let h = TestHarness::new();
    let id = h.register().await.id().unwrap();

    h.gate
        .check_in(CheckIn::new(id, "Kito", "gate-1").on(day(8)))
        .await
        .unwrap();
    let second = h
        .gate
        .check_in(CheckIn::new(id, "Kito", "gate-1").on(day(9)))
        .await
        .unwrap();

    assert!(matches!(second.billing, Escalation::Existing(_)));
    assert_eq!(h.gate.queue().items_for_registration(id).await.unwrap().len(), 1);
    assert_eq!(h.notifier.notice_count().await, 1);
}

#[tokio::test]
async fn paid_registration_is_not_escalated() {
    let h = TestHarness::new();
    let id = h.register().await.id().unwrap();
    h.gate
        .registrations()
        .update_payment_status(UpdatePaymentStatus::new(
            id,
            PaymentStatus::Paid,
            PaymentMethod::Card,
        ))
        .await
        .unwrap();

    let result = h
        .gate
        .check_in(CheckIn::new(id, "Kito", "gate-1").on(day(8)))
        .await
        .unwrap();
    assert!(matches!(result.billing, Escalation::NotRequired));
    assert_eq!(result.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn partial_payment_escalates_the_remainder() {
    let h = TestHarness::new();
    let id = h.register().await.id().unwrap();
    h.gate
        .registrations()
        .update_payment_status(
            UpdatePaymentStatus::new(id, PaymentStatus::Partial, PaymentMethod::MobileMoney)
                .with_amount_paid(Money::from_units(5000)),
        )
        .await
        .unwrap();

    let result = h
        .gate
        .check_in(CheckIn::new(id, "Lulu", "gate-1").on(day(8)))
        .await
        .unwrap();
    let item = result.billing.item().unwrap();
    assert_eq!(item.amount_due(), Money::from_units(7500));
    assert_eq!(item.amount_paid(), Money::from_units(5000));
}

#[tokio::test]
async fn duplicate_check_in_does_not_touch_billing() {
    let h = TestHarness::new();
    let id = h.register().await.id().unwrap();
    h.gate
        .check_in(CheckIn::new(id, "Kito", "gate-1").on(day(8)))
        .await
        .unwrap();

    let err = h
        .gate
        .check_in(CheckIn::new(id, "Kito", "gate-2").on(day(8)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EscalationError::Domain(DomainError::Attendance(
            AttendanceError::AlreadyCheckedIn { .. }
        ))
    ));
    assert_eq!(h.notifier.notice_count().await, 1);
}

#[tokio::test]
async fn concurrent_escalations_store_one_pending_item() {
    let store = InMemoryEventStore::new();
    let notifier = InMemoryBillingNotifier::new();
    let registrations = RegistrationService::new(store.clone(), catalog());
    let registration = Arc::new(
        registrations
            .create(CreateRegistration::new(draft()))
            .await
            .unwrap(),
    );
    let queue = Arc::new(BillingQueue::new(store, notifier.clone()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let queue = Arc::clone(&queue);
        let registration = Arc::clone(&registration);
        handles.push(tokio::spawn(async move {
            queue.escalate(&registration, "Kito").await
        }));
    }

    let mut created = 0;
    let mut ids = Vec::new();
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        if outcome.is_created() {
            created += 1;
        }
        ids.push(outcome.item().unwrap().id());
    }

    assert_eq!(created, 1);
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    let items = queue
        .items_for_registration(registration.id().unwrap())
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(notifier.notice_count().await, 1);
}

#[tokio::test]
async fn mark_completed_by_registration_closes_exactly_the_pending_ones() {
    let h = TestHarness::new();
    let id = h.register().await.id().unwrap();
    let kito = h
        .gate
        .check_in(CheckIn::new(id, "Kito", "gate-1").on(day(8)))
        .await
        .unwrap();
    h.gate
        .check_in(CheckIn::new(id, "Lulu", "gate-1").on(day(8)))
        .await
        .unwrap();

    // Kito's item is already being handled, so only Lulu's is pending.
    let kito_item = kito.billing.item().unwrap().id().unwrap();
    h.gate.queue().start(kito_item, "billing-1").await.unwrap();

    let closed = h
        .gate
        .queue()
        .mark_completed_by_registration(id, "billing-2", None)
        .await
        .unwrap();
    assert_eq!(closed, 1);

    let statuses: Vec<_> = h
        .gate
        .queue()
        .items_for_registration(id)
        .await
        .unwrap()
        .iter()
        .map(|item| item.status())
        .collect();
    assert_eq!(
        statuses,
        vec![ActionItemStatus::InProgress, ActionItemStatus::Completed]
    );
}

#[tokio::test]
async fn settle_at_gate_pays_and_closes() {
    let h = TestHarness::new();
    let id = h.register().await.id().unwrap();
    for child in ["Kito", "Lulu"] {
        h.gate
            .check_in(CheckIn::new(id, child, "gate-1").on(day(9)))
            .await
            .unwrap();
    }

    let settlement = h
        .gate
        .settle_at_gate(id, PaymentMethod::CashOnSite, Some("RCPT-77".into()), "gate-1")
        .await
        .unwrap();
    assert_eq!(settlement.items_closed, 2);

    let registration = h.gate.registrations().get_by_id(id).await.unwrap();
    assert_eq!(registration.amount_due(), Money::zero());
    assert_eq!(registration.payment_reference(), Some("RCPT-77"));
}

#[tokio::test]
async fn token_flow_with_check_out() {
    let h = TestHarness::new();
    let registration = h.register().await;

    let admitted = h
        .gate
        .check_in_by_token(GateScan {
            token: registration.identity_token().to_string(),
            child_name: "lulu".into(),
            marked_by: "gate-3".into(),
            attendance_date: Some(day(9)),
            notes: Some("forgot hat".into()),
        })
        .await
        .unwrap();
    assert_eq!(admitted.child_name, "Lulu");

    h.gate
        .check_out(CheckOut::new(admitted.attendance_id, None))
        .await
        .unwrap();
    let err = h
        .gate
        .check_out(CheckOut::new(admitted.attendance_id, None))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EscalationError::Domain(DomainError::Attendance(
            AttendanceError::AlreadyCheckedOut { .. }
        ))
    ));
}

struct SlowNotifier;

#[async_trait]
impl BillingNotifier for SlowNotifier {
    async fn notify_billing(&self, _notice: BillingNotice) -> Result<(), EscalationError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

#[tokio::test]
async fn slow_notifier_does_not_hold_up_check_in() {
    let store = InMemoryEventStore::new();
    let registrations = RegistrationService::new(store.clone(), catalog());
    let registration = registrations
        .create(CreateRegistration::new(draft()))
        .await
        .unwrap();
    let gate = GateCoordinator::from_parts(
        registrations,
        AttendanceService::new(store.clone()),
        BillingQueue::new(store, SlowNotifier).with_notify_timeout(Duration::from_millis(20)),
    );

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        gate.check_in(CheckIn::new(registration.id().unwrap(), "Kito", "gate-1").on(day(10))),
    )
    .await
    .expect("check-in should not wait for the notifier")
    .unwrap();
    assert!(result.billing.is_created());
}

#[tokio::test]
async fn unknown_registration_is_not_found() {
    let h = TestHarness::new();
    let err = h
        .gate
        .check_in(CheckIn::new(AggregateId::new(), "Kito", "gate-1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), domain::ErrorKind::NotFound);
}

/// Rejects the next `n` billing item appends, then behaves normally.
#[derive(Clone)]
struct BillingOutageStore {
    inner: InMemoryEventStore,
    failures_left: Arc<AtomicUsize>,
}

impl BillingOutageStore {
    fn failing(n: usize) -> Self {
        Self {
            inner: InMemoryEventStore::new(),
            failures_left: Arc::new(AtomicUsize::new(n)),
        }
    }
}

#[async_trait]
impl EventStore for BillingOutageStore {
    async fn append(
        &self,
        events: Vec<EventEnvelope>,
        options: AppendOptions,
    ) -> event_store::Result<Version> {
        let billing = events
            .first()
            .is_some_and(|e| e.aggregate_type == "BillingActionItem");
        if billing
            && self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            return Err(EventStoreError::InvalidAppend("connection reset".into()));
        }
        self.inner.append(events, options).await
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> event_store::Result<Vec<EventEnvelope>> {
        self.inner.get_events_for_aggregate(aggregate_id).await
    }

    async fn query_events(&self, query: EventQuery) -> event_store::Result<Vec<EventEnvelope>> {
        self.inner.query_events(query).await
    }

    async fn stream_all_events(&self) -> event_store::Result<EventStream> {
        self.inner.stream_all_events().await
    }

    async fn stream_events_after(&self, position: u64) -> event_store::Result<EventStream> {
        self.inner.stream_events_after(position).await
    }

    async fn get_aggregate_version(
        &self,
        aggregate_id: AggregateId,
    ) -> event_store::Result<Option<Version>> {
        self.inner.get_aggregate_version(aggregate_id).await
    }
}

#[tokio::test]
async fn rescan_after_failed_escalation_raises_the_missing_item() {
    let notifier = InMemoryBillingNotifier::new();
    let gate = GateCoordinator::new(BillingOutageStore::failing(1), catalog(), notifier.clone());
    let id = gate
        .registrations()
        .create(CreateRegistration::new(draft()))
        .await
        .unwrap()
        .id()
        .unwrap();

    let err = gate
        .check_in(CheckIn::new(id, "Kito", "gate-1").on(day(8)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), domain::ErrorKind::Dependency);
    assert!(
        gate.attendance()
            .has_checked_in(id, "Kito", day(8))
            .await
            .unwrap()
    );
    assert!(gate.queue().items_for_registration(id).await.unwrap().is_empty());

    let err = gate
        .check_in(CheckIn::new(id, "Kito", "gate-1").on(day(8)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EscalationError::Domain(DomainError::Attendance(
            AttendanceError::AlreadyCheckedIn { .. }
        ))
    ));

    let items = gate.queue().items_for_registration(id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].child_name(), "Kito");
    assert_eq!(items[0].status(), ActionItemStatus::Pending);
    assert_eq!(notifier.notice_count().await, 1);
}

#[tokio::test]
async fn rescan_does_not_reopen_a_resolved_item() {
    let h = TestHarness::new();
    let id = h.register().await.id().unwrap();
    let admitted = h
        .gate
        .check_in(CheckIn::new(id, "Kito", "gate-1").on(day(8)))
        .await
        .unwrap();
    let item_id = admitted.billing.item().unwrap().id().unwrap();
    h.gate
        .queue()
        .mark_completed(item_id, "billing-1", Some("Invoice sent".into()))
        .await
        .unwrap();

    h.gate
        .check_in(CheckIn::new(id, "Kito", "gate-2").on(day(8)))
        .await
        .unwrap_err();

    let items = h.gate.queue().items_for_registration(id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status(), ActionItemStatus::Completed);
    assert_eq!(h.notifier.notice_count().await, 1);
}
