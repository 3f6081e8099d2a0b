use std::sync::Arc;

use chrono::NaiveDate;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    Aggregate, CampCatalog, CampType, CheckIn, ChildDraft, CreateRegistration, GuardianContact,
    Money, PaymentMethod, PaymentStatus, RegistrationDraft, SessionCatalog, SessionRates,
};
use escalation::{GateCoordinator, InMemoryBillingNotifier};
use event_store::InMemoryEventStore;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
}

fn gate() -> GateCoordinator<InMemoryEventStore, InMemoryBillingNotifier> {
    let sessions = (4..=8).fold(SessionCatalog::new(), |c, d| {
        c.with_date(
            day(d),
            SessionRates::new(Money::from_units(1500), Money::from_units(2500)),
        )
    });
    let catalog = CampCatalog::new().with_offering(CampType::DayCamp, sessions);
    GateCoordinator::new(
        InMemoryEventStore::new(),
        Arc::new(catalog),
        InMemoryBillingNotifier::new(),
    )
}

fn draft() -> RegistrationDraft {
    RegistrationDraft::new(
        CampType::DayCamp,
        GuardianContact::new("Wanjiru Kamau", "wanjiru@example.com", "0712345678"),
    )
    .with_child(
        ChildDraft::new("Amani", NaiveDate::from_ymd_opt(2018, 3, 9).unwrap(), "6-8")
            .with_dates([day(4), day(5), day(6)]),
    )
    .with_consent(true)
}

fn bench_paid_check_in(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("checkin/paid_registration", |b| {
        b.iter(|| {
            rt.block_on(async {
                let gate = gate();
                let id = gate
                    .registrations()
                    .create(CreateRegistration::new(draft().with_payment(
                        PaymentStatus::Paid,
                        PaymentMethod::Card,
                        None,
                    )))
                    .await
                    .unwrap()
                    .id()
                    .unwrap();
                gate.check_in(CheckIn::new(id, "Amani", "gate-1").on(day(4)))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_unpaid_check_in_with_escalation(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("checkin/unpaid_registration_escalates", |b| {
        b.iter(|| {
            rt.block_on(async {
                let gate = gate();
                let id = gate
                    .registrations()
                    .create(CreateRegistration::new(draft()))
                    .await
                    .unwrap()
                    .id()
                    .unwrap();
                gate.check_in(CheckIn::new(id, "Amani", "gate-1").on(day(4)))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_duplicate_check_in_rejected(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let gate = gate();
    let id = rt.block_on(async {
        let id = gate
            .registrations()
            .create(CreateRegistration::new(draft()))
            .await
            .unwrap()
            .id()
            .unwrap();
        gate.check_in(CheckIn::new(id, "Amani", "gate-1").on(day(4)))
            .await
            .unwrap();
        id
    });

    c.bench_function("checkin/duplicate_rejected", |b| {
        b.iter(|| {
            rt.block_on(async {
                gate.check_in(CheckIn::new(id, "Amani", "gate-2").on(day(4)))
                    .await
                    .unwrap_err();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_paid_check_in,
    bench_unpaid_check_in_with_escalation,
    bench_duplicate_check_in_rejected,
);
criterion_main!(benches);
