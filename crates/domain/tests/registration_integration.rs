//! End-to-end tests for registration, pricing and attendance.
//!
//! These run against the in-memory store and exercise the same services the
//! HTTP layer uses.

use std::sync::Arc;

use chrono::NaiveDate;
use domain::{
    Aggregate, AttendanceError, AttendanceService, AttendanceState, CampCatalog, CampType,
    CancelRegistration, CheckIn, CheckOut, ChildDraft, CreateRegistration, DomainError,
    ErrorKind, GuardianContact, Money, PaymentMethod, PaymentStatus, PricingError, Registration,
    RegistrationDraft, RegistrationError, RegistrationService, RegistrationStatus, SessionCatalog,
    SessionRates, SessionType, UpdatePaymentStatus,
};
use event_store::{EventQuery, EventStore, InMemoryEventStore};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
}

fn catalog() -> CampCatalog {
    let sessions = (1..=10).fold(SessionCatalog::new(), |c, d| {
        c.with_date(
            day(d),
            SessionRates::new(Money::from_units(1500), Money::from_units(2500)),
        )
    });
    CampCatalog::new().with_offering(CampType::DayCamp, sessions)
}

fn services() -> (
    InMemoryEventStore,
    RegistrationService<InMemoryEventStore>,
    AttendanceService<InMemoryEventStore>,
) {
    let store = InMemoryEventStore::new();
    (
        store.clone(),
        RegistrationService::new(store.clone(), Arc::new(catalog())),
        AttendanceService::new(store),
    )
}

fn guardian() -> GuardianContact {
    GuardianContact::new("Achieng Odhiambo", "achieng@example.com", "0700111222")
        .with_emergency_contact("Okoth 0700333444")
}

fn two_children() -> RegistrationDraft {
    RegistrationDraft::new(CampType::DayCamp, guardian())
        .with_child(
            ChildDraft::new("Neema", NaiveDate::from_ymd_opt(2016, 4, 12).unwrap(), "8-10")
                .with_dates([day(1), day(2), day(3)]),
        )
        .with_child(
            ChildDraft::new("Jabari", NaiveDate::from_ymd_opt(2019, 9, 30).unwrap(), "5-7")
                .with_session(day(4), SessionType::Half)
                .with_session(day(5), SessionType::Half)
                .with_special_needs("peanut allergy"),
        )
        .with_consent(true)
}

async fn create(service: &RegistrationService<InMemoryEventStore>) -> Registration {
    service
        .create(CreateRegistration::new(two_children()))
        .await
        .unwrap()
}

mod pricing_and_creation {
    use super::*;

    #[tokio::test]
    async fn two_children_mixed_sessions_total_10500() {
        let (_, registrations, _) = services();
        let registration = create(&registrations).await;

        assert_eq!(registration.total_amount(), Money::from_units(10_500));
        assert_eq!(registration.total_amount().to_string(), "10500.00");
        assert_eq!(registration.children().len(), 2);
        assert_eq!(registration.payment_status(), PaymentStatus::Unpaid);
        assert_eq!(registration.status(), RegistrationStatus::Active);
    }

    #[tokio::test]
    async fn stored_registration_matches_returned_one() {
        let (_, registrations, _) = services();
        let created = create(&registrations).await;
        let loaded = registrations.get_by_id(created.id().unwrap()).await.unwrap();

        assert_eq!(loaded.registration_number(), created.registration_number());
        assert_eq!(loaded.identity_token(), created.identity_token());
        assert_eq!(loaded.total_amount(), created.total_amount());
        assert_eq!(
            loaded.child("jabari").and_then(|c| c.special_needs.clone()),
            Some("peanut allergy".to_string())
        );
    }

    #[tokio::test]
    async fn missing_consent_is_rejected_and_nothing_is_stored() {
        let (store, registrations, _) = services();
        let err = registrations
            .create(CreateRegistration::new(two_children().with_consent(false)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::Registration(RegistrationError::ConsentRequired)
        ));
        assert_eq!(err.kind(), ErrorKind::Validation);
        let stored = store
            .query_events(EventQuery::for_aggregate_type("Registration"))
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn date_outside_catalog_is_never_priced() {
        let (store, registrations, _) = services();
        let draft = RegistrationDraft::new(CampType::DayCamp, guardian())
            .with_child(
                ChildDraft::new("Neema", NaiveDate::from_ymd_opt(2016, 4, 12).unwrap(), "8-10")
                    .with_dates([day(1), NaiveDate::from_ymd_opt(2025, 12, 25).unwrap()]),
            )
            .with_consent(true);

        let err = registrations
            .create(CreateRegistration::new(draft))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Registration(RegistrationError::Pricing(PricingError::UnknownDate(_)))
        ));
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn empty_registration_is_rejected() {
        let (_, registrations, _) = services();
        let draft = RegistrationDraft::new(CampType::DayCamp, guardian()).with_consent(true);
        let err = registrations
            .create(CreateRegistration::new(draft))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Registration(RegistrationError::EmptyRegistration)
        ));
    }
}

mod payment_and_lifecycle {
    use super::*;

    #[tokio::test]
    async fn partial_then_paid() {
        let (_, registrations, _) = services();
        let id = create(&registrations).await.id().unwrap();

        let partial = registrations
            .update_payment_status(
                UpdatePaymentStatus::new(id, PaymentStatus::Partial, PaymentMethod::MobileMoney)
                    .with_amount_paid(Money::from_units(4000))
                    .with_reference("MPESA-XYZ"),
            )
            .await
            .unwrap();
        assert_eq!(partial.amount_due(), Money::from_units(6500));
        assert_eq!(partial.payment_reference(), Some("MPESA-XYZ"));

        let paid = registrations
            .update_payment_status(UpdatePaymentStatus::new(
                id,
                PaymentStatus::Paid,
                PaymentMethod::CashOnSite,
            ))
            .await
            .unwrap();
        assert_eq!(paid.amount_due(), Money::zero());
        // Prices never move after creation.
        assert_eq!(paid.total_amount(), Money::from_units(10_500));
    }

    #[tokio::test]
    async fn overpayment_is_rejected() {
        let (_, registrations, _) = services();
        let id = create(&registrations).await.id().unwrap();

        let err = registrations
            .update_payment_status(
                UpdatePaymentStatus::new(id, PaymentStatus::Partial, PaymentMethod::Card)
                    .with_amount_paid(Money::from_units(20_000)),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Registration(RegistrationError::InvalidAmountPaid { .. })
        ));
    }

    #[tokio::test]
    async fn cancellation_keeps_attendance_history() {
        let (_, registrations, attendance) = services();
        let registration = create(&registrations).await;
        let id = registration.id().unwrap();
        let record = attendance
            .check_in(&registration, CheckIn::new(id, "Neema", "gate-1").on(day(1)))
            .await
            .unwrap();

        registrations
            .cancel(CancelRegistration::new(id, Some("moved away".into())))
            .await
            .unwrap();

        let kept = attendance.get(record.id().unwrap()).await.unwrap();
        assert_eq!(kept.registration_id(), Some(id));
    }
}

mod attendance_flow {
    use super::*;

    #[tokio::test]
    async fn check_in_out_and_refuse_second_check_out() {
        let (_, registrations, attendance) = services();
        let registration = create(&registrations).await;
        let id = registration.id().unwrap();

        let record = attendance
            .check_in(
                &registration,
                CheckIn::new(id, "Neema", "gate-1")
                    .on(day(2))
                    .with_notes("arrived with packed lunch"),
            )
            .await
            .unwrap();
        let attendance_id = record.id().unwrap();

        let out = attendance
            .check_out(CheckOut::new(attendance_id, None))
            .await
            .unwrap();
        assert_eq!(out.state(), AttendanceState::CheckedOut);

        let err = attendance
            .check_out(CheckOut::new(attendance_id, Some("again".into())))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Attendance(AttendanceError::AlreadyCheckedOut { .. })
        ));

        let stored = attendance.get(attendance_id).await.unwrap();
        assert_eq!(stored.check_out_time(), out.check_out_time());
        assert_eq!(stored.check_out_notes(), None);
    }

    #[tokio::test]
    async fn same_child_other_day_is_a_new_record() {
        let (_, registrations, attendance) = services();
        let registration = create(&registrations).await;
        let id = registration.id().unwrap();

        let first = attendance
            .check_in(&registration, CheckIn::new(id, "Neema", "gate-1").on(day(1)))
            .await
            .unwrap();
        let second = attendance
            .check_in(&registration, CheckIn::new(id, "Neema", "gate-1").on(day(2)))
            .await
            .unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn concurrent_check_ins_admit_exactly_one() {
        let (store, registrations, _) = services();
        let registration = Arc::new(create(&registrations).await);
        let id = registration.id().unwrap();
        let attendance = Arc::new(AttendanceService::new(store));

        let mut handles = Vec::new();
        for station in 0..8 {
            let attendance = Arc::clone(&attendance);
            let registration = Arc::clone(&registration);
            handles.push(tokio::spawn(async move {
                attendance
                    .check_in(
                        &registration,
                        CheckIn::new(id, "Jabari", format!("gate-{station}")).on(day(4)),
                    )
                    .await
            }));
        }

        let mut admitted = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(DomainError::Attendance(AttendanceError::AlreadyCheckedIn { .. })) => {
                    conflicts += 1
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(admitted, 1);
        assert_eq!(conflicts, 7);
    }
}
