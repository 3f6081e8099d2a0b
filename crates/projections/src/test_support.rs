//! Event fixtures for view tests.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use common::AggregateId;
use domain::{
    AttendanceEvent, CampType, Child, GuardianContact, Money, PaymentMethod, PaymentStatus,
    RegistrationEvent, RegistrationType, SessionType,
    attendance::ChildCheckedInData,
    registration::{RegistrationCreatedData, registration_number},
};
use escalation::events::ActionItemCreatedData;
use escalation::{ActionItemEvent, ActionType};
use event_store::{EventEnvelope, Version};
use serde::Serialize;

pub(crate) fn envelope<T: Serialize>(
    aggregate_id: AggregateId,
    aggregate_type: &str,
    version: i64,
    event: &T,
) -> EventEnvelope {
    let payload = serde_json::to_value(event).unwrap();
    let event_type = payload["type"].as_str().unwrap_or("Unknown").to_string();
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type(aggregate_type)
        .event_type(event_type)
        .version(Version::new(version))
        .payload_raw(payload)
        .build()
        .unwrap()
}

fn guardian() -> GuardianContact {
    GuardianContact::new("Wanjiru Kamau", "wanjiru@example.com", "0712345678")
}

/// An unpaid single-child registration totalling 5,000.
pub(crate) fn created_event(id: AggregateId, camp_type: CampType) -> RegistrationEvent {
    let now = Utc::now();
    let child = Child {
        child_name: "Amani".into(),
        date_of_birth: NaiveDate::from_ymd_opt(2018, 3, 9).unwrap(),
        age_range: "6-8".into(),
        special_needs: None,
        session_type_by_date: BTreeMap::from([(
            NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
            SessionType::Full,
        )]),
        price: Money::from_units(5000),
    };
    RegistrationEvent::RegistrationCreated(RegistrationCreatedData {
        registration_id: id,
        registration_number: registration_number(id, now),
        camp_type,
        guardian: guardian(),
        children: vec![child],
        total_amount: Money::from_units(5000),
        amount_paid: Money::zero(),
        payment_status: PaymentStatus::Unpaid,
        payment_method: PaymentMethod::default(),
        payment_reference: None,
        registration_type: RegistrationType::default(),
        identity_token: "token".into(),
        consent_given: true,
        admin_notes: None,
        created_at: now,
    })
}

pub(crate) fn checked_in_event(
    attendance_id: AggregateId,
    registration_id: AggregateId,
    child_name: &str,
    attendance_date: NaiveDate,
) -> AttendanceEvent {
    AttendanceEvent::ChildCheckedIn(ChildCheckedInData {
        attendance_id,
        registration_id,
        child_name: child_name.into(),
        attendance_date,
        check_in_time: Utc::now(),
        marked_by: "gate-1".into(),
        notes: None,
    })
}

pub(crate) fn action_item_created(
    item_id: AggregateId,
    registration_id: AggregateId,
    child_name: &str,
) -> ActionItemEvent {
    ActionItemEvent::ActionItemCreated(ActionItemCreatedData {
        item_id,
        registration_id,
        child_name: child_name.into(),
        ordinal: 0,
        guardian: guardian(),
        action_type: ActionType::InvoiceNeeded,
        amount_due: Money::from_units(5000),
        amount_paid: Money::zero(),
        camp_type: CampType::DayCamp,
        notes: None,
        created_at: Utc::now(),
    })
}
