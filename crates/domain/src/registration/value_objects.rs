//! Registration inputs and embedded records.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::catalog::{CampType, SessionType};
use crate::money::Money;
use crate::pricing::PricedSelection;

use super::{PaymentMethod, PaymentStatus, RegistrationError, RegistrationType};

/// Guardian contact details, copied onto billing items as a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianContact {
    pub parent_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub emergency_contact: Option<String>,
}

impl GuardianContact {
    pub fn new(
        parent_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            parent_name: parent_name.into(),
            email: email.into(),
            phone: phone.into(),
            emergency_contact: None,
        }
    }

    pub fn with_emergency_contact(mut self, contact: impl Into<String>) -> Self {
        self.emergency_contact = Some(contact.into());
        self
    }

    fn validate(&self) -> Result<(), RegistrationError> {
        for (field, value) in [
            ("parent_name", &self.parent_name),
            ("email", &self.email),
            ("phone", &self.phone),
        ] {
            if value.trim().is_empty() {
                return Err(RegistrationError::MissingField(field));
            }
        }
        Ok(())
    }
}

/// A child as submitted by the guardian, before pricing.
///
/// `session_type_by_date` may leave dates out; they are booked as full days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildDraft {
    pub child_name: String,
    pub date_of_birth: NaiveDate,
    pub age_range: String,
    #[serde(default)]
    pub special_needs: Option<String>,
    pub selected_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub session_type_by_date: BTreeMap<NaiveDate, SessionType>,
}

impl ChildDraft {
    pub fn new(
        child_name: impl Into<String>,
        date_of_birth: NaiveDate,
        age_range: impl Into<String>,
    ) -> Self {
        Self {
            child_name: child_name.into(),
            date_of_birth,
            age_range: age_range.into(),
            special_needs: None,
            selected_dates: Vec::new(),
            session_type_by_date: BTreeMap::new(),
        }
    }

    pub fn with_dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.selected_dates.extend(dates);
        self
    }

    /// Selects `date` with an explicit session type.
    pub fn with_session(mut self, date: NaiveDate, session_type: SessionType) -> Self {
        if !self.selected_dates.contains(&date) {
            self.selected_dates.push(date);
        }
        self.session_type_by_date.insert(date, session_type);
        self
    }

    pub fn with_special_needs(mut self, notes: impl Into<String>) -> Self {
        self.special_needs = Some(notes.into());
        self
    }

    fn validate(&self) -> Result<(), RegistrationError> {
        if self.child_name.trim().is_empty() {
            return Err(RegistrationError::MissingField("child_name"));
        }
        if self.selected_dates.is_empty() {
            return Err(RegistrationError::EmptyRegistration);
        }
        if let Some(date) = self
            .session_type_by_date
            .keys()
            .find(|date| !self.selected_dates.contains(date))
        {
            return Err(RegistrationError::SessionTypeForUnselectedDate {
                child_name: self.child_name.clone(),
                date: *date,
            });
        }
        Ok(())
    }
}

/// A booked child. Its dates are exactly the keys of `session_type_by_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub child_name: String,
    pub date_of_birth: NaiveDate,
    pub age_range: String,
    pub special_needs: Option<String>,
    pub session_type_by_date: BTreeMap<NaiveDate, SessionType>,
    pub price: Money,
}

impl Child {
    pub(crate) fn from_priced(draft: &ChildDraft, selection: &PricedSelection) -> Self {
        Self {
            child_name: draft.child_name.trim().to_string(),
            date_of_birth: draft.date_of_birth,
            age_range: draft.age_range.clone(),
            special_needs: draft.special_needs.clone(),
            session_type_by_date: selection.session_types(),
            price: selection.total(),
        }
    }

    pub fn selected_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.session_type_by_date.keys().copied()
    }

    pub fn session_type(&self, date: NaiveDate) -> Option<SessionType> {
        self.session_type_by_date.get(&date).copied()
    }

    pub fn attends(&self, date: NaiveDate) -> bool {
        self.session_type_by_date.contains_key(&date)
    }
}

/// Everything needed to create a registration in one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationDraft {
    pub camp_type: CampType,
    #[serde(flatten)]
    pub guardian: GuardianContact,
    pub children: Vec<ChildDraft>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_reference: Option<String>,
    /// Only meaningful with `partial` or `unpaid`; `paid` implies the total.
    #[serde(default)]
    pub amount_paid: Option<Money>,
    #[serde(default)]
    pub registration_type: RegistrationType,
    pub consent_given: bool,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

impl RegistrationDraft {
    pub fn new(camp_type: CampType, guardian: GuardianContact) -> Self {
        Self {
            camp_type,
            guardian,
            children: Vec::new(),
            payment_status: PaymentStatus::default(),
            payment_method: PaymentMethod::default(),
            payment_reference: None,
            amount_paid: None,
            registration_type: RegistrationType::default(),
            consent_given: false,
            admin_notes: None,
        }
    }

    pub fn with_child(mut self, child: ChildDraft) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_consent(mut self, consent_given: bool) -> Self {
        self.consent_given = consent_given;
        self
    }

    pub fn with_payment(
        mut self,
        status: PaymentStatus,
        method: PaymentMethod,
        reference: Option<String>,
    ) -> Self {
        self.payment_status = status;
        self.payment_method = method;
        self.payment_reference = reference;
        self
    }

    pub fn with_registration_type(mut self, registration_type: RegistrationType) -> Self {
        self.registration_type = registration_type;
        self
    }

    /// Input checks that need no catalog. Consent is checked first.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if !self.consent_given {
            return Err(RegistrationError::ConsentRequired);
        }
        self.guardian.validate()?;
        if self.children.is_empty() {
            return Err(RegistrationError::EmptyRegistration);
        }

        // Child names key attendance and billing records.
        let mut seen = HashSet::new();
        for child in &self.children {
            child.validate()?;
            if !seen.insert(child_key(&child.child_name)) {
                return Err(RegistrationError::DuplicateChild {
                    child_name: child.child_name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Normalised form of a child name, used wherever children are matched or
/// keyed: trimmed and lowercased with full Unicode case mapping.
pub fn child_key(child_name: &str) -> String {
    child_name.trim().to_lowercase()
}

/// Human-facing number, e.g. `CAMP-2025-3FA85F6457`.
///
/// Ten hex digits come from the random part of the id (40 bits), enough to
/// keep a camp's yearly registrations apart when staff search by number.
pub fn registration_number(id: AggregateId, created_at: DateTime<Utc>) -> String {
    let hex = id.as_uuid().simple().to_string();
    format!("CAMP-{}-{}", created_at.year(), hex[..10].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn child(name: &str) -> ChildDraft {
        ChildDraft::new(name, NaiveDate::from_ymd_opt(2018, 3, 9).unwrap(), "6-8")
            .with_dates([day(1)])
    }

    fn draft() -> RegistrationDraft {
        RegistrationDraft::new(
            CampType::DayCamp,
            GuardianContact::new("Achieng Otieno", "achieng@example.com", "+254700000001"),
        )
        .with_child(child("Baraka"))
        .with_consent(true)
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn consent_is_checked_before_anything_else() {
        let mut d = draft().with_consent(false);
        d.children.clear();
        assert!(matches!(d.validate(), Err(RegistrationError::ConsentRequired)));
    }

    #[test]
    fn rejects_empty_children_and_dateless_child() {
        let mut d = draft();
        d.children.clear();
        assert!(matches!(d.validate(), Err(RegistrationError::EmptyRegistration)));

        let mut dateless = child("Nia");
        dateless.selected_dates.clear();
        let d = draft().with_child(dateless);
        assert!(matches!(d.validate(), Err(RegistrationError::EmptyRegistration)));
    }

    #[test]
    fn rejects_duplicate_child_names_case_insensitively() {
        let d = draft().with_child(child(" baraka "));
        assert!(matches!(
            d.validate(),
            Err(RegistrationError::DuplicateChild { .. })
        ));
    }

    #[test]
    fn rejects_session_type_for_unselected_date() {
        let mut c = child("Nia");
        c.session_type_by_date.insert(day(2), SessionType::Half);
        let d = draft().with_child(c);
        assert!(matches!(
            d.validate(),
            Err(RegistrationError::SessionTypeForUnselectedDate { date, .. }) if date == day(2)
        ));
    }

    #[test]
    fn rejects_blank_guardian_fields() {
        let mut d = draft();
        d.guardian.phone = "  ".to_string();
        assert!(matches!(
            d.validate(),
            Err(RegistrationError::MissingField("phone"))
        ));
    }

    #[test]
    fn child_key_folds_unicode_case() {
        assert_eq!(child_key(" Émile "), child_key("ÉMILE"));
        assert_eq!(child_key("Zoë"), "zoë");
    }

    #[test]
    fn registration_number_format() {
        let id = AggregateId::from_uuid(
            uuid::Uuid::parse_str("3fa85f64-5717-4562-b3fc-2c963f66afa6").unwrap(),
        );
        let created_at = "2025-06-30T10:00:00Z".parse().unwrap();
        assert_eq!(registration_number(id, created_at), "CAMP-2025-3FA85F6457");
    }

    #[test]
    fn registration_numbers_stay_distinct_within_a_year() {
        let created_at = "2025-06-30T10:00:00Z".parse().unwrap();
        let numbers: HashSet<_> = (0..5_000)
            .map(|_| registration_number(AggregateId::new(), created_at))
            .collect();
        assert_eq!(numbers.len(), 5_000);
    }

    #[test]
    fn draft_json_flattens_guardian() {
        let json = serde_json::json!({
            "camp_type": "holiday_camp",
            "parent_name": "Wairimu",
            "email": "w@example.com",
            "phone": "0700",
            "children": [{
                "child_name": "Kip",
                "date_of_birth": "2017-01-02",
                "age_range": "8-10",
                "selected_dates": ["2025-12-15"],
                "session_type_by_date": {"2025-12-15": "half"}
            }],
            "consent_given": true
        });
        let draft: RegistrationDraft = serde_json::from_value(json).unwrap();
        assert_eq!(draft.guardian.parent_name, "Wairimu");
        assert_eq!(draft.payment_status, PaymentStatus::Unpaid);
        assert_eq!(
            draft.children[0].session_type_by_date
                [&NaiveDate::from_ymd_opt(2025, 12, 15).unwrap()],
            SessionType::Half
        );
    }
}
