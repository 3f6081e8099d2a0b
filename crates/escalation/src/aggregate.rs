//! Billing action item aggregate.

use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{Aggregate, CampType, GuardianContact, Money, child_key};
use event_store::Version;
use serde::Serialize;

use crate::error::EscalationError;
use crate::events::{ActionItemCreatedData, ActionItemEvent};
use crate::state::{ActionItemStatus, ActionType};

/// A follow-up task for billing staff about one child on one registration.
///
/// Items for the same `(registration, child)` pair live on a sequence of
/// streams numbered by ordinal. A new ordinal is only opened once the
/// previous item has left `pending`, so the pair has at most one pending
/// item at any time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BillingActionItem {
    id: Option<AggregateId>,
    #[serde(skip)]
    version: Version,
    registration_id: Option<AggregateId>,
    child_name: String,
    ordinal: u32,
    guardian: Option<GuardianContact>,
    action_type: ActionType,
    amount_due: Money,
    amount_paid: Money,
    camp_type: Option<CampType>,
    status: ActionItemStatus,
    notes: Option<String>,
    assigned_to: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    completed_by: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for BillingActionItem {
    type Event = ActionItemEvent;
    type Error = EscalationError;

    fn aggregate_type() -> &'static str {
        "BillingActionItem"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            ActionItemEvent::ActionItemCreated(data) => {
                self.id = Some(data.item_id);
                self.registration_id = Some(data.registration_id);
                self.child_name = data.child_name;
                self.ordinal = data.ordinal;
                self.guardian = Some(data.guardian);
                self.action_type = data.action_type;
                self.amount_due = data.amount_due;
                self.amount_paid = data.amount_paid;
                self.camp_type = Some(data.camp_type);
                self.notes = data.notes;
                self.status = ActionItemStatus::Pending;
                self.created_at = Some(data.created_at);
                self.updated_at = Some(data.created_at);
            }
            ActionItemEvent::ActionItemStarted(data) => {
                self.status = ActionItemStatus::InProgress;
                self.assigned_to = Some(data.started_by);
                self.updated_at = Some(data.started_at);
            }
            ActionItemEvent::ActionItemCompleted(data) => {
                self.status = ActionItemStatus::Completed;
                self.completed_by = Some(data.completed_by);
                self.completed_at = Some(data.completed_at);
                self.updated_at = Some(data.completed_at);
                if data.notes.is_some() {
                    self.notes = data.notes;
                }
            }
            ActionItemEvent::ActionItemCancelled(data) => {
                self.status = ActionItemStatus::Cancelled;
                self.updated_at = Some(data.cancelled_at);
                if data.reason.is_some() {
                    self.notes = data.reason;
                }
            }
        }
    }
}

// Query methods
impl BillingActionItem {
    /// Stream id of the `ordinal`-th item for a `(registration, child)` pair.
    pub fn item_id(registration_id: AggregateId, child_name: &str, ordinal: u32) -> AggregateId {
        let child = child_key(child_name);
        AggregateId::derive("billing", &format!("{registration_id}/{child}/{ordinal}"))
    }

    pub fn registration_id(&self) -> Option<AggregateId> {
        self.registration_id
    }

    pub fn child_name(&self) -> &str {
        &self.child_name
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn guardian(&self) -> Option<&GuardianContact> {
        self.guardian.as_ref()
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn amount_due(&self) -> Money {
        self.amount_due
    }

    pub fn amount_paid(&self) -> Money {
        self.amount_paid
    }

    pub fn camp_type(&self) -> Option<CampType> {
        self.camp_type
    }

    pub fn status(&self) -> ActionItemStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn assigned_to(&self) -> Option<&str> {
        self.assigned_to.as_deref()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn completed_by(&self) -> Option<&str> {
        self.completed_by.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// Everything needed to raise a new item.
#[derive(Debug, Clone)]
pub struct NewActionItem {
    pub registration_id: AggregateId,
    pub child_name: String,
    pub guardian: GuardianContact,
    pub action_type: ActionType,
    pub amount_due: Money,
    pub amount_paid: Money,
    pub camp_type: CampType,
    pub notes: Option<String>,
}

// Command methods (return events)
impl BillingActionItem {
    pub fn create(
        &self,
        item: NewActionItem,
        ordinal: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActionItemEvent>, EscalationError> {
        if self.id.is_some() {
            return Err(EscalationError::AlreadyCreated);
        }
        if item.child_name.trim().is_empty() {
            return Err(EscalationError::MissingField("child_name"));
        }

        Ok(vec![ActionItemEvent::ActionItemCreated(ActionItemCreatedData {
            item_id: Self::item_id(item.registration_id, &item.child_name, ordinal),
            registration_id: item.registration_id,
            child_name: item.child_name,
            ordinal,
            guardian: item.guardian,
            action_type: item.action_type,
            amount_due: item.amount_due,
            amount_paid: item.amount_paid,
            camp_type: item.camp_type,
            notes: item.notes,
            created_at: now,
        })])
    }

    pub fn start(
        &self,
        staff_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActionItemEvent>, EscalationError> {
        self.ensure_created()?;
        require_staff(staff_id)?;
        if !self.status.can_start() {
            return Err(EscalationError::InvalidTransition {
                current: self.status,
                action: "start",
            });
        }
        Ok(vec![ActionItemEvent::started(staff_id.trim(), now)])
    }

    pub fn complete(
        &self,
        staff_id: &str,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActionItemEvent>, EscalationError> {
        self.ensure_created()?;
        require_staff(staff_id)?;
        if self.status.is_terminal() {
            return Err(EscalationError::InvalidTransition {
                current: self.status,
                action: "complete",
            });
        }
        Ok(vec![ActionItemEvent::completed(staff_id.trim(), notes, now)])
    }

    pub fn cancel(
        &self,
        staff_id: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActionItemEvent>, EscalationError> {
        self.ensure_created()?;
        require_staff(staff_id)?;
        if self.status.is_terminal() {
            return Err(EscalationError::InvalidTransition {
                current: self.status,
                action: "cancel",
            });
        }
        Ok(vec![ActionItemEvent::cancelled(staff_id.trim(), reason, now)])
    }

    fn ensure_created(&self) -> Result<(), EscalationError> {
        if self.id.is_none() {
            return Err(EscalationError::NotCreated);
        }
        Ok(())
    }
}

pub(crate) fn require_staff(staff_id: &str) -> Result<(), EscalationError> {
    if staff_id.trim().is_empty() {
        return Err(EscalationError::MissingField("staff_id"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(registration_id: AggregateId) -> NewActionItem {
        NewActionItem {
            registration_id,
            child_name: "Amani".to_string(),
            guardian: GuardianContact::new("Mercy Wambui", "mercy@example.com", "0711222333"),
            action_type: ActionType::InvoiceNeeded,
            amount_due: Money::from_units(7500),
            amount_paid: Money::zero(),
            camp_type: CampType::DayCamp,
            notes: None,
        }
    }

    fn created() -> BillingActionItem {
        let mut item = BillingActionItem::default();
        let events = item.create(new_item(AggregateId::new()), 0, Utc::now()).unwrap();
        item.apply_events(events);
        item
    }

    #[test]
    fn create_sets_pending_with_snapshot() {
        let item = created();
        assert_eq!(item.status(), ActionItemStatus::Pending);
        assert_eq!(item.amount_due(), Money::from_units(7500));
        assert_eq!(item.guardian().unwrap().email, "mercy@example.com");
        assert_eq!(
            item.id(),
            Some(BillingActionItem::item_id(
                item.registration_id().unwrap(),
                "amani",
                0
            ))
        );
    }

    #[test]
    fn start_then_complete_stamps_staff() {
        let mut item = created();
        let events = item.start("billing-1", Utc::now()).unwrap();
        item.apply_events(events);
        assert_eq!(item.status(), ActionItemStatus::InProgress);
        assert_eq!(item.assigned_to(), Some("billing-1"));

        let events = item
            .complete("billing-2", Some("paid by M-Pesa".into()), Utc::now())
            .unwrap();
        item.apply_events(events);
        assert_eq!(item.status(), ActionItemStatus::Completed);
        assert_eq!(item.completed_by(), Some("billing-2"));
        assert!(item.completed_at().is_some());
        assert_eq!(item.notes(), Some("paid by M-Pesa"));
    }

    #[test]
    fn terminal_items_refuse_changes() {
        let mut item = created();
        let events = item.cancel("billing-1", None, Utc::now()).unwrap();
        item.apply_events(events);

        assert!(matches!(
            item.complete("billing-1", None, Utc::now()),
            Err(EscalationError::InvalidTransition { .. })
        ));
        assert!(matches!(
            item.start("billing-1", Utc::now()),
            Err(EscalationError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn item_ids_differ_by_ordinal_and_child() {
        let reg = AggregateId::new();
        assert_ne!(
            BillingActionItem::item_id(reg, "Amani", 0),
            BillingActionItem::item_id(reg, "Amani", 1)
        );
        assert_ne!(
            BillingActionItem::item_id(reg, "Amani", 0),
            BillingActionItem::item_id(reg, "Baraka", 0)
        );
    }

    #[test]
    fn staff_is_required() {
        assert!(matches!(
            created().complete("  ", None, Utc::now()),
            Err(EscalationError::MissingField("staff_id"))
        ));
    }
}
