//! Billing escalation queue.

use std::time::Duration;

use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{
    Aggregate, AttendanceError, AttendanceRecord, DomainError, DomainEvent, Registration,
};
use event_store::{AppendOptions, EventEnvelope, EventQuery, EventStore, Version};
use serde::Serialize;

use crate::aggregate::{BillingActionItem, NewActionItem, require_staff};
use crate::error::{EscalationError, Result};
use crate::events::ActionItemEvent;
use crate::notifier::{BillingNotice, BillingNotifier};
use crate::state::ActionType;

pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(2);

/// Result of escalating a check-in.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "item", rename_all = "snake_case")]
pub enum Escalation {
    /// The registration is fully paid.
    NotRequired,
    /// A pending item already covered this child; nothing was written.
    Existing(BillingActionItem),
    Created(BillingActionItem),
}

impl Escalation {
    pub fn item(&self) -> Option<&BillingActionItem> {
        match self {
            Escalation::NotRequired => None,
            Escalation::Existing(item) | Escalation::Created(item) => Some(item),
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Escalation::Created(_))
    }
}

/// Creates and resolves billing follow-ups for unpaid attendance.
///
/// Items are event-sourced on derived stream ids (see
/// [`BillingActionItem::item_id`]); creating one claims a fresh stream, so two
/// concurrent escalations for the same child settle on a single item.
pub struct BillingQueue<S, N>
where
    S: EventStore,
    N: BillingNotifier,
{
    store: S,
    notifier: N,
    notify_timeout: Duration,
}

impl<S, N> BillingQueue<S, N>
where
    S: EventStore,
    N: BillingNotifier,
{
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            store,
            notifier,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }

    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// The pending item for a child, if there is one.
    pub async fn check_existing_item(
        &self,
        registration_id: AggregateId,
        child_name: &str,
    ) -> Result<Option<BillingActionItem>> {
        let mut ordinal = 0;
        loop {
            let item_id = BillingActionItem::item_id(registration_id, child_name, ordinal);
            match self.load(item_id).await? {
                None => return Ok(None),
                Some(item) if item.status().is_pending() => return Ok(Some(item)),
                Some(_) => ordinal += 1,
            }
        }
    }

    /// Raises an `invoice_needed` item for a checked-in child unless the
    /// registration is paid or a pending item already exists.
    ///
    /// The billing notifier is only called for newly created items, and its
    /// failure does not fail the escalation.
    #[tracing::instrument(skip(self, registration), fields(registration_id = ?registration.id(), child = %child_name))]
    pub async fn escalate(&self, registration: &Registration, child_name: &str) -> Result<Escalation> {
        self.raise(registration, child_name, None).await
    }

    /// Escalates a check-in that is already on record.
    ///
    /// Any item raised at or after the check-in covers it, even one staff
    /// have since resolved, so scanning the same child again never reopens
    /// billing that was already dealt with.
    #[tracing::instrument(skip(self, registration, record), fields(registration_id = ?registration.id(), child = %record.child_name()))]
    pub async fn escalate_recorded(
        &self,
        registration: &Registration,
        record: &AttendanceRecord,
    ) -> Result<Escalation> {
        self.raise(registration, record.child_name(), record.check_in_time())
            .await
    }

    async fn raise(
        &self,
        registration: &Registration,
        child_name: &str,
        covered_since: Option<DateTime<Utc>>,
    ) -> Result<Escalation> {
        if registration.payment_status().is_paid() {
            return Ok(Escalation::NotRequired);
        }

        let registration_id = registration
            .id()
            .ok_or(EscalationError::MissingField("registration_id"))?;
        let child = registration.child(child_name).ok_or_else(|| {
            DomainError::from(AttendanceError::UnknownChild {
                child_name: child_name.to_string(),
            })
        })?;
        let guardian = registration
            .guardian()
            .cloned()
            .ok_or(EscalationError::MissingField("guardian"))?;
        let camp_type = registration
            .camp_type()
            .ok_or(EscalationError::MissingField("camp_type"))?;

        let new_item = NewActionItem {
            registration_id,
            child_name: child.child_name.clone(),
            guardian,
            action_type: ActionType::InvoiceNeeded,
            amount_due: registration.amount_due(),
            amount_paid: registration.amount_paid(),
            camp_type,
            notes: None,
        };

        let mut ordinal = 0;
        loop {
            let item_id = BillingActionItem::item_id(registration_id, &new_item.child_name, ordinal);
            match self.load(item_id).await? {
                Some(item) if item.status().is_pending() => {
                    tracing::debug!(%item_id, "Pending billing item already exists");
                    return Ok(Escalation::Existing(item));
                }
                Some(item) if covers(&item, covered_since) => {
                    tracing::debug!(%item_id, "Check-in already escalated");
                    return Ok(Escalation::Existing(item));
                }
                Some(_) => {
                    ordinal += 1;
                    continue;
                }
                None => {}
            }

            let mut item = BillingActionItem::default();
            let events = item.create(new_item.clone(), ordinal, Utc::now())?;
            match self.append_events(item_id, Version::initial(), &events).await {
                Ok(version) => {
                    item.apply_events(events);
                    item.set_version(version);
                    metrics::counter!("billing_items_created_total").increment(1);
                    tracing::info!(%item_id, amount_due = %item.amount_due(), "Billing item created");
                    self.notify(&new_item).await;
                    return Ok(Escalation::Created(item));
                }
                // Another check-in claimed this ordinal first; re-read it.
                Err(EscalationError::EventStore(e)) if e.is_conflict() => {
                    tracing::debug!(%item_id, "Billing item created concurrently");
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn get(&self, item_id: AggregateId) -> Result<BillingActionItem> {
        self.load(item_id)
            .await?
            .ok_or(EscalationError::ItemNotFound(item_id))
    }

    /// Every item ever raised for a registration, oldest first.
    pub async fn items_for_registration(
        &self,
        registration_id: AggregateId,
    ) -> Result<Vec<BillingActionItem>> {
        let created = self
            .store
            .query_events(
                EventQuery::for_aggregate_type(BillingActionItem::aggregate_type())
                    .event_type("ActionItemCreated"),
            )
            .await?;

        let mut items = Vec::new();
        for envelope in created {
            let ActionItemEvent::ActionItemCreated(data) =
                serde_json::from_value::<ActionItemEvent>(envelope.payload)?
            else {
                continue;
            };
            if data.registration_id != registration_id {
                continue;
            }
            if let Some(item) = self.load(data.item_id).await? {
                items.push(item);
            }
        }
        Ok(items)
    }

    #[tracing::instrument(skip(self))]
    pub async fn start(&self, item_id: AggregateId, staff_id: &str) -> Result<BillingActionItem> {
        self.transition(item_id, |item| item.start(staff_id, Utc::now()))
            .await
    }

    #[tracing::instrument(skip(self, notes))]
    pub async fn mark_completed(
        &self,
        item_id: AggregateId,
        staff_id: &str,
        notes: Option<String>,
    ) -> Result<BillingActionItem> {
        let item = self
            .transition(item_id, |item| item.complete(staff_id, notes, Utc::now()))
            .await?;
        metrics::counter!("billing_items_completed_total").increment(1);
        tracing::info!(%item_id, "Billing item completed");
        Ok(item)
    }

    #[tracing::instrument(skip(self, reason))]
    pub async fn cancel(
        &self,
        item_id: AggregateId,
        staff_id: &str,
        reason: Option<String>,
    ) -> Result<BillingActionItem> {
        self.transition(item_id, |item| item.cancel(staff_id, reason, Utc::now()))
            .await
    }

    /// Completes every pending item of a registration and returns how many
    /// were closed. Items changed concurrently by someone else are skipped.
    #[tracing::instrument(skip(self, notes))]
    pub async fn mark_completed_by_registration(
        &self,
        registration_id: AggregateId,
        staff_id: &str,
        notes: Option<String>,
    ) -> Result<usize> {
        require_staff(staff_id)?;

        let mut closed = 0;
        for item in self.items_for_registration(registration_id).await? {
            let Some(item_id) = item.id().filter(|_| item.status().is_pending()) else {
                continue;
            };
            match self.mark_completed(item_id, staff_id, notes.clone()).await {
                Ok(_) => closed += 1,
                Err(EscalationError::EventStore(e)) if e.is_conflict() => {
                    tracing::debug!(%item_id, "Billing item changed concurrently, skipped");
                }
                Err(EscalationError::InvalidTransition { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        tracing::info!(closed, "Closed pending billing items");
        Ok(closed)
    }

    async fn notify(&self, item: &NewActionItem) {
        let notice = BillingNotice {
            registration_id: item.registration_id,
            child_name: item.child_name.clone(),
            parent_name: item.guardian.parent_name.clone(),
            email: item.guardian.email.clone(),
            phone: item.guardian.phone.clone(),
            amount_due: item.amount_due,
            camp_type: item.camp_type,
        };

        match tokio::time::timeout(self.notify_timeout, self.notifier.notify_billing(notice)).await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                metrics::counter!("billing_notifications_failed_total").increment(1);
                tracing::warn!(error = %e, "Billing notification failed");
            }
            Err(_) => {
                metrics::counter!("billing_notifications_failed_total").increment(1);
                tracing::warn!(
                    timeout_ms = self.notify_timeout.as_millis() as u64,
                    "Billing notification timed out"
                );
            }
        }
    }

    async fn transition<F>(&self, item_id: AggregateId, action: F) -> Result<BillingActionItem>
    where
        F: FnOnce(&BillingActionItem) -> Result<Vec<ActionItemEvent>>,
    {
        let mut item = self.get(item_id).await?;
        let events = action(&item)?;
        let version = self.append_events(item_id, item.version(), &events).await?;
        item.apply_events(events);
        item.set_version(version);
        Ok(item)
    }

    async fn load(&self, item_id: AggregateId) -> Result<Option<BillingActionItem>> {
        let events = self.store.get_events_for_aggregate(item_id).await?;
        if events.is_empty() {
            return Ok(None);
        }

        let mut item = BillingActionItem::default();
        for envelope in events {
            let event: ActionItemEvent = serde_json::from_value(envelope.payload)?;
            item.apply(event);
            item.set_version(envelope.version);
        }
        Ok(Some(item))
    }

    async fn append_events(
        &self,
        item_id: AggregateId,
        current_version: Version,
        events: &[ActionItemEvent],
    ) -> Result<Version> {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;
        for event in events {
            version = version.next();
            envelopes.push(
                EventEnvelope::builder()
                    .event_type(event.event_type())
                    .aggregate_id(item_id)
                    .aggregate_type(BillingActionItem::aggregate_type())
                    .version(version)
                    .payload(event)?
                    .build()?,
            );
        }

        Ok(self
            .store
            .append(envelopes, AppendOptions::expect_version(current_version))
            .await?)
    }
}

fn covers(item: &BillingActionItem, since: Option<DateTime<Utc>>) -> bool {
    matches!((since, item.created_at()), (Some(since), Some(created)) if created >= since)
}
