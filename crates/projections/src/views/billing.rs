//! Billing queue read model for the back-office worklist.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{CampType, Money};
use escalation::{ActionItemEvent, ActionItemStatus, ActionType};
use event_store::EventEnvelope;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

#[derive(Debug, Clone, Serialize)]
pub struct BillingItemSummary {
    pub item_id: AggregateId,
    pub registration_id: AggregateId,
    pub child_name: String,
    pub parent_name: String,
    pub email: String,
    pub phone: String,
    pub action_type: ActionType,
    pub amount_due: Money,
    pub camp_type: CampType,
    pub status: ActionItemStatus,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct State {
    items: HashMap<AggregateId, BillingItemSummary>,
    order: Vec<AggregateId>,
}

#[derive(Clone, Default)]
pub struct BillingQueueView {
    state: Arc<RwLock<State>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl BillingQueueView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, item_id: AggregateId) -> Option<BillingItemSummary> {
        self.state.read().await.items.get(&item_id).cloned()
    }

    /// All items, oldest first.
    pub async fn all(&self) -> Vec<BillingItemSummary> {
        self.matching(|_| true).await
    }

    pub async fn by_status(&self, status: ActionItemStatus) -> Vec<BillingItemSummary> {
        self.matching(|item| item.status == status).await
    }

    pub async fn by_registration(&self, registration_id: AggregateId) -> Vec<BillingItemSummary> {
        self.matching(|item| item.registration_id == registration_id)
            .await
    }

    pub async fn pending_count(&self) -> usize {
        self.state
            .read()
            .await
            .items
            .values()
            .filter(|item| item.status.is_pending())
            .count()
    }

    async fn matching<F>(&self, predicate: F) -> Vec<BillingItemSummary>
    where
        F: Fn(&BillingItemSummary) -> bool,
    {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|id| state.items.get(id))
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Projection for BillingQueueView {
    fn name(&self) -> &'static str {
        "BillingQueueView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type == "BillingActionItem" {
            let item_event: ActionItemEvent = serde_json::from_value(event.payload.clone())?;
            let id = event.aggregate_id;
            let mut state = self.state.write().await;

            match item_event {
                ActionItemEvent::ActionItemCreated(data) => {
                    if !state.items.contains_key(&id) {
                        state.order.push(id);
                    }
                    state.items.insert(
                        id,
                        BillingItemSummary {
                            item_id: id,
                            registration_id: data.registration_id,
                            child_name: data.child_name,
                            parent_name: data.guardian.parent_name,
                            email: data.guardian.email,
                            phone: data.guardian.phone,
                            action_type: data.action_type,
                            amount_due: data.amount_due,
                            camp_type: data.camp_type,
                            status: ActionItemStatus::Pending,
                            assigned_to: None,
                            notes: data.notes,
                            created_at: data.created_at,
                            completed_at: None,
                        },
                    );
                }
                ActionItemEvent::ActionItemStarted(data) => {
                    if let Some(item) = state.items.get_mut(&id) {
                        item.status = ActionItemStatus::InProgress;
                        item.assigned_to = Some(data.started_by);
                    }
                }
                ActionItemEvent::ActionItemCompleted(data) => {
                    if let Some(item) = state.items.get_mut(&id) {
                        item.status = ActionItemStatus::Completed;
                        item.completed_at = Some(data.completed_at);
                        if data.notes.is_some() {
                            item.notes = data.notes;
                        }
                    }
                }
                ActionItemEvent::ActionItemCancelled(data) => {
                    if let Some(item) = state.items.get_mut(&id) {
                        item.status = ActionItemStatus::Cancelled;
                        item.completed_at = Some(data.cancelled_at);
                    }
                }
            }
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance_to(event);
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = State::default();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for BillingQueueView {
    fn name(&self) -> &'static str {
        "BillingQueueView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.items.len()).unwrap_or(0)
    }
}
