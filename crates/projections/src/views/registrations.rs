//! Registrations read model: one row per registration, current state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{
    CampType, Money, PaymentMethod, PaymentStatus, RegistrationEvent, RegistrationStatus,
    RegistrationType,
};
use event_store::EventEnvelope;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;
use crate::reporting::{RegistrationReport, ReportFilter};

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationSummary {
    pub registration_id: AggregateId,
    pub registration_number: String,
    pub camp_type: CampType,
    pub parent_name: String,
    pub email: String,
    pub phone: String,
    pub child_names: Vec<String>,
    pub total_amount: Money,
    pub amount_paid: Money,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub registration_type: RegistrationType,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RegistrationSummary {
    pub fn child_count(&self) -> usize {
        self.child_names.len()
    }
}

#[derive(Debug, Default)]
struct State {
    rows: HashMap<AggregateId, RegistrationSummary>,
    /// Creation order.
    order: Vec<AggregateId>,
}

/// Every registration with its latest payment and lifecycle status.
#[derive(Clone, Default)]
pub struct RegistrationsView {
    state: Arc<RwLock<State>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl RegistrationsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, registration_id: AggregateId) -> Option<RegistrationSummary> {
        self.state.read().await.rows.get(&registration_id).cloned()
    }

    /// All registrations, oldest first.
    pub async fn all(&self) -> Vec<RegistrationSummary> {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|id| state.rows.get(id))
            .cloned()
            .collect()
    }

    pub async fn by_camp_type(&self, camp_type: CampType) -> Vec<RegistrationSummary> {
        self.matching(|row| row.camp_type == camp_type).await
    }

    pub async fn by_payment_status(&self, status: PaymentStatus) -> Vec<RegistrationSummary> {
        self.matching(|row| row.payment_status == status).await
    }

    pub async fn matching<F>(&self, predicate: F) -> Vec<RegistrationSummary>
    where
        F: Fn(&RegistrationSummary) -> bool,
    {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|id| state.rows.get(id))
            .filter(|row| predicate(row))
            .cloned()
            .collect()
    }

    pub async fn report(&self, filter: &ReportFilter) -> RegistrationReport {
        let rows = self.matching(|row| filter.matches(row)).await;
        RegistrationReport::build(filter.clone(), rows)
    }
}

#[async_trait]
impl Projection for RegistrationsView {
    fn name(&self) -> &'static str {
        "RegistrationsView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type == "Registration" {
            let registration_event: RegistrationEvent =
                serde_json::from_value(event.payload.clone())?;
            let id = event.aggregate_id;
            let mut state = self.state.write().await;

            match registration_event {
                RegistrationEvent::RegistrationCreated(data) => {
                    if !state.rows.contains_key(&id) {
                        state.order.push(id);
                    }
                    state.rows.insert(
                        id,
                        RegistrationSummary {
                            registration_id: id,
                            registration_number: data.registration_number,
                            camp_type: data.camp_type,
                            parent_name: data.guardian.parent_name,
                            email: data.guardian.email,
                            phone: data.guardian.phone,
                            child_names: data.children.into_iter().map(|c| c.child_name).collect(),
                            total_amount: data.total_amount,
                            amount_paid: data.amount_paid,
                            payment_status: data.payment_status,
                            payment_method: data.payment_method,
                            payment_reference: data.payment_reference,
                            registration_type: data.registration_type,
                            status: RegistrationStatus::Active,
                            created_at: data.created_at,
                            updated_at: data.created_at,
                        },
                    );
                }
                RegistrationEvent::PaymentStatusUpdated(data) => {
                    if let Some(row) = state.rows.get_mut(&id) {
                        row.payment_status = data.payment_status;
                        row.payment_method = data.payment_method;
                        row.payment_reference = data.payment_reference;
                        row.amount_paid = data.amount_paid;
                        row.updated_at = data.updated_at;
                    }
                }
                RegistrationEvent::RegistrationCancelled(data) => {
                    if let Some(row) = state.rows.get_mut(&id) {
                        row.status = RegistrationStatus::Cancelled;
                        row.updated_at = data.cancelled_at;
                    }
                }
                RegistrationEvent::RegistrationCompleted(data) => {
                    if let Some(row) = state.rows.get_mut(&id) {
                        row.status = RegistrationStatus::Completed;
                        row.updated_at = data.completed_at;
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

impl ReadModel for RegistrationsView {
    fn name(&self) -> &'static str {
        "RegistrationsView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.rows.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{created_event, envelope};
    use domain::DomainEvent;

    #[tokio::test]
    async fn tracks_payment_and_status() {
        let view = RegistrationsView::new();
        let id = AggregateId::new();
        view.handle(&envelope(id, "Registration", 1, &created_event(id, CampType::DayCamp)))
            .await
            .unwrap();

        let paid = RegistrationEvent::payment_status_updated(
            PaymentStatus::Paid,
            PaymentMethod::Card,
            Some("TXN-9".into()),
            Money::from_units(5000),
            Utc::now(),
        );
        view.handle(&envelope(id, "Registration", 2, &paid))
            .await
            .unwrap();
        let cancelled = RegistrationEvent::cancelled(None, Utc::now());
        assert_eq!(cancelled.event_type(), "RegistrationCancelled");
        view.handle(&envelope(id, "Registration", 3, &cancelled))
            .await
            .unwrap();

        let row = view.get(id).await.unwrap();
        assert_eq!(row.payment_status, PaymentStatus::Paid);
        assert_eq!(row.amount_paid, Money::from_units(5000));
        assert_eq!(row.status, RegistrationStatus::Cancelled);
        assert_eq!(row.child_count(), 1);
    }

    #[tokio::test]
    async fn lists_in_creation_order_and_filters() {
        let view = RegistrationsView::new();
        let first = AggregateId::new();
        let second = AggregateId::new();
        view.handle(&envelope(first, "Registration", 1, &created_event(first, CampType::DayCamp)))
            .await
            .unwrap();
        view.handle(&envelope(
            second,
            "Registration",
            1,
            &created_event(second, CampType::LittleForest),
        ))
        .await
        .unwrap();

        let all: Vec<_> = view.all().await.into_iter().map(|r| r.registration_id).collect();
        assert_eq!(all, vec![first, second]);
        assert_eq!(view.by_camp_type(CampType::LittleForest).await.len(), 1);
        assert_eq!(view.by_payment_status(PaymentStatus::Unpaid).await.len(), 2);
        assert_eq!(ReadModel::count(&view), 2);
    }

    #[tokio::test]
    async fn ignores_other_streams_but_advances() {
        let view = RegistrationsView::new();
        let mut other = envelope(
            AggregateId::new(),
            "AttendanceRecord",
            1,
            &serde_json::json!({"type": "ChildCheckedOut", "data": {}}),
        );
        other.position = 4;
        view.handle(&other).await.unwrap();
        assert!(view.all().await.is_empty());
        assert_eq!(view.position().await, ProjectionPosition::at(4));

        view.reset().await.unwrap();
        assert_eq!(view.position().await, ProjectionPosition::zero());
    }
}
