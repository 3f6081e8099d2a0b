//! Daily attendance read model.
//!
//! Attendance records only carry the registration id, so the view also
//! follows registration streams to show the parent, camp and payment state
//! next to each check-in.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::AggregateId;
use domain::{AttendanceEvent, AttendanceState, CampType, PaymentStatus, RegistrationEvent};
use event_store::EventEnvelope;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRow {
    pub attendance_id: AggregateId,
    pub registration_id: AggregateId,
    pub registration_number: Option<String>,
    pub child_name: String,
    pub parent_name: Option<String>,
    pub camp_type: Option<CampType>,
    pub payment_status: Option<PaymentStatus>,
    pub attendance_date: NaiveDate,
    pub state: AttendanceState,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub marked_by: String,
    pub notes: Option<String>,
}

/// Head counts for one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub date: Option<NaiveDate>,
    pub total: usize,
    /// Children currently on site.
    pub checked_in: usize,
    pub checked_out: usize,
    /// Check-ins whose registration is not fully paid.
    pub unpaid: usize,
    pub by_camp_type: BTreeMap<CampType, usize>,
}

#[derive(Debug, Clone)]
struct RegistrationContext {
    registration_number: String,
    parent_name: String,
    camp_type: CampType,
    payment_status: PaymentStatus,
}

#[derive(Debug, Default)]
struct State {
    rows: HashMap<AggregateId, AttendanceRow>,
    by_date: BTreeMap<NaiveDate, Vec<AggregateId>>,
    registrations: HashMap<AggregateId, RegistrationContext>,
}

impl State {
    fn apply_context(&mut self, registration_id: AggregateId) {
        let Some(context) = self.registrations.get(&registration_id) else {
            return;
        };
        for row in self
            .rows
            .values_mut()
            .filter(|row| row.registration_id == registration_id)
        {
            row.registration_number = Some(context.registration_number.clone());
            row.parent_name = Some(context.parent_name.clone());
            row.camp_type = Some(context.camp_type);
            row.payment_status = Some(context.payment_status);
        }
    }
}

#[derive(Clone, Default)]
pub struct AttendanceView {
    state: Arc<RwLock<State>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl AttendanceView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, attendance_id: AggregateId) -> Option<AttendanceRow> {
        self.state.read().await.rows.get(&attendance_id).cloned()
    }

    /// Records for `date`, in check-in order.
    pub async fn by_date(&self, date: NaiveDate) -> Vec<AttendanceRow> {
        let state = self.state.read().await;
        let mut rows: Vec<_> = state
            .by_date
            .get(&date)
            .into_iter()
            .flatten()
            .filter_map(|id| state.rows.get(id))
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.check_in_time);
        rows
    }

    pub async fn by_registration(&self, registration_id: AggregateId) -> Vec<AttendanceRow> {
        let state = self.state.read().await;
        let mut rows: Vec<_> = state
            .rows
            .values()
            .filter(|row| row.registration_id == registration_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.attendance_date, row.check_in_time));
        rows
    }

    pub async fn summary(&self, date: NaiveDate) -> AttendanceSummary {
        let rows = self.by_date(date).await;
        let mut summary = AttendanceSummary {
            date: Some(date),
            total: rows.len(),
            ..AttendanceSummary::default()
        };

        for row in &rows {
            match row.state {
                AttendanceState::CheckedOut => summary.checked_out += 1,
                _ => summary.checked_in += 1,
            }
            if !row.payment_status.is_some_and(|s| s.is_paid()) {
                summary.unpaid += 1;
            }
            if let Some(camp_type) = row.camp_type {
                *summary.by_camp_type.entry(camp_type).or_default() += 1;
            }
        }
        summary
    }

    async fn apply_registration(&self, id: AggregateId, event: RegistrationEvent) {
        let mut state = self.state.write().await;
        match event {
            RegistrationEvent::RegistrationCreated(data) => {
                state.registrations.insert(
                    id,
                    RegistrationContext {
                        registration_number: data.registration_number,
                        parent_name: data.guardian.parent_name,
                        camp_type: data.camp_type,
                        payment_status: data.payment_status,
                    },
                );
            }
            RegistrationEvent::PaymentStatusUpdated(data) => {
                if let Some(context) = state.registrations.get_mut(&id) {
                    context.payment_status = data.payment_status;
                }
            }
            RegistrationEvent::RegistrationCancelled(_)
            | RegistrationEvent::RegistrationCompleted(_) => return,
        }
        state.apply_context(id);
    }

    async fn apply_attendance(&self, id: AggregateId, event: AttendanceEvent) {
        let mut state = self.state.write().await;
        match event {
            AttendanceEvent::ChildCheckedIn(data) => {
                let registration_id = data.registration_id;
                state
                    .by_date
                    .entry(data.attendance_date)
                    .or_default()
                    .push(id);
                state.rows.insert(
                    id,
                    AttendanceRow {
                        attendance_id: id,
                        registration_id,
                        registration_number: None,
                        child_name: data.child_name,
                        parent_name: None,
                        camp_type: None,
                        payment_status: None,
                        attendance_date: data.attendance_date,
                        state: AttendanceState::CheckedIn,
                        check_in_time: data.check_in_time,
                        check_out_time: None,
                        marked_by: data.marked_by,
                        notes: data.notes,
                    },
                );
                state.apply_context(registration_id);
            }
            AttendanceEvent::ChildCheckedOut(data) => {
                if let Some(row) = state.rows.get_mut(&id) {
                    row.state = AttendanceState::CheckedOut;
                    row.check_out_time = Some(data.check_out_time);
                }
            }
        }
    }
}

#[async_trait]
impl Projection for AttendanceView {
    fn name(&self) -> &'static str {
        "AttendanceView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        match event.aggregate_type.as_str() {
            "Registration" => {
                let registration_event: RegistrationEvent =
                    serde_json::from_value(event.payload.clone())?;
                self.apply_registration(event.aggregate_id, registration_event)
                    .await;
            }
            "AttendanceRecord" => {
                let attendance_event: AttendanceEvent =
                    serde_json::from_value(event.payload.clone())?;
                self.apply_attendance(event.aggregate_id, attendance_event)
                    .await;
            }
            _ => {}
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

impl ReadModel for AttendanceView {
    fn name(&self) -> &'static str {
        "AttendanceView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.rows.len()).unwrap_or(0)
    }
}
