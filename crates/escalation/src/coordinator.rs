//! Gate coordination: resolve a registration, record attendance, escalate billing.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use common::AggregateId;
use domain::{
    Aggregate, AttendanceError, AttendanceRecord, AttendanceService, CampCatalog, CheckIn,
    CheckOut, DomainError, PaymentMethod, PaymentStatus, Registration, RegistrationService,
    UpdatePaymentStatus,
};
use event_store::EventStore;
use serde::{Deserialize, Serialize};

use crate::error::{EscalationError, Result};
use crate::notifier::BillingNotifier;
use crate::queue::{BillingQueue, Escalation};

/// A scanned identity token plus the child being admitted.
#[derive(Debug, Clone, Deserialize)]
pub struct GateScan {
    pub token: String,
    pub child_name: String,
    pub marked_by: String,
    #[serde(default)]
    pub attendance_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GateCheckIn {
    pub registration_id: AggregateId,
    pub attendance_id: AggregateId,
    pub child_name: String,
    pub attendance_date: Option<NaiveDate>,
    pub payment_status: PaymentStatus,
    pub billing: Escalation,
}

#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    pub registration_id: AggregateId,
    pub payment_status: PaymentStatus,
    pub items_closed: usize,
}

/// Runs the gate flow over one event store.
///
/// Check-in is synchronous: when it returns, the attendance record exists
/// and, for an unpaid registration, so does a pending billing item.
pub struct GateCoordinator<S, N>
where
    S: EventStore,
    N: BillingNotifier,
{
    registrations: RegistrationService<S>,
    attendance: AttendanceService<S>,
    queue: BillingQueue<S, N>,
}

impl<S, N> GateCoordinator<S, N>
where
    S: EventStore + Clone,
    N: BillingNotifier,
{
    pub fn new(store: S, catalog: Arc<CampCatalog>, notifier: N) -> Self {
        Self::from_parts(
            RegistrationService::new(store.clone(), catalog),
            AttendanceService::new(store.clone()),
            BillingQueue::new(store, notifier),
        )
    }

    pub fn from_parts(
        registrations: RegistrationService<S>,
        attendance: AttendanceService<S>,
        queue: BillingQueue<S, N>,
    ) -> Self {
        Self {
            registrations,
            attendance,
            queue,
        }
    }

    pub fn registrations(&self) -> &RegistrationService<S> {
        &self.registrations
    }

    pub fn attendance(&self) -> &AttendanceService<S> {
        &self.attendance
    }

    pub fn queue(&self) -> &BillingQueue<S, N> {
        &self.queue
    }

    #[tracing::instrument(skip(self, cmd), fields(registration_id = %cmd.registration_id, child = %cmd.child_name))]
    pub async fn check_in(&self, cmd: CheckIn) -> Result<GateCheckIn> {
        let started = Instant::now();
        let registration = self.registrations.get_by_id(cmd.registration_id).await?;
        let result = self.admit(&registration, cmd).await;
        metrics::histogram!("checkin_duration_seconds").record(started.elapsed().as_secs_f64());
        result
    }

    /// Same as [`check_in`](Self::check_in), starting from a scanned token.
    /// Tokens that do not decode are reported as an unknown registration.
    #[tracing::instrument(skip(self, scan), fields(child = %scan.child_name))]
    pub async fn check_in_by_token(&self, scan: GateScan) -> Result<GateCheckIn> {
        let started = Instant::now();
        let registration = self.registrations.resolve_by_token(&scan.token).await?;
        let registration_id = registration
            .id()
            .ok_or(EscalationError::MissingField("registration_id"))?;

        let mut cmd = CheckIn::new(registration_id, scan.child_name, scan.marked_by);
        if let Some(date) = scan.attendance_date {
            cmd = cmd.on(date);
        }
        if let Some(notes) = scan.notes {
            cmd = cmd.with_notes(notes);
        }

        let result = self.admit(&registration, cmd).await;
        metrics::histogram!("checkin_duration_seconds").record(started.elapsed().as_secs_f64());
        result
    }

    pub async fn check_out(&self, cmd: CheckOut) -> Result<AttendanceRecord> {
        Ok(self.attendance.check_out(cmd).await?)
    }

    /// Records full payment taken at the gate and closes every pending
    /// billing item for the registration.
    #[tracing::instrument(skip(self, reference))]
    pub async fn settle_at_gate(
        &self,
        registration_id: AggregateId,
        method: PaymentMethod,
        reference: Option<String>,
        staff_id: &str,
    ) -> Result<Settlement> {
        let mut update = UpdatePaymentStatus::new(registration_id, PaymentStatus::Paid, method);
        if let Some(reference) = reference {
            update = update.with_reference(reference);
        }
        let registration = self.registrations.update_payment_status(update).await?;

        let items_closed = self
            .queue
            .mark_completed_by_registration(
                registration_id,
                staff_id,
                Some("Settled at gate".to_string()),
            )
            .await?;

        Ok(Settlement {
            registration_id,
            payment_status: registration.payment_status(),
            items_closed,
        })
    }

    async fn admit(&self, registration: &Registration, cmd: CheckIn) -> Result<GateCheckIn> {
        let record_id =
            AttendanceRecord::record_id(cmd.registration_id, &cmd.child_name, cmd.attendance_date);
        let record = match self.attendance.check_in(registration, cmd).await {
            Ok(record) => record,
            Err(e @ DomainError::Attendance(AttendanceError::AlreadyCheckedIn { .. })) => {
                self.recover_escalation(registration, record_id).await?;
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        let (Some(registration_id), Some(attendance_id)) = (record.registration_id(), record.id())
        else {
            return Err(EscalationError::MissingField("attendance_id"));
        };
        let billing = self
            .queue
            .escalate(registration, record.child_name())
            .await?;

        Ok(GateCheckIn {
            registration_id,
            attendance_id,
            child_name: record.child_name().to_string(),
            attendance_date: record.attendance_date(),
            payment_status: registration.payment_status(),
            billing,
        })
    }

    /// A check-in whose escalation failed is only seen again when the child
    /// is scanned a second time. Raise the missing item then.
    async fn recover_escalation(
        &self,
        registration: &Registration,
        record_id: AggregateId,
    ) -> Result<()> {
        if registration.payment_status().is_paid() {
            return Ok(());
        }
        let Some(record) = self.attendance.find(record_id).await? else {
            return Ok(());
        };
        if let Escalation::Created(item) = self.queue.escalate_recorded(registration, &record).await? {
            tracing::warn!(
                item_id = ?item.id(),
                attendance_id = %record_id,
                "Raised billing item missing for an earlier check-in"
            );
        }
        Ok(())
    }
}
