//! Attendance tracker service.

use chrono::{NaiveDate, Utc};
use common::AggregateId;
use event_store::{EventStore, EventStoreExt};

use crate::aggregate::Aggregate;
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::registration::Registration;

use super::{AttendanceError, AttendanceRecord, CheckIn, CheckOut};

pub struct AttendanceService<S: EventStore> {
    handler: CommandHandler<S, AttendanceRecord>,
}

impl<S: EventStore> AttendanceService<S> {
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    pub async fn has_checked_in(
        &self,
        registration_id: AggregateId,
        child_name: &str,
        date: NaiveDate,
    ) -> Result<bool, DomainError> {
        let record_id = AttendanceRecord::record_id(registration_id, child_name, date);
        Ok(self.handler.store().aggregate_exists(record_id).await?)
    }

    pub async fn has_checked_in_today(
        &self,
        registration_id: AggregateId,
        child_name: &str,
    ) -> Result<bool, DomainError> {
        self.has_checked_in(registration_id, child_name, Utc::now().date_naive())
            .await
    }

    /// Checks a child of `registration` in for `cmd.attendance_date`.
    ///
    /// The existence pre-check only produces the friendly error early. Two
    /// stations racing past it still collide on the record's stream and the
    /// loser gets the same `AlreadyCheckedIn`.
    #[tracing::instrument(skip(self, registration, cmd), fields(registration_id = %cmd.registration_id, child = %cmd.child_name, date = %cmd.attendance_date))]
    pub async fn check_in(
        &self,
        registration: &Registration,
        cmd: CheckIn,
    ) -> Result<AttendanceRecord, DomainError> {
        let registration_id = registration
            .id()
            .filter(|id| *id == cmd.registration_id)
            .ok_or_else(|| DomainError::not_found("Registration", cmd.registration_id))?;
        if !registration.status().is_active() {
            return Err(AttendanceError::RegistrationNotActive {
                status: registration.status(),
            }
            .into());
        }
        let child = registration
            .child(&cmd.child_name)
            .ok_or_else(|| AttendanceError::UnknownChild {
                child_name: cmd.child_name.clone(),
            })?;
        let child_name = child.child_name.clone();
        let date = cmd.attendance_date;
        let already_checked_in = || {
            metrics::counter!("checkin_conflicts_total").increment(1);
            DomainError::from(AttendanceError::AlreadyCheckedIn {
                child_name: child_name.clone(),
                date,
            })
        };

        if self
            .has_checked_in(registration_id, &child_name, date)
            .await?
        {
            return Err(already_checked_in());
        }

        let record_id = AttendanceRecord::record_id(registration_id, &child_name, date);
        let result = self
            .handler
            .execute(record_id, |record| {
                record.check_in(
                    registration_id,
                    &child_name,
                    date,
                    &cmd.marked_by,
                    cmd.notes.clone(),
                    Utc::now(),
                )
            })
            .await;

        match result {
            Ok(result) => {
                metrics::counter!("checkins_total").increment(1);
                tracing::info!(attendance_id = %record_id, "Child checked in");
                Ok(result.aggregate)
            }
            Err(DomainError::EventStore(e)) if e.is_conflict() => {
                tracing::warn!(attendance_id = %record_id, "Lost check-in race");
                Err(already_checked_in())
            }
            Err(DomainError::Attendance(AttendanceError::AlreadyCheckedIn { .. })) => {
                Err(already_checked_in())
            }
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self, cmd), fields(attendance_id = %cmd.attendance_id))]
    pub async fn check_out(&self, cmd: CheckOut) -> Result<AttendanceRecord, DomainError> {
        let attendance_id = cmd.attendance_id;
        let result = self
            .handler
            .execute(attendance_id, |record| {
                record.check_out(cmd.notes.clone(), Utc::now())
            })
            .await;

        match result {
            Ok(CommandResult { aggregate, .. }) => {
                tracing::info!("Child checked out");
                Ok(aggregate)
            }
            Err(DomainError::Attendance(AttendanceError::NotCheckedIn)) => {
                Err(DomainError::not_found("AttendanceRecord", attendance_id))
            }
            Err(DomainError::EventStore(e)) if e.is_conflict() => {
                Err(AttendanceError::AlreadyCheckedOut { attendance_id }.into())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn find(&self, attendance_id: AggregateId) -> Result<Option<AttendanceRecord>, DomainError> {
        self.handler.load_existing(attendance_id).await
    }

    pub async fn get(&self, attendance_id: AggregateId) -> Result<AttendanceRecord, DomainError> {
        self.find(attendance_id)
            .await?
            .ok_or_else(|| DomainError::not_found("AttendanceRecord", attendance_id))
    }
}
