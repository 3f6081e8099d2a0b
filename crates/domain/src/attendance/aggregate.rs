//! Attendance record aggregate.

use chrono::{DateTime, NaiveDate, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::registration::child_key;

use super::{AttendanceError, AttendanceEvent, ChildCheckedInData};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceState {
    #[default]
    Absent,
    CheckedIn,
    CheckedOut,
}

/// A single child's presence on a single camp day.
#[derive(Debug, Clone, Default)]
pub struct AttendanceRecord {
    id: Option<AggregateId>,
    version: Version,
    registration_id: Option<AggregateId>,
    child_name: String,
    attendance_date: Option<NaiveDate>,
    check_in_time: Option<DateTime<Utc>>,
    check_out_time: Option<DateTime<Utc>>,
    marked_by: String,
    notes: Option<String>,
    check_out_notes: Option<String>,
}

impl Aggregate for AttendanceRecord {
    type Event = AttendanceEvent;
    type Error = AttendanceError;

    fn aggregate_type() -> &'static str {
        "AttendanceRecord"
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
            AttendanceEvent::ChildCheckedIn(data) => {
                self.id = Some(data.attendance_id);
                self.registration_id = Some(data.registration_id);
                self.child_name = data.child_name;
                self.attendance_date = Some(data.attendance_date);
                self.check_in_time = Some(data.check_in_time);
                self.marked_by = data.marked_by;
                self.notes = data.notes;
            }
            AttendanceEvent::ChildCheckedOut(data) => {
                self.check_out_time = Some(data.check_out_time);
                self.check_out_notes = data.notes;
            }
        }
    }
}

impl AttendanceRecord {
    /// Stream id of the record for `(registration, child, date)`.
    ///
    /// Child names are compared trimmed and case-insensitively.
    pub fn record_id(registration_id: AggregateId, child_name: &str, date: NaiveDate) -> AggregateId {
        let child = child_key(child_name);
        AggregateId::derive("attendance", &format!("{registration_id}/{child}/{date}"))
    }

    pub fn state(&self) -> AttendanceState {
        match (self.check_in_time, self.check_out_time) {
            (None, _) => AttendanceState::Absent,
            (Some(_), None) => AttendanceState::CheckedIn,
            (Some(_), Some(_)) => AttendanceState::CheckedOut,
        }
    }

    pub fn registration_id(&self) -> Option<AggregateId> {
        self.registration_id
    }

    pub fn child_name(&self) -> &str {
        &self.child_name
    }

    pub fn attendance_date(&self) -> Option<NaiveDate> {
        self.attendance_date
    }

    pub fn check_in_time(&self) -> Option<DateTime<Utc>> {
        self.check_in_time
    }

    pub fn check_out_time(&self) -> Option<DateTime<Utc>> {
        self.check_out_time
    }

    pub fn marked_by(&self) -> &str {
        &self.marked_by
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn check_out_notes(&self) -> Option<&str> {
        self.check_out_notes.as_deref()
    }

    pub fn check_in(
        &self,
        registration_id: AggregateId,
        child_name: &str,
        attendance_date: NaiveDate,
        marked_by: &str,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AttendanceEvent>, AttendanceError> {
        if self.id.is_some() {
            return Err(AttendanceError::AlreadyCheckedIn {
                child_name: child_name.to_string(),
                date: attendance_date,
            });
        }
        if marked_by.trim().is_empty() {
            return Err(AttendanceError::MissingField("marked_by"));
        }

        Ok(vec![AttendanceEvent::ChildCheckedIn(ChildCheckedInData {
            attendance_id: Self::record_id(registration_id, child_name, attendance_date),
            registration_id,
            child_name: child_name.to_string(),
            attendance_date,
            check_in_time: now,
            marked_by: marked_by.trim().to_string(),
            notes,
        })])
    }

    /// A second check-out is an error, never a timestamp update.
    pub fn check_out(
        &self,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AttendanceEvent>, AttendanceError> {
        match (self.id, self.state()) {
            (None, _) | (_, AttendanceState::Absent) => Err(AttendanceError::NotCheckedIn),
            (Some(attendance_id), AttendanceState::CheckedOut) => {
                Err(AttendanceError::AlreadyCheckedOut { attendance_id })
            }
            (Some(_), AttendanceState::CheckedIn) => {
                Ok(vec![AttendanceEvent::checked_out(now, notes)])
            }
        }
    }
}
