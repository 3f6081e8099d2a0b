//! Attendance commands.

use chrono::{NaiveDate, Utc};
use common::AggregateId;
use serde::Deserialize;

use crate::command::Command;

use super::AttendanceRecord;

/// Check a child in at the gate.
///
/// `attendance_date` defaults to today (UTC).
#[derive(Debug, Clone, Deserialize)]
pub struct CheckIn {
    pub registration_id: AggregateId,
    pub child_name: String,
    pub marked_by: String,
    #[serde(default = "today")]
    pub attendance_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl CheckIn {
    pub fn new(
        registration_id: AggregateId,
        child_name: impl Into<String>,
        marked_by: impl Into<String>,
    ) -> Self {
        Self {
            registration_id,
            child_name: child_name.into(),
            marked_by: marked_by.into(),
            attendance_date: today(),
            notes: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.attendance_date = date;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl Command for CheckIn {
    type Aggregate = AttendanceRecord;

    fn aggregate_id(&self) -> AggregateId {
        AttendanceRecord::record_id(self.registration_id, &self.child_name, self.attendance_date)
    }
}

#[derive(Debug, Clone)]
pub struct CheckOut {
    pub attendance_id: AggregateId,
    pub notes: Option<String>,
}

impl CheckOut {
    pub fn new(attendance_id: AggregateId, notes: Option<String>) -> Self {
        Self {
            attendance_id,
            notes,
        }
    }
}

impl Command for CheckOut {
    type Aggregate = AttendanceRecord;

    fn aggregate_id(&self) -> AggregateId {
        self.attendance_id
    }
}
