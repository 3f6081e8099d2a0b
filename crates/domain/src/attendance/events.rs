//! Attendance events.

use chrono::{DateTime, NaiveDate, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AttendanceEvent {
    ChildCheckedIn(ChildCheckedInData),
    ChildCheckedOut(ChildCheckedOutData),
}

impl DomainEvent for AttendanceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AttendanceEvent::ChildCheckedIn(_) => "ChildCheckedIn",
            AttendanceEvent::ChildCheckedOut(_) => "ChildCheckedOut",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildCheckedInData {
    pub attendance_id: AggregateId,
    pub registration_id: AggregateId,
    pub child_name: String,
    pub attendance_date: NaiveDate,
    pub check_in_time: DateTime<Utc>,
    pub marked_by: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildCheckedOutData {
    pub check_out_time: DateTime<Utc>,
    pub notes: Option<String>,
}

impl AttendanceEvent {
    pub fn checked_out(check_out_time: DateTime<Utc>, notes: Option<String>) -> Self {
        AttendanceEvent::ChildCheckedOut(ChildCheckedOutData {
            check_out_time,
            notes,
        })
    }
}
