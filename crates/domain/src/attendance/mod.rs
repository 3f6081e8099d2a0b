//! Attendance tracking: one record per child per camp day.
//!
//! A record moves `absent -> checked_in -> checked_out` and never back. The
//! record's stream id is derived from `(registration, child, date)`, so the
//! store itself refuses a second check-in for the same key.

mod aggregate;
mod commands;
mod events;
mod service;

pub use aggregate::{AttendanceRecord, AttendanceState};
pub use commands::{CheckIn, CheckOut};
pub use events::{AttendanceEvent, ChildCheckedInData, ChildCheckedOutData};
pub use service::AttendanceService;

use chrono::NaiveDate;
use common::AggregateId;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::registration::RegistrationStatus;

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("{child_name} is already checked in for {date}")]
    AlreadyCheckedIn { child_name: String, date: NaiveDate },

    #[error("Attendance record {attendance_id} is already checked out")]
    AlreadyCheckedOut { attendance_id: AggregateId },

    #[error("Attendance record not found")]
    NotCheckedIn,

    #[error("Cannot check in against a {status} registration")]
    RegistrationNotActive { status: RegistrationStatus },

    #[error("{child_name} is not on this registration")]
    UnknownChild { child_name: String },

    #[error("Field {0} must not be empty")]
    MissingField(&'static str),
}

impl AttendanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AttendanceError::AlreadyCheckedIn { .. }
            | AttendanceError::AlreadyCheckedOut { .. }
            | AttendanceError::RegistrationNotActive { .. } => ErrorKind::Conflict,
            AttendanceError::NotCheckedIn => ErrorKind::NotFound,
            AttendanceError::UnknownChild { .. } | AttendanceError::MissingField(_) => {
                ErrorKind::Validation
            }
        }
    }
}
