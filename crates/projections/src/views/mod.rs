//! Read model views.

mod attendance;
mod billing;
mod registrations;

pub use attendance::{AttendanceRow, AttendanceSummary, AttendanceView};
pub use billing::{BillingItemSummary, BillingQueueView};
pub use registrations::{RegistrationSummary, RegistrationsView};
