//! Read side of the camp booking workspace.
//!
//! - [`Projection`] folds the event log into a read model
//! - [`ProjectionProcessor`] feeds events from the store to projections
//! - Views: [`RegistrationsView`], [`AttendanceView`], [`BillingQueueView`]
//! - [`RegistrationReport`] aggregates registrations; [`export`] renders them

pub mod error;
pub mod export;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod reporting;
pub mod views;

#[cfg(test)]
mod test_support;

pub use error::{ProjectionError, Result};
pub use export::{CsvRenderer, DocumentRenderer, ExportError, ExportRow};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use reporting::{CampTypeTotals, PaymentStatusTotals, RegistrationReport, ReportFilter};
pub use views::{
    AttendanceRow, AttendanceSummary, AttendanceView, BillingItemSummary, BillingQueueView,
    RegistrationSummary, RegistrationsView,
};
