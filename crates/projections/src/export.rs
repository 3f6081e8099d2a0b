//! Tabular export of registration detail rows.
//!
//! Rows are handed to a [`DocumentRenderer`]. [`CsvRenderer`] is the only
//! built-in renderer; other formats plug in behind the same trait.

use chrono::{DateTime, Utc};
use domain::{CampType, Money, PaymentMethod, PaymentStatus, RegistrationType};
use serde::Serialize;
use thiserror::Error;

use crate::views::RegistrationSummary;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Renderer failed: {0}")]
    Renderer(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub registration_number: String,
    pub parent_name: String,
    pub camp_type: CampType,
    pub child_count: usize,
    pub total_amount: Money,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub registration_type: RegistrationType,
    pub created_at: DateTime<Utc>,
}

impl From<&RegistrationSummary> for ExportRow {
    fn from(row: &RegistrationSummary) -> Self {
        Self {
            registration_number: row.registration_number.clone(),
            parent_name: row.parent_name.clone(),
            camp_type: row.camp_type,
            child_count: row.child_count(),
            total_amount: row.total_amount,
            payment_status: row.payment_status,
            payment_method: row.payment_method,
            registration_type: row.registration_type,
            created_at: row.created_at,
        }
    }
}

/// Turns export rows into a downloadable document.
pub trait DocumentRenderer: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn file_extension(&self) -> &'static str;

    fn render(&self, rows: &[ExportRow]) -> Result<Vec<u8>, ExportError>;
}

const CSV_HEADER: [&str; 9] = [
    "registration_number",
    "parent_name",
    "camp_type",
    "child_count",
    "total_amount",
    "payment_status",
    "payment_method",
    "registration_type",
    "created_at",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRenderer;

impl DocumentRenderer for CsvRenderer {
    fn content_type(&self) -> &'static str {
        "text/csv; charset=utf-8"
    }

    fn file_extension(&self) -> &'static str {
        "csv"
    }

    fn render(&self, rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;

        for row in rows {
            writer.write_record(&[
                row.registration_number.clone(),
                row.parent_name.clone(),
                row.camp_type.to_string(),
                row.child_count.to_string(),
                row.total_amount.to_string(),
                row.payment_status.to_string(),
                row.payment_method.to_string(),
                row.registration_type.to_string(),
                row.created_at.to_rfc3339(),
            ])?;
        }

        writer.flush()?;
        writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))
    }
}
