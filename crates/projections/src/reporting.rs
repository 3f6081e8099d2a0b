//! Revenue and enrolment reporting over the registrations read model.

use chrono::NaiveDate;
use domain::{CampType, Money, PaymentStatus, RegistrationStatus};
use serde::{Deserialize, Serialize};

use crate::export::ExportRow;
use crate::views::RegistrationSummary;

/// Filters on the registration's creation date (inclusive) and camp type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub camp_type: Option<CampType>,
}

impl ReportFilter {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            camp_type: None,
        }
    }

    pub fn for_camp_type(mut self, camp_type: CampType) -> Self {
        self.camp_type = Some(camp_type);
        self
    }

    pub fn matches(&self, row: &RegistrationSummary) -> bool {
        let created = row.created_at.date_naive();
        self.from.is_none_or(|from| created >= from)
            && self.to.is_none_or(|to| created <= to)
            && self.camp_type.is_none_or(|camp_type| row.camp_type == camp_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentStatusTotals {
    pub payment_status: PaymentStatus,
    pub registrations: usize,
    pub billed: Money,
    pub collected: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampTypeTotals {
    pub camp_type: CampType,
    pub registrations: usize,
    pub children: usize,
    pub billed: Money,
}

/// Aggregates for a filtered set of registrations.
///
/// Cancelled registrations are listed in `rows` and counted in `cancelled`
/// but contribute nothing to the money totals or the per-type counts.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationReport {
    pub filter: ReportFilter,
    pub registrations: usize,
    pub children: usize,
    pub cancelled: usize,
    pub total_billed: Money,
    pub total_collected: Money,
    pub total_outstanding: Money,
    pub by_payment_status: Vec<PaymentStatusTotals>,
    pub by_camp_type: Vec<CampTypeTotals>,
    pub rows: Vec<RegistrationSummary>,
}

impl RegistrationReport {
    pub fn build(filter: ReportFilter, rows: Vec<RegistrationSummary>) -> Self {
        let mut by_payment_status: Vec<_> = PaymentStatus::ALL
            .into_iter()
            .map(|payment_status| PaymentStatusTotals {
                payment_status,
                registrations: 0,
                billed: Money::zero(),
                collected: Money::zero(),
            })
            .collect();
        let mut by_camp_type: Vec<_> = CampType::ALL
            .into_iter()
            .map(|camp_type| CampTypeTotals {
                camp_type,
                registrations: 0,
                children: 0,
                billed: Money::zero(),
            })
            .collect();

        let mut report = Self {
            filter,
            registrations: 0,
            children: 0,
            cancelled: 0,
            total_billed: Money::zero(),
            total_collected: Money::zero(),
            total_outstanding: Money::zero(),
            by_payment_status: Vec::new(),
            by_camp_type: Vec::new(),
            rows: Vec::new(),
        };

        for row in &rows {
            if row.status == RegistrationStatus::Cancelled {
                report.cancelled += 1;
                continue;
            }
            report.registrations += 1;
            report.children += row.child_count();
            report.total_billed += row.total_amount;
            report.total_collected += row.amount_paid;

            if let Some(totals) = by_payment_status
                .iter_mut()
                .find(|t| t.payment_status == row.payment_status)
            {
                totals.registrations += 1;
                totals.billed += row.total_amount;
                totals.collected += row.amount_paid;
            }
            if let Some(totals) = by_camp_type
                .iter_mut()
                .find(|t| t.camp_type == row.camp_type)
            {
                totals.registrations += 1;
                totals.children += row.child_count();
                totals.billed += row.total_amount;
            }
        }

        report.total_outstanding = report.total_billed.saturating_sub(report.total_collected);
        report.by_payment_status = by_payment_status;
        report.by_camp_type = by_camp_type;
        report.rows = rows;
        report
    }

    pub fn payment_status(&self, status: PaymentStatus) -> Option<&PaymentStatusTotals> {
        self.by_payment_status
            .iter()
            .find(|t| t.payment_status == status)
    }

    pub fn camp_type(&self, camp_type: CampType) -> Option<&CampTypeTotals> {
        self.by_camp_type.iter().find(|t| t.camp_type == camp_type)
    }

    /// Detail rows in export shape, cancelled registrations included.
    pub fn export_rows(&self) -> Vec<ExportRow> {
        self.rows.iter().map(ExportRow::from).collect()
    }
}
