//! Pricing of date and session selections against a session catalog.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::{CampType, SessionCatalog, SessionType};
use crate::money::Money;
use crate::registration::ChildDraft;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("{0} is not an offered session date")]
    UnknownDate(NaiveDate),

    #[error("No session catalog for camp type {0}")]
    UnknownOffering(CampType),

    #[error("{0} is not part of this selection")]
    DateNotSelected(NaiveDate),

    #[error("Registration has no children")]
    EmptyRegistration,
}

/// One priced date within a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    pub date: NaiveDate,
    pub session_type: SessionType,
    pub rate: Money,
}

/// A child's dates with their session types and rates.
///
/// Keeps one line per date, so edits re-price only the date they touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PricedSelection {
    lines: BTreeMap<NaiveDate, PricedLine>,
    total: Money,
}

impl PricedSelection {
    /// Prices `selected_dates`, taking each date's session type from
    /// `session_types` and defaulting to full day. Repeated dates count once.
    pub fn price(
        selected_dates: &[NaiveDate],
        session_types: &BTreeMap<NaiveDate, SessionType>,
        catalog: &SessionCatalog,
    ) -> Result<Self, PricingError> {
        let mut selection = Self::default();
        for &date in selected_dates {
            let session_type = session_types.get(&date).copied().unwrap_or_default();
            selection.add_date(date, session_type, catalog)?;
        }
        Ok(selection)
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn lines(&self) -> impl Iterator<Item = &PricedLine> {
        self.lines.values()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn session_types(&self) -> BTreeMap<NaiveDate, SessionType> {
        self.lines
            .values()
            .map(|line| (line.date, line.session_type))
            .collect()
    }

    /// Adds a date. Selecting an already selected date changes nothing.
    pub fn add_date(
        &mut self,
        date: NaiveDate,
        session_type: SessionType,
        catalog: &SessionCatalog,
    ) -> Result<Money, PricingError> {
        if self.lines.contains_key(&date) {
            return Ok(self.total);
        }
        let rate = catalog.rate(date, session_type)?;
        self.lines.insert(
            date,
            PricedLine {
                date,
                session_type,
                rate,
            },
        );
        self.total += rate;
        Ok(self.total)
    }

    pub fn remove_date(&mut self, date: NaiveDate) -> Money {
        if let Some(line) = self.lines.remove(&date) {
            self.total -= line.rate;
        }
        self.total
    }

    /// Switches one date between half and full day and returns the new total.
    pub fn change_session_type(
        &mut self,
        date: NaiveDate,
        session_type: SessionType,
        catalog: &SessionCatalog,
    ) -> Result<Money, PricingError> {
        let line = self
            .lines
            .get_mut(&date)
            .ok_or(PricingError::DateNotSelected(date))?;
        let rate = catalog.rate(date, session_type)?;

        self.total = self.total - line.rate + rate;
        line.session_type = session_type;
        line.rate = rate;
        Ok(self.total)
    }
}

/// Price of one child's selection.
pub fn price_child(
    selected_dates: &[NaiveDate],
    session_types: &BTreeMap<NaiveDate, SessionType>,
    catalog: &SessionCatalog,
) -> Result<Money, PricingError> {
    PricedSelection::price(selected_dates, session_types, catalog).map(|s| s.total())
}

/// Sum of `price_child` over every child.
pub fn price_registration(
    children: &[ChildDraft],
    catalog: &SessionCatalog,
) -> Result<Money, PricingError> {
    if children.is_empty() {
        return Err(PricingError::EmptyRegistration);
    }

    children
        .iter()
        .map(|child| price_child(&child.selected_dates, &child.session_type_by_date, catalog))
        .sum()
}
