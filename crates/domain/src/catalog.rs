//! Session catalog: which days each camp offering runs and what they cost.
//!
//! The catalog is configuration. It is loaded once (see `CampCatalog::from_json`)
//! and handed to pricing as an explicit `Arc<CampCatalog>`.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::pricing::PricingError;

/// Camp offerings a registration can be made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampType {
    DayCamp,
    LittleForest,
    HolidayCamp,
}

impl CampType {
    pub const ALL: [CampType; 3] = [
        CampType::DayCamp,
        CampType::LittleForest,
        CampType::HolidayCamp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CampType::DayCamp => "day_camp",
            CampType::LittleForest => "little_forest",
            CampType::HolidayCamp => "holiday_camp",
        }
    }
}

impl std::fmt::Display for CampType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CampType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CampType::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown camp type: {s}"))
    }
}

/// Half-day or full-day attendance on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Half,
    #[default]
    Full,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Half => "half",
            SessionType::Full => "full",
        }
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRates {
    pub half: Money,
    pub full: Money,
}

impl SessionRates {
    pub fn new(half: Money, full: Money) -> Self {
        Self { half, full }
    }

    pub fn rate(&self, session_type: SessionType) -> Money {
        match session_type {
            SessionType::Half => self.half,
            SessionType::Full => self.full,
        }
    }
}

/// Bookable dates of one offering and their rates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCatalog {
    dates: BTreeMap<NaiveDate, SessionRates>,
}

impl SessionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date(mut self, date: NaiveDate, rates: SessionRates) -> Self {
        self.dates.insert(date, rates);
        self
    }

    /// Rate for `date`, or `UnknownDate` if the offering does not run that day.
    pub fn rate(&self, date: NaiveDate, session_type: SessionType) -> Result<Money, PricingError> {
        self.dates
            .get(&date)
            .map(|rates| rates.rate(session_type))
            .ok_or(PricingError::UnknownDate(date))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains_key(&date)
    }

    pub fn dates(&self) -> impl Iterator<Item = (&NaiveDate, &SessionRates)> {
        self.dates.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Session catalogs keyed by offering.
///
/// JSON form:
/// `{"day_camp": {"2025-07-01": {"half": 150000, "full": 250000}}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampCatalog {
    offerings: HashMap<CampType, SessionCatalog>,
}

impl CampCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offering(mut self, camp_type: CampType, sessions: SessionCatalog) -> Self {
        self.offerings.insert(camp_type, sessions);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn offering(&self, camp_type: CampType) -> Result<&SessionCatalog, PricingError> {
        self.offerings
            .get(&camp_type)
            .ok_or(PricingError::UnknownOffering(camp_type))
    }

    pub fn is_empty(&self) -> bool {
        self.offerings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn camp_type_round_trips_through_str() {
        for camp in CampType::ALL {
            assert_eq!(camp.as_str().parse::<CampType>().unwrap(), camp);
        }
        assert!("sleepaway".parse::<CampType>().is_err());
    }

    #[test]
    fn session_type_defaults_to_full() {
        assert_eq!(SessionType::default(), SessionType::Full);
        assert_eq!(serde_json::to_string(&SessionType::Half).unwrap(), "\"half\"");
    }

    #[test]
    fn unknown_date_is_an_error_not_zero() {
        let sessions = SessionCatalog::new().with_date(
            date("2025-07-01"),
            SessionRates::new(Money::from_units(1500), Money::from_units(2500)),
        );

        assert_eq!(
            sessions.rate(date("2025-07-01"), SessionType::Half).unwrap(),
            Money::from_units(1500)
        );
        assert!(matches!(
            sessions.rate(date("2025-07-02"), SessionType::Full),
            Err(PricingError::UnknownDate(d)) if d == date("2025-07-02")
        ));
    }

    #[test]
    fn parses_catalog_json() {
        let catalog = CampCatalog::from_json(
            r#"{"little_forest": {"2025-08-04": {"half": 150000, "full": 250000}}}"#,
        )
        .unwrap();

        let forest = catalog.offering(CampType::LittleForest).unwrap();
        assert_eq!(
            forest.rate(date("2025-08-04"), SessionType::Full).unwrap(),
            Money::from_units(2500)
        );
        assert!(matches!(
            catalog.offering(CampType::DayCamp),
            Err(PricingError::UnknownOffering(CampType::DayCamp))
        ));
    }
}
