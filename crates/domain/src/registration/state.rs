//! Registration lifecycle and payment states.

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Administrative status of a registration.
///
/// ```text
/// Active ──┬──► Cancelled
///          └──► Completed
/// ```
/// Both end states are terminal. Registrations are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    #[default]
    Active,
    Cancelled,
    Completed,
}

impl RegistrationStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, RegistrationStatus::Active)
    }

    pub fn can_cancel(&self) -> bool {
        self.is_active()
    }

    pub fn can_complete(&self) -> bool {
        self.is_active()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RegistrationStatus::Cancelled | RegistrationStatus::Completed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Active => "active",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Unpaid,
        PaymentStatus::Partial,
        PaymentStatus::Paid,
    ];

    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }

    /// Amount paid implied by moving to this status.
    ///
    /// `Paid` means the full total. `Unpaid` means nothing unless an amount is
    /// given. `Partial` takes the given amount or keeps `current`.
    pub fn amount_paid(&self, total: Money, given: Option<Money>, current: Money) -> Money {
        match self {
            PaymentStatus::Paid => total,
            PaymentStatus::Unpaid => given.unwrap_or_default(),
            PaymentStatus::Partial => given.unwrap_or(current),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Pending,
    Card,
    MobileMoney,
    CashOnSite,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Pending => "pending",
            PaymentMethod::Card => "card",
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::CashOnSite => "cash_on_site",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Channel a registration came in through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationType {
    #[default]
    OnlineOnly,
    OnlinePaid,
    GroundRegistration,
}

impl RegistrationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationType::OnlineOnly => "online_only",
            RegistrationType::OnlinePaid => "online_paid",
            RegistrationType::GroundRegistration => "ground_registration",
        }
    }
}

impl std::fmt::Display for RegistrationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
