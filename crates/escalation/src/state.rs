//! Billing action item states and kinds.

use serde::{Deserialize, Serialize};

/// Lifecycle of a billing action item.
///
/// ```text
/// Pending ──► InProgress ──┬──► Completed
///    │                     └──► Cancelled
///    ├──────────────────────────► Completed
///    └──────────────────────────► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionItemStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ActionItemStatus {
    pub const ALL: [ActionItemStatus; 4] = [
        ActionItemStatus::Pending,
        ActionItemStatus::InProgress,
        ActionItemStatus::Completed,
        ActionItemStatus::Cancelled,
    ];

    pub fn is_pending(&self) -> bool {
        matches!(self, ActionItemStatus::Pending)
    }

    pub fn can_start(&self) -> bool {
        matches!(self, ActionItemStatus::Pending)
    }

    /// Completed and cancelled items never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionItemStatus::Completed | ActionItemStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionItemStatus::Pending => "pending",
            ActionItemStatus::InProgress => "in_progress",
            ActionItemStatus::Completed => "completed",
            ActionItemStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ActionItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown action item status: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Raised automatically when an unpaid child is checked in.
    #[default]
    InvoiceNeeded,
    ReceiptNeeded,
    PaymentFollowup,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::InvoiceNeeded => "invoice_needed",
            ActionType::ReceiptNeeded => "receipt_needed",
            ActionType::PaymentFollowup => "payment_followup",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
