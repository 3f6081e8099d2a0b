//! Billing escalation for unpaid attendance.
//!
//! When a child is checked in against a registration that is not fully paid,
//! the [`BillingQueue`] raises one `invoice_needed` item per child and alerts
//! billing staff through a [`BillingNotifier`]. The [`GateCoordinator`] ties
//! the registration store, attendance tracker and queue into the gate flow.

pub mod aggregate;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod notifier;
pub mod queue;
pub mod state;

pub use aggregate::{BillingActionItem, NewActionItem};
pub use coordinator::{GateCheckIn, GateCoordinator, GateScan, Settlement};
pub use error::EscalationError;
pub use events::ActionItemEvent;
pub use notifier::{BillingNotice, BillingNotifier, InMemoryBillingNotifier, LogBillingNotifier};
pub use queue::{BillingQueue, DEFAULT_NOTIFY_TIMEOUT, Escalation};
pub use state::{ActionItemStatus, ActionType};
