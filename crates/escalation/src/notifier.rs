//! Billing notification collaborator.

use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use domain::{CampType, Money};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::EscalationError;

/// What billing staff are told when an unpaid child is checked in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingNotice {
    pub registration_id: AggregateId,
    pub child_name: String,
    pub parent_name: String,
    pub email: String,
    pub phone: String,
    pub amount_due: Money,
    pub camp_type: CampType,
}

/// Outbound alert to billing staff.
///
/// Callers treat delivery as best effort: a failure is logged and counted,
/// never propagated to the check-in that triggered it.
#[async_trait]
pub trait BillingNotifier: Send + Sync {
    async fn notify_billing(&self, notice: BillingNotice) -> Result<(), EscalationError>;
}

#[async_trait]
impl<T: BillingNotifier + ?Sized> BillingNotifier for Arc<T> {
    async fn notify_billing(&self, notice: BillingNotice) -> Result<(), EscalationError> {
        (**self).notify_billing(notice).await
    }
}

/// Writes each notice as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogBillingNotifier;

#[async_trait]
impl BillingNotifier for LogBillingNotifier {
    async fn notify_billing(&self, notice: BillingNotice) -> Result<(), EscalationError> {
        tracing::info!(
            registration_id = %notice.registration_id,
            child = %notice.child_name,
            parent = %notice.parent_name,
            email = %notice.email,
            phone = %notice.phone,
            amount_due = %notice.amount_due,
            camp_type = %notice.camp_type,
            "Billing follow-up required"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    notices: Vec<BillingNotice>,
    fail: bool,
}

/// Records notices in memory. Used in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBillingNotifier {
    state: Arc<Mutex<InMemoryNotifierState>>,
}

impl InMemoryBillingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail until reset.
    pub async fn set_fail(&self, fail: bool) {
        self.state.lock().await.fail = fail;
    }

    pub async fn notices(&self) -> Vec<BillingNotice> {
        self.state.lock().await.notices.clone()
    }

    pub async fn notice_count(&self) -> usize {
        self.state.lock().await.notices.len()
    }
}

#[async_trait]
impl BillingNotifier for InMemoryBillingNotifier {
    async fn notify_billing(&self, notice: BillingNotice) -> Result<(), EscalationError> {
        let mut state = self.state.lock().await;
        if state.fail {
            return Err(EscalationError::Notifier(
                "billing mailbox unreachable".to_string(),
            ));
        }
        state.notices.push(notice);
        Ok(())
    }
}
