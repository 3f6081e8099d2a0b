//! Registration store: the only way registrations are created, found and changed.

use std::sync::Arc;

use chrono::Utc;
use common::AggregateId;
use event_store::EventStore;
use serde::Serialize;

use crate::catalog::{CampCatalog, CampType};
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::money::Money;
use crate::pricing::{PricedLine, PricedSelection, price_registration};

use super::{
    CancelRegistration, ChildDraft, CompleteRegistration, CreateRegistration, Registration,
    RegistrationError, UpdatePaymentStatus, token,
};

/// Price breakdown for a set of children, without creating anything.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub camp_type: CampType,
    pub children: Vec<ChildQuote>,
    pub total: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChildQuote {
    pub child_name: String,
    pub lines: Vec<PricedLine>,
    pub price: Money,
}

pub struct RegistrationService<S: EventStore> {
    handler: CommandHandler<S, Registration>,
    catalog: Arc<CampCatalog>,
}

impl<S: EventStore> RegistrationService<S> {
    pub fn new(store: S, catalog: Arc<CampCatalog>) -> Self {
        Self {
            handler: CommandHandler::new(store),
            catalog,
        }
    }

    pub fn handler(&self) -> &CommandHandler<S, Registration> {
        &self.handler
    }

    pub fn catalog(&self) -> &CampCatalog {
        &self.catalog
    }

    /// Validates, prices and persists a new registration.
    ///
    /// Rejected drafts leave no trace in the store.
    #[tracing::instrument(skip(self, cmd), fields(registration_id = %cmd.registration_id, camp_type = %cmd.draft.camp_type))]
    pub async fn create(&self, cmd: CreateRegistration) -> Result<Registration, DomainError> {
        let registration_id = cmd.registration_id;
        let catalog = Arc::clone(&self.catalog);

        let result = self
            .handler
            .execute(registration_id, |registration| {
                registration.create(registration_id, &cmd.draft, &catalog, Utc::now())
            })
            .await?;

        let registration = result.aggregate;
        metrics::counter!(
            "registrations_created_total",
            "camp_type" => cmd.draft.camp_type.as_str()
        )
        .increment(1);
        tracing::info!(
            registration_number = registration.registration_number(),
            total = %registration.total_amount(),
            children = registration.children().len(),
            "Registration created"
        );

        Ok(registration)
    }

    pub async fn find(&self, registration_id: AggregateId) -> Result<Option<Registration>, DomainError> {
        self.handler.load_existing(registration_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, registration_id: AggregateId) -> Result<Registration, DomainError> {
        self.find(registration_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Registration", registration_id))
    }

    /// Resolves a check-in token. Malformed tokens are reported as not found.
    #[tracing::instrument(skip(self, raw_token))]
    pub async fn resolve_by_token(&self, raw_token: &str) -> Result<Registration, DomainError> {
        let Some(decoded) = token::decode(raw_token) else {
            tracing::debug!("Token did not decode");
            return Err(DomainError::not_found("Registration", "token"));
        };
        self.get_by_id(decoded.registration_id).await
    }

    #[tracing::instrument(skip(self, cmd), fields(registration_id = %cmd.registration_id, status = %cmd.payment_status))]
    pub async fn update_payment_status(
        &self,
        cmd: UpdatePaymentStatus,
    ) -> Result<Registration, DomainError> {
        let registration_id = cmd.registration_id;
        let result = self
            .handler
            .execute(registration_id, |registration| {
                registration.update_payment_status(
                    cmd.payment_status,
                    cmd.payment_method,
                    cmd.payment_reference.clone(),
                    cmd.amount_paid,
                    Utc::now(),
                )
            })
            .await;
        finish(registration_id, result)
    }

    #[tracing::instrument(skip(self, cmd), fields(registration_id = %cmd.registration_id))]
    pub async fn cancel(&self, cmd: CancelRegistration) -> Result<Registration, DomainError> {
        let registration_id = cmd.registration_id;
        let result = self
            .handler
            .execute(registration_id, |registration| {
                registration.cancel(cmd.reason.clone(), Utc::now())
            })
            .await;
        finish(registration_id, result)
    }

    #[tracing::instrument(skip(self, cmd), fields(registration_id = %cmd.registration_id))]
    pub async fn complete(&self, cmd: CompleteRegistration) -> Result<Registration, DomainError> {
        let registration_id = cmd.registration_id;
        let result = self
            .handler
            .execute(registration_id, |registration| registration.complete(Utc::now()))
            .await;
        finish(registration_id, result)
    }

    /// Prices children for `camp_type` against the current catalog.
    pub fn quote(&self, camp_type: CampType, children: &[ChildDraft]) -> Result<Quote, DomainError> {
        let sessions = self.catalog.offering(camp_type)?;
        let total = price_registration(children, sessions)?;

        let children = children
            .iter()
            .map(|child| {
                let selection = PricedSelection::price(
                    &child.selected_dates,
                    &child.session_type_by_date,
                    sessions,
                )?;
                Ok(ChildQuote {
                    child_name: child.child_name.clone(),
                    lines: selection.lines().copied().collect(),
                    price: selection.total(),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(Quote {
            camp_type,
            children,
            total,
        })
    }
}

fn finish(
    registration_id: AggregateId,
    result: Result<CommandResult<Registration>, DomainError>,
) -> Result<Registration, DomainError> {
    match result {
        Ok(result) => Ok(result.aggregate),
        Err(DomainError::Registration(RegistrationError::NotCreated)) => {
            Err(DomainError::not_found("Registration", registration_id))
        }
        Err(e) => Err(e),
    }
}
