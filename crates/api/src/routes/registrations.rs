//! Registration endpoints: create, quote, look up and change status.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{
    Aggregate, CampType, CancelRegistration, Child, ChildDraft, CompleteRegistration,
    CreateRegistration, GuardianContact, Money, PaymentMethod, PaymentStatus, Quote, Registration,
    RegistrationDraft, RegistrationStatus, RegistrationType, UpdatePaymentStatus,
};
use escalation::BillingNotifier;
use event_store::EventStore;
use projections::RegistrationSummary;
use serde::{Deserialize, Serialize};

use super::parse_aggregate_id;
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct QuoteRequest {
    pub camp_type: CampType,
    pub children: Vec<ChildDraft>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub camp_type: Option<CampType>,
}

#[derive(Deserialize, Default)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct RegistrationResponse {
    pub id: Option<AggregateId>,
    pub registration_number: String,
    pub camp_type: Option<CampType>,
    pub guardian: Option<GuardianContact>,
    pub children: Vec<Child>,
    pub total_amount: Money,
    pub amount_paid: Money,
    pub amount_due: Money,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub registration_type: RegistrationType,
    pub status: RegistrationStatus,
    pub identity_token: String,
    pub consent_given: bool,
    pub admin_notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Registration> for RegistrationResponse {
    fn from(registration: &Registration) -> Self {
        Self {
            id: registration.id(),
            registration_number: registration.registration_number().to_string(),
            camp_type: registration.camp_type(),
            guardian: registration.guardian().cloned(),
            children: registration.children().to_vec(),
            total_amount: registration.total_amount(),
            amount_paid: registration.amount_paid(),
            amount_due: registration.amount_due(),
            payment_status: registration.payment_status(),
            payment_method: registration.payment_method(),
            payment_reference: registration.payment_reference().map(String::from),
            registration_type: registration.registration_type(),
            status: registration.status(),
            identity_token: registration.identity_token().to_string(),
            consent_given: registration.consent_given(),
            admin_notes: registration.admin_notes().map(String::from),
            created_at: registration.created_at(),
            updated_at: registration.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /registrations: price and persist a new registration.
#[tracing::instrument(skip(state, draft), fields(camp_type = %draft.camp_type))]
pub async fn create<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Json(draft): Json<RegistrationDraft>,
) -> Result<(StatusCode, Json<RegistrationResponse>), ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let registration = state
        .gate
        .registrations()
        .create(CreateRegistration::new(draft))
        .await?;
    Ok((StatusCode::CREATED, Json(RegistrationResponse::from(&registration))))
}

/// POST /registrations/quote: price children without creating anything.
pub async fn quote<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<Quote>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let quote = state
        .gate
        .registrations()
        .quote(req.camp_type, &req.children)?;
    Ok(Json(quote))
}

/// GET /registrations: list registrations from the read model, oldest first.
#[tracing::instrument(skip(state, query))]
pub async fn list<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RegistrationSummary>>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    state.catch_up().await?;

    let rows = match query.camp_type {
        Some(camp_type) => state.registrations.by_camp_type(camp_type).await,
        None => state.registrations.all().await,
    };
    Ok(Json(rows))
}

/// GET /registrations/{id}: load a registration by id.
#[tracing::instrument(skip(state))]
pub async fn get<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
) -> Result<Json<RegistrationResponse>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let registration_id = parse_aggregate_id(&id)?;
    let registration = state.gate.registrations().get_by_id(registration_id).await?;
    Ok(Json(RegistrationResponse::from(&registration)))
}

/// GET /registrations/by-token/{token}: resolve a scanned identity token.
///
/// Anyone holding the token can read the registration.
#[tracing::instrument(skip(state, token))]
pub async fn by_token<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(token): Path<String>,
) -> Result<Json<RegistrationResponse>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let registration = state.gate.registrations().resolve_by_token(&token).await?;
    Ok(Json(RegistrationResponse::from(&registration)))
}

/// POST /registrations/{id}/payment: reconcile payment from an external source.
#[tracing::instrument(skip(state, update))]
pub async fn update_payment<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
    Json(update): Json<UpdatePaymentStatus>,
) -> Result<Json<RegistrationResponse>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let registration_id = parse_aggregate_id(&id)?;
    let registration = state
        .gate
        .registrations()
        .update_payment_status(update.for_registration(registration_id))
        .await?;
    Ok(Json(RegistrationResponse::from(&registration)))
}

/// POST /registrations/{id}/cancel
#[tracing::instrument(skip(state, req))]
pub async fn cancel<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<RegistrationResponse>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let registration_id = parse_aggregate_id(&id)?;
    let registration = state
        .gate
        .registrations()
        .cancel(CancelRegistration::new(registration_id, req.reason))
        .await?;
    Ok(Json(RegistrationResponse::from(&registration)))
}

/// POST /registrations/{id}/complete
#[tracing::instrument(skip(state))]
pub async fn complete<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
) -> Result<Json<RegistrationResponse>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let registration_id = parse_aggregate_id(&id)?;
    let registration = state
        .gate
        .registrations()
        .complete(CompleteRegistration::new(registration_id))
        .await?;
    Ok(Json(RegistrationResponse::from(&registration)))
}
