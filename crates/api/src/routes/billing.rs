//! Billing worklist endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use domain::PaymentMethod;
use escalation::{ActionItemStatus, BillingActionItem, BillingNotifier, Settlement};
use event_store::EventStore;
use projections::BillingItemSummary;
use serde::{Deserialize, Serialize};

use super::parse_aggregate_id;
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct StatusQuery {
    pub status: Option<ActionItemStatus>,
}

#[derive(Deserialize)]
pub struct StaffAction {
    pub staff_id: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct CancelItemRequest {
    pub staff_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct SettleRequest {
    pub staff_id: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_reference: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ItemsClosedResponse {
    pub items_closed: usize,
}

// -- Handlers --

/// GET /billing/items?status=: the worklist, oldest first.
#[tracing::instrument(skip(state, query))]
pub async fn list<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<BillingItemSummary>>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    state.catch_up().await?;

    let items = match query.status {
        Some(status) => state.billing.by_status(status).await,
        None => state.billing.all().await,
    };
    Ok(Json(items))
}

/// GET /registrations/{id}/billing: every item raised for a registration.
#[tracing::instrument(skip(state))]
pub async fn for_registration<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<BillingActionItem>>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let registration_id = parse_aggregate_id(&id)?;
    let items = state
        .gate
        .queue()
        .items_for_registration(registration_id)
        .await?;
    Ok(Json(items))
}

/// POST /billing/items/{id}/start
#[tracing::instrument(skip(state, req))]
pub async fn start<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
    Json(req): Json<StaffAction>,
) -> Result<Json<BillingActionItem>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let item_id = parse_aggregate_id(&id)?;
    let item = state.gate.queue().start(item_id, &req.staff_id).await?;
    Ok(Json(item))
}

/// POST /billing/items/{id}/complete
#[tracing::instrument(skip(state, req))]
pub async fn complete<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
    Json(req): Json<StaffAction>,
) -> Result<Json<BillingActionItem>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let item_id = parse_aggregate_id(&id)?;
    let item = state
        .gate
        .queue()
        .mark_completed(item_id, &req.staff_id, req.notes)
        .await?;
    Ok(Json(item))
}

/// POST /billing/items/{id}/cancel
#[tracing::instrument(skip(state, req))]
pub async fn cancel<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
    Json(req): Json<CancelItemRequest>,
) -> Result<Json<BillingActionItem>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let item_id = parse_aggregate_id(&id)?;
    let item = state
        .gate
        .queue()
        .cancel(item_id, &req.staff_id, req.reason)
        .await?;
    Ok(Json(item))
}

/// POST /registrations/{id}/billing/complete: close every pending item.
#[tracing::instrument(skip(state, req))]
pub async fn complete_for_registration<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
    Json(req): Json<StaffAction>,
) -> Result<Json<ItemsClosedResponse>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let registration_id = parse_aggregate_id(&id)?;
    let items_closed = state
        .gate
        .queue()
        .mark_completed_by_registration(registration_id, &req.staff_id, req.notes)
        .await?;
    Ok(Json(ItemsClosedResponse { items_closed }))
}

/// POST /registrations/{id}/settle: full payment taken at the gate.
#[tracing::instrument(skip(state, req))]
pub async fn settle<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
    Json(req): Json<SettleRequest>,
) -> Result<Json<Settlement>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let registration_id = parse_aggregate_id(&id)?;
    let settlement = state
        .gate
        .settle_at_gate(
            registration_id,
            req.payment_method,
            req.payment_reference,
            &req.staff_id,
        )
        .await?;
    Ok(Json(settlement))
}
