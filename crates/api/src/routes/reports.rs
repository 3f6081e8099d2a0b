//! Reporting and export endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use escalation::BillingNotifier;
use event_store::EventStore;
use projections::{RegistrationReport, ReportFilter};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /reports/summary?from=&to=&camp_type=
#[tracing::instrument(skip(state))]
pub async fn summary<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Query(filter): Query<ReportFilter>,
) -> Result<Json<RegistrationReport>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    state.catch_up().await?;
    Ok(Json(state.registrations.report(&filter).await))
}

/// GET /reports/export?from=&to=&camp_type=: detail rows as a document.
#[tracing::instrument(skip(state))]
pub async fn export<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Query(filter): Query<ReportFilter>,
) -> Result<impl IntoResponse, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    state.catch_up().await?;
    let report = state.registrations.report(&filter).await;
    let rows = report.export_rows();
    let document = state.renderer.render(&rows)?;
    tracing::info!(rows = rows.len(), bytes = document.len(), "Export rendered");

    let disposition = format!(
        "attachment; filename=\"registrations.{}\"",
        state.renderer.file_extension()
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, state.renderer.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document,
    ))
}
