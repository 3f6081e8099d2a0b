//! Gate check-in, check-out and daily attendance listings.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use common::AggregateId;
use domain::{Aggregate, AttendanceRecord, AttendanceState, CheckIn, CheckOut};
use escalation::{BillingNotifier, GateCheckIn, GateScan};
use event_store::EventStore;
use projections::{AttendanceRow, AttendanceSummary};
use serde::{Deserialize, Serialize};

use super::parse_aggregate_id;
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

/// A check-in either carries a scanned token or names the registration.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum CheckInRequest {
    Token(GateScan),
    Direct(CheckIn),
}

#[derive(Deserialize, Default)]
pub struct CheckOutRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

impl DateQuery {
    fn date_or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct AttendanceResponse {
    pub attendance_id: Option<AggregateId>,
    pub registration_id: Option<AggregateId>,
    pub child_name: String,
    pub attendance_date: Option<NaiveDate>,
    pub state: AttendanceState,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub marked_by: String,
    pub notes: Option<String>,
    pub check_out_notes: Option<String>,
}

impl From<&AttendanceRecord> for AttendanceResponse {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            attendance_id: record.id(),
            registration_id: record.registration_id(),
            child_name: record.child_name().to_string(),
            attendance_date: record.attendance_date(),
            state: record.state(),
            check_in_time: record.check_in_time(),
            check_out_time: record.check_out_time(),
            marked_by: record.marked_by().to_string(),
            notes: record.notes().map(String::from),
            check_out_notes: record.check_out_notes().map(String::from),
        }
    }
}

// -- Handlers --

/// POST /check-in: admit a child and escalate billing when unpaid.
#[tracing::instrument(skip(state, req))]
pub async fn check_in<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Json(req): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<GateCheckIn>), ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let admitted = match req {
        CheckInRequest::Token(scan) => state.gate.check_in_by_token(scan).await?,
        CheckInRequest::Direct(cmd) => state.gate.check_in(cmd).await?,
    };
    Ok((StatusCode::CREATED, Json(admitted)))
}

/// POST /attendance/{id}/check-out
#[tracing::instrument(skip(state, req))]
pub async fn check_out<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
    Json(req): Json<CheckOutRequest>,
) -> Result<Json<AttendanceResponse>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let attendance_id = parse_aggregate_id(&id)?;
    let record = state
        .gate
        .check_out(CheckOut::new(attendance_id, req.notes))
        .await?;
    Ok(Json(AttendanceResponse::from(&record)))
}

/// GET /attendance?date=: everyone checked in on a day (default today).
#[tracing::instrument(skip(state, query))]
pub async fn list<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<AttendanceRow>>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    state.catch_up().await?;
    Ok(Json(state.attendance.by_date(query.date_or_today()).await))
}

/// GET /attendance/summary?date=
#[tracing::instrument(skip(state, query))]
pub async fn summary<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<AttendanceSummary>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    state.catch_up().await?;
    Ok(Json(state.attendance.summary(query.date_or_today()).await))
}

/// GET /registrations/{id}/attendance
#[tracing::instrument(skip(state))]
pub async fn for_registration<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AttendanceRow>>, ApiError>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    let registration_id = parse_aggregate_id(&id)?;
    state.gate.registrations().get_by_id(registration_id).await?;
    state.catch_up().await?;
    Ok(Json(state.attendance.by_registration(registration_id).await))
}
