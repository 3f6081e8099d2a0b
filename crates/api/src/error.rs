//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, ErrorKind};
use escalation::EscalationError;
use projections::{ExportError, ProjectionError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed path or query input.
    BadRequest(String),
    Domain(DomainError),
    Escalation(EscalationError),
    /// Read models could not be brought up to date.
    Projection(ProjectionError),
    /// The requested document could not be rendered.
    Export(ExportError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(err) => kind_to_status(err.kind()),
            ApiError::Escalation(err) => kind_to_status(err.kind()),
            ApiError::Projection(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Export(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

fn kind_to_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Dependency => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "{msg}"),
            ApiError::Domain(err) => write!(f, "{err}"),
            ApiError::Escalation(err) => write!(f, "{err}"),
            ApiError::Projection(err) => write!(f, "{err}"),
            ApiError::Export(err) => write!(f, "{err}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        metrics::counter!("http_errors_total", "status" => status.as_u16().to_string())
            .increment(1);
        if status.is_server_error() {
            tracing::error!(error = %message, %status, "request failed");
        } else {
            tracing::debug!(error = %message, %status, "request rejected");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<EscalationError> for ApiError {
    fn from(err: EscalationError) -> Self {
        ApiError::Escalation(err)
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        ApiError::Projection(err)
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        ApiError::Export(err)
    }
}
