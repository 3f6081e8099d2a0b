//! HTTP API server with observability for the camp booking system.
//!
//! Provides REST endpoints for registration, gate check-in, the billing
//! worklist and reporting, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use escalation::BillingNotifier;
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::ApiError;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, N>(state: Arc<AppState<S, N>>, metrics_handle: PrometheusHandle) -> Router
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    use routes::{attendance, billing, registrations, reports};

    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health))
        .route(
            "/registrations",
            post(registrations::create::<S, N>).get(registrations::list::<S, N>),
        )
        .route("/registrations/quote", post(registrations::quote::<S, N>))
        .route("/registrations/{id}", get(registrations::get::<S, N>))
        .route(
            "/registrations/by-token/{token}",
            get(registrations::by_token::<S, N>),
        )
        .route(
            "/registrations/{id}/payment",
            post(registrations::update_payment::<S, N>),
        )
        .route("/registrations/{id}/cancel", post(registrations::cancel::<S, N>))
        .route(
            "/registrations/{id}/complete",
            post(registrations::complete::<S, N>),
        )
        .route(
            "/registrations/{id}/attendance",
            get(attendance::for_registration::<S, N>),
        )
        .route(
            "/registrations/{id}/billing",
            get(billing::for_registration::<S, N>),
        )
        .route(
            "/registrations/{id}/billing/complete",
            post(billing::complete_for_registration::<S, N>),
        )
        .route("/registrations/{id}/settle", post(billing::settle::<S, N>))
        .route("/check-in", post(attendance::check_in::<S, N>))
        .route(
            "/attendance/{id}/check-out",
            post(attendance::check_out::<S, N>),
        )
        .route("/attendance", get(attendance::list::<S, N>))
        .route("/attendance/summary", get(attendance::summary::<S, N>))
        .route("/billing/items", get(billing::list::<S, N>))
        .route("/billing/items/{id}/start", post(billing::start::<S, N>))
        .route("/billing/items/{id}/complete", post(billing::complete::<S, N>))
        .route("/billing/items/{id}/cancel", post(billing::cancel::<S, N>))
        .route("/reports/summary", get(reports::summary::<S, N>))
        .route("/reports/export", get(reports::export::<S, N>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
