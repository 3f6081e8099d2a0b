//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use domain::{AttendanceService, CampCatalog, RegistrationService};
use escalation::{BillingNotifier, BillingQueue, GateCoordinator};
use event_store::EventStore;
use projections::{
    AttendanceView, BillingQueueView, CsvRenderer, DocumentRenderer, ProjectionProcessor,
    RegistrationsView,
};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventStore, N: BillingNotifier> {
    pub gate: GateCoordinator<S, N>,
    pub processor: Arc<ProjectionProcessor<S>>,
    pub registrations: RegistrationsView,
    pub attendance: AttendanceView,
    pub billing: BillingQueueView,
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl<S, N> AppState<S, N>
where
    S: EventStore + Clone + 'static,
    N: BillingNotifier + 'static,
{
    /// Wires services, views and the projection processor over one store.
    pub fn new(store: S, catalog: Arc<CampCatalog>, notifier: N, notify_timeout: Duration) -> Self {
        let gate = GateCoordinator::from_parts(
            RegistrationService::new(store.clone(), catalog),
            AttendanceService::new(store.clone()),
            BillingQueue::new(store.clone(), notifier).with_notify_timeout(notify_timeout),
        );

        let registrations = RegistrationsView::new();
        let attendance = AttendanceView::new();
        let billing = BillingQueueView::new();

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Arc::new(registrations.clone()));
        processor.register(Arc::new(attendance.clone()));
        processor.register(Arc::new(billing.clone()));

        Self {
            gate,
            processor: Arc::new(processor),
            registrations,
            attendance,
            billing,
            renderer: Arc::new(CsvRenderer),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Brings every read model up to date with the store.
    pub async fn catch_up(&self) -> Result<(), ApiError> {
        self.processor.run_catch_up().await?;
        Ok(())
    }
}
