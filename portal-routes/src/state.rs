use crate::service::PortalService;
use axum::extract::FromRef;
use portal_core::PortalEngine;
use std::time::Instant;

/// When the app state was built, reported as uptime by the health check.
#[derive(Debug, Clone, Copy)]
pub struct StartedAt(pub Instant);

#[derive(Clone)]
pub struct PortalAppState<T: PortalEngine> {
    pub service: PortalService<T>,
    pub metrics_enabled: bool,
    pub started_at: StartedAt,
}

impl<T: PortalEngine> PortalAppState<T> {
    pub fn new_with_metrics(engine: T) -> Self {
        Self::new(engine, true)
    }

    pub fn new_without_metrics(engine: T) -> Self {
        Self::new(engine, false)
    }

    fn new(engine: T, metrics_enabled: bool) -> Self {
        Self {
            service: PortalService::new(engine),
            metrics_enabled,
            started_at: StartedAt(Instant::now()),
        }
    }
}

impl<T: PortalEngine> FromRef<PortalAppState<T>> for PortalService<T> {
    fn from_ref(input: &PortalAppState<T>) -> Self {
        input.service.clone()
    }
}

impl<T: PortalEngine> FromRef<PortalAppState<T>> for StartedAt {
    fn from_ref(input: &PortalAppState<T>) -> Self {
        input.started_at
    }
}
