use portal_core::PortalEngine;

mod applications;
mod catalog;
mod intent;
mod stats;

pub use applications::{BatchFailure, BatchResult, StatusUpdateOutcome, SubmitOutcome};
pub use intent::IntentOutcome;

/// Validation and orchestration over the engine's repositories. Domain
/// rejections come back as outcome enums, only faults come back as errors.
#[derive(Debug, Clone)]
pub struct PortalService<T> {
    engine: T,
}

impl<T: PortalEngine> PortalService<T> {
    pub fn new(engine: T) -> Self {
        PortalService { engine }
    }
}

/// Absent and empty strings are treated the same by every request field.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
