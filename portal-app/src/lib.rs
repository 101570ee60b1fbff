use axum::Router;
use memory::MemoryEngine;
use portal_routes::state::PortalAppState;
use repositories::SeedStore;
use std::path::Path;
use tracing::{debug, error};

pub mod config;
pub mod memory;

pub fn router(engine: MemoryEngine, metrics_enabled: bool) -> Router {
    let state = if metrics_enabled {
        PortalAppState::new_with_metrics(engine)
    } else {
        PortalAppState::new_without_metrics(engine)
    };

    debug!("building routes..");
    portal_routes::routes::build(state)
}

/// Loads the seed file. A missing or malformed file is logged and the portal
/// starts with no users and no services.
pub fn load_seed(path: &Path) -> SeedStore {
    SeedStore::load(path).unwrap_or_else(|e| {
        error!("error loading seed data, starting with empty collections: {e:?}");
        SeedStore::default()
    })
}
