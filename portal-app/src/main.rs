use dotenv::dotenv;
use engine::app::{AppError, AppProperties, AppResult};
use error_stack::ResultExt;
use error_stack::fmt::ColorMode;
use portal_app::config::AppConfig;
use portal_app::memory::MemoryEngine;
use portal_core::{CatalogRepository, DirectoryRepository};
use portal_routes::routes::OPENAPI_JSON_PATH;
use repositories::FilePatternSource;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/api/health", "Health check"),
    ("GET", "/api/services", "Get all services"),
    ("GET", "/api/services/{id}", "Get service by ID"),
    ("GET", "/api/users/{uid}", "Get user by UID"),
    ("POST", "/api/applications", "Submit application"),
    ("GET", "/api/applications/user/{uid}", "Get user applications"),
    ("GET", "/api/applications/{id}", "Get application by ID"),
    ("PATCH", "/api/applications/{id}/status", "Update application status"),
    ("POST", "/api/applications/batch", "Batch submit (offline sync)"),
    ("POST", "/api/intent", "Intent recognition"),
    ("GET", "/api/stats", "Get statistics"),
    ("DELETE", "/api/applications", "Clear all applications"),
    ("GET", "/api/metrics", "Prometheus metrics"),
];

#[tokio::main]
async fn main() {
    match try_main().await {
        Ok(_) => info!("portal service shutting down"),
        Err(e) => {
            error!("portal service exited with error: {e:?}");
        }
    }
}

fn init_logging() {
    error_stack::Report::set_color_mode(ColorMode::None);

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_env("PORTAL_LOG"))
        .init();
}

async fn try_main() -> AppResult<()> {
    init_logging();

    if let Err(e) = dotenv() {
        warn!("failed to load .env file: {e}");
    }

    let config = AppConfig::from_env().change_context(AppError)?;

    let store = portal_app::load_seed(&config.seed_file);
    let portal = MemoryEngine::new(store.clone(), FilePatternSource::new(&config.intent_file));

    let services = store.catalog().count().await.change_context(AppError)?;
    let users = store.directory().count().await.change_context(AppError)?;
    log_banner(&config, services, users);

    let routes = portal_app::router(portal, config.metrics_enabled);
    engine::app::run(
        routes,
        AppProperties {
            port: config.port,
            run_mode: config.run_mode,
        },
    )
    .await
}

fn log_banner(config: &AppConfig, services: usize, users: usize) {
    info!("MyGOV Mock API Server");
    info!("serving {services} services and {users} users");
    info!("intent patterns read from {}", config.intent_file.display());
    info!("running in {:?} mode", config.run_mode);
    info!("available endpoints:");
    for (method, path, description) in ENDPOINTS {
        info!("  {method:<7}{path:<34}- {description}");
    }
    info!("  {:<7}{:<34}- OpenAPI document", "GET", OPENAPI_JSON_PATH);
}
