use crate::error::{panic_response, reveal_fault_detail};
use axum::{Router, http, middleware};
use error_stack::{Report, ResultExt};
use std::any::Any;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{Span, info};

pub struct AppProperties {
    pub port: u16,
    pub run_mode: RunMode,
}

/// Decides whether 500 bodies carry the fault detail.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    #[default]
    Production,
    Development,
}

impl RunMode {
    /// `development` in any case selects development mode, anything else is production.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("development") {
            Self::Development
        } else {
            Self::Production
        }
    }

    pub fn exposes_fault_detail(self) -> bool {
        self == Self::Development
    }
}

#[derive(Debug, thiserror::Error)]
#[error("the app exited with an error")]
pub struct AppError;

pub type AppResult<T> = Result<T, Report<AppError>>;

pub async fn run(routes: Router, properties: AppProperties) -> AppResult<()> {
    let listener = build_listener(properties.port).await?;

    info!(
        "starting up portal service on port {}",
        listener
            .local_addr()
            .change_context(AppError)?
            .port()
    );

    serve_on(listener, layered(routes, properties.run_mode)).await
}

/// Applies the layers every served router gets: request tracing, permissive CORS,
/// and conversion of handler panics into the JSON fault envelope.
pub fn layered(routes: Router, run_mode: RunMode) -> Router {
    let routes = if run_mode.exposes_fault_detail() {
        routes.layer(middleware::map_response(reveal_fault_detail))
    } else {
        routes
    };

    routes.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http().on_response(
                |res: &http::Response<_>, latency: Duration, _span: &Span| {
                    info!("returned {} in {}ms", res.status(), latency.as_millis());
                },
            ))
            .layer(CorsLayer::permissive())
            .layer(CatchPanicLayer::custom(
                move |panic: Box<dyn Any + Send + 'static>| panic_response(panic, run_mode),
            )),
    )
}

async fn serve_on(listener: TcpListener, routes: Router) -> AppResult<()> {
    axum::serve(listener, routes)
        .await
        .change_context(AppError)
}

async fn build_listener(port: u16) -> AppResult<TcpListener> {
    TcpListener::bind(std::net::SocketAddr::V4(SocketAddrV4::new(
        Ipv4Addr::UNSPECIFIED,
        port,
    )))
    .await
    .change_context(AppError)
    .attach_with(|| format!("port {port}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_mode_is_case_insensitive() {
        assert_eq!(RunMode::Development, RunMode::parse("development"));
        assert_eq!(RunMode::Development, RunMode::parse(" Development "));
        assert!(RunMode::parse("DEVELOPMENT").exposes_fault_detail());
    }

    #[test]
    fn any_other_mode_is_production() {
        assert_eq!(RunMode::Production, RunMode::parse("production"));
        assert_eq!(RunMode::Production, RunMode::parse("dev"));
        assert_eq!(RunMode::Production, RunMode::parse(""));
        assert!(!RunMode::default().exposes_fault_detail());
    }
}
