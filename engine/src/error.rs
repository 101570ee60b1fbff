use crate::app::RunMode;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use error_stack::Report;
use serde::Serialize;
use std::any::Any;
use std::error::Error;
use tracing::error;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(thiserror::Error)]
#[error("there was an error running the endpoint")]
pub struct EndpointError<T: Error>(Report<T>);

impl<T: Error> std::fmt::Debug for EndpointError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<T> From<Report<T>> for EndpointError<T>
where
    T: Error,
{
    fn from(value: Report<T>) -> Self {
        Self(value)
    }
}

impl<T: Error> IntoResponse for EndpointError<T> {
    fn into_response(self) -> Response {
        error!("endpoint failed: {:?}", self.0);
        internal_error(self.0.to_string())
    }
}

/// Rides along on a 500 response until `reveal_fault_detail` renders it.
#[derive(Debug, Clone)]
struct FaultDetail(String);

#[derive(Debug, Serialize)]
struct FaultBody {
    success: bool,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Builds the 500 envelope without detail. The detail is kept as a response
/// extension so only routers layered for development mode expose it.
fn internal_error(detail: String) -> Response {
    let mut response = fault_response(None);
    response.extensions_mut().insert(FaultDetail(detail));
    response
}

fn fault_response(error: Option<String>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(FaultBody {
            success: false,
            message: INTERNAL_ERROR_MESSAGE,
            error,
        }),
    )
        .into_response()
}

pub(crate) async fn reveal_fault_detail(mut response: Response) -> Response {
    match response.extensions_mut().remove::<FaultDetail>() {
        Some(FaultDetail(detail)) => fault_response(Some(detail)),
        None => response,
    }
}

pub(crate) fn panic_response(panic: Box<dyn Any + Send + 'static>, run_mode: RunMode) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic payload")
    };

    error!("handler panicked: {detail}");
    fault_response(run_mode.exposes_fault_detail().then_some(detail))
}
