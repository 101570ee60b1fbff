use crate::service::BatchResult;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use portal_core::id::{AppId, ServiceId, Uid};
use serde::Serialize;
use std::borrow::Cow;

pub type MessageType = Cow<'static, str>;

/// The `{success, message?, count?, data?}` envelope every portal reply uses.
#[derive(Debug, Serialize)]
pub struct PortalResponse<T> {
    #[serde(skip)]
    status_code: StatusCode,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<MessageType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> PortalResponse<T> {
    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, true, None, Some(data))
    }

    pub fn ok_with_message(message: impl Into<MessageType>, data: T) -> Self {
        Self::new(StatusCode::OK, true, Some(message.into()), Some(data))
    }

    pub fn created(message: impl Into<MessageType>, data: T) -> Self {
        Self::new(StatusCode::CREATED, true, Some(message.into()), Some(data))
    }

    /// A 200 reply whose outcome is still negative, e.g. an unmatched intent.
    pub fn unsuccessful(message: impl Into<MessageType>, data: T) -> Self {
        Self::new(StatusCode::OK, false, Some(message.into()), Some(data))
    }

    fn new(
        status_code: StatusCode,
        success: bool,
        message: Option<MessageType>,
        data: Option<T>,
    ) -> Self {
        Self {
            status_code,
            success,
            message,
            count: None,
            data,
        }
    }
}

impl<T: Serialize> PortalResponse<Vec<T>> {
    pub fn listing(items: Vec<T>) -> Self {
        Self {
            count: Some(items.len()),
            ..Self::ok(items)
        }
    }
}

impl PortalResponse<()> {
    pub fn message(message: impl Into<MessageType>) -> Self {
        Self::new(StatusCode::OK, true, Some(message.into()), None)
    }
}

impl<T: Serialize> IntoResponse for PortalResponse<T> {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

/// What a failed lookup was looking for. Flattened next to the error message.
#[derive(Debug, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum ErrorSubject {
    Service { service_id: ServiceId },
    User { uid: Uid },
    Application { app_id: AppId },
    Route { path: String, method: String },
    Cause { error: String },
}

#[derive(Debug, Serialize)]
pub struct PortalError {
    #[serde(skip)]
    status_code: StatusCode,
    success: bool,
    message: MessageType,
    #[serde(flatten)]
    subject: Option<ErrorSubject>,
}

impl PortalError {
    pub fn service_not_found(service_id: ServiceId) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "Service not found",
            Some(ErrorSubject::Service { service_id }),
        )
    }

    pub fn user_not_found(uid: Uid) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "User not found",
            Some(ErrorSubject::User { uid }),
        )
    }

    pub fn application_not_found(app_id: AppId) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "Application not found",
            Some(ErrorSubject::Application { app_id }),
        )
    }

    pub fn endpoint_not_found(path: String, method: String) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "Endpoint not found",
            Some(ErrorSubject::Route { path, method }),
        )
    }

    pub fn bad_request(message: impl Into<MessageType>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, None)
    }

    pub fn metrics_disabled() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Metrics endpoint is disabled. Metrics must be enabled and the service restarted",
            None,
        )
    }

    pub fn internal(message: impl Into<MessageType>, error: String) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            Some(ErrorSubject::Cause { error }),
        )
    }

    fn new(
        status_code: StatusCode,
        message: impl Into<MessageType>,
        subject: Option<ErrorSubject>,
    ) -> Self {
        Self {
            status_code,
            success: false,
            message: message.into(),
            subject,
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

/// Reply to a batch upload: 201 when every item was stored, 207 otherwise.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    #[serde(skip)]
    status_code: StatusCode,
    success: bool,
    message: String,
    data: BatchResult,
}

impl BatchResponse {
    pub fn new(result: BatchResult) -> Self {
        let failed = result.failed.len();
        let status_code = if failed == 0 {
            StatusCode::CREATED
        } else {
            StatusCode::MULTI_STATUS
        };

        Self {
            status_code,
            success: failed == 0,
            message: format!(
                "Processed {} applications: {} successful, {} failed",
                result.total,
                result.successful.len(),
                failed
            ),
            data: result,
        }
    }
}

impl IntoResponse for BatchResponse {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    success: bool,
    status: &'static str,
    message: &'static str,
    timestamp: DateTime<Utc>,
    /// Seconds since the app state was built.
    uptime: f64,
}

impl HealthResponse {
    pub fn ok(uptime: f64) -> Self {
        Self {
            success: true,
            status: "ok",
            message: "MyGOV Mock API is running",
            timestamp: Utc::now(),
            uptime,
        }
    }
}
