use crate::routes::responses::PortalError;
use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use portal_core::model::Payload;
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

/// `axum::Json` with its rejections rendered in the portal's error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(PortalError))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for PortalError {
    fn from(rejection: JsonRejection) -> Self {
        PortalError::bad_request(rejection.body_text())
    }
}

/// Every field is optional so that missing ones are reported by the handler
/// rather than by the JSON extractor.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationRequest {
    pub service_id: Option<String>,
    pub uid: Option<String>,
    /// Form answers. Must be a non-empty object.
    #[schema(value_type = Option<Object>)]
    pub filled_data: Option<Payload>,
    /// Initial status. Defaults to `submitted`.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
    /// Audit entry text. Defaults to `Status changed from {previous} to {new}`.
    pub details: Option<String>,
    /// Who made the change. Defaults to `system`.
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchRequest {
    /// Offline-recorded applications. Items are validated one by one.
    #[schema(value_type = Vec<Object>)]
    pub applications: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IntentRequest {
    pub transcript: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceListQuery {
    pub category: Option<String>,
}
