use crate::error::PortalServiceError;
use crate::metrics;
use crate::service::{
    BatchResult, IntentOutcome, PortalService, StatusUpdateOutcome, SubmitOutcome,
};
use crate::state::{PortalAppState, StartedAt};
use axum::extract::OriginalUri;
use axum::http::Method;
use axum::middleware;
use axum::routing::patch;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response, Result},
    routing::{get, post},
};
use const_format::formatcp;
use engine::error::EndpointError;
use portal_core::PortalEngine;
use portal_core::id::{AppId, ServiceId, Uid};
use portal_core::model::Application;
use portal_core::stats::Stats;
use requests::{
    BatchRequest, IntentRequest, JsonBody, ServiceListQuery, StatusUpdateRequest,
    SubmitApplicationRequest,
};
use responses::{BatchResponse, HealthResponse, PortalError, PortalResponse};
use serde_json::Value;
use tracing::{info, instrument, warn};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

mod requests;
mod responses;

pub const API_ROOT_PATH: &str = "/api";
pub const OPENAPI_JSON_PATH: &str = formatcp!("{}/api-docs/openapi.json", API_ROOT_PATH);

const HEALTH_PATH: &str = "/health";
const SERVICE_LIST_PATH: &str = "/services";
const SERVICE_GET_PATH: &str = "/services/{service_id}";
const USER_GET_PATH: &str = "/users/{uid}";
const APPLICATIONS_PATH: &str = "/applications";
const USER_APPLICATIONS_PATH: &str = "/applications/user/{uid}";
const APPLICATION_GET_PATH: &str = "/applications/{app_id}";
const APPLICATION_STATUS_PATH: &str = "/applications/{app_id}/status";
const APPLICATION_BATCH_PATH: &str = "/applications/batch";
const INTENT_PATH: &str = "/intent";
const STATS_PATH: &str = "/stats";
const METRICS_PATH: &str = "/metrics";

const MISSING_SUBMISSION_FIELDS: &str = "Missing required fields: serviceId, uid, filledData";
const INVALID_BATCH: &str = "Invalid batch data. Expected array of applications.";

#[derive(OpenApi)]
#[openapi(
    nest(
        (path = API_ROOT_PATH, api = PortalDocs),
    )
)]
struct ApiDoc;

#[derive(OpenApi)]
#[openapi(paths(
    health,
    list_services,
    get_service,
    get_user,
    submit_application,
    list_user_applications,
    get_application,
    update_application_status,
    submit_batch,
    clear_applications,
    match_intent,
    get_stats,
))]
struct PortalDocs;

pub fn build<T: PortalEngine>(app_state: PortalAppState<T>) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(routes(app_state))
        .split_for_parts();

    router
        .route(OPENAPI_JSON_PATH, get(|| async move { Json(api) }))
        .fallback(endpoint_not_found)
        .method_not_allowed_fallback(endpoint_not_found)
}

fn routes<S, T: PortalEngine>(app_state: PortalAppState<T>) -> OpenApiRouter<S> {
    let main_router = OpenApiRouter::new()
        .route(HEALTH_PATH, get(health))
        .route(SERVICE_LIST_PATH, get(list_services::<T>))
        .route(SERVICE_GET_PATH, get(get_service::<T>))
        .route(USER_GET_PATH, get(get_user::<T>))
        .route(
            APPLICATIONS_PATH,
            post(submit_application::<T>).delete(clear_applications::<T>),
        )
        .route(USER_APPLICATIONS_PATH, get(list_user_applications::<T>))
        .route(APPLICATION_BATCH_PATH, post(submit_batch::<T>))
        .route(APPLICATION_GET_PATH, get(get_application::<T>))
        .route(
            APPLICATION_STATUS_PATH,
            patch(update_application_status::<T>),
        )
        .route(INTENT_PATH, post(match_intent::<T>))
        .route(STATS_PATH, get(get_stats::<T>));

    let recorder = if app_state.metrics_enabled {
        metrics::recorder()
    } else {
        None
    };

    let router = match recorder {
        Some(recorder) => {
            info!("metrics enabled, setting up metrics handler");
            main_router
                .route(METRICS_PATH, get(|| async move { recorder.render() }))
                .route_layer(middleware::from_fn(metrics::track_http))
        }
        None => {
            info!("metrics not available, setting up service unavailable metrics handler");
            main_router.route(
                METRICS_PATH,
                get(|| async { PortalError::metrics_disabled() }),
            )
        }
    };

    OpenApiRouter::new()
        .nest(API_ROOT_PATH, router)
        .with_state(app_state)
}

/// Nested routes see their path with the prefix stripped, so the original URI is reported.
async fn endpoint_not_found(method: Method, OriginalUri(uri): OriginalUri) -> PortalError {
    PortalError::endpoint_not_found(uri.path().to_string(), method.to_string())
}

/// Liveness check.
#[utoipa::path(
    get,
    path = HEALTH_PATH,
    responses(
        (status = OK, description = "The API is running. Reports the time and the uptime in seconds"),
    )
)]
async fn health(State(started_at): State<StartedAt>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(started_at.0.elapsed().as_secs_f64()))
}

/// List the service catalog, optionally only the services in one category.
#[utoipa::path(
    get,
    path = SERVICE_LIST_PATH,
    responses(
        (status = OK, description = "Services in catalog order, with their count. Empty when no service is in the category"),
    ),
    params(
        ("category" = Option<String>, Query, description = "Exact category name to filter by"),
    )
)]
#[instrument(skip(service), err(Debug), fields(req.category = query.category))]
async fn list_services<T: PortalEngine>(
    State(service): State<PortalService<T>>,
    Query(query): Query<ServiceListQuery>,
) -> Result<Response, EndpointError<PortalServiceError>> {
    let services = service.list_services(query.category).await?;
    Ok(PortalResponse::listing(services).into_response())
}

#[utoipa::path(
    get,
    path = SERVICE_GET_PATH,
    responses(
        (status = OK, description = "The service was found"),
        (status = NOT_FOUND, description = "No service has the given id. The id is echoed back as serviceId"),
    ),
    params(
        ("service_id" = String, Path, description = "The serviceId to find"),
    )
)]
#[instrument(skip(service), err(Debug))]
async fn get_service<T: PortalEngine>(
    State(service): State<PortalService<T>>,
    Path(service_id): Path<ServiceId>,
) -> Result<Response, EndpointError<PortalServiceError>> {
    let found = service.get_service(service_id.clone()).await?;

    Ok(found
        .map(|s| PortalResponse::ok(s).into_response())
        .unwrap_or_else(|| PortalError::service_not_found(service_id).into_response()))
}

#[utoipa::path(
    get,
    path = USER_GET_PATH,
    responses(
        (status = OK, description = "The user was found"),
        (status = NOT_FOUND, description = "No user has the given uid. The uid is echoed back"),
    ),
    params(
        ("uid" = String, Path, description = "The uid to find"),
    )
)]
#[instrument(skip(service), err(Debug))]
async fn get_user<T: PortalEngine>(
    State(service): State<PortalService<T>>,
    Path(uid): Path<Uid>,
) -> Result<Response, EndpointError<PortalServiceError>> {
    let found = service.get_user(uid.clone()).await?;

    Ok(found
        .map(|u| PortalResponse::ok(u).into_response())
        .unwrap_or_else(|| PortalError::user_not_found(uid).into_response()))
}

/// Submit a new application for a seeded service on behalf of a seeded user.
#[utoipa::path(
    post,
    path = APPLICATIONS_PATH,
    responses(
        (status = CREATED, description = "The application was stored with a fresh appId and one audit entry", body = Application),
        (status = BAD_REQUEST, description = "serviceId, uid or filledData is missing or empty"),
        (status = NOT_FOUND, description = "The service or the user does not exist"),
    ),
    request_body = SubmitApplicationRequest
)]
#[instrument(skip_all, err(Debug), fields(req.service_id = request.service_id, req.uid = request.uid))]
async fn submit_application<T: PortalEngine>(
    State(service): State<PortalService<T>>,
    JsonBody(request): JsonBody<SubmitApplicationRequest>,
) -> Result<Response, EndpointError<PortalServiceError>> {
    let outcome = service
        .submit(
            request.service_id,
            request.uid,
            request.filled_data,
            request.status,
        )
        .await?;

    let res = match outcome {
        SubmitOutcome::Submitted(application) => {
            metrics::increment_applications_submitted();
            PortalResponse::created("Application submitted successfully", application)
                .into_response()
        }
        SubmitOutcome::MissingFields => {
            PortalError::bad_request(MISSING_SUBMISSION_FIELDS).into_response()
        }
        SubmitOutcome::ServiceNotFound(service_id) => {
            PortalError::service_not_found(service_id).into_response()
        }
        SubmitOutcome::UserNotFound(uid) => PortalError::user_not_found(uid).into_response(),
    };

    Ok(res)
}

/// All applications submitted by one user, oldest first.
#[utoipa::path(
    get,
    path = USER_APPLICATIONS_PATH,
    responses(
        (status = OK, description = "The user's applications with their count. Empty for unknown users", body = Vec<Application>),
    ),
    params(
        ("uid" = String, Path, description = "The uid whose applications to list"),
    )
)]
#[instrument(skip(service), err(Debug))]
async fn list_user_applications<T: PortalEngine>(
    State(service): State<PortalService<T>>,
    Path(uid): Path<Uid>,
) -> Result<Response, EndpointError<PortalServiceError>> {
    let applications = service.list_user_applications(uid).await?;
    Ok(PortalResponse::listing(applications).into_response())
}

#[utoipa::path(
    get,
    path = APPLICATION_GET_PATH,
    responses(
        (status = OK, description = "The application was found", body = Application),
        (status = NOT_FOUND, description = "No application has the given appId"),
    ),
    params(
        ("app_id" = String, Path, description = "The appId to find"),
    )
)]
#[instrument(skip(service), err(Debug))]
async fn get_application<T: PortalEngine>(
    State(service): State<PortalService<T>>,
    Path(app_id): Path<AppId>,
) -> Result<Response, EndpointError<PortalServiceError>> {
    let found = service.get_application(app_id.clone()).await?;

    Ok(found
        .map(|a| PortalResponse::ok(a).into_response())
        .unwrap_or_else(|| PortalError::application_not_found(app_id).into_response()))
}

/// Move an application to a new status. Every call appends one audit entry,
/// even when the status does not change.
#[utoipa::path(
    patch,
    path = APPLICATION_STATUS_PATH,
    responses(
        (status = OK, description = "The status was updated and the transition audited", body = Application),
        (status = BAD_REQUEST, description = "status is missing or empty"),
        (status = NOT_FOUND, description = "No application has the given appId"),
    ),
    params(
        ("app_id" = String, Path, description = "The appId to update"),
    ),
    request_body = StatusUpdateRequest,
)]
#[instrument(skip(service, request), err(Debug), fields(req.status = request.status))]
async fn update_application_status<T: PortalEngine>(
    State(service): State<PortalService<T>>,
    Path(app_id): Path<AppId>,
    JsonBody(request): JsonBody<StatusUpdateRequest>,
) -> Result<Response, EndpointError<PortalServiceError>> {
    let outcome = service
        .update_status(
            app_id.clone(),
            request.status,
            request.details,
            request.actor,
        )
        .await?;

    let res = match outcome {
        StatusUpdateOutcome::Updated(application) => {
            metrics::increment_status_changes();
            PortalResponse::ok_with_message("Application status updated", application)
                .into_response()
        }
        StatusUpdateOutcome::MissingStatus => {
            PortalError::bad_request("Status is required").into_response()
        }
        StatusUpdateOutcome::NotFound => PortalError::application_not_found(app_id).into_response(),
    };

    Ok(res)
}

/// Upload applications recorded offline. Each item is stored or rejected on its
/// own; the reply lists both.
#[utoipa::path(
    post,
    path = APPLICATION_BATCH_PATH,
    responses(
        (status = CREATED, description = "Every item was stored", body = BatchResult),
        (status = MULTI_STATUS, description = "At least one item failed. Failed items are returned with the reason", body = BatchResult),
        (status = BAD_REQUEST, description = "applications is missing, not an array, or empty"),
    ),
    request_body = BatchRequest
)]
#[instrument(skip_all, err(Debug))]
async fn submit_batch<T: PortalEngine>(
    State(service): State<PortalService<T>>,
    JsonBody(request): JsonBody<BatchRequest>,
) -> Result<Response, EndpointError<PortalServiceError>> {
    let items = match request.applications {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Ok(PortalError::bad_request(INVALID_BATCH).into_response()),
    };

    let result = service.submit_batch(items).await?;

    metrics::increment_batch_items_by(result.successful.len(), "successful");
    metrics::increment_batch_items_by(result.failed.len(), "failed");
    if !result.failed.is_empty() {
        warn!(
            "{} of {} batch applications failed",
            result.failed.len(),
            result.total
        );
    }

    Ok(BatchResponse::new(result).into_response())
}

/// Remove every application. Intended for resetting test environments.
#[utoipa::path(
    delete,
    path = APPLICATIONS_PATH,
    responses(
        (status = OK, description = "All applications were removed. The message carries how many"),
    )
)]
#[instrument(skip(service), err(Debug))]
async fn clear_applications<T: PortalEngine>(
    State(service): State<PortalService<T>>,
) -> Result<Response, EndpointError<PortalServiceError>> {
    let count = service.clear_applications().await?;
    metrics::increment_applications_cleared_by(count);

    Ok(PortalResponse::message(format!("Cleared {count} applications")).into_response())
}

/// Map a free-text transcript to a service using the intent pattern file.
#[utoipa::path(
    post,
    path = INTENT_PATH,
    responses(
        (status = OK, description = "success is true with the matched service, or false with up to three suggested serviceIds"),
        (status = BAD_REQUEST, description = "transcript is missing or empty"),
        (status = INTERNAL_SERVER_ERROR, description = "The intent patterns could not be loaded"),
    ),
    request_body = IntentRequest
)]
#[instrument(skip_all, err(Debug), fields(req.language = request.language))]
async fn match_intent<T: PortalEngine>(
    State(service): State<PortalService<T>>,
    JsonBody(request): JsonBody<IntentRequest>,
) -> Result<Response, EndpointError<PortalServiceError>> {
    let outcome = service
        .match_intent(request.transcript, request.language)
        .await?;

    let res = match outcome {
        IntentOutcome::Matched(matched) => {
            metrics::increment_intents_matched();
            PortalResponse::ok(matched).into_response()
        }
        IntentOutcome::NoMatch(no_match) => {
            PortalResponse::unsuccessful("No matching service found", no_match).into_response()
        }
        IntentOutcome::MissingTranscript => {
            PortalError::bad_request("Transcript is required").into_response()
        }
        IntentOutcome::PatternsUnavailable(reason) => {
            PortalError::internal("Error processing intent", reason).into_response()
        }
    };

    Ok(res)
}

#[utoipa::path(
    get,
    path = STATS_PATH,
    responses(
        (status = OK, description = "Totals and per-status, per-service application counts", body = Stats),
    )
)]
#[instrument(skip(service), err(Debug))]
async fn get_stats<T: PortalEngine>(
    State(service): State<PortalService<T>>,
) -> Result<Response, EndpointError<PortalServiceError>> {
    let stats = service.stats().await?;
    Ok(PortalResponse::ok(stats).into_response())
}
