use super::{PortalService, non_empty};
use crate::error::PortalServiceError;
use crate::{OptServiceResult, ServiceResult};
use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use portal_core::id::{AppId, ServiceId, Uid};
use portal_core::model::{Application, BatchApplication, NewApplication, Payload, StatusChange};
use portal_core::{ApplicationRepository, CatalogRepository, DirectoryRepository, PortalEngine};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};
use utoipa::ToSchema;

pub const MISSING_REQUIRED_FIELDS: &str = "Missing required fields";
const REQUIRED_FIELDS: [&str; 3] = ["serviceId", "uid", "filledData"];

#[derive(Debug)]
pub enum SubmitOutcome {
    Submitted(Application),
    MissingFields,
    ServiceNotFound(ServiceId),
    UserNotFound(Uid),
}

#[derive(Debug)]
pub enum StatusUpdateOutcome {
    Updated(Application),
    MissingStatus,
    NotFound,
}

/// Result of an offline-sync upload. `total == successful.len() + failed.len()`.
#[derive(Debug, Serialize, ToSchema, Default)]
pub struct BatchResult {
    pub total: usize,
    pub successful: Vec<Application>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchFailure {
    /// The item exactly as it was received.
    #[schema(value_type = Object)]
    pub data: Value,
    pub error: String,
}

impl BatchFailure {
    fn new(data: Value, error: impl Into<String>) -> Self {
        Self {
            data,
            error: error.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchItem {
    app_id: Option<Value>,
    service_id: String,
    uid: String,
    filled_data: Payload,
    status: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
    audit: Option<Vec<Value>>,
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(_) => true,
    }
}

/// Offline clients may number their records, so numeric ids are kept as their text.
/// Falsy ids get a generated one.
fn batch_app_id(value: Option<Value>) -> Result<Option<AppId>, String> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::String(id)) => Ok(non_empty(Some(id)).map(AppId::new)),
        Some(Value::Number(n)) => Ok(Some(AppId::new(n.to_string()))),
        Some(other) => Err(format!("appId must be a string or a number, got {other}")),
    }
}

fn parse_batch_item(item: &Value) -> Result<BatchApplication, String> {
    let has_required = item
        .as_object()
        .is_some_and(|o| REQUIRED_FIELDS.iter().all(|f| is_present(o.get(*f))));
    if !has_required {
        return Err(MISSING_REQUIRED_FIELDS.to_string());
    }

    let item = BatchItem::deserialize(item).map_err(|e| e.to_string())?;

    Ok(BatchApplication {
        app_id: batch_app_id(item.app_id)?,
        service_id: ServiceId::new(item.service_id),
        uid: Uid::new(item.uid),
        filled_data: item.filled_data,
        status: non_empty(item.status),
        submitted_at: item.submitted_at,
        audit: item.audit,
    })
}

impl<T: PortalEngine> PortalService<T> {
    /// Validates presence first, then that the service and the user exist.
    #[instrument(skip_all, name = "service#submit")]
    pub async fn submit(
        &self,
        service_id: Option<String>,
        uid: Option<String>,
        filled_data: Option<Payload>,
        status: Option<String>,
    ) -> ServiceResult<SubmitOutcome> {
        let (Some(service_id), Some(uid), Some(filled_data)) = (
            non_empty(service_id),
            non_empty(uid),
            filled_data.filter(|d| !d.is_empty()),
        ) else {
            return Ok(SubmitOutcome::MissingFields);
        };

        let service_id = ServiceId::new(service_id);
        let service = self
            .engine
            .catalog()
            .get(service_id.clone())
            .await
            .change_context(PortalServiceError)?;
        if service.is_none() {
            return Ok(SubmitOutcome::ServiceNotFound(service_id));
        }

        let uid = Uid::new(uid);
        let user = self
            .engine
            .directory()
            .get(uid.clone())
            .await
            .change_context(PortalServiceError)?;
        if user.is_none() {
            return Ok(SubmitOutcome::UserNotFound(uid));
        }

        self.engine
            .applications()
            .create(NewApplication::new(
                service_id,
                uid,
                filled_data,
                non_empty(status),
            ))
            .await
            .change_context(PortalServiceError)
            .map(SubmitOutcome::Submitted)
    }

    #[instrument(skip_all, name = "service#get_application")]
    pub async fn get_application(&self, id: AppId) -> OptServiceResult<Application> {
        self.engine
            .applications()
            .get(id)
            .await
            .change_context(PortalServiceError)
    }

    pub async fn list_user_applications(&self, uid: Uid) -> ServiceResult<Vec<Application>> {
        self.engine
            .applications()
            .list_by_user(uid)
            .await
            .change_context(PortalServiceError)
    }

    /// An unknown id is reported before a missing status.
    #[instrument(skip_all, name = "service#update_status")]
    pub async fn update_status(
        &self,
        id: AppId,
        status: Option<String>,
        details: Option<String>,
        actor: Option<String>,
    ) -> ServiceResult<StatusUpdateOutcome> {
        let applications = self.engine.applications();

        let existing = applications
            .get(id.clone())
            .await
            .change_context(PortalServiceError)?;
        if existing.is_none() {
            return Ok(StatusUpdateOutcome::NotFound);
        }

        let Some(status) = non_empty(status) else {
            return Ok(StatusUpdateOutcome::MissingStatus);
        };

        let updated = applications
            .update_status(
                id,
                StatusChange::new(status, non_empty(details), non_empty(actor)),
            )
            .await
            .change_context(PortalServiceError)?;

        // cleared between the lookup and the update
        Ok(updated.map_or(StatusUpdateOutcome::NotFound, StatusUpdateOutcome::Updated))
    }

    /// Each item succeeds or fails on its own. Service and user ids are not
    /// checked against the catalog or the directory.
    #[instrument(skip_all, fields(batch.size = items.len()), name = "service#submit_batch")]
    pub async fn submit_batch(&self, items: Vec<Value>) -> ServiceResult<BatchResult> {
        let total = items.len();

        let mut records = Vec::with_capacity(total);
        let mut slots = Vec::with_capacity(total);
        for item in items {
            match parse_batch_item(&item) {
                Ok(record) => {
                    records.push(record);
                    slots.push((item, None));
                }
                Err(error) => {
                    debug!("batch item rejected: {error}");
                    slots.push((item, Some(error)));
                }
            }
        }

        let expected = records.len();
        let created = if records.is_empty() {
            Vec::new()
        } else {
            self.engine
                .applications()
                .create_many(records)
                .await
                .change_context(PortalServiceError)?
        };
        let mut created = created.into_iter();

        let mut result = BatchResult {
            total,
            ..BatchResult::default()
        };

        for (item, rejection) in slots {
            if let Some(error) = rejection {
                result.failed.push(BatchFailure::new(item, error));
                continue;
            }

            let Some(outcome) = created.next() else {
                return Err(Report::new(PortalServiceError)
                    .attach(format!("registry returned fewer than {expected} results")));
            };

            match outcome {
                Ok(application) => result.successful.push(application),
                Err(report) => result
                    .failed
                    .push(BatchFailure::new(item, report.current_context().to_string())),
            }
        }

        Ok(result)
    }

    #[instrument(skip_all, name = "service#clear")]
    pub async fn clear_applications(&self) -> ServiceResult<usize> {
        self.engine
            .applications()
            .clear()
            .await
            .change_context(PortalServiceError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn complete_item_parses_with_caller_fields() {
        let record = parse_batch_item(&json!({
            "appId": "offline-1",
            "serviceId": "welfare_relief_2025",
            "uid": "user_aminah",
            "filledData": { "householdSize": 4 },
            "status": "under_review",
            "submittedAt": "2025-01-15T08:30:00Z",
        }))
        .unwrap();

        assert_eq!(Some(AppId::from("offline-1")), record.app_id);
        assert_eq!(ServiceId::from("welfare_relief_2025"), record.service_id);
        assert_eq!(Uid::from("user_aminah"), record.uid);
        assert_eq!(Some("under_review".to_string()), record.status);
        assert!(record.submitted_at.is_some());
        assert!(record.audit.is_none());
    }

    #[test]
    fn empty_optional_fields_fall_back_to_defaults() {
        let record = parse_batch_item(&json!({
            "appId": "",
            "serviceId": "welfare_relief_2025",
            "uid": "user_aminah",
            "filledData": { "householdSize": 4 },
            "status": "",
        }))
        .unwrap();

        assert!(record.app_id.is_none());
        assert!(record.status.is_none());
    }

    #[test]
    fn caller_audit_is_taken_without_checking_its_shape() {
        let entry = json!({
            "timestamp": "2025-01-15T08:30:00.000Z",
            "action": "submitted",
            "actor": "user_aminah",
        });

        let record = parse_batch_item(&json!({
            "serviceId": "welfare_relief_2025",
            "uid": "user_aminah",
            "filledData": { "householdSize": 4 },
            "audit": [entry.clone()],
        }))
        .unwrap();

        assert_eq!(Some(vec![entry]), record.audit);
    }

    #[test]
    fn numeric_app_id_is_kept_as_text() {
        let record = parse_batch_item(&json!({
            "appId": 1042,
            "serviceId": "welfare_relief_2025",
            "uid": "user_aminah",
            "filledData": { "householdSize": 4 },
        }))
        .unwrap();

        assert_eq!(Some(AppId::from("1042")), record.app_id);
    }

    #[rstest]
    #[case::no_service(json!({ "uid": "u", "filledData": { "a": 1 } }))]
    #[case::empty_uid(json!({ "serviceId": "s", "uid": "", "filledData": { "a": 1 } }))]
    #[case::null_data(json!({ "serviceId": "s", "uid": "u", "filledData": null }))]
    #[case::empty_data(json!({ "serviceId": "s", "uid": "u", "filledData": {} }))]
    #[case::not_an_object(json!("welfare_relief_2025"))]
    fn missing_required_fields_are_rejected(#[case] item: Value) {
        let err = parse_batch_item(&item).unwrap_err();

        assert_eq!(MISSING_REQUIRED_FIELDS, err);
    }

    #[rstest]
    #[case::bad_timestamp(json!({
        "serviceId": "s", "uid": "u", "filledData": { "a": 1 }, "submittedAt": "yesterday"
    }))]
    #[case::numeric_service(json!({ "serviceId": 7, "uid": "u", "filledData": { "a": 1 } }))]
    #[case::audit_not_a_list(json!({
        "serviceId": "s", "uid": "u", "filledData": { "a": 1 }, "audit": "submitted"
    }))]
    #[case::object_app_id(json!({
        "appId": { "local": 7 }, "serviceId": "s", "uid": "u", "filledData": { "a": 1 }
    }))]
    fn unparseable_fields_are_rejected_with_parse_message(#[case] item: Value) {
        let err = parse_batch_item(&item).unwrap_err();

        assert_ne!(MISSING_REQUIRED_FIELDS, err);
        assert!(!err.is_empty());
    }
}
