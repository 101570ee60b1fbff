use crate::id::{AppId, ServiceId, Uid};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Caller-defined JSON object. Never inspected beyond presence.
pub type Payload = Map<String, Value>;

pub const DEFAULT_STATUS: &str = "submitted";
pub const SYSTEM_ACTOR: &str = "system";
pub const SUBMITTED_DETAILS: &str = "Application submitted via ISN app";
pub const OFFLINE_SYNC_DETAILS: &str = "Application submitted via ISN app (offline sync)";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub service_id: ServiceId,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Names, descriptions, required documents and the like. Passed through untouched.
    #[serde(flatten)]
    pub details: Payload,
}

impl Service {
    pub fn in_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub uid: Uid,
    #[serde(flatten)]
    pub profile: Payload,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Submitted,
    StatusChanged,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub details: String,
    /// The submitting uid, or `system` for automated changes.
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<String>,
}

impl AuditEntry {
    pub fn submitted(timestamp: DateTime<Utc>, actor: &Uid, details: impl Into<String>) -> Self {
        Self {
            timestamp,
            action: AuditAction::Submitted,
            details: details.into(),
            actor: actor.to_string(),
            previous_status: None,
            new_status: None,
        }
    }

    pub fn status_changed(
        timestamp: DateTime<Utc>,
        previous_status: String,
        new_status: String,
        details: Option<String>,
        actor: Option<String>,
    ) -> Self {
        Self {
            timestamp,
            action: AuditAction::StatusChanged,
            details: details.unwrap_or_else(|| {
                format!("Status changed from {previous_status} to {new_status}")
            }),
            actor: actor.unwrap_or_else(|| SYSTEM_ACTOR.to_string()),
            previous_status: Some(previous_status),
            new_status: Some(new_status),
        }
    }
}

/// One element of an application's audit trail.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum AuditRecord {
    Entry(AuditEntry),
    /// Recorded by an offline client and kept exactly as uploaded.
    Synced(Value),
}

impl AuditRecord {
    pub fn as_entry(&self) -> Option<&AuditEntry> {
        match self {
            AuditRecord::Entry(entry) => Some(entry),
            AuditRecord::Synced(_) => None,
        }
    }
}

impl From<AuditEntry> for AuditRecord {
    fn from(entry: AuditEntry) -> Self {
        AuditRecord::Entry(entry)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub app_id: AppId,
    pub service_id: ServiceId,
    pub uid: Uid,
    pub status: String,
    #[schema(value_type = Object)]
    pub filled_data: Payload,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Append only. Always holds at least the submission entry.
    #[schema(value_type = Vec<AuditEntry>)]
    pub audit: Vec<AuditRecord>,
}

impl Application {
    pub fn submit(app_id: AppId, new_application: NewApplication, now: DateTime<Utc>) -> Self {
        let NewApplication {
            service_id,
            uid,
            filled_data,
            status,
        } = new_application;

        let audit: Vec<AuditRecord> =
            vec![AuditEntry::submitted(now, &uid, SUBMITTED_DETAILS).into()];

        Self {
            app_id,
            service_id,
            uid,
            status: status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            filled_data,
            submitted_at: now,
            updated_at: now,
            audit,
        }
    }

    /// Builds an application from an offline-synced record. The caller's id has
    /// already been resolved by the registry.
    pub fn synced(app_id: AppId, batch: BatchApplication, now: DateTime<Utc>) -> Self {
        let BatchApplication {
            app_id: _,
            service_id,
            uid,
            filled_data,
            status,
            submitted_at,
            audit,
        } = batch;

        let submitted_at = submitted_at.unwrap_or(now);
        let audit: Vec<AuditRecord> = match audit {
            Some(audit) if !audit.is_empty() => {
                audit.into_iter().map(AuditRecord::Synced).collect()
            }
            _ => vec![AuditEntry::submitted(now, &uid, OFFLINE_SYNC_DETAILS).into()],
        };

        Self {
            app_id,
            service_id,
            uid,
            status: status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            filled_data,
            submitted_at,
            // a client clock ahead of ours must not leave updated_at behind submitted_at
            updated_at: now.max(submitted_at),
            audit,
        }
    }

    /// Moves the application to `change.status` and records the transition.
    /// Setting the status it already has is still recorded.
    pub fn apply_status_change(&mut self, change: StatusChange, now: DateTime<Utc>) {
        let StatusChange {
            status,
            details,
            actor,
        } = change;

        let previous_status = std::mem::replace(&mut self.status, status.clone());
        let now = now.max(self.updated_at);
        self.updated_at = now;
        self.audit.push(
            AuditEntry::status_changed(now, previous_status, status, details, actor).into(),
        );
    }
}

/// A validated single submission. Foreign keys have been resolved by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct NewApplication {
    pub service_id: ServiceId,
    pub uid: Uid,
    pub filled_data: Payload,
    pub status: Option<String>,
}

impl NewApplication {
    pub fn new(service_id: ServiceId, uid: Uid, filled_data: Payload, status: Option<String>) -> Self {
        Self {
            service_id,
            uid,
            filled_data,
            status,
        }
    }
}

/// An application recorded offline by a client and uploaded in a batch.
/// Everything beyond the three required fields is optional. The caller's audit
/// entries are opaque.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchApplication {
    pub app_id: Option<AppId>,
    pub service_id: ServiceId,
    pub uid: Uid,
    pub filled_data: Payload,
    pub status: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub audit: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: String,
    pub details: Option<String>,
    pub actor: Option<String>,
}

impl StatusChange {
    pub fn new(status: String, details: Option<String>, actor: Option<String>) -> Self {
        Self {
            status,
            details,
            actor,
        }
    }
}
