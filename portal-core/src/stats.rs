use crate::model::Application;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_applications: usize,
    pub total_users: usize,
    pub total_services: usize,
    pub applications_by_status: BTreeMap<String, usize>,
    pub applications_by_service: BTreeMap<String, usize>,
}

impl Stats {
    pub fn compute(applications: &[Application], total_users: usize, total_services: usize) -> Self {
        Self {
            total_applications: applications.len(),
            total_users,
            total_services,
            applications_by_status: applications
                .iter()
                .map(|a| a.status.clone())
                .counts()
                .into_iter()
                .collect(),
            applications_by_service: applications
                .iter()
                .map(|a| a.service_id.to_string())
                .counts()
                .into_iter()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::AppId;
    use crate::model::{NewApplication, StatusChange};
    use chrono::Utc;
    use serde_json::Map;

    fn application(service_id: &str, status: Option<&str>) -> Application {
        Application::submit(
            AppId::generate(),
            NewApplication::new(
                service_id.into(),
                "U1".into(),
                Map::new(),
                status.map(str::to_string),
            ),
            Utc::now(),
        )
    }

    #[test]
    fn empty_registry_counts_nothing() {
        let stats = Stats::compute(&[], 3, 5);

        assert_eq!(0, stats.total_applications);
        assert_eq!(3, stats.total_users);
        assert_eq!(5, stats.total_services);
        assert!(stats.applications_by_status.is_empty());
        assert!(stats.applications_by_service.is_empty());
    }

    #[test]
    fn groups_by_status_and_service() {
        let first = application("S1", None);
        let mut second = application("S1", None);
        second.apply_status_change(StatusChange::new("approved".into(), None, None), Utc::now());

        let stats = Stats::compute(&[first, second], 1, 1);

        assert_eq!(2, stats.total_applications);
        assert_eq!(
            BTreeMap::from([("submitted".to_string(), 1), ("approved".to_string(), 1)]),
            stats.applications_by_status
        );
        assert_eq!(Some(&2), stats.applications_by_service.get("S1"));
    }

    #[test]
    fn statuses_are_free_form() {
        let stats = Stats::compute(
            &[
                application("S1", Some("needs-docs")),
                application("S2", Some("needs-docs")),
                application("S2", Some("Needs-Docs")),
            ],
            0,
            0,
        );

        assert_eq!(Some(&2), stats.applications_by_status.get("needs-docs"));
        assert_eq!(Some(&1), stats.applications_by_status.get("Needs-Docs"));
        assert_eq!(Some(&2), stats.applications_by_service.get("S2"));
    }
}
