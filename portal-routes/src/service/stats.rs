use super::PortalService;
use crate::ServiceResult;
use crate::error::PortalServiceError;
use error_stack::ResultExt;
use portal_core::stats::Stats;
use portal_core::{ApplicationRepository, CatalogRepository, DirectoryRepository, PortalEngine};
use tracing::instrument;

impl<T: PortalEngine> PortalService<T> {
    /// Recomputed from the registry on every call.
    #[instrument(skip_all, name = "service#stats")]
    pub async fn stats(&self) -> ServiceResult<Stats> {
        let applications = self
            .engine
            .applications()
            .list()
            .await
            .change_context(PortalServiceError)?;
        let total_users = self
            .engine
            .directory()
            .count()
            .await
            .change_context(PortalServiceError)?;
        let total_services = self
            .engine
            .catalog()
            .count()
            .await
            .change_context(PortalServiceError)?;

        Ok(Stats::compute(&applications, total_users, total_services))
    }
}
