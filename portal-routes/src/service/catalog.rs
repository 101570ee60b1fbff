use super::{PortalService, non_empty};
use crate::error::PortalServiceError;
use crate::{OptServiceResult, ServiceResult};
use error_stack::ResultExt;
use portal_core::id::{ServiceId, Uid};
use portal_core::model::{Service, User};
use portal_core::{CatalogRepository, DirectoryRepository, PortalEngine};
use tracing::instrument;

impl<T: PortalEngine> PortalService<T> {
    #[instrument(skip_all, name = "service#get_service")]
    pub async fn get_service(&self, id: ServiceId) -> OptServiceResult<Service> {
        self.engine
            .catalog()
            .get(id)
            .await
            .change_context(PortalServiceError)
    }

    pub async fn list_services(&self, category: Option<String>) -> ServiceResult<Vec<Service>> {
        self.engine
            .catalog()
            .list(non_empty(category))
            .await
            .change_context(PortalServiceError)
    }

    #[instrument(skip_all, name = "service#get_user")]
    pub async fn get_user(&self, uid: Uid) -> OptServiceResult<User> {
        self.engine
            .directory()
            .get(uid)
            .await
            .change_context(PortalServiceError)
    }
}
