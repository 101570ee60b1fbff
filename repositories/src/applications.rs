use chrono::Utc;
use engine::ArwLock;
use error_stack::Report;
use portal_core::ApplicationRepository;
use portal_core::id::{AppId, Uid};
use portal_core::model::{Application, BatchApplication, NewApplication, StatusChange};
use portal_core::result::{ApplicationRepoError, OptRepoResult, RepoResult};
use tracing::{debug, info, instrument};

/// The application registry. Insertion order is kept so listings come back in
/// submission order. All writes go through the write half of the lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryApplicationRepo {
    applications: ArwLock<Vec<Application>>,
}

impl MemoryApplicationRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_id(applications: &[Application], id: &AppId) -> bool {
    applications.iter().any(|a| &a.app_id == id)
}

/// Must be called with the write lock held so the id cannot be taken in between.
fn allocate_id(applications: &[Application]) -> AppId {
    loop {
        let id = AppId::generate();
        if !contains_id(applications, &id) {
            return id;
        }
    }
}

impl ApplicationRepository for MemoryApplicationRepo {
    #[instrument(skip(self), ret(level = "debug"), name = "repo#get_application")]
    async fn get(&self, id: AppId) -> OptRepoResult<Application, ApplicationRepoError> {
        let applications = self.applications.read().await;
        Ok(applications.iter().find(|a| a.app_id == id).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<Application>, ApplicationRepoError> {
        Ok(self.applications.read().await.clone())
    }

    #[instrument(skip(self), name = "repo#list_by_user")]
    async fn list_by_user(&self, uid: Uid) -> RepoResult<Vec<Application>, ApplicationRepoError> {
        let applications = self.applications.read().await;
        let found: Vec<_> = applications
            .iter()
            .filter(|a| a.uid == uid)
            .cloned()
            .collect();

        debug!("{} applications found for user", found.len());
        Ok(found)
    }

    #[instrument(skip_all, name = "repo#create")]
    async fn create(
        &self,
        new_application: NewApplication,
    ) -> RepoResult<Application, ApplicationRepoError> {
        let mut applications = self.applications.write().await;

        let id = allocate_id(&applications);
        let application = Application::submit(id, new_application, Utc::now());
        applications.push(application.clone());

        info!(
            "new application submitted: {} for service {} by user {}",
            application.app_id, application.service_id, application.uid
        );
        Ok(application)
    }

    #[instrument(skip_all, fields(batch.size = batch.len()), name = "repo#create_many")]
    async fn create_many(
        &self,
        batch: Vec<BatchApplication>,
    ) -> RepoResult<Vec<RepoResult<Application, ApplicationRepoError>>, ApplicationRepoError> {
        let mut applications = self.applications.write().await;
        let now = Utc::now();

        let results = batch
            .into_iter()
            .map(|record| {
                let id = match &record.app_id {
                    Some(id) if contains_id(&applications, id) => {
                        return Err(Report::new(ApplicationRepoError::DuplicateId)
                            .attach(format!("appId: {id}")));
                    }
                    Some(id) => id.clone(),
                    None => allocate_id(&applications),
                };

                let application = Application::synced(id, record, now);
                applications.push(application.clone());
                info!("batch application submitted: {}", application.app_id);
                Ok(application)
            })
            .collect();

        Ok(results)
    }

    #[instrument(skip(self, change), fields(change.status = %change.status), name = "repo#update_status")]
    async fn update_status(
        &self,
        id: AppId,
        change: StatusChange,
    ) -> OptRepoResult<Application, ApplicationRepoError> {
        let mut applications = self.applications.write().await;

        let Some(application) = applications.iter_mut().find(|a| a.app_id == id) else {
            return Ok(None);
        };

        let previous_status = application.status.clone();
        application.apply_status_change(change, Utc::now());

        info!(
            "application {} status updated: {} -> {}",
            application.app_id, previous_status, application.status
        );
        Ok(Some(application.clone()))
    }

    #[instrument(skip(self), name = "repo#clear")]
    async fn clear(&self) -> RepoResult<usize, ApplicationRepoError> {
        let mut applications = self.applications.write().await;
        let count = applications.len();
        applications.clear();

        info!("cleared all {count} applications");
        Ok(count)
    }
}
