use error_stack::{Report, ResultExt};
use portal_core::id::{ServiceId, Uid};
use portal_core::model::{Service, User};
use portal_core::result::{CatalogRepoError, DirectoryRepoError, OptRepoResult, RepoResult};
use portal_core::{CatalogRepository, DirectoryRepository};
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open seed file for reading")]
    Io,
    #[error("failed to parse seed file contents as JSON")]
    Json,
}

/// Shape of the seed file. Either collection may be left out.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub services: Vec<Service>,
}

/// Users and services loaded once at startup. Never written to afterwards, so
/// clones share the same data without a lock.
#[derive(Debug, Clone, Default)]
pub struct SeedStore {
    services: Arc<[Service]>,
    users: Arc<[User]>,
}

impl SeedStore {
    pub fn new(seed: SeedData) -> Self {
        Self {
            services: seed.services.into(),
            users: seed.users.into(),
        }
    }

    #[instrument]
    pub fn load(path: &Path) -> Result<Self, Report<LoadError>> {
        debug!("loading seed data...");
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .change_context(LoadError::Io)
            .attach(path.display().to_string())?;

        let seed: SeedData = serde_json::from_reader(file)
            .change_context(LoadError::Json)
            .attach(path.display().to_string())?;

        info!(
            "loaded {} users and {} services from seed data",
            seed.users.len(),
            seed.services.len()
        );
        Ok(Self::new(seed))
    }

    pub fn catalog(&self) -> SeedCatalog {
        SeedCatalog {
            services: Arc::clone(&self.services),
        }
    }

    pub fn directory(&self) -> SeedDirectory {
        SeedDirectory {
            users: Arc::clone(&self.users),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeedCatalog {
    services: Arc<[Service]>,
}

impl CatalogRepository for SeedCatalog {
    #[instrument(skip(self), ret(level = "debug"), name = "repo#get_service")]
    async fn get(&self, id: ServiceId) -> OptRepoResult<Service, CatalogRepoError> {
        Ok(self.services.iter().find(|s| s.service_id == id).cloned())
    }

    #[instrument(skip(self), name = "repo#list_services")]
    async fn list(&self, category: Option<String>) -> RepoResult<Vec<Service>, CatalogRepoError> {
        let services = match category {
            Some(category) => self
                .services
                .iter()
                .filter(|s| s.in_category(&category))
                .cloned()
                .collect(),
            None => self.services.to_vec(),
        };

        Ok(services)
    }

    async fn first_ids(&self, n: usize) -> RepoResult<Vec<ServiceId>, CatalogRepoError> {
        Ok(self
            .services
            .iter()
            .take(n)
            .map(|s| s.service_id.clone())
            .collect())
    }

    async fn count(&self) -> RepoResult<usize, CatalogRepoError> {
        Ok(self.services.len())
    }
}

#[derive(Debug, Clone)]
pub struct SeedDirectory {
    users: Arc<[User]>,
}

impl DirectoryRepository for SeedDirectory {
    #[instrument(skip(self), ret(level = "debug"), name = "repo#get_user")]
    async fn get(&self, uid: Uid) -> OptRepoResult<User, DirectoryRepoError> {
        Ok(self.users.iter().find(|u| u.uid == uid).cloned())
    }

    async fn count(&self) -> RepoResult<usize, DirectoryRepoError> {
        Ok(self.users.len())
    }
}
