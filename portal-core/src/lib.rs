use id::{AppId, ServiceId, Uid};
use intent::IntentPattern;
use model::{Application, BatchApplication, NewApplication, Service, StatusChange, User};
use result::{
    ApplicationRepoError, CatalogRepoError, DirectoryRepoError, IntentSourceError, OptRepoResult,
    RepoResult,
};

pub mod id;
pub mod intent;
pub mod model;
pub mod result;
pub mod stats;

/// Everything a portal instance is built from. Constructed once at startup and
/// shared with every handler through the app state.
pub trait PortalEngine: Clone + Send + Sync + 'static {
    type Catalog: CatalogRepository;
    type Directory: DirectoryRepository;
    type Applications: ApplicationRepository;
    type Patterns: IntentPatternSource;

    fn catalog(&self) -> Self::Catalog;
    fn directory(&self) -> Self::Directory;
    fn applications(&self) -> Self::Applications;
    fn patterns(&self) -> Self::Patterns;
}

/// Read-only view of the seeded services.
pub trait CatalogRepository: Send + Sync + Clone + 'static {
    fn get(
        &self,
        id: ServiceId,
    ) -> impl Future<Output = OptRepoResult<Service, CatalogRepoError>> + Send;

    /// All services in load order, or only those in `category` when one is given.
    fn list(
        &self,
        category: Option<String>,
    ) -> impl Future<Output = RepoResult<Vec<Service>, CatalogRepoError>> + Send;

    /// The first `n` service ids in load order.
    fn first_ids(
        &self,
        n: usize,
    ) -> impl Future<Output = RepoResult<Vec<ServiceId>, CatalogRepoError>> + Send;

    fn count(&self) -> impl Future<Output = RepoResult<usize, CatalogRepoError>> + Send;
}

/// Read-only view of the seeded users.
pub trait DirectoryRepository: Send + Sync + Clone + 'static {
    fn get(&self, uid: Uid) -> impl Future<Output = OptRepoResult<User, DirectoryRepoError>> + Send;

    fn count(&self) -> impl Future<Output = RepoResult<usize, DirectoryRepoError>> + Send;
}

/// The mutable application registry. Implementations must serialize writers so
/// that id allocation and audit appends are never interleaved.
pub trait ApplicationRepository: Send + Sync + Clone + 'static {
    fn get(
        &self,
        id: AppId,
    ) -> impl Future<Output = OptRepoResult<Application, ApplicationRepoError>> + Send;

    fn list(&self) -> impl Future<Output = RepoResult<Vec<Application>, ApplicationRepoError>> + Send;

    fn list_by_user(
        &self,
        uid: Uid,
    ) -> impl Future<Output = RepoResult<Vec<Application>, ApplicationRepoError>> + Send;

    fn create(
        &self,
        new_application: NewApplication,
    ) -> impl Future<Output = RepoResult<Application, ApplicationRepoError>> + Send;

    /// Inserts each record independently. The outer result fails only if the
    /// registry itself is unusable; per-record failures are in the inner results,
    /// in input order.
    fn create_many(
        &self,
        applications: Vec<BatchApplication>,
    ) -> impl Future<
        Output = RepoResult<Vec<RepoResult<Application, ApplicationRepoError>>, ApplicationRepoError>,
    > + Send;

    fn update_status(
        &self,
        id: AppId,
        change: StatusChange,
    ) -> impl Future<Output = OptRepoResult<Application, ApplicationRepoError>> + Send;

    /// Removes every application and returns how many were removed.
    fn clear(&self) -> impl Future<Output = RepoResult<usize, ApplicationRepoError>> + Send;
}

pub trait IntentPatternSource: Send + Sync + Clone + 'static {
    /// Loads the current rule table, in priority order.
    fn load(
        &self,
    ) -> impl Future<Output = RepoResult<Vec<IntentPattern>, IntentSourceError>> + Send;
}
