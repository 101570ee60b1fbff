use error_stack::Report;

pub type RepoResult<T, E> = Result<T, Report<E>>;
pub type OptRepoResult<T, E> = Result<Option<T>, Report<E>>;

#[derive(Debug, thiserror::Error)]
pub enum CatalogRepoError {
    #[error("failed to get service")]
    Get,
    #[error("failed to list services")]
    List,
    #[error("failed to count services")]
    Count,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryRepoError {
    #[error("failed to get user")]
    Get,
    #[error("failed to count users")]
    Count,
}

#[derive(Debug, thiserror::Error)]
pub enum ApplicationRepoError {
    #[error("failed to get application")]
    Get,
    #[error("failed to list applications")]
    List,
    #[error("failed to create application")]
    Create,
    #[error("An application with this appId already exists")]
    DuplicateId,
    #[error("failed to update application status")]
    UpdateStatus,
    #[error("failed to clear applications")]
    Clear,
}

#[derive(Debug, thiserror::Error)]
pub enum IntentSourceError {
    #[error("failed to read intent patterns")]
    Read,
    #[error("failed to parse intent patterns")]
    Parse,
    #[error("intent pattern is not a valid regular expression")]
    Pattern,
}
