use error_stack::ResultExt;
use portal_core::IntentPatternSource;
use portal_core::intent::{IntentPattern, IntentPatternFile};
use portal_core::result::{IntentSourceError, RepoResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Intent rules kept in a JSON file. The file is read on every `load`, so edits
/// take effect without a restart.
#[derive(Debug, Clone)]
pub struct FilePatternSource {
    path: Arc<Path>,
}

impl FilePatternSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        Self {
            path: Arc::from(path),
        }
    }
}

impl IntentPatternSource for FilePatternSource {
    #[instrument(skip(self), fields(path = %self.path.display()), name = "repo#load_patterns")]
    async fn load(&self) -> RepoResult<Vec<IntentPattern>, IntentSourceError> {
        let contents = tokio::fs::read(&*self.path)
            .await
            .change_context(IntentSourceError::Read)
            .attach(self.path.display().to_string())?;

        let file: IntentPatternFile = serde_json::from_slice(&contents)
            .change_context(IntentSourceError::Parse)
            .attach(self.path.display().to_string())?;

        debug!("loaded {} intent patterns", file.patterns.len());
        Ok(file.patterns)
    }
}
