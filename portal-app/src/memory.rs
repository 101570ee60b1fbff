use portal_core::PortalEngine;
use repositories::{
    FilePatternSource, MemoryApplicationRepo, SeedCatalog, SeedDirectory, SeedStore,
};

/// The in-memory portal: seeded catalog and directory, a fresh application
/// registry, and the intent pattern file.
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    store: SeedStore,
    applications: MemoryApplicationRepo,
    patterns: FilePatternSource,
}

impl MemoryEngine {
    pub fn new(store: SeedStore, patterns: FilePatternSource) -> Self {
        Self {
            store,
            applications: MemoryApplicationRepo::new(),
            patterns,
        }
    }
}

impl PortalEngine for MemoryEngine {
    type Catalog = SeedCatalog;
    type Directory = SeedDirectory;
    type Applications = MemoryApplicationRepo;
    type Patterns = FilePatternSource;

    fn catalog(&self) -> Self::Catalog {
        self.store.catalog()
    }

    fn directory(&self) -> Self::Directory {
        self.store.directory()
    }

    fn applications(&self) -> Self::Applications {
        self.applications.clone()
    }

    fn patterns(&self) -> Self::Patterns {
        self.patterns.clone()
    }
}
