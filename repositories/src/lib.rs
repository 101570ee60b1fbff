pub mod applications;
pub mod intent;
pub mod seed;

pub use applications::MemoryApplicationRepo;
pub use intent::FilePatternSource;
pub use seed::{SeedCatalog, SeedData, SeedDirectory, SeedStore};
