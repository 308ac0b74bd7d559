pub mod config;
pub mod executor;
pub mod github;
pub mod harvest;
pub mod model;
pub mod sink;
pub mod telemetry;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export common types for convenience
pub use config::HarvestConfig;
pub use executor::*;
pub use github::GitHubClient;
pub use harvest::*;
pub use model::*;
pub use sink::{LibraryRecord, MemorySink, VersionRecord};
pub use traits::*;
