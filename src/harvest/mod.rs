//! Harvest module - repository tag harvesting pipeline.
//!
//! Stages, leaf first:
//! - **Exclusion**: static denylist via [`ExclusionFilter`]
//! - **Versions**: tag to canonical version via [`VersionResolver`]
//! - **Tags**: per-repository tag listing via [`TagResolver`]
//! - **Repositories**: paging, filtering and fork resolution via [`RepositoryEnumerator`]
//! - **Recording**: per-tag sink writes via [`VersionRecorder`]
//! - **Pipeline**: the whole run via [`pipeline::HarvestPipeline`]

pub mod exclusion;
pub mod pipeline;
pub mod recorder;
pub mod repos;
pub mod tags;
pub mod version;

// Re-export commonly used types
pub use exclusion::ExclusionFilter;
pub use pipeline::{HarvestError, HarvestPipeline, HarvestReport};
pub use recorder::{VersionOutcome, VersionRecorder};
pub use repos::{resolve_fork, RepositoryEnumerator};
pub use tags::TagResolver;
pub use version::{strip_version_prefix, SemverNormalizer, VersionResolver};
