//! Boundaries to the collaborators the harvester drives.
//!
//! - [`RepositoryClient`]: repository listing, detail and tag lookups
//! - [`ManifestExtractor`]: finds package manifests at a commit
//! - [`VersionNormalizer`]: turns a tag into a [`CanonicalVersion`]
//! - [`RecordSink`]: upsert-only storage for libraries, versions and dependencies

use crate::model::{CanonicalVersion, DirectoryInfo, Repository, Tag};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Client error: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Repository API error: {0}")]
    Client(#[from] ClientError),
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),
    #[error("Extraction error: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("'{raw}' is not a semantic version: {reason}")]
    Unparseable { raw: String, reason: String },
}

/// Hosting API access. Implementations must be safe to share between tasks.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Fetches one page (1-based) of the account's repositories in summary form.
    async fn list_repositories(
        &self,
        owner: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Repository>, ClientError>;

    /// Fetches the full record of a repository, including its fork source.
    async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository, ClientError>;

    /// Lists every tag of a repository. Pagination is the client's concern.
    async fn list_tags(&self, owner: &str, name: &str) -> Result<Vec<Tag>, ClientError>;
}

/// Everything an extractor needs to locate manifests at one version.
#[derive(Debug, Clone, Copy)]
pub struct ExtractRequest<'a> {
    pub owner_login: &'a str,
    pub display_name: &'a str,
    pub repository: &'a Repository,
    pub commit: &'a str,
    pub version: &'a str,
}

#[async_trait]
pub trait ManifestExtractor: Send + Sync {
    async fn extract(&self, request: ExtractRequest<'_>) -> Result<DirectoryInfo, ExtractError>;
}

pub trait VersionNormalizer: Send + Sync {
    fn normalize(&self, raw: &str) -> Result<CanonicalVersion, VersionError>;
}

/// Storage boundary. Every mutation is a set-style upsert keyed by identity,
/// so replaying the same calls leaves the store unchanged.
pub trait RecordSink: Send + Sync {
    /// Obtains (creating if needed) the library identified by the triple.
    fn library<'a>(
        &'a self,
        name: &str,
        homepage: &str,
        owner_uri: &str,
    ) -> Result<Box<dyn LibraryHandle + 'a>, SinkError>;
}

pub trait LibraryHandle {
    fn set_description(&self, description: &str) -> Result<(), SinkError>;
    fn set_homepage(&self, homepage: &str) -> Result<(), SinkError>;
    fn set_repository(&self, url: &str, protocol: &str) -> Result<(), SinkError>;
    fn set_stars(&self, stars: u64) -> Result<(), SinkError>;
    fn set_email(&self, email: &str) -> Result<(), SinkError>;
    fn add_version<'a>(
        &'a self,
        version: &CanonicalVersion,
    ) -> Result<Box<dyn VersionHandle + 'a>, SinkError>;
}

pub trait VersionHandle {
    fn set_path(&self, path: &str, is_file: bool) -> Result<(), SinkError>;
    fn set_hash(&self, hash: &str) -> Result<(), SinkError>;
    fn set_tarball_url(&self, url: &str) -> Result<(), SinkError>;
    fn set_zipball_url(&self, url: &str) -> Result<(), SinkError>;
    fn add_dependency(&self, name: &str, constraint: &str) -> Result<(), SinkError>;
}
