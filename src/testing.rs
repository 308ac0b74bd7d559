//! Scripted collaborators and fixtures shared by the unit tests.

use crate::model::{DirectoryInfo, Repository, Tag};
use crate::traits::{
    ClientError, ExtractError, ExtractRequest, LibraryHandle, ManifestExtractor, RecordSink,
    RepositoryClient, SinkError,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub fn repo(owner: &str, name: &str) -> Repository {
    Repository {
        owner: owner.to_string(),
        name: name.to_string(),
        description: Some(format!("{} library", name)),
        homepage: Some(format!("https://host/{}/{}", owner, name)),
        git_url: Some(format!("git://host/{}/{}.git", owner, name)),
        stars: 0,
        fork: false,
        source: None,
    }
}

pub fn tag(name: &str, commit: &str) -> Tag {
    Tag {
        name: name.to_string(),
        commit: commit.to_string(),
        tarball_url: Some(format!("https://host/tarball/{}", name)),
        zipball_url: Some(format!("https://host/zipball/{}", name)),
    }
}

type RepoKey = (String, String);

fn key(owner: &str, name: &str) -> RepoKey {
    (owner.to_string(), name.to_string())
}

/// In-memory hosting API. Repositories are listed in insertion order.
#[derive(Default)]
pub struct MockClient {
    listing: Vec<Repository>,
    details: HashMap<RepoKey, Repository>,
    tags: HashMap<RepoKey, Vec<Tag>>,
    failing_tags: HashSet<RepoKey>,
    failing_page: Option<u32>,
    pub pages_requested: Mutex<Vec<u32>>,
    pub tags_requested: Mutex<Vec<RepoKey>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listed, with `repository` as its detail record.
    pub fn with_repository(mut self, repository: Repository) -> Self {
        let mut summary = repository.clone();
        summary.source = None;
        self.listing.push(summary);
        self.details
            .insert(key(&repository.owner, &repository.name), repository);
        self
    }

    /// Listed, but the detail fetch fails.
    pub fn with_listed_only(mut self, repository: Repository) -> Self {
        self.listing.push(repository);
        self
    }

    pub fn with_tags(mut self, owner: &str, name: &str, tags: Vec<Tag>) -> Self {
        self.tags.insert(key(owner, name), tags);
        self
    }

    pub fn with_failing_tags(mut self, owner: &str, name: &str) -> Self {
        self.failing_tags.insert(key(owner, name));
        self
    }

    pub fn with_failing_page(mut self, page: u32) -> Self {
        self.failing_page = Some(page);
        self
    }
}

#[async_trait]
impl RepositoryClient for MockClient {
    async fn list_repositories(
        &self,
        owner: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Repository>, ClientError> {
        self.pages_requested.lock().unwrap().push(page);
        if self.failing_page == Some(page) {
            return Err(ClientError::Other(format!("page {} unavailable", page)));
        }
        let start = ((page - 1) * per_page) as usize;
        Ok(self
            .listing
            .iter()
            .filter(|r| r.owner == owner)
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect())
    }

    async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository, ClientError> {
        self.details
            .get(&key(owner, name))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("{}/{}", owner, name)))
    }

    async fn list_tags(&self, owner: &str, name: &str) -> Result<Vec<Tag>, ClientError> {
        self.tags_requested.lock().unwrap().push(key(owner, name));
        if self.failing_tags.contains(&key(owner, name)) {
            return Err(ClientError::Other(format!("tags of {}/{} unavailable", owner, name)));
        }
        Ok(self.tags.get(&key(owner, name)).cloned().unwrap_or_default())
    }
}

/// One recorded extractor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractCall {
    pub owner_login: String,
    pub display_name: String,
    pub commit: String,
    pub version: String,
}

/// Returns scripted directory info per commit; unknown commits yield nothing.
#[derive(Default)]
pub struct MockExtractor {
    by_commit: HashMap<String, DirectoryInfo>,
    failing: HashSet<String>,
    pub calls: Mutex<Vec<ExtractCall>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_info(mut self, commit: &str, info: DirectoryInfo) -> Self {
        self.by_commit.insert(commit.to_string(), info);
        self
    }

    pub fn with_failure(mut self, commit: &str) -> Self {
        self.failing.insert(commit.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ManifestExtractor for MockExtractor {
    async fn extract(&self, request: ExtractRequest<'_>) -> Result<DirectoryInfo, ExtractError> {
        self.calls.lock().unwrap().push(ExtractCall {
            owner_login: request.owner_login.to_string(),
            display_name: request.display_name.to_string(),
            commit: request.commit.to_string(),
            version: request.version.to_string(),
        });
        if self.failing.contains(request.commit) {
            return Err(ExtractError::InvalidManifest(format!(
                "broken manifest at {}",
                request.commit
            )));
        }
        Ok(self
            .by_commit
            .get(request.commit)
            .cloned()
            .unwrap_or_default())
    }
}

/// Sink whose backing store is unreachable; every library lookup fails.
pub struct FailingSink;

impl RecordSink for FailingSink {
    fn library<'a>(
        &'a self,
        name: &str,
        _homepage: &str,
        _owner_uri: &str,
    ) -> Result<Box<dyn LibraryHandle + 'a>, SinkError> {
        Err(SinkError::Storage(format!("index unavailable for {}", name)))
    }
}
