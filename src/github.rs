//! GitHub REST API implementation of [`RepositoryClient`].
//!
//! Wire records are decoded into private serde structs and converted to the
//! crate's model, so the rest of the harvester never sees API field names.

use crate::config::HarvestConfig;
use crate::model::{Repository, Tag};
use crate::traits::{ClientError, RepositoryClient};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TAGS_PER_PAGE: u32 = 100;
const ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct WireOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct WireRepository {
    name: String,
    owner: WireOwner,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    git_url: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    source: Option<Box<WireRepository>>,
}

impl From<WireRepository> for Repository {
    fn from(wire: WireRepository) -> Self {
        Repository {
            owner: wire.owner.login,
            name: wire.name,
            description: wire.description,
            homepage: wire.html_url,
            git_url: wire.git_url,
            stars: wire.stargazers_count,
            fork: wire.fork,
            source: wire.source.map(|source| Box::new(Repository::from(*source))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireCommit {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct WireTag {
    name: String,
    commit: WireCommit,
    #[serde(default)]
    tarball_url: Option<String>,
    #[serde(default)]
    zipball_url: Option<String>,
}

impl From<WireTag> for Tag {
    fn from(wire: WireTag) -> Self {
        Tag {
            name: wire.name,
            commit: wire.commit.sha,
            tarball_url: wire.tarball_url,
            zipball_url: wire.zipball_url,
        }
    }
}

/// GitHub API client. Cheap to clone and safe to share between tasks.
#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    /// Creates a client; requests are anonymous when `token` is `None`.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ClientError::Other(format!("Invalid token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .user_agent(format!("tag-harvester/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Uses the configured API URL and the resolved token.
    pub fn from_config(config: &HarvestConfig) -> Result<Self, ClientError> {
        Self::new(config.api_url.clone(), config.resolve_token())
    }

    fn repositories_url(&self, owner: &str, page: u32, per_page: u32) -> String {
        format!(
            "{}/users/{}/repos?page={}&per_page={}",
            self.base_url, owner, page, per_page
        )
    }

    fn repository_url(&self, owner: &str, name: &str) -> String {
        format!("{}/repos/{}/{}", self.base_url, owner, name)
    }

    fn tags_url(&self, owner: &str, name: &str, page: u32) -> String {
        format!(
            "{}/repos/{}/{}/tags?page={}&per_page={}",
            self.base_url, owner, name, page, TAGS_PER_PAGE
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RepositoryClient for GitHubClient {
    async fn list_repositories(
        &self,
        owner: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Repository>, ClientError> {
        let url = self.repositories_url(owner, page, per_page);
        let repos: Vec<WireRepository> = self.get_json(&url).await?;
        Ok(repos.into_iter().map(Repository::from).collect())
    }

    async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository, ClientError> {
        let repo: WireRepository = self.get_json(&self.repository_url(owner, name)).await?;
        Ok(repo.into())
    }

    #[instrument(skip(self))]
    async fn list_tags(&self, owner: &str, name: &str) -> Result<Vec<Tag>, ClientError> {
        let mut tags = Vec::new();
        let mut page = 1;

        loop {
            let batch: Vec<WireTag> = self.get_json(&self.tags_url(owner, name, page)).await?;
            if batch.is_empty() {
                break;
            }
            debug!(page, entries = batch.len(), "Fetched tag page");
            tags.extend(batch.into_iter().map(Tag::from));
            page += 1;
        }

        Ok(tags)
    }
}
