//! Repository discovery for one account.
//!
//! Listing is paged with a fixed page size until an empty page comes back;
//! any page failure is fatal. Each matching repository is then re-fetched in
//! full, and forks are resolved to their upstream source for metadata.

use crate::harvest::pipeline::HarvestError;
use crate::model::{HarvestTarget, Repository};
use crate::traits::RepositoryClient;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct RepositoryEnumerator {
    client: Arc<dyn RepositoryClient>,
    pattern: Regex,
    page_size: u32,
}

impl RepositoryEnumerator {
    pub fn new(client: Arc<dyn RepositoryClient>, pattern: Regex, page_size: u32) -> Self {
        Self {
            client,
            pattern,
            page_size: page_size.max(1),
        }
    }

    /// Collects every page of the account's repository listing.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::ListRepositories`] if any page fails; without
    /// the complete listing the run cannot proceed.
    #[instrument(skip(self))]
    pub async fn list_all(&self, owner: &str) -> Result<Vec<Repository>, HarvestError> {
        let mut repositories = Vec::new();
        let mut page = 1;

        loop {
            let entries = self
                .client
                .list_repositories(owner, page, self.page_size)
                .await
                .map_err(|source| HarvestError::ListRepositories {
                    owner: owner.to_string(),
                    page,
                    source,
                })?;

            debug!(page, entries = entries.len(), "Fetched repository page");
            if entries.is_empty() {
                break;
            }
            repositories.extend(entries);
            page += 1;
        }

        info!(count = repositories.len(), "Listed repositories");
        Ok(repositories)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    /// Turns a listed repository into a harvest target.
    ///
    /// The name is expected to have passed [`Self::matches`] already.
    /// Returns `None` when the detail record cannot be fetched; that is
    /// logged and never fatal.
    pub async fn resolve(&self, owner: &str, listed: &Repository) -> Option<HarvestTarget> {
        match self.client.get_repository(owner, &listed.name).await {
            Ok(detail) => Some(resolve_fork(owner, detail)),
            Err(e) => {
                warn!(
                    owner,
                    repo = %listed.name,
                    error = %e,
                    "Unable to fetch complete repository details"
                );
                None
            }
        }
    }

    /// Lists and resolves every repository of the account in listing order.
    pub async fn enumerate(&self, owner: &str) -> Result<Vec<HarvestTarget>, HarvestError> {
        let mut targets = Vec::new();
        for listed in self.list_all(owner).await? {
            if !self.matches(&listed.name) {
                debug!(
                    repo = %listed.name,
                    pattern = %self.pattern,
                    "Skipping repository, name does not match pattern"
                );
                continue;
            }
            if let Some(target) = self.resolve(owner, &listed).await {
                targets.push(target);
            }
        }
        Ok(targets)
    }
}

/// Forks with a known source are recorded under the source's metadata but
/// keep their own name for tag enumeration. A fork without a source is
/// treated like any other repository.
pub fn resolve_fork(owner: &str, mut detail: Repository) -> HarvestTarget {
    let name = detail.name.clone();
    let metadata = match detail.source.take() {
        Some(source) if detail.fork => {
            debug!(repo = %name, source = %source.full_name(), "Fork resolved to source");
            *source
        }
        _ => detail,
    };

    HarvestTarget {
        owner: owner.to_string(),
        name,
        metadata,
    }
}
