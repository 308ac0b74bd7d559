//! Tag listing for one repository.

use crate::model::Tag;
use crate::traits::{ClientError, RepositoryClient};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Lists a repository's tags through the [`RepositoryClient`], which owns
/// pagination.
#[derive(Clone)]
pub struct TagResolver {
    client: Arc<dyn RepositoryClient>,
}

impl TagResolver {
    pub fn new(client: Arc<dyn RepositoryClient>) -> Self {
        Self { client }
    }

    /// A failure here is repository-scoped; callers skip the repository.
    #[instrument(skip(self))]
    pub async fn list_tags(&self, owner: &str, name: &str) -> Result<Vec<Tag>, ClientError> {
        let tags = self.client.list_tags(owner, name).await?;
        debug!(count = tags.len(), "Listed tags");
        Ok(tags)
    }
}
