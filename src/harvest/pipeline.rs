//! Top-level harvest run.
//!
//! This module provides the [`HarvestPipeline`] coordinator that walks an
//! account's repositories and records every versioned tag:
//! 1. **Enumeration**: list all repository pages (fatal on failure)
//! 2. **Resolution**: pattern filter, detail fetch and fork resolution
//! 3. **Tags**: list tags, drop excluded ones
//! 4. **Recording**: resolve, extract and record each remaining tag
//!
//! Only enumeration failures abort a run. Everything else is contained to
//! the repository or tag it concerns and shows up in the [`HarvestReport`].

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use regex::Regex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::config::HarvestConfig;
use crate::executor::HarvesterExecutor;
use crate::harvest::recorder::{VersionOutcome, VersionRecorder};
use crate::harvest::repos::RepositoryEnumerator;
use crate::harvest::tags::TagResolver;
use crate::harvest::version::VersionResolver;
use crate::model::{HarvestTarget, Repository, Tag};
use crate::traits::{
    ClientError, ManifestExtractor, RecordSink, RepositoryClient, VersionNormalizer,
};

// ============================================================================
// Errors
// ============================================================================

/// Errors that abort a whole harvest run.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    /// A page of the account's repository listing could not be fetched
    #[error("Failed to list repositories for {owner} (page {page}): {source}")]
    ListRepositories {
        owner: String,
        page: u32,
        source: ClientError,
    },

    /// The repository name pattern is not a valid regular expression
    #[error("Invalid repository name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The job executor could not schedule work
    #[error("Executor error: {0}")]
    Executor(String),
}

// ============================================================================
// Report
// ============================================================================

/// Counters describing what a run did.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct HarvestReport {
    /// Repositories returned by the listing
    pub repositories_listed: usize,

    /// Repositories whose name matched the pattern
    pub repositories_matched: usize,

    /// Matching repositories dropped because detail or tag lookups failed
    pub repositories_skipped: usize,

    pub tags_seen: usize,
    pub tags_excluded: usize,
    pub tags_not_versions: usize,
    pub tags_empty: usize,

    /// Tags abandoned on extractor or sink failure
    pub tags_failed: usize,

    pub versions_recorded: usize,
    pub libraries_recorded: usize,

    /// Libraries skipped for lack of a homepage URL
    pub libraries_skipped: usize,

    /// Whether the run stopped early on a cancellation signal
    pub cancelled: bool,

    pub total_duration_ms: u64,
}

impl HarvestReport {
    fn record(&mut self, outcome: &VersionOutcome) {
        match outcome {
            VersionOutcome::NotAVersion => self.tags_not_versions += 1,
            VersionOutcome::NoLibraries => self.tags_empty += 1,
            VersionOutcome::ExtractionFailed | VersionOutcome::SinkFailed => self.tags_failed += 1,
            VersionOutcome::Recorded {
                libraries, skipped, ..
            } => {
                if *libraries > 0 {
                    self.versions_recorded += 1;
                }
                self.libraries_recorded += libraries;
                self.libraries_skipped += skipped;
            }
        }
    }

    fn merge(&mut self, other: &HarvestReport) {
        self.repositories_listed += other.repositories_listed;
        self.repositories_matched += other.repositories_matched;
        self.repositories_skipped += other.repositories_skipped;
        self.tags_seen += other.tags_seen;
        self.tags_excluded += other.tags_excluded;
        self.tags_not_versions += other.tags_not_versions;
        self.tags_empty += other.tags_empty;
        self.tags_failed += other.tags_failed;
        self.versions_recorded += other.versions_recorded;
        self.libraries_recorded += other.libraries_recorded;
        self.libraries_skipped += other.libraries_skipped;
        self.cancelled |= other.cancelled;
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Harvests every matching repository of one account into a [`RecordSink`].
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use tag_harvester::{GitHubClient, HarvestConfig, HarvestPipeline, MemorySink};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = HarvestConfig::new("modelica-3rdparty").with_concurrency(4);
///     let client = Arc::new(GitHubClient::from_config(&config)?);
///     let sink = Arc::new(MemorySink::new());
///     let pipeline = HarvestPipeline::new(config, client, Arc::new(extractor), sink.clone())?;
///
///     let report = pipeline.run().await?;
///     println!("Recorded {} versions", report.versions_recorded);
///     Ok(())
/// }
/// ```
pub struct HarvestPipeline {
    config: HarvestConfig,
    enumerator: RepositoryEnumerator,
    tags: TagResolver,
    recorder: VersionRecorder,
    executor: HarvesterExecutor,
}

impl HarvestPipeline {
    /// Creates a pipeline using the default semver normalizer.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidPattern`] if the configured name
    /// pattern does not compile.
    pub fn new(
        config: HarvestConfig,
        client: Arc<dyn RepositoryClient>,
        extractor: Arc<dyn ManifestExtractor>,
        sink: Arc<dyn RecordSink>,
    ) -> Result<Self, HarvestError> {
        let pattern = Regex::new(config.effective_pattern())?;

        Ok(Self {
            enumerator: RepositoryEnumerator::new(client.clone(), pattern, config.page_size),
            tags: TagResolver::new(client),
            recorder: VersionRecorder::new(extractor, sink, VersionResolver::default()),
            executor: HarvesterExecutor::new(config.concurrency),
            config,
        })
    }

    /// Replaces the version normalizer.
    pub fn with_normalizer(mut self, normalizer: Arc<dyn VersionNormalizer>) -> Self {
        self.recorder = self.recorder.with_resolver(VersionResolver::new(normalizer));
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Whether a tag goes on to extraction; only exclusion is decided here.
    pub fn should_process(&self, target: &HarvestTarget, tag: &Tag) -> bool {
        !self
            .config
            .exclusions
            .is_excluded(&self.config.account, &target.name, &tag.name)
    }

    /// Runs to completion.
    pub async fn run(&self) -> Result<HarvestReport, HarvestError> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run_until(cancel_rx).await
    }

    /// Runs until done or until `cancel` turns `true`.
    ///
    /// Cancellation is observed before each repository and before each tag;
    /// a tag already being recorded is finished first.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] only for failures that make the whole run
    /// meaningless, i.e. the repository listing.
    pub async fn run_until(
        &self,
        cancel: watch::Receiver<bool>,
    ) -> Result<HarvestReport, HarvestError> {
        let start = Instant::now();
        info!(harvester = %self, concurrency = self.executor.limit(), "Starting harvest");

        let listed = self
            .enumerator
            .list_all(&self.config.account)
            .await
            .inspect_err(|e| error!(error = %e, "Aborting harvest"))?;

        let mut report = HarvestReport {
            repositories_listed: listed.len(),
            ..HarvestReport::default()
        };

        let cancel = &cancel;
        let jobs = listed
            .iter()
            .map(|repository| self.executor.execute(self.harvest_repository(repository, cancel)));
        for result in join_all(jobs).await {
            report.merge(&result?);
        }

        report.total_duration_ms = start.elapsed().as_millis() as u64;
        info!(
            repositories = report.repositories_matched,
            versions = report.versions_recorded,
            libraries = report.libraries_recorded,
            cancelled = report.cancelled,
            duration_ms = report.total_duration_ms,
            "Harvest completed"
        );
        Ok(report)
    }

    #[instrument(skip(self, listed, cancel), fields(repo = %listed.name))]
    async fn harvest_repository(
        &self,
        listed: &Repository,
        cancel: &watch::Receiver<bool>,
    ) -> HarvestReport {
        let mut report = HarvestReport::default();
        if *cancel.borrow() {
            report.cancelled = true;
            return report;
        }
        if !self.enumerator.matches(&listed.name) {
            debug!("Skipping repository, name does not match pattern");
            return report;
        }
        report.repositories_matched += 1;

        let Some(target) = self.enumerator.resolve(&self.config.account, listed).await else {
            report.repositories_skipped += 1;
            return report;
        };

        let tags = match self.tags.list_tags(&target.owner, &target.name).await {
            Ok(tags) => tags,
            Err(e) => {
                warn!(error = %e, "Error getting tags, skipping repository");
                report.repositories_skipped += 1;
                return report;
            }
        };
        report.tags_seen = tags.len();

        let candidates: Vec<&Tag> = tags
            .iter()
            .filter(|tag| {
                let keep = self.should_process(&target, tag);
                if !keep {
                    debug!(tag = %tag.name, "Skipping excluded tag");
                    report.tags_excluded += 1;
                }
                keep
            })
            .collect();

        let target = &target;
        let outcomes: Vec<Option<VersionOutcome>> = stream::iter(candidates)
            .map(|tag| async move {
                if *cancel.borrow() {
                    return None;
                }
                Some(self.recorder.process_version(target, tag).await)
            })
            .buffer_unordered(self.config.tag_concurrency.max(1))
            .collect()
            .await;

        for outcome in &outcomes {
            match outcome {
                Some(outcome) => report.record(outcome),
                None => report.cancelled = true,
            }
        }
        report
    }
}

impl fmt::Display for HarvestPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.config, f)
    }
}

// ============================================================================
// Tests
// ============================================================================
