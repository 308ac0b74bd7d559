//! Materializes one (repository, tag) pair as library versions in the sink.

use crate::harvest::version::{strip_version_prefix, VersionResolver};
use crate::model::{CanonicalVersion, DirectoryInfo, HarvestTarget, Library, Tag};
use crate::traits::{ExtractRequest, ManifestExtractor, RecordSink, SinkError};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Protocol recorded alongside the repository URL.
const REPOSITORY_PROTOCOL: &str = "git";

/// What happened to a tag. Nothing here is an error for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionOutcome {
    /// The tag does not name a semantic version (`latest`, `nightly`, ...).
    NotAVersion,
    /// No package manifest was found at the tag.
    NoLibraries,
    ExtractionFailed,
    /// The sink rejected a write; the rest of the tag was abandoned.
    SinkFailed,
    Recorded {
        version: CanonicalVersion,
        libraries: usize,
        /// Libraries skipped because the repository has no homepage URL.
        skipped: usize,
    },
}

pub struct VersionRecorder {
    extractor: Arc<dyn ManifestExtractor>,
    sink: Arc<dyn RecordSink>,
    resolver: VersionResolver,
}

impl VersionRecorder {
    pub fn new(
        extractor: Arc<dyn ManifestExtractor>,
        sink: Arc<dyn RecordSink>,
        resolver: VersionResolver,
    ) -> Self {
        Self {
            extractor,
            sink,
            resolver,
        }
    }

    pub fn with_resolver(mut self, resolver: VersionResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Resolves, extracts and records one tag.
    ///
    /// Never fails: every problem is logged and reported through the
    /// returned [`VersionOutcome`], so one bad tag cannot abort a batch.
    /// All sink writes are identity-keyed upserts, so processing the same
    /// tag twice leaves the sink as processing it once.
    #[instrument(skip(self, target, tag), fields(repo = %target.name, tag = %tag.name))]
    pub async fn process_version(&self, target: &HarvestTarget, tag: &Tag) -> VersionOutcome {
        let Some(version) = self.resolver.resolve(&tag.name) else {
            debug!("Ignoring tag, not a version");
            return VersionOutcome::NotAVersion;
        };

        let request = ExtractRequest {
            owner_login: &target.metadata.owner,
            display_name: &target.name,
            repository: &target.metadata,
            commit: &tag.commit,
            version: strip_version_prefix(&tag.name),
        };
        let info = match self.extractor.extract(request).await {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "Manifest extraction failed");
                return VersionOutcome::ExtractionFailed;
            }
        };

        if info.libraries.is_empty() {
            info!(%version, "No libraries found");
            return VersionOutcome::NoLibraries;
        }

        let mut libraries = 0;
        let mut skipped = 0;
        for library in &info.libraries {
            let Some(homepage) = target.metadata.homepage.as_deref() else {
                error!(
                    library = %library.name,
                    "Cannot index library, repository has no homepage URL"
                );
                skipped += 1;
                continue;
            };

            debug!(library = %library.name, path = %library.path, "Processing library");
            if let Err(e) = self.record_library(target, tag, &version, homepage, &info, library) {
                warn!(library = %library.name, error = %e, "Sink rejected version");
                return VersionOutcome::SinkFailed;
            }
            libraries += 1;
        }

        info!(%version, libraries, "Recorded version");
        VersionOutcome::Recorded {
            version,
            libraries,
            skipped,
        }
    }

    fn record_library(
        &self,
        target: &HarvestTarget,
        tag: &Tag,
        version: &CanonicalVersion,
        homepage: &str,
        info: &DirectoryInfo,
        library: &Library,
    ) -> Result<(), SinkError> {
        let repo = &target.metadata;
        let handle = self.sink.library(&library.name, homepage, &info.owner_uri)?;

        if let Some(description) = repo.description.as_deref() {
            handle.set_description(description)?;
        }
        handle.set_homepage(homepage)?;
        if let Some(git_url) = repo.git_url.as_deref() {
            handle.set_repository(git_url, REPOSITORY_PROTOCOL)?;
        }
        handle.set_stars(repo.stars)?;
        handle.set_email(&info.email)?;

        let entry = handle.add_version(version)?;
        entry.set_path(&library.path, library.is_file)?;
        entry.set_hash(&tag.commit)?;
        if let Some(url) = tag.tarball_url.as_deref() {
            entry.set_tarball_url(url)?;
        }
        if let Some(url) = tag.zipball_url.as_deref() {
            entry.set_zipball_url(url)?;
        }
        for dependency in &library.dependencies {
            entry.add_dependency(&dependency.name, &dependency.version)?;
        }
        Ok(())
    }
}
