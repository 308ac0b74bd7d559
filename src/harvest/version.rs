//! Tag name to canonical version resolution.

use crate::model::CanonicalVersion;
use crate::traits::{VersionError, VersionNormalizer};
use std::sync::Arc;

/// Drops one leading `v`, so `v1.2.3` and `1.2.3` resolve alike.
pub fn strip_version_prefix(raw: &str) -> &str {
    raw.strip_prefix('v').unwrap_or(raw)
}

/// Wraps a [`VersionNormalizer`]; a tag that fails to normalize is simply not
/// a release candidate.
#[derive(Clone)]
pub struct VersionResolver {
    normalizer: Arc<dyn VersionNormalizer>,
}

impl VersionResolver {
    pub fn new(normalizer: Arc<dyn VersionNormalizer>) -> Self {
        Self { normalizer }
    }

    pub fn resolve(&self, raw_tag: &str) -> Option<CanonicalVersion> {
        self.normalizer.normalize(strip_version_prefix(raw_tag)).ok()
    }
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self::new(Arc::new(SemverNormalizer))
    }
}

/// Normalizer backed by the `semver` crate.
///
/// Short version cores are padded (`3.2` becomes `3.2.0`); pre-release and
/// build suffixes are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemverNormalizer;

impl VersionNormalizer for SemverNormalizer {
    fn normalize(&self, raw: &str) -> Result<CanonicalVersion, VersionError> {
        let unparseable = |reason: String| VersionError::Unparseable {
            raw: raw.to_string(),
            reason,
        };

        let split = raw.find(['-', '+']).unwrap_or(raw.len());
        let (core, suffix) = raw.split_at(split);

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3
            || parts
                .iter()
                .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(unparseable(format!("invalid version core '{}'", core)));
        }

        let mut padded = parts.join(".");
        for _ in parts.len()..3 {
            padded.push_str(".0");
        }
        padded.push_str(suffix);

        semver::Version::parse(&padded)
            .map(|v| CanonicalVersion::new(v.to_string()))
            .map_err(|e| unparseable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records what it was asked to normalize.
    #[derive(Default)]
    struct RecordingNormalizer {
        seen: Mutex<Vec<String>>,
    }

    impl VersionNormalizer for RecordingNormalizer {
        fn normalize(&self, raw: &str) -> Result<CanonicalVersion, VersionError> {
            self.seen.lock().unwrap().push(raw.to_string());
            SemverNormalizer.normalize(raw)
        }
    }

    #[test]
    fn test_leading_v_is_stripped_once() {
        assert_eq!(strip_version_prefix("v1.2.3"), "1.2.3");
        assert_eq!(strip_version_prefix("1.2.3"), "1.2.3");
        assert_eq!(strip_version_prefix("vv1"), "v1");
        assert_eq!(strip_version_prefix(""), "");
    }

    #[test]
    fn test_resolver_hands_stripped_tag_to_normalizer() {
        let normalizer = Arc::new(RecordingNormalizer::default());
        let resolver = VersionResolver::new(normalizer.clone());

        assert_eq!(
            resolver.resolve("v1.2.3"),
            Some(CanonicalVersion::new("1.2.3"))
        );
        assert_eq!(
            resolver.resolve("2.0.0"),
            Some(CanonicalVersion::new("2.0.0"))
        );
        assert_eq!(resolver.resolve("latest"), None);

        let seen = normalizer.seen.lock().unwrap();
        assert_eq!(*seen, vec!["1.2.3", "2.0.0", "latest"]);
    }

    #[test]
    fn test_semver_normalizer_pads_short_versions() {
        let n = SemverNormalizer;
        assert_eq!(n.normalize("3.2").unwrap().as_str(), "3.2.0");
        assert_eq!(n.normalize("1").unwrap().as_str(), "1.0.0");
        assert_eq!(n.normalize("0.82").unwrap().as_str(), "0.82.0");
        assert_eq!(
            n.normalize("1.0-beta.1").unwrap().as_str(),
            "1.0.0-beta.1"
        );
        assert_eq!(n.normalize("1.2.3+build5").unwrap().as_str(), "1.2.3+build5");
    }

    #[test]
    fn test_semver_normalizer_rejects_non_versions() {
        let n = SemverNormalizer;
        for raw in ["latest", "nightly", "", "1..2", "1.2.3.4", "release-1.0", "1.x"] {
            assert!(n.normalize(raw).is_err(), "{} should not normalize", raw);
        }
    }
}
