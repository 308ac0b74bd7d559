use serde::{Deserialize, Serialize};
use std::fmt;

/// A repository as reported by the hosting API.
///
/// Listing endpoints return summaries with `source` unset; the detail
/// endpoint fills it in for forks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String, // owner login
    pub name: String,
    pub description: Option<String>,
    pub homepage: Option<String>, // browsable URL of the repository
    pub git_url: Option<String>,
    pub stars: u64,
    pub fork: bool,
    pub source: Option<Box<Repository>>,
}

impl Repository {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A repository ready for tag harvesting.
///
/// `owner`/`name` identify the listed repository whose tags are enumerated,
/// while `metadata` is the record whose descriptive fields get recorded
/// (the upstream source when the listed repository is a fork).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestTarget {
    pub owner: String,
    pub name: String,
    pub metadata: Repository,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String, // raw, may carry a leading `v`
    pub commit: String,
    pub tarball_url: Option<String>,
    pub zipball_url: Option<String>,
}

/// Normalized semantic version, used as the key of a recorded version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalVersion(String);

impl CanonicalVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Manifest extraction result for one (repository, version).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryInfo {
    pub owner_uri: String,
    pub email: String,
    pub libraries: Vec<Library>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    pub path: String,
    pub is_file: bool,
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String, // constraint string as declared
}

/// An (owner, repository, raw tag) triple that must never be harvested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExclusionEntry {
    pub owner: String,
    pub repository: String,
    pub tag: String,
}

impl ExclusionEntry {
    pub fn new(
        owner: impl Into<String>,
        repository: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repository: repository.into(),
            tag: tag.into(),
        }
    }
}
