//! In-memory [`RecordSink`] that accumulates an index of harvested libraries.

use crate::model::CanonicalVersion;
use crate::traits::{LibraryHandle, RecordSink, SinkError, VersionHandle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Identity of a library across versions and runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LibraryKey {
    pub name: String,
    pub homepage: String,
    pub owner_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub url: String,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRecord {
    pub name: String,
    pub homepage: String,
    pub owner_uri: String,
    pub description: Option<String>,
    pub repository: Option<RepositoryRef>,
    pub stars: u64,
    pub email: Option<String>,
    pub versions: BTreeMap<CanonicalVersion, VersionRecord>,
}

impl LibraryRecord {
    fn new(key: &LibraryKey) -> Self {
        Self {
            name: key.name.clone(),
            homepage: key.homepage.clone(),
            owner_uri: key.owner_uri.clone(),
            description: None,
            repository: None,
            stars: 0,
            email: None,
            versions: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub path: String,
    pub is_file: bool,
    pub hash: Option<String>,
    pub tarball_url: Option<String>,
    pub zipball_url: Option<String>,
    /// Dependency name to version constraint.
    pub dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct MemorySink {
    libraries: Mutex<BTreeMap<LibraryKey, LibraryRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library records ordered by identity.
    pub fn snapshot(&self) -> Vec<LibraryRecord> {
        match self.libraries.lock() {
            Ok(guard) => guard.values().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().values().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the index document.
    pub fn to_json(&self) -> Result<String, SinkError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<LibraryKey, LibraryRecord>>, SinkError> {
        self.libraries
            .lock()
            .map_err(|e| SinkError::Storage(format!("Index lock poisoned: {}", e)))
    }

    fn with_library<F>(&self, key: &LibraryKey, update: F) -> Result<(), SinkError>
    where
        F: FnOnce(&mut LibraryRecord),
    {
        let mut libraries = self.lock()?;
        let record = libraries
            .entry(key.clone())
            .or_insert_with(|| LibraryRecord::new(key));
        update(record);
        Ok(())
    }

    fn with_version<F>(
        &self,
        key: &LibraryKey,
        version: &CanonicalVersion,
        update: F,
    ) -> Result<(), SinkError>
    where
        F: FnOnce(&mut VersionRecord),
    {
        self.with_library(key, |library| {
            update(library.versions.entry(version.clone()).or_default())
        })
    }
}

impl RecordSink for MemorySink {
    fn library<'a>(
        &'a self,
        name: &str,
        homepage: &str,
        owner_uri: &str,
    ) -> Result<Box<dyn LibraryHandle + 'a>, SinkError> {
        let key = LibraryKey {
            name: name.to_string(),
            homepage: homepage.to_string(),
            owner_uri: owner_uri.to_string(),
        };
        self.with_library(&key, |_| {})?;
        Ok(Box::new(MemoryLibrary { sink: self, key }))
    }
}

struct MemoryLibrary<'a> {
    sink: &'a MemorySink,
    key: LibraryKey,
}

impl LibraryHandle for MemoryLibrary<'_> {
    fn set_description(&self, description: &str) -> Result<(), SinkError> {
        self.sink.with_library(&self.key, |lib| {
            lib.description = Some(description.to_string())
        })
    }

    fn set_homepage(&self, homepage: &str) -> Result<(), SinkError> {
        self.sink
            .with_library(&self.key, |lib| lib.homepage = homepage.to_string())
    }

    fn set_repository(&self, url: &str, protocol: &str) -> Result<(), SinkError> {
        self.sink.with_library(&self.key, |lib| {
            lib.repository = Some(RepositoryRef {
                url: url.to_string(),
                protocol: protocol.to_string(),
            })
        })
    }

    fn set_stars(&self, stars: u64) -> Result<(), SinkError> {
        self.sink.with_library(&self.key, |lib| lib.stars = stars)
    }

    fn set_email(&self, email: &str) -> Result<(), SinkError> {
        self.sink
            .with_library(&self.key, |lib| lib.email = Some(email.to_string()))
    }

    fn add_version<'a>(
        &'a self,
        version: &CanonicalVersion,
    ) -> Result<Box<dyn VersionHandle + 'a>, SinkError> {
        self.sink.with_version(&self.key, version, |_| {})?;
        Ok(Box::new(MemoryVersion {
            library: self,
            version: version.clone(),
        }))
    }
}

struct MemoryVersion<'a> {
    library: &'a MemoryLibrary<'a>,
    version: CanonicalVersion,
}

impl MemoryVersion<'_> {
    fn update<F>(&self, update: F) -> Result<(), SinkError>
    where
        F: FnOnce(&mut VersionRecord),
    {
        self.library
            .sink
            .with_version(&self.library.key, &self.version, update)
    }
}

impl VersionHandle for MemoryVersion<'_> {
    fn set_path(&self, path: &str, is_file: bool) -> Result<(), SinkError> {
        self.update(|v| {
            v.path = path.to_string();
            v.is_file = is_file;
        })
    }

    fn set_hash(&self, hash: &str) -> Result<(), SinkError> {
        self.update(|v| v.hash = Some(hash.to_string()))
    }

    fn set_tarball_url(&self, url: &str) -> Result<(), SinkError> {
        self.update(|v| v.tarball_url = Some(url.to_string()))
    }

    fn set_zipball_url(&self, url: &str) -> Result<(), SinkError> {
        self.update(|v| v.zipball_url = Some(url.to_string()))
    }

    fn add_dependency(&self, name: &str, constraint: &str) -> Result<(), SinkError> {
        self.update(|v| {
            v.dependencies
                .insert(name.to_string(), constraint.to_string());
        })
    }
}
