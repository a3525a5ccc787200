use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::repository::{DocumentStore, RepositoryError, Revision};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredCollection {
    revision: Revision,
    items: serde_json::Value,
}

type Collections = BTreeMap<String, StoredCollection>;

fn apply_save(
    collections: &mut Collections,
    collection: &str,
    expected: Revision,
    items: serde_json::Value,
) -> Result<Revision, RepositoryError> {
    let found = collections
        .get(collection)
        .map(|stored| stored.revision)
        .unwrap_or_default();
    if found != expected {
        return Err(RepositoryError::Conflict {
            collection: collection.to_string(),
            expected,
            found,
        });
    }

    let revision = found.next();
    collections.insert(
        collection.to_string(),
        StoredCollection { revision, items },
    );
    Ok(revision)
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
}

/// Process-local store used by tests, demos and the default server setup.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<Collections>,
}

impl DocumentStore for MemoryDocumentStore {
    fn load_raw(
        &self,
        collection: &str,
    ) -> Result<(Revision, Option<serde_json::Value>), RepositoryError> {
        let guard = lock(&self.collections)?;
        Ok(match guard.get(collection) {
            Some(stored) => (stored.revision, Some(stored.items.clone())),
            None => (Revision::default(), None),
        })
    }

    fn save_raw(
        &self,
        collection: &str,
        expected: Revision,
        items: serde_json::Value,
    ) -> Result<Revision, RepositoryError> {
        let mut guard = lock(&self.collections)?;
        apply_save(&mut guard, collection, expected, items)
    }
}

/// All collections in one JSON document on disk.
///
/// Each save rewrites the whole file through a temporary sibling and a rename,
/// so a failed write leaves the previous document in place.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Collections, RepositoryError> {
        if !self.path.exists() {
            return Ok(Collections::new());
        }

        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Collections::new());
        }

        serde_json::from_str(&raw).map_err(|source| RepositoryError::Corrupt {
            collection: "document",
            source,
        })
    }

    fn write(&self, collections: &Collections) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let payload =
            serde_json::to_vec_pretty(collections).map_err(|source| RepositoryError::Corrupt {
                collection: "document",
                source,
            })?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl DocumentStore for JsonFileStore {
    fn load_raw(
        &self,
        collection: &str,
    ) -> Result<(Revision, Option<serde_json::Value>), RepositoryError> {
        let _guard = lock(&self.guard)?;
        let mut collections = self.read()?;
        Ok(match collections.remove(collection) {
            Some(stored) => (stored.revision, Some(stored.items)),
            None => (Revision::default(), None),
        })
    }

    fn save_raw(
        &self,
        collection: &str,
        expected: Revision,
        items: serde_json::Value,
    ) -> Result<Revision, RepositoryError> {
        let _guard = lock(&self.guard)?;
        let mut collections = self.read()?;
        let revision = apply_save(&mut collections, collection, expected, items)?;
        self.write(&collections)?;
        Ok(revision)
    }
}
