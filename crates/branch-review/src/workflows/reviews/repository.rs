use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::domain::{Branch, QuestionSpec, ReviewRecord, SurveyDefinition};

/// Monotonic stamp of a stored collection; bumps on every successful save.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Revision(pub u64);

impl Revision {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Whole collection as read from the store, with the revision it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub revision: Revision,
    pub items: Vec<T>,
}

/// Item type persisted as one named collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;
}

impl Document for Branch {
    const COLLECTION: &'static str = "branches";
}

impl Document for SurveyDefinition {
    const COLLECTION: &'static str = "surveys";
}

impl Document for ReviewRecord {
    const COLLECTION: &'static str = "reviews";
}

/// Legacy global question list kept for migration into named surveys.
impl Document for QuestionSpec {
    const COLLECTION: &'static str = "questions";
}

/// Entry of the shared topic list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(pub String);

impl Document for Topic {
    const COLLECTION: &'static str = "topics";
}

/// Storage abstraction over whole-collection documents.
///
/// Every write replaces the full collection. `save_raw` must reject the write
/// with [`RepositoryError::Conflict`] when the stored revision no longer
/// matches `expected`, so concurrent read-modify-write cycles cannot silently
/// overwrite each other.
pub trait DocumentStore: Send + Sync {
    fn load_raw(
        &self,
        collection: &str,
    ) -> Result<(Revision, Option<serde_json::Value>), RepositoryError>;

    fn save_raw(
        &self,
        collection: &str,
        expected: Revision,
        items: serde_json::Value,
    ) -> Result<Revision, RepositoryError>;

    fn load_all<T: Document>(&self) -> Result<Snapshot<T>, RepositoryError>
    where
        Self: Sized,
    {
        let (revision, value) = self.load_raw(T::COLLECTION)?;
        let items = match value {
            Some(value) => {
                serde_json::from_value(value).map_err(|source| RepositoryError::Corrupt {
                    collection: T::COLLECTION,
                    source,
                })?
            }
            None => Vec::new(),
        };
        Ok(Snapshot { revision, items })
    }

    fn save_all<T: Document>(
        &self,
        expected: Revision,
        items: &[T],
    ) -> Result<Revision, RepositoryError>
    where
        Self: Sized,
    {
        let value = serde_json::to_value(items).map_err(|source| RepositoryError::Corrupt {
            collection: T::COLLECTION,
            source,
        })?;
        self.save_raw(T::COLLECTION, expected, value)
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{collection} changed since it was read (expected {expected}, found {found})")]
    Conflict {
        collection: String,
        expected: Revision,
        found: Revision,
    },
    #[error("record not found")]
    NotFound,
    #[error("stored {collection} could not be decoded: {source}")]
    Corrupt {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
