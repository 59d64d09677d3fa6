//! Genre store snapshots consumed once at startup

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{GenreRecord, RelationshipRecord};

/// Supplies the one-time snapshot the index is built from.
pub trait GenreStore {
    fn snapshot(&self) -> Result<Snapshot, StoreError>;
}

/// All genre and relationship rows, as read from the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub genres: Vec<GenreRecord>,
    #[serde(default)]
    pub relationships: Vec<RelationshipRecord>,
}

impl Snapshot {
    pub fn new(genres: Vec<GenreRecord>, relationships: Vec<RelationshipRecord>) -> Self {
        Snapshot {
            genres,
            relationships,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
    }
}

impl GenreStore for Snapshot {
    fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(self.clone())
    }
}

/// Reads a `{ "genres": [...], "relationships": [...] }` JSON export.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonSnapshotStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GenreStore for JsonSnapshotStore {
    fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        let snapshot: Snapshot =
            serde_json::from_str(&text).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            "Read {} genres, {} relationships from {}",
            snapshot.genres.len(),
            snapshot.relationships.len(),
            self.path.display()
        );
        Ok(snapshot)
    }
}
