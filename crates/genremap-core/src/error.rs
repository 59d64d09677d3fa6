//! Error types for building and querying the genre graph

use std::path::PathBuf;

use thiserror::Error;

use crate::model::GenreId;

/// Fatal failures while building the index. Startup aborts on any of these.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("genre snapshot is empty")]
    EmptySnapshot,

    #[error("no genre has both bouncy and organic values; normalization is undefined")]
    NoNormalizationValues,

    #[error("genre id {0} appears more than once in the snapshot")]
    DuplicateGenre(GenreId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Direct index queries on ids that do not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("unknown genre id {0}")]
    UnknownNode(GenreId),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("decimal precision {0} is out of range (0..=15)")]
    InvalidPrecision(u32),

    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: &'static str, value: String },
}
