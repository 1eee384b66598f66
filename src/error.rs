use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by trials, dataset I/O and the batch harness.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("trajectory recording requires a game id and an output destination")]
    MissingGameId,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("corrupt trial unit {path} (line {line}): {reason}")]
    CorruptUnit {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
