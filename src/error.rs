use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The text could not be interpreted as a vCard record.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ParseError(String);

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Per-file conversion errors. None of these abort a batch.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse vCard: {0}")]
    Parse(#[from] ParseError),

    #[error("UID {0:?} is not a valid UUID")]
    IdentifierInvalid(String),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not remove old file {}: {source}", path.display())]
    StaleFileCleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConvertError {
    /// Strict-mode rejections are reported as skips rather than failures.
    pub fn is_skip(&self) -> bool {
        matches!(self, ConvertError::IdentifierInvalid(_))
    }
}
