//! Error taxonomy shared by every fallible operation in this crate.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file {path} is empty, nothing to read")]
    EmptyFile { path: PathBuf },

    #[error("malformed model: {reason}")]
    MalformedModel { reason: String },

    #[error("no in-vocabulary words found while composing a document vector")]
    NoWords,

    #[error("uninitialized dependency: {what}")]
    UninitializedDependency { what: String },

    #[error("{0}")]
    UnknownFailure(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedModel {
            reason: reason.into(),
        }
    }

    pub fn uninitialized(what: impl Into<String>) -> Self {
        Error::UninitializedDependency { what: what.into() }
    }
}
