//! Errors raised while revisioning assets or rewriting references.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::utils::{encoding::Encoding, glob::GlobError};

/// Fatal errors. Any of these aborts the whole invocation.
#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("destination `{0}` exists and is not a directory")]
    DestinationNotDir(PathBuf),

    #[error("failed to create destination directory `{path}`")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("source file `{0}` not found")]
    MissingSource(PathBuf),

    #[error("failed to {op} `{path}`")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to expand {patterns:?}")]
    Glob {
        patterns: Vec<String>,
        #[source]
        source: GlobError,
    },

    #[error("`{path}` is not valid {encoding:?} text")]
    Decode { path: PathBuf, encoding: Encoding },

    #[error("rewritten `{path}` cannot be encoded as {encoding:?}")]
    Encode { path: PathBuf, encoding: Encoding },
}

impl RevisionError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { op, path, source }
    }
}
