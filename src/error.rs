//! Error type of the crate.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of loading, writing or driving a reduction run.
///
/// Nothing in the reduction loop itself fails: solver crashes are verdicts,
/// not errors. These variants cover the file and process plumbing around it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}:{line}: {msg}")]
    Parse {
        path: PathBuf,
        line: usize,
        msg: String,
    },
    #[error("invalid parameter {key}: {msg}")]
    Parameter { key: String, msg: String },
    #[error("snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },
    #[error("solver command {command} could not be run: {source}")]
    Command {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Inconsistent(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
    pub(crate) fn parse(path: impl Into<PathBuf>, line: usize, msg: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            line,
            msg: msg.into(),
        }
    }
    pub(crate) fn parameter(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Parameter {
            key: key.into(),
            msg: msg.into(),
        }
    }
}
