use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The output destination could not be created or written.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot create output directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot create output file {path}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("cannot flush {path} to disk")]
    Sync {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("recorder for {path} is already closed")]
    Closed { path: PathBuf },
}

/// The render/input port is unusable.
#[derive(Debug, Error)]
pub enum PresentationError {
    #[error("display unavailable: {0}")]
    Unavailable(String),
    #[error("frame presentation failed: {0}")]
    Render(String),
    #[error("input polling failed: {0}")]
    Input(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Fatal session failure. Trials flushed before the failure stay on disk.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Presentation(#[from] PresentationError),
}
