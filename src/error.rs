//! Error types and handling
//!
//! Every failure the supervisor can observe is one of these variants. Only
//! `Config` is fatal, and only at startup; the rest are caught at the worker
//! or relay boundary and logged.

use std::path::PathBuf;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum CamsyncError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to create output directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch {program}: {source}")]
    ProcessLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while supervising {program}: {source}")]
    ProcessIo {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("relay bootstrap failed: {0}")]
    RelayBootstrap(String),

    #[error("worker pool is shut down")]
    PoolClosed,
}

/// Problems with the source list, raised before any worker launches
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed source list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("source #{index}: field `{field}` must not be empty")]
    EmptyField { index: usize, field: &'static str },

    #[error("source `{name}`: port must be positive")]
    InvalidPort { name: String },

    #[error("source `{name}`: unknown stream `{value}` (expected stream1 or stream2)")]
    InvalidStream { name: String, value: String },

    #[error("source `{name}`: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("source `{name}`: relay target needs at least one output endpoint")]
    EmptyEndpoints { name: String },

    #[error("source name `{0}` is used more than once")]
    DuplicateName(String),

    #[error("no sources configured")]
    NoSources,
}

/// Result type alias using CamsyncError
pub type Result<T> = std::result::Result<T, CamsyncError>;
