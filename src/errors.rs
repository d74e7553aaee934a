// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::ExitCode;

#[derive(Error, Debug)]
pub enum GftpError {
    #[error("failed to start {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("gftp binary not found: {0:?}")]
    BinaryNotFound(PathBuf),

    #[error("invalid version string: {0:?}")]
    InvalidVersion(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("gftp reported an error: {0}")]
    Service(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("process exited with {code}; output: {output}")]
    ProcessExit { code: ExitCode, output: String },

    #[error("transfer failed: gftp exited with {0}")]
    TransferFailed(ExitCode),

    #[error("file not found: {0:?}")]
    FileNotFound(PathBuf),

    #[error("files are not identical: {0}")]
    FilesDiffer(String),

    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: &'static str, after: Duration },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GftpError>;
