// src/config/resolve.rs

//! Locating the gftp executable.
//!
//! Resolution order: explicit path (CLI) > `[gftp].binary` > `GFTP_BIN`
//! environment variable > `gftp` found on `PATH`.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::model::ConfigFile;

pub const BINARY_ENV_VAR: &str = "GFTP_BIN";

#[cfg(windows)]
pub const DEFAULT_BINARY_NAME: &str = "gftp.exe";
#[cfg(not(windows))]
pub const DEFAULT_BINARY_NAME: &str = "gftp";

/// Resolve the binary using the process environment.
///
/// Falls back to the bare [`DEFAULT_BINARY_NAME`] when nothing is found, so
/// the caller's existence check reports a useful path.
pub fn resolve_binary(explicit: Option<&Path>, cfg: &ConfigFile) -> PathBuf {
    resolve_binary_from(
        explicit,
        cfg,
        env::var_os(BINARY_ENV_VAR),
        env::var_os("PATH"),
    )
    .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY_NAME))
}

/// Resolution with the environment passed in explicitly.
pub fn resolve_binary_from(
    explicit: Option<&Path>,
    cfg: &ConfigFile,
    env_binary: Option<OsString>,
    path_var: Option<OsString>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = &cfg.gftp.binary {
        return Some(path.clone());
    }
    if let Some(value) = env_binary.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(value));
    }
    path_var.and_then(|paths| search_path(&paths, DEFAULT_BINARY_NAME))
}

fn search_path(paths: &OsString, name: &str) -> Option<PathBuf> {
    env::split_paths(paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
