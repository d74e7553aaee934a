// src/config/mod.rs

//! Configuration for gftpwrap.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate and parse durations (`validate.rs`).
//! - Locate the gftp executable (`resolve.rs`).

pub mod loader;
pub mod model;
pub mod resolve;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, GftpSection, RawConfigFile, RawTimeouts, Timeouts};
pub use resolve::{resolve_binary, resolve_binary_from};
