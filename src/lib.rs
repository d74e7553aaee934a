// src/lib.rs

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod errors;
pub mod event;
pub mod fs;
pub mod logging;
pub mod proc;
pub mod types;

use anyhow::Result;
use tracing::debug;

use crate::api::Gftp;
use crate::cli::{CliArgs, Command};
use crate::config::load_or_default;

pub use crate::api::GftpOptions;
pub use crate::context::OperationContext;
pub use crate::errors::GftpError;
pub use crate::types::ExitCode;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file, then CLI overrides)
/// - binary resolution and the `--version` acceptance check
/// - the selected subcommand
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_or_default(args.config.as_deref())?;
    if let Some(url) = args.gsb_url.clone() {
        cfg.gftp.gsb_url = Some(url);
    }
    debug!(?cfg, "effective configuration");

    let gftp = Gftp::from_config(args.gftp_bin.as_deref(), &cfg).await?;

    match args.command {
        Command::Version => commands::version(&gftp),
        Command::Publish { files } => commands::publish(&gftp, &files).await,
        Command::Download { url, path } => commands::download(&gftp, &url, &path).await,
        Command::Roundtrip { size, dir, keep } => {
            commands::roundtrip(&gftp, size, &dir, keep).await
        }
    }
}
