// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `gftpwrap`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gftpwrap",
    version,
    about = "Publish and download files through the gftp command-line tool.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Gftp.toml` in the current working directory, if it exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the gftp executable (overrides config and `GFTP_BIN`).
    #[arg(long, value_name = "PATH")]
    pub gftp_bin: Option<PathBuf>,

    /// GSB URL passed to gftp as `GSB_URL` (overrides config).
    #[arg(long, value_name = "URL")]
    pub gsb_url: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GFTPWRAP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the version of the accepted gftp binary.
    Version,

    /// Publish files and keep serving them until Ctrl-C.
    Publish {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Download a published URL into a local file.
    Download {
        url: String,
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Self test: generate, publish, download and compare a random file.
    Roundtrip {
        /// Size of the generated file in bytes.
        #[arg(long, default_value_t = 10_000_000)]
        size: u64,

        /// Directory for the scratch files.
        #[arg(long, value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Keep the scratch files afterwards.
        #[arg(long)]
        keep: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
