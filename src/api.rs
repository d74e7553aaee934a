// src/api.rs

//! High-level gftp operations.
//!
//! Each operation is a thin policy over the process layer: it decides the
//! command line, the terminal predicate to wait for and how the final state
//! maps to a result.

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use tracing::{error, info, warn};

use crate::config::{ConfigFile, Timeouts, resolve_binary};
use crate::context::OperationContext;
use crate::context::state::{OperationState, exited, url_or_exit};
use crate::errors::{GftpError, Result};
use crate::proc::{LaunchSpec, run_blocking, spawn_streaming};
use crate::types::{ExitCode, OperationKind};

pub const GSB_URL_ENV_VAR: &str = "GSB_URL";

/// Per-handle settings applied to every gftp invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GftpOptions {
    /// Exported as `GSB_URL`; inherited from the environment when `None`.
    pub gsb_url: Option<String>,
    pub timeouts: Timeouts,
}

impl GftpOptions {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            gsb_url: cfg.gftp.gsb_url.clone(),
            timeouts: cfg.timeouts,
        }
    }
}

/// An accepted gftp binary.
#[derive(Debug, Clone)]
pub struct Gftp {
    binary: PathBuf,
    version: String,
    options: GftpOptions,
}

impl Gftp {
    /// Accept `binary`: it must be an existing file and answer `--version`.
    pub async fn new(binary: impl Into<PathBuf>, options: GftpOptions) -> Result<Self> {
        let binary = binary.into();
        if !binary.is_file() {
            return Err(GftpError::BinaryNotFound(binary));
        }

        let spec = base_spec(&binary, &options).arg("--version");
        let output = run_blocking(&spec).await?;
        let version = parse_version(&output.stdout)?;

        info!(binary = ?binary, %version, "GFTP binary accepted");

        Ok(Self {
            binary,
            version,
            options,
        })
    }

    /// Resolve the binary from `explicit` / config / environment and accept it.
    pub async fn from_config(explicit: Option<&Path>, cfg: &ConfigFile) -> Result<Self> {
        let binary = resolve_binary(explicit, cfg);
        Self::new(binary, GftpOptions::from_config(cfg)).await
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn options(&self) -> &GftpOptions {
        &self.options
    }

    fn spec(&self) -> LaunchSpec {
        base_spec(&self.binary, &self.options)
    }

    /// Publish one file and wait until gftp hands out its URL.
    ///
    /// The returned context keeps the publishing process alive; pass it to
    /// [`Gftp::unpublish`] to stop serving the file.
    pub async fn publish(&self, path: impl AsRef<Path>) -> Result<OperationContext> {
        self.publish_many(std::slice::from_ref(&path)).await
    }

    /// Publish several files with a single gftp process.
    pub async fn publish_many<P: AsRef<Path>>(&self, paths: &[P]) -> Result<OperationContext> {
        if paths.is_empty() {
            return Err(GftpError::Other(anyhow!("no files given to publish")));
        }
        for path in paths {
            let path = path.as_ref();
            if !path.is_file() {
                return Err(GftpError::FileNotFound(path.to_path_buf()));
            }
        }

        let files: Vec<&Path> = paths.iter().map(|p| p.as_ref()).collect();
        info!(?files, "Publishing files");

        let spec = self.spec().arg("publish").args(&files);
        let ctx = spawn_streaming(&spec, OperationKind::Publish)?;

        let bound = self.options.timeouts.publish;
        let Some(state) = ctx.wait_bounded(bound, url_or_exit).await? else {
            ctx.kill().await;
            return Err(GftpError::Timeout {
                what: "publish URL",
                after: bound.unwrap_or_default(),
            });
        };

        if let Some(err) = state.error() {
            return Err(err.clone().into());
        }

        match state.url() {
            Some(url) => {
                info!(file = ?state.file(), url, "File published");
                Ok(ctx)
            }
            None => {
                let code = exit_of(&state)?;
                Err(GftpError::Protocol(format!(
                    "gftp exited with {code} before publishing a URL"
                )))
            }
        }
    }

    /// Start downloading `url` into `path`; returns without waiting.
    pub fn download(&self, url: &str, path: impl AsRef<Path>) -> Result<OperationContext> {
        let path = path.as_ref();
        info!(url, ?path, "Downloading file");

        let spec = self.spec().arg("download").arg(url).arg(path);
        spawn_streaming(&spec, OperationKind::Download)
    }

    /// Wait for a download started with [`Gftp::download`] to finish.
    pub async fn wait_for_download(&self, ctx: &OperationContext) -> Result<ExitCode> {
        let bound = self.options.timeouts.download;
        let Some(state) = ctx.wait_bounded(bound, exited).await? else {
            ctx.kill().await;
            return Err(GftpError::Timeout {
                what: "download",
                after: bound.unwrap_or_default(),
            });
        };

        if let Some(err) = state.error() {
            error!(message = %err.message, "Error downloading file");
            return Err(err.clone().into());
        }

        let code = exit_of(&state)?;
        if !code.success() {
            error!(exit_code = %code, "Error downloading file");
            return Err(GftpError::TransferFailed(code));
        }

        info!("File downloaded");
        Ok(code)
    }

    /// Stop a publishing process.
    ///
    /// Sends an interrupt, force-kills after `shutdown_grace`, and returns the
    /// exit code whatever it is.
    pub async fn unpublish(&self, ctx: OperationContext) -> Result<ExitCode> {
        if !ctx.snapshot().has_exited() {
            ctx.interrupt().await;
        }

        let grace = self.options.timeouts.shutdown_grace;
        let state = match ctx.wait_until_within(grace, exited).await? {
            Some(state) => state,
            None => {
                warn!(?grace, "gftp did not stop after interrupt; killing it");
                ctx.kill().await;
                ctx.wait_until(exited).await?
            }
        };

        if let Some(err) = state.error() {
            warn!(message = %err.message, "gftp reported an error while publishing");
        }

        let code = exit_of(&state)?;
        info!(exit_code = %code, "GFTP process stopped");
        Ok(code)
    }
}

fn base_spec(binary: &Path, options: &GftpOptions) -> LaunchSpec {
    let spec = LaunchSpec::new(binary);
    match &options.gsb_url {
        Some(url) => spec.env(GSB_URL_ENV_VAR, url),
        None => spec,
    }
}

fn exit_of(state: &OperationState) -> Result<ExitCode> {
    state
        .exit_code()
        .ok_or_else(|| GftpError::Other(anyhow!("operation finished without an exit code")))
}

/// Extract the version from `gftp --version` output (second token).
pub fn parse_version(output: &str) -> Result<String> {
    let trimmed = output.trim();
    trimmed
        .split_whitespace()
        .nth(1)
        .map(str::to_string)
        .ok_or_else(|| GftpError::InvalidVersion(trimmed.to_string()))
}
