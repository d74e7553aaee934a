// src/commands.rs

//! Bodies of the `gftpwrap` subcommands.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::Gftp;
use crate::context::OperationContext;
use crate::context::state::exited;
use crate::fs::{check_files_identical, generate_random_file, random_chars};

/// Minimum spacing between two progress log lines.
pub const PROGRESS_EVERY: Duration = Duration::from_secs(1);

pub fn version(gftp: &Gftp) -> Result<()> {
    println!("{}", gftp.version());
    Ok(())
}

/// Publish, print `file<TAB>url` lines, then serve until Ctrl-C.
pub async fn publish(gftp: &Gftp, files: &[PathBuf]) -> Result<()> {
    let ctx = gftp.publish_many(files).await?;

    for entry in ctx.snapshot().published() {
        println!("{}\t{}", entry.file, entry.url);
    }
    info!("serving published files; press Ctrl-C to stop");

    let stopped_on_its_own = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("listening for Ctrl-C")?;
            false
        }
        res = ctx.wait_until(exited) => {
            res?;
            true
        }
    };

    let code = gftp.unpublish(ctx).await?;
    if stopped_on_its_own {
        bail!("gftp stopped serving on its own ({code})");
    }
    Ok(())
}

pub async fn download(gftp: &Gftp, url: &str, path: &Path) -> Result<()> {
    let ctx = gftp.download(url, path)?;
    let reporter = spawn_progress_reporter(&ctx, PROGRESS_EVERY);
    let res = gftp.wait_for_download(&ctx).await;
    reporter.abort();
    res?;
    Ok(())
}

/// Generate a random file, publish it, download it back and compare.
pub async fn roundtrip(gftp: &Gftp, size: u64, dir: &Path, keep: bool) -> Result<()> {
    let tag = random_chars(8);
    let src = dir.join(format!("gftp-src-{tag}.bin"));
    let dst = dir.join(format!("gftp-dst-{tag}.bin"));

    info!(path = ?src, size, "Generating test file");
    {
        let src = src.clone();
        tokio::task::spawn_blocking(move || generate_random_file(&src, size)).await??;
    }

    let result = roundtrip_transfer(gftp, &src, &dst).await;

    if !keep {
        for path in [&src, &dst] {
            if let Err(e) = std::fs::remove_file(path) {
                debug!(?path, error = %e, "could not remove scratch file");
            }
        }
    }

    result?;
    println!("roundtrip ok: {size} bytes");
    Ok(())
}

async fn roundtrip_transfer(gftp: &Gftp, src: &Path, dst: &Path) -> Result<()> {
    let published = gftp.publish(src).await?;
    let url = published
        .url()
        .ok_or_else(|| anyhow!("publish finished without a URL"))?;

    let download = gftp.download(&url, dst)?;
    let reporter = spawn_progress_reporter(&download, PROGRESS_EVERY);
    let downloaded = gftp.wait_for_download(&download).await;
    reporter.abort();

    // Stop serving even if the download failed.
    let unpublished = gftp.unpublish(published).await;
    downloaded?;
    unpublished?;

    let (src, dst) = (src.to_path_buf(), dst.to_path_buf());
    tokio::task::spawn_blocking(move || check_files_identical(&src, &dst)).await??;
    info!("downloaded file is identical to the published one");
    Ok(())
}

/// Log transfer progress, at most once per `every`, until the process exits.
pub fn spawn_progress_reporter(ctx: &OperationContext, every: Duration) -> JoinHandle<()> {
    let mut rx = ctx.subscribe();
    let kind = ctx.kind();

    tokio::spawn(async move {
        let mut last_report: Option<Instant> = None;

        while rx.changed().await.is_ok() {
            let (progress, done) = {
                let state = rx.borrow_and_update();
                (state.progress().copied(), state.has_exited())
            };
            if done {
                break;
            }
            let Some(p) = progress else { continue };
            if last_report.is_some_and(|t| t.elapsed() < every) {
                continue;
            }
            last_report = Some(Instant::now());

            let percent = p.fraction().unwrap_or(0.0) * 100.0;
            info!(
                op = %kind,
                current = p.current,
                total = p.total,
                speed = p.speed_current,
                "Progress: {}/{} - {:.2}%",
                p.current,
                p.total,
                percent
            );
        }
    })
}
