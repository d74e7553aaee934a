// src/proc/launcher.rs

//! Starting gftp processes.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::anyhow;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info};

use crate::context::OperationContext;
use crate::errors::{GftpError, Result};
use crate::types::{ExitCode, OperationKind};

use super::supervisor;

/// Program, arguments and extra environment for one gftp invocation.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Set an environment variable for the child on top of the inherited ones.
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().cloned())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// A freshly spawned child with both output pipes taken out.
#[derive(Debug)]
pub struct Launched {
    pub child: Child,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

pub fn launch(spec: &LaunchSpec) -> Result<Launched> {
    debug!(program = ?spec.program, args = ?spec.args, "spawning gftp");

    let mut child = spec.command().spawn().map_err(|source| GftpError::Spawn {
        program: spec.program.clone(),
        source,
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| GftpError::Other(anyhow!("child stdout was not piped")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| GftpError::Other(anyhow!("child stderr was not piped")))?;

    Ok(Launched {
        child,
        stdout,
        stderr,
    })
}

/// Everything a blocking invocation printed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockingOutput {
    pub stdout: String,
    pub stderr: String,
}

impl BlockingOutput {
    /// Stdout followed by stderr, used for diagnostics.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        out.push_str(&self.stderr);
        out
    }
}

/// Run to completion and collect stdout and stderr.
///
/// A non-zero exit is reported as [`GftpError::ProcessExit`] with the
/// collected output attached.
pub async fn run_blocking(spec: &LaunchSpec) -> Result<BlockingOutput> {
    let Launched {
        mut child,
        mut stdout,
        mut stderr,
    } = launch(spec)?;

    let mut out = Vec::new();
    let mut err = Vec::new();
    let (status, _, _) = tokio::try_join!(
        child.wait(),
        stdout.read_to_end(&mut out),
        stderr.read_to_end(&mut err),
    )?;

    let output = BlockingOutput {
        stdout: String::from_utf8_lossy(&out).into_owned(),
        stderr: String::from_utf8_lossy(&err).into_owned(),
    };

    let code = ExitCode::from_status(status);
    debug!(program = ?spec.program, exit_code = %code, "blocking gftp call finished");

    if !code.success() {
        return Err(GftpError::ProcessExit {
            code,
            output: output.combined(),
        });
    }

    Ok(output)
}

/// Start a process whose stdout is decoded into a live [`OperationContext`].
///
/// Returns as soon as the process is spawned; must be called from within a
/// Tokio runtime.
pub fn spawn_streaming(spec: &LaunchSpec, kind: OperationKind) -> Result<OperationContext> {
    let launched = launch(spec)?;

    info!(
        op = %kind,
        program = ?spec.program,
        pid = ?launched.child.id(),
        "started gftp process"
    );

    Ok(supervisor::supervise(launched, kind))
}
