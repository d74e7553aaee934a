// src/proc/supervisor.rs

//! Per-process supervisor for streaming operations.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::context::{OperationContext, OperationState};
use crate::event::{self, LineBuffer};
use crate::types::{ExitCode, OperationKind};

use super::launcher::Launched;
use super::signal;

const READ_CHUNK: usize = 8 * 1024;

/// How long to keep reading pipes after the process itself has exited.
///
/// A grandchild that inherited the pipes can keep them open indefinitely.
const PIPE_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Requests a caller can make of a running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Interrupt,
    Kill,
}

type StateWriter = Arc<watch::Sender<OperationState>>;

/// Take ownership of a launched child and return the caller's handle.
///
/// Spawns three Tokio tasks: the stdout pump, the stderr drain and the
/// supervisor that waits for the process. The `Child` is moved into the
/// supervisor and reaped exactly once there.
pub(crate) fn supervise(launched: Launched, kind: OperationKind) -> OperationContext {
    let Launched {
        child,
        stdout,
        stderr,
    } = launched;
    let pid = child.id();

    let (state_tx, state_rx) = watch::channel(OperationState::new());
    let state_tx: StateWriter = Arc::new(state_tx);
    let (control_tx, control_rx) = mpsc::channel::<ControlSignal>(8);

    let stdout_task = tokio::spawn(pump_stdout(kind, stdout, Arc::clone(&state_tx)));
    let stderr_task = tokio::spawn(drain_stderr(kind, stderr));

    tokio::spawn(async move {
        run_supervisor(kind, child, control_rx, stdout_task, stderr_task, state_tx).await;
        debug!(op = %kind, "supervisor finished");
    });

    OperationContext::new(kind, pid, state_rx, control_tx)
}

async fn pump_stdout(kind: OperationKind, mut stdout: ChildStdout, state: StateWriter) {
    let mut lines = LineBuffer::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let n = match stdout.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!(op = %kind, error = %e, "reading gftp stdout failed");
                break;
            }
        };

        for line in lines.push(&chunk[..n]) {
            state.send_modify(|s| event::handle_line(kind, &line, s));
        }
    }

    if let Some(rest) = lines.finish() {
        state.send_modify(|s| event::handle_line(kind, &rest, s));
    }

    debug!(op = %kind, "stdout closed");
}

/// Consume stderr until EOF so the pipe never fills or closes early; log at
/// debug. Bytes are decoded lossily, so invalid UTF-8 does not stop the drain.
async fn drain_stderr(kind: OperationKind, stderr: ChildStderr) {
    let mut reader = BufReader::new(stderr);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                debug!(op = %kind, "stderr: {}", text.trim_end());
            }
            Err(e) => {
                warn!(op = %kind, error = %e, "reading gftp stderr failed");
                break;
            }
        }
    }
}

async fn run_supervisor(
    kind: OperationKind,
    mut child: Child,
    mut control_rx: mpsc::Receiver<ControlSignal>,
    mut stdout_task: JoinHandle<()>,
    mut stderr_task: JoinHandle<()>,
    state: StateWriter,
) {
    let mut control_open = true;

    // Either the process exits on its own, or a caller asks us to stop it.
    let status = loop {
        tokio::select! {
            status = child.wait() => break status,

            signal = control_rx.recv(), if control_open => match signal {
                Some(signal) => deliver(kind, &mut child, signal),
                None => {
                    control_open = false;
                    info!(op = %kind, "operation handle dropped while running; killing gftp process");
                    if let Err(e) = child.start_kill() {
                        warn!(op = %kind, error = %e, "failed to kill orphaned gftp process");
                    }
                }
            },
        }
    };

    let code = match status {
        Ok(status) => ExitCode::from_status(status),
        Err(e) => {
            error!(op = %kind, error = %e, "waiting for gftp process failed");
            ExitCode::Unknown
        }
    };

    // The last lines may still be in flight; they must land before the exit.
    finish_pipe(kind, "stdout", &mut stdout_task).await;
    finish_pipe(kind, "stderr", &mut stderr_task).await;

    info!(
        op = %kind,
        exit_code = %code,
        success = code.success(),
        "gftp process exited"
    );

    state.send_modify(|s| {
        s.set_exit(code);
    });
}

fn deliver(kind: OperationKind, child: &mut Child, signal: ControlSignal) {
    let res = match signal {
        ControlSignal::Interrupt => signal::interrupt(child),
        ControlSignal::Kill => child.start_kill(),
    };

    match res {
        Ok(()) => info!(op = %kind, ?signal, "signal sent to gftp process"),
        Err(e) => warn!(op = %kind, ?signal, error = %e, "failed to signal gftp process"),
    }
}

async fn finish_pipe(kind: OperationKind, pipe: &'static str, task: &mut JoinHandle<()>) {
    match tokio::time::timeout(PIPE_DRAIN_GRACE, &mut *task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(op = %kind, pipe, error = %e, "pipe reader task failed"),
        Err(_) => {
            warn!(op = %kind, pipe, "pipe still open after process exit; abandoning reader");
            task.abort();
        }
    }
}
