// src/context/awaiter.rs

//! Waiting for an operation to reach a terminal condition.
//!
//! Writers (the stdout pump and the process supervisor) publish every state
//! change on a `tokio::sync::watch` channel, so waiters are woken exactly when
//! something changed instead of re-checking on a timer.

use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::watch;

use crate::context::state::OperationState;
use crate::errors::{GftpError, Result};

/// Suspend until `pred` holds for the current state and return a snapshot of
/// that state.
///
/// Fails only if every writer went away without the predicate ever holding,
/// which means the process supervisor stopped without recording an exit.
pub async fn wait_until<F>(
    rx: &mut watch::Receiver<OperationState>,
    pred: F,
) -> Result<OperationState>
where
    F: FnMut(&OperationState) -> bool,
{
    match rx.wait_for(pred).await {
        Ok(state) => Ok(state.clone()),
        Err(_) => Err(GftpError::Other(anyhow!(
            "gftp process supervisor stopped before the awaited condition was reached"
        ))),
    }
}

/// Like [`wait_until`], but gives up after `bound` and returns `Ok(None)`.
pub async fn wait_until_within<F>(
    rx: &mut watch::Receiver<OperationState>,
    bound: Duration,
    pred: F,
) -> Result<Option<OperationState>>
where
    F: FnMut(&OperationState) -> bool,
{
    match tokio::time::timeout(bound, wait_until(rx, pred)).await {
        Ok(res) => res.map(Some),
        Err(_elapsed) => Ok(None),
    }
}
