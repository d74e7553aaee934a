// src/context/mod.rs

//! Operation contexts.
//!
//! An [`OperationContext`] is the caller's handle on one running gftp
//! process. It is cheap to query but deliberately not `Clone`: it carries the
//! only control channel to the process supervisor, so whoever holds it decides
//! when the process is interrupted. Dropping it while the process still runs
//! kills the process.
//!
//! - [`state`] holds the typed record and the terminal predicates.
//! - [`awaiter`] implements waiting on that record.

pub mod awaiter;
pub mod state;

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::errors::Result;
use crate::proc::ControlSignal;
use crate::types::{ExitCode, OperationKind};

pub use state::{ErrorKind, OperationError, OperationState, Phase, Progress, Published};

#[derive(Debug)]
pub struct OperationContext {
    kind: OperationKind,
    pid: Option<u32>,
    state: watch::Receiver<OperationState>,
    control: mpsc::Sender<ControlSignal>,
}

impl OperationContext {
    pub(crate) fn new(
        kind: OperationKind,
        pid: Option<u32>,
        state: watch::Receiver<OperationState>,
        control: mpsc::Sender<ControlSignal>,
    ) -> Self {
        Self {
            kind,
            pid,
            state,
            control,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// OS process id, if the process had not already been reaped at spawn time.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Copy of the current record.
    pub fn snapshot(&self) -> OperationState {
        self.state.borrow().clone()
    }

    pub fn url(&self) -> Option<String> {
        self.state.borrow().url().map(str::to_string)
    }

    pub fn file(&self) -> Option<String> {
        self.state.borrow().file().map(str::to_string)
    }

    pub fn exit_code(&self) -> Option<ExitCode> {
        self.state.borrow().exit_code()
    }

    /// Receiver that is notified on every state change (progress reporting).
    pub fn subscribe(&self) -> watch::Receiver<OperationState> {
        self.state.clone()
    }

    pub async fn wait_until<F>(&self, pred: F) -> Result<OperationState>
    where
        F: FnMut(&OperationState) -> bool,
    {
        let mut rx = self.state.clone();
        awaiter::wait_until(&mut rx, pred).await
    }

    /// Bounded wait; `Ok(None)` means `bound` elapsed first.
    pub async fn wait_until_within<F>(
        &self,
        bound: Duration,
        pred: F,
    ) -> Result<Option<OperationState>>
    where
        F: FnMut(&OperationState) -> bool,
    {
        let mut rx = self.state.clone();
        awaiter::wait_until_within(&mut rx, bound, pred).await
    }

    /// Wait with an optional bound.
    pub(crate) async fn wait_bounded<F>(
        &self,
        bound: Option<Duration>,
        pred: F,
    ) -> Result<Option<OperationState>>
    where
        F: FnMut(&OperationState) -> bool,
    {
        match bound {
            Some(bound) => self.wait_until_within(bound, pred).await,
            None => self.wait_until(pred).await.map(Some),
        }
    }

    /// Ask the process to stop (SIGINT on unix).
    pub async fn interrupt(&self) {
        self.signal(ControlSignal::Interrupt).await;
    }

    /// Forcefully kill the process.
    pub async fn kill(&self) {
        self.signal(ControlSignal::Kill).await;
    }

    async fn signal(&self, signal: ControlSignal) {
        if self.control.send(signal).await.is_err() {
            debug!(op = %self.kind, ?signal, "process supervisor already finished; signal not sent");
        }
    }
}
