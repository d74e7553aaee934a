// src/context/state.rs

//! Typed operation record.
//!
//! `OperationState` is the single source of truth for one gftp operation. The
//! fields are private; mutation goes through methods that enforce the record's
//! rules:
//!
//! - the first latched error wins and is never replaced,
//! - progress is replaced as a whole (no partial updates),
//! - the exit code is recorded at most once.
//!
//! [`Phase`] is a discriminated view over the record for callers that only
//! care about "where" the operation currently is.

use crate::errors::GftpError;
use crate::event::parser::{GftpEvent, INVALID_RESPONSE_MESSAGE, ResultEntry};
use crate::types::ExitCode;

/// Transfer progress as reported by a single progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub speed_current: u64,
    pub speed_total: u64,
    pub elapsed: u64,
}

impl Progress {
    /// `current / total`, or `None` while the total is still unknown.
    pub fn fraction(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.current as f64 / self.total as f64)
        }
    }
}

/// One published file and the URL it can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub file: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Error message reported by gftp, passed through verbatim.
    Service,
    /// The identity endpoint of the background service could not be reached.
    ServiceUnavailable,
    /// A result event was malformed or incomplete.
    Protocol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl OperationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<OperationError> for GftpError {
    fn from(err: OperationError) -> Self {
        match err.kind {
            ErrorKind::Service => GftpError::Service(err.message),
            ErrorKind::ServiceUnavailable => GftpError::ServiceUnavailable(err.message),
            ErrorKind::Protocol => GftpError::Protocol(err.message),
        }
    }
}

/// Where an operation currently is, most significant condition first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase<'a> {
    Pending,
    Progress(&'a Progress),
    Published(&'a Published),
    Error(&'a OperationError),
    Exited(ExitCode),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationState {
    progress: Option<Progress>,
    published: Vec<Published>,
    error: Option<OperationError>,
    exit: Option<ExitCode>,
}

impl OperationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    /// Every published entry, in the order gftp reported them.
    pub fn published(&self) -> &[Published] {
        &self.published
    }

    /// File name of the most recently published entry.
    pub fn file(&self) -> Option<&str> {
        self.published.last().map(|p| p.file.as_str())
    }

    /// URL of the most recently published entry.
    pub fn url(&self) -> Option<&str> {
        self.published.last().map(|p| p.url.as_str())
    }

    pub fn error(&self) -> Option<&OperationError> {
        self.error.as_ref()
    }

    pub fn exit_code(&self) -> Option<ExitCode> {
        self.exit
    }

    pub fn has_exited(&self) -> bool {
        self.exit.is_some()
    }

    pub fn phase(&self) -> Phase<'_> {
        if let Some(code) = self.exit {
            return Phase::Exited(code);
        }
        if let Some(err) = &self.error {
            return Phase::Error(err);
        }
        if let Some(published) = self.published.last() {
            return Phase::Published(published);
        }
        match &self.progress {
            Some(p) => Phase::Progress(p),
            None => Phase::Pending,
        }
    }

    /// Fold one decoded event into the record.
    ///
    /// Invalid elements of a batch result latch a protocol error, but valid
    /// siblings are still recorded.
    pub fn apply(&mut self, event: GftpEvent) {
        match event {
            GftpEvent::Error(err) => {
                self.latch_error(err);
            }
            GftpEvent::Results(entries) => {
                let mut invalid = false;
                for entry in entries {
                    match entry {
                        ResultEntry::Published(p) => self.push_published(p),
                        ResultEntry::Invalid => invalid = true,
                    }
                }
                if invalid {
                    self.latch_error(OperationError::new(
                        ErrorKind::Protocol,
                        INVALID_RESPONSE_MESSAGE,
                    ));
                }
            }
            GftpEvent::Progress(progress) => self.set_progress(progress),
        }
    }

    pub(crate) fn set_progress(&mut self, progress: Progress) {
        self.progress = Some(progress);
    }

    pub(crate) fn push_published(&mut self, published: Published) {
        self.published.push(published);
    }

    /// Latch an error. Returns `false` if an earlier error was kept instead.
    pub(crate) fn latch_error(&mut self, err: OperationError) -> bool {
        if self.error.is_some() {
            return false;
        }
        self.error = Some(err);
        true
    }

    /// Record the exit code. Returns `false` if one was already recorded.
    pub(crate) fn set_exit(&mut self, code: ExitCode) -> bool {
        if self.exit.is_some() {
            return false;
        }
        self.exit = Some(code);
        true
    }
}

/// Terminal predicate for publish: a URL was issued or the process is gone.
pub fn url_or_exit(state: &OperationState) -> bool {
    state.url().is_some() || state.has_exited()
}

/// Terminal predicate for download and unpublish.
pub fn exited(state: &OperationState) -> bool {
    state.has_exited()
}
