// src/proc/mod.rs

//! Process layer.
//!
//! Everything that touches `tokio::process` lives here:
//!
//! - [`launcher`] builds the command line and starts gftp, either blocking
//!   (collect all output, fail on non-zero exit) or streaming (return an
//!   [`OperationContext`](crate::context::OperationContext) immediately).
//! - [`supervisor`] owns a streaming child: it pumps stdout into the
//!   operation state, drains stderr, delivers control signals and records the
//!   exit code once the process is gone.
//! - [`signal`] contains the platform-specific interrupt.

pub mod launcher;
pub mod signal;
pub mod supervisor;

pub use launcher::{BlockingOutput, LaunchSpec, Launched, launch, run_blocking, spawn_streaming};
pub use supervisor::ControlSignal;
