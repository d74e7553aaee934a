// src/event/mod.rs

//! gftp stdout event stream.
//!
//! - [`line_buffer`] turns raw pipe chunks into complete lines.
//! - [`parser`] decodes one line into a [`GftpEvent`].
//!
//! [`handle_line`] glues both to an [`OperationState`]: it is what the stdout
//! pump calls for every line it reassembles.

pub mod line_buffer;
pub mod parser;

use tracing::{debug, info, warn};

use crate::context::state::OperationState;
use crate::types::OperationKind;

pub use line_buffer::LineBuffer;
pub use parser::{GftpEvent, ParsedLine, ResultEntry, parse_line};

/// Decode one stdout line and fold it into `state`.
///
/// Never fails: lines that are not JSON are logged and dropped, because gftp
/// may interleave plain diagnostics with its events.
pub fn handle_line(kind: OperationKind, line: &str, state: &mut OperationState) {
    match parse_line(line) {
        ParsedLine::Event(event) => {
            debug!(op = %kind, ?event, "gftp event");
            if let GftpEvent::Error(err) = &event {
                if state.error().is_some() {
                    warn!(op = %kind, message = %err.message, "error already latched; ignoring later error");
                }
            }
            state.apply(event);
        }
        ParsedLine::Empty => {}
        ParsedLine::Unrecognized(value) => {
            debug!(op = %kind, %value, "ignoring gftp message of unknown shape");
        }
        ParsedLine::Malformed(e) => {
            info!(op = %kind, error = %e, "Cannot parse line: {}", line);
        }
    }
}
