// src/event/parser.rs

//! Decoding of single gftp stdout lines into typed events.
//!
//! gftp writes one JSON object per line. Three shapes are known:
//!
//! ```text
//! {"error": {"message": "..."}}
//! {"result": {"file": "...", "url": "..."}}      (or an array of those)
//! {"cur": 1, "tot": 2, "spc": 3, "spt": 4, "elp": 5}
//! ```
//!
//! Anything else is either valid JSON of an unknown shape or not JSON at all;
//! neither is an error for the caller.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::context::state::{ErrorKind, OperationError, Progress, Published};

/// Substring gftp reports when the service identity endpoint is not reachable.
pub const SERVICE_UNAVAILABLE_MARKER: &str = "`/local/identity/Get` is unavailable";

/// Diagnostic that replaces any message containing [`SERVICE_UNAVAILABLE_MARKER`].
pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "Cannot connect to yagna service - check if yagna is running and GSB_URL is set correctly.";

pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response from GFTP";

/// One element of a `result` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultEntry {
    Published(Published),
    /// Element without string `file` and `url` fields.
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GftpEvent {
    Error(OperationError),
    Results(Vec<ResultEntry>),
    Progress(Progress),
}

#[derive(Debug)]
pub enum ParsedLine {
    Event(GftpEvent),
    /// Blank line.
    Empty,
    /// Valid JSON that matches none of the known shapes.
    Unrecognized(Value),
    /// Not JSON at all.
    Malformed(serde_json::Error),
}

/// Progress object exactly as gftp serializes it.
#[derive(Debug, Deserialize)]
struct WireProgress {
    cur: u64,
    tot: u64,
    spc: u64,
    spt: u64,
    elp: u64,
}

impl From<WireProgress> for Progress {
    fn from(w: WireProgress) -> Self {
        Progress {
            current: w.cur,
            total: w.tot,
            speed_current: w.spc,
            speed_total: w.spt,
            elapsed: w.elp,
        }
    }
}

pub fn parse_line(line: &str) -> ParsedLine {
    let line = line.trim();
    if line.is_empty() {
        return ParsedLine::Empty;
    }

    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return ParsedLine::Malformed(e),
    };

    match classify(&value) {
        Some(event) => ParsedLine::Event(event),
        None => ParsedLine::Unrecognized(value),
    }
}

fn classify(value: &Value) -> Option<GftpEvent> {
    let obj = value.as_object()?;

    if let Some(err) = obj.get("error") {
        return Some(GftpEvent::Error(error_from_value(err)));
    }

    if let Some(result) = obj.get("result") {
        let entries = match result {
            Value::Array(items) => items.iter().map(result_entry).collect(),
            other => vec![result_entry(other)],
        };
        return Some(GftpEvent::Results(entries));
    }

    if obj.contains_key("cur") {
        // All five fields travel together; a partial object is not a progress event.
        return serde_json::from_value::<WireProgress>(value.clone())
            .ok()
            .map(|w| GftpEvent::Progress(w.into()));
    }

    None
}

fn error_from_value(err: &Value) -> OperationError {
    match err.get("message").and_then(Value::as_str) {
        Some(message) if message.contains(SERVICE_UNAVAILABLE_MARKER) => OperationError::new(
            ErrorKind::ServiceUnavailable,
            SERVICE_UNAVAILABLE_MESSAGE,
        ),
        Some(message) => OperationError::new(ErrorKind::Service, message),
        None => OperationError::new(ErrorKind::Protocol, INVALID_RESPONSE_MESSAGE),
    }
}

fn result_entry(item: &Value) -> ResultEntry {
    let Some(obj) = item.as_object() else {
        return ResultEntry::Invalid;
    };
    match (string_field(obj, "file"), string_field(obj, "url")) {
        (Some(file), Some(url)) => ResultEntry::Published(Published {
            file: file.to_string(),
            url: url.to_string(),
        }),
        _ => ResultEntry::Invalid,
    }
}

fn string_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}
