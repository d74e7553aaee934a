// src/types.rs

use std::fmt;
use std::process::ExitStatus;
use std::time::Duration;

/// Final status of a gftp process.
///
/// `Signal` is the distinguished marker for a process that was terminated by
/// a signal and therefore has no exit code of its own. `Unknown` means the
/// process is gone but its status could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Code(i32),
    Signal(i32),
    Unknown,
}

impl ExitCode {
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitCode::Code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitCode::Signal(signal);
            }
        }

        ExitCode::Unknown
    }

    pub fn success(&self) -> bool {
        matches!(self, ExitCode::Code(0))
    }

    /// Numeric exit code, if the process exited normally.
    pub fn code(&self) -> Option<i32> {
        match self {
            ExitCode::Code(c) => Some(*c),
            ExitCode::Signal(_) | ExitCode::Unknown => None,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Code(c) => write!(f, "exit code {c}"),
            ExitCode::Signal(s) => write!(f, "signal {s}"),
            ExitCode::Unknown => f.write_str("unknown exit status"),
        }
    }
}

/// Which gftp subcommand an operation is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Publish,
    Download,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Publish => f.write_str("publish"),
            OperationKind::Download => f.write_str("download"),
        }
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}
