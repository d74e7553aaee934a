// src/proc/signal.rs

use std::io;

use tokio::process::Child;

/// Send SIGINT to the child, the same signal Ctrl-C would deliver.
#[cfg(unix)]
pub fn interrupt(child: &mut Child) -> io::Result<()> {
    let Some(pid) = child.id() else {
        // Already reaped.
        return Ok(());
    };

    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// No console interrupt for a child without a console; fall back to killing it.
#[cfg(not(unix))]
pub fn interrupt(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}
