// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{
    ConfigFile, DEFAULT_SHUTDOWN_GRACE, GftpSection, RawConfigFile, RawTimeouts, Timeouts,
};
use crate::errors::{GftpError, Result};
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::GftpError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_gftp_section(&raw.gftp)?;
        let timeouts = validate_timeouts(&raw.timeouts)?;
        Ok(ConfigFile::new_unchecked(raw.gftp, timeouts))
    }
}

fn validate_gftp_section(section: &GftpSection) -> Result<()> {
    if let Some(binary) = &section.binary {
        if binary.as_os_str().is_empty() {
            return Err(GftpError::ConfigError(
                "[gftp].binary must not be empty".to_string(),
            ));
        }
    }

    if let Some(url) = &section.gsb_url {
        if url.trim().is_empty() {
            return Err(GftpError::ConfigError(
                "[gftp].gsb_url must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_timeouts(raw: &RawTimeouts) -> Result<Timeouts> {
    let shutdown_grace = parse_field("shutdown_grace", raw.shutdown_grace.as_deref())?
        .unwrap_or(DEFAULT_SHUTDOWN_GRACE);

    if shutdown_grace.is_zero() {
        return Err(GftpError::ConfigError(
            "[timeouts].shutdown_grace must be greater than zero".to_string(),
        ));
    }

    Ok(Timeouts {
        shutdown_grace,
        publish: parse_field("publish", raw.publish.as_deref())?,
        download: parse_field("download", raw.download.as_deref())?,
    })
}

fn parse_field(name: &str, value: Option<&str>) -> Result<Option<Duration>> {
    value
        .map(|s| {
            parse_duration(s).map_err(|e| {
                GftpError::ConfigError(format!("[timeouts].{name} = {s:?}: {e}"))
            })
        })
        .transpose()
}
