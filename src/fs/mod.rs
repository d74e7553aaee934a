// src/fs/mod.rs

//! File helpers used around transfers: random test files and byte-exact
//! comparison.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use anyhow::Context;
use rand::distributions::Alphanumeric;
use rand::{Rng, RngCore};
use tracing::debug;

use crate::errors::{GftpError, Result};

/// Largest block of random bytes held in memory while generating a file.
pub const MAX_RANDOM_CHUNK: usize = 20_000_000;

const COMPARE_CHUNK: usize = 1_000_000;

/// Write exactly `size` random bytes to `path`, replacing any existing file.
///
/// One random block of at most [`MAX_RANDOM_CHUNK`] bytes is generated and
/// repeated, so large files are cheap to produce.
pub fn generate_random_file(path: &Path, size: u64) -> Result<()> {
    let chunk_count = size / MAX_RANDOM_CHUNK as u64 + 1;
    let chunk_size = (size / chunk_count) as usize;

    debug!(?path, size, chunk_size, "generating random file");

    let mut block = vec![0u8; chunk_size];
    rand::thread_rng().fill_bytes(&mut block);

    let file = File::create(path).with_context(|| format!("creating file {:?}", path))?;
    let mut writer = BufWriter::new(file);

    let mut remaining = size;
    while remaining > 0 {
        let n = remaining.min(chunk_size as u64) as usize;
        writer
            .write_all(&block[..n])
            .with_context(|| format!("writing to file {:?}", path))?;
        remaining -= n as u64;
    }

    writer
        .flush()
        .with_context(|| format!("flushing file {:?}", path))?;
    Ok(())
}

/// Fail unless both files exist and have identical size and content.
pub fn check_files_identical(a: &Path, b: &Path) -> Result<()> {
    for path in [a, b] {
        if !path.is_file() {
            return Err(GftpError::FileNotFound(path.to_path_buf()));
        }
    }

    let size_a = std::fs::metadata(a)?.len();
    let size_b = std::fs::metadata(b)?.len();
    if size_a != size_b {
        return Err(GftpError::FilesDiffer(format!(
            "size mismatch ({size_a} vs {size_b} bytes)"
        )));
    }

    let mut file_a = File::open(a).with_context(|| format!("opening file {:?}", a))?;
    let mut file_b = File::open(b).with_context(|| format!("opening file {:?}", b))?;
    let mut buf_a = vec![0u8; COMPARE_CHUNK];
    let mut buf_b = vec![0u8; COMPARE_CHUNK];
    let mut offset: u64 = 0;

    loop {
        let n = read_full(&mut file_a, &mut buf_a)?;
        let m = read_full(&mut file_b, &mut buf_b)?;
        if n != m || buf_a[..n] != buf_b[..m] {
            return Err(GftpError::FilesDiffer(format!(
                "content mismatch in block starting at byte {offset}"
            )));
        }
        if n == 0 {
            return Ok(());
        }
        offset += n as u64;
    }
}

/// Fill `buf` as far as the reader allows; short only at EOF.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Random ASCII letters and digits, for unique scratch file names.
pub fn random_chars(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
