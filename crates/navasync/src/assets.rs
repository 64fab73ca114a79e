//! One-time site resources: the fragment file and the spinner image
//!
//! Both follow first-writer-wins: an existing file is never overwritten,
//! so repeated runs and concurrent per-page invocations agree on a single
//! copy.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::Path;

use crate::config::NavAsyncConfig;
use crate::error::{NavAsyncError, Result};

/// Spinner shipped with the crate, used when no `spinner_source` is configured
pub const DEFAULT_SPINNER_SVG: &[u8] = include_bytes!("../assets/bars-rotate-fade.svg");

/// Write `bytes` to `path` unless the file already exists.
///
/// Returns `true` when this call created the file. The data is synced to
/// disk before returning; a failed write removes the partial file.
pub fn write_if_absent(path: &Path, bytes: &[u8]) -> Result<bool> {
    create_and_fill(path, |file| {
        file.write_all(bytes)?;
        file.sync_all()
    })
}

fn create_and_fill<F>(path: &Path, fill: F) -> Result<bool>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(NavAsyncError::io(path, e)),
    };

    if let Err(e) = fill(&mut file) {
        drop(file);
        if let Err(remove_err) = std::fs::remove_file(path) {
            tracing::error!(
                "Could not remove partial file {}: {}",
                path.display(),
                remove_err
            );
        }
        return Err(NavAsyncError::io(path, e));
    }
    Ok(true)
}

/// Copy the spinner image to the site root if it is not there yet
pub fn install_spinner(config: &NavAsyncConfig) -> Result<bool> {
    let dest = config.spinner_file_path();
    if dest.exists() {
        tracing::debug!("Spinner already present: {}", dest.display());
        return Ok(false);
    }

    let installed = match &config.spinner_source {
        Some(source) => {
            let bytes = std::fs::read(source).map_err(|e| NavAsyncError::io(source, e))?;
            write_if_absent(&dest, &bytes)?
        }
        None => write_if_absent(&dest, DEFAULT_SPINNER_SVG)?,
    };

    if installed {
        tracing::info!("Spinner copied to: {}", dest.display());
    }
    Ok(installed)
}
