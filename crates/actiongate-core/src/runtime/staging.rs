// crates/actiongate-core/src/runtime/staging.rs
// ============================================================================
// Module: ActionGate Upload Staging
// Description: Request-scoped directory for uploaded files.
// Purpose: Give uploads filesystem paths that never outlive their request.
// Dependencies: tempfile, thiserror
// ============================================================================

//! ## Overview
//! Each request owns one [`StagingArea`]. The directory is created lazily on
//! the first upload and removed when the area is dropped, so cleanup runs on
//! every exit path: success, error, timeout, and panic unwinding.
//!
//! Security posture: client file names are untrusted. Only the final path
//! component survives, restricted to `[A-Za-z0-9._-]`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use tempfile::TempDir;
use thiserror::Error;

use crate::core::transport::UploadedFile;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix of staging directory names.
pub(crate) const STAGING_PREFIX: &str = "actiongate_upload_";

/// Name used when a client file name sanitizes to nothing.
const FALLBACK_FILENAME: &str = "upload";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Staging failures.
#[derive(Debug, Error)]
pub enum StagingError {
    /// Filesystem operation failed.
    #[error("upload staging failed: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// SECTION: Staging Area
// ============================================================================

/// Per-request upload directory, removed on drop.
#[derive(Debug, Default)]
pub struct StagingArea {
    /// Parent directory override; the system temp dir when `None`.
    parent: Option<PathBuf>,
    /// Directory, created on first upload.
    dir: Option<TempDir>,
}

impl StagingArea {
    /// Creates an area under the system temp directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an area under `parent`.
    #[must_use]
    pub fn in_dir(parent: impl Into<PathBuf>) -> Self {
        Self {
            parent: Some(parent.into()),
            dir: None,
        }
    }

    /// Returns the directory path once something has been staged.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }

    /// Writes `upload` into the area and returns its path.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError`] when the directory or file cannot be written.
    pub fn stage(&mut self, upload: &UploadedFile) -> Result<PathBuf, StagingError> {
        let dir = self.ensure_dir()?;
        let name = sanitize_filename(&upload.filename);
        let mut target = dir.join(&name);
        let mut counter = 1_u32;
        while target.exists() {
            target = dir.join(format!("{counter}_{name}"));
            counter += 1;
        }
        fs::write(&target, &upload.bytes)?;
        Ok(target)
    }

    /// Removes the directory now, reporting failures instead of ignoring them.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError`] when removal fails.
    pub fn close(mut self) -> Result<(), StagingError> {
        match self.dir.take() {
            Some(dir) => dir.close().map_err(StagingError::from),
            None => Ok(()),
        }
    }

    /// Creates the directory if needed.
    fn ensure_dir(&mut self) -> Result<PathBuf, StagingError> {
        if let Some(dir) = &self.dir {
            return Ok(dir.path().to_path_buf());
        }
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        let dir = match &self.parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        let path = dir.path().to_path_buf();
        self.dir = Some(dir);
        Ok(path)
    }
}

/// Keeps the last path component and replaces unsafe characters.
fn sanitize_filename(raw: &str) -> String {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') { ch } else { '_' })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() { FALLBACK_FILENAME.to_string() } else { trimmed.to_string() }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]

    use super::*;

    fn upload(name: &str, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            content_type: None,
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn filenames_lose_directories_and_dots() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("..\\win\\evil name.txt"), "evil_name.txt");
        assert_eq!(sanitize_filename(".."), "upload");
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[test]
    fn directory_is_created_lazily_and_removed_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let mut area = StagingArea::in_dir(parent.path());
        assert!(area.path().is_none());
        let staged = area.stage(&upload("a.txt", b"hello")).unwrap();
        assert_eq!(fs::read(&staged).unwrap(), b"hello");
        let dir = area.path().unwrap().to_path_buf();
        assert!(dir.file_name().unwrap().to_string_lossy().starts_with(STAGING_PREFIX));
        drop(area);
        assert!(!dir.exists());
    }

    #[test]
    fn colliding_names_do_not_overwrite() {
        let mut area = StagingArea::new();
        let first = area.stage(&upload("a.txt", b"1")).unwrap();
        let second = area.stage(&upload("a.txt", b"2")).unwrap();
        assert_ne!(first, second);
        assert_eq!(fs::read(&first).unwrap(), b"1");
        area.close().unwrap();
        assert!(!first.exists());
    }
}
