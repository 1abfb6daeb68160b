//! Target directory handling for uploads.
//!
//! This module provides the filesystem side of the pipeline:
//! - Idempotent creation of the target directory
//! - Create-or-truncate writes streamed from a reader
//! - Removal of written files (used by the rollback policy)

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use super::error::UploadError;

/// Permission bits for created directories (rwxr-xr-x).
pub const DIR_MODE: u32 = 0o755;

/// Make sure `path` exists, creating it and any missing parents.
///
/// If anything already exists at `path` this succeeds without checking that
/// it is a directory.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if fs::metadata(path).is_ok() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(path)
}

/// A directory that uploaded files are written into.
#[derive(Debug, Clone)]
pub struct UploadDir {
    path: PathBuf,
}

impl UploadDir {
    /// Ensure the directory exists and return a handle to it.
    pub fn ensure(path: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let path = path.into();
        ensure_dir(&path).map_err(|source| UploadError::DirectoryUnavailable {
            path: path.clone(),
            source,
        })?;

        Ok(Self { path })
    }

    /// Get the directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the full path for a stored name.
    pub fn file_path(&self, stored_name: &str) -> PathBuf {
        self.path.join(stored_name)
    }

    /// Create or truncate `stored_name` and copy all of `reader` into it.
    ///
    /// Returns the number of bytes written. The file handle is flushed and
    /// closed before returning.
    pub fn write<R: Read + ?Sized>(&self, stored_name: &str, reader: &mut R) -> io::Result<u64> {
        let file = File::create(self.file_path(stored_name))?;
        let mut writer = BufWriter::new(file);
        let written = io::copy(reader, &mut writer)?;
        writer.flush()?;

        Ok(written)
    }

    /// Delete a stored file.
    ///
    /// Returns `true` if the file was deleted, `false` if it didn't exist.
    pub fn remove(&self, stored_name: &str) -> io::Result<bool> {
        match fs::remove_file(self.file_path(stored_name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if a stored file exists.
    pub fn exists(&self, stored_name: &str) -> bool {
        self.file_path(stored_name).exists()
    }
}
