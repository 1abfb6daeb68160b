//! Upload processor.
//!
//! Validates, names and stores every file of a multipart upload:
//! - Whole-request size cap while parsing
//! - Per-file size check
//! - Content sniffing against the allow-list
//! - Generated or verbatim on-disk names

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use axum::extract::Multipart;
use serde::Serialize;

use super::error::UploadError;
use super::form::{parse_form, FilePart};
use super::naming::{client_base_name, generated_file_name};
use super::policy::UploadPolicy;
use super::sniff::{detect_content_type, SNIFF_LEN};
use super::storage::UploadDir;

/// Metadata for a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    /// File name declared by the client.
    pub original_file_name: String,
    /// Name the file was stored under.
    pub assigned_file_name: String,
    /// Bytes written to disk.
    pub size: u64,
    /// Content type detected from the file's leading bytes.
    pub content_type: String,
}

/// Processes multipart uploads into a target directory.
///
/// Files are handled one at a time in the order the form yields them. The
/// first failure ends the batch.
#[derive(Debug, Clone, Default)]
pub struct UploadProcessor {
    policy: UploadPolicy,
}

impl UploadProcessor {
    /// Create a new processor with the given policy.
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }

    /// Get the policy.
    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Parse `multipart` and store every file part in `target_dir`.
    ///
    /// Nothing is written if parsing fails or the directory cannot be
    /// created. When a later file fails, files already written stay on disk
    /// unless the policy asks for rollback.
    pub async fn process(
        &self,
        multipart: Multipart,
        target_dir: impl AsRef<Path>,
    ) -> Result<Vec<UploadedFile>, UploadError> {
        let form = parse_form(
            multipart,
            self.policy.request_limit(),
            self.policy.spool_threshold,
        )
        .await?;

        self.store_parts(form.files, target_dir)
    }

    /// Like [`process`](Self::process) but returns only the first file.
    ///
    /// Fails with [`UploadError::NoFiles`] when the form had no file parts.
    pub async fn process_one(
        &self,
        multipart: Multipart,
        target_dir: impl AsRef<Path>,
    ) -> Result<UploadedFile, UploadError> {
        self.process(multipart, target_dir)
            .await?
            .into_iter()
            .next()
            .ok_or(UploadError::NoFiles)
    }

    /// Store already-parsed parts in `target_dir`.
    pub fn store_parts(
        &self,
        parts: Vec<FilePart>,
        target_dir: impl AsRef<Path>,
    ) -> Result<Vec<UploadedFile>, UploadError> {
        let dir = UploadDir::ensure(target_dir.as_ref())?;
        let mut uploaded = Vec::with_capacity(parts.len());

        for part in parts {
            match self.store_part(&dir, part) {
                Ok(file) => {
                    tracing::info!(
                        original = %file.original_file_name,
                        stored = %file.assigned_file_name,
                        size = file.size,
                        content_type = %file.content_type,
                        "Stored uploaded file"
                    );
                    uploaded.push(file);
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        stored_before_failure = uploaded.len(),
                        "Upload batch aborted"
                    );
                    if self.policy.rollback_on_failure {
                        Self::rollback(&dir, &uploaded);
                    }
                    return Err(e);
                }
            }
        }

        Ok(uploaded)
    }

    fn store_part(
        &self,
        dir: &UploadDir,
        mut part: FilePart,
    ) -> Result<UploadedFile, UploadError> {
        let name = part.file_name.as_str();

        let limit = self.policy.file_limit();
        if part.size > limit {
            return Err(UploadError::FileTooLarge {
                name: name.to_string(),
                size: part.size,
                limit,
            });
        }

        let mut head = Vec::with_capacity(SNIFF_LEN);
        (&mut part.content)
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .map_err(UploadError::stream_io(name))?;
        let content_type = detect_content_type(&head);
        tracing::debug!(file_name = %name, content_type, "Sniffed content type");

        if !self.policy.permits(content_type) {
            return Err(UploadError::FileTypeNotPermitted {
                name: name.to_string(),
                detected_type: content_type.to_string(),
            });
        }

        part.content
            .seek(SeekFrom::Start(0))
            .map_err(UploadError::stream_io(name))?;

        let assigned_file_name = if self.policy.rename {
            generated_file_name(name)?
        } else {
            verbatim_file_name(name)?
        };

        let size = self.write_file(dir, &assigned_file_name, name, &mut part.content)?;

        Ok(UploadedFile {
            original_file_name: part.file_name,
            assigned_file_name,
            size,
            content_type: content_type.to_string(),
        })
    }

    /// Copy `reader` into `stored_name`.
    ///
    /// A failed copy leaves a partial file behind; it is removed when the
    /// policy asks for rollback.
    fn write_file<R: Read + ?Sized>(
        &self,
        dir: &UploadDir,
        stored_name: &str,
        name: &str,
        reader: &mut R,
    ) -> Result<u64, UploadError> {
        dir.write(stored_name, reader).map_err(|e| {
            if self.policy.rollback_on_failure {
                Self::discard(dir, stored_name);
            }
            UploadError::stream_io(name)(e)
        })
    }

    fn rollback(dir: &UploadDir, uploaded: &[UploadedFile]) {
        for file in uploaded {
            Self::discard(dir, &file.assigned_file_name);
        }
    }

    fn discard(dir: &UploadDir, stored_name: &str) {
        match dir.remove(stored_name) {
            Ok(_) => {
                tracing::warn!(stored = %stored_name, "Removed file from aborted batch");
            }
            Err(e) => {
                tracing::error!(
                    stored = %stored_name,
                    error = %e,
                    "Failed to remove file from aborted batch"
                );
            }
        }
    }
}

/// Use the last path component of a client file name as the stored name.
///
/// Names that would not land inside the target directory are rejected.
fn verbatim_file_name(name: &str) -> Result<String, UploadError> {
    let base = client_base_name(name);
    let unsafe_name = base.is_empty() || base == "." || base == ".." || base.contains('\0');
    if unsafe_name {
        return Err(UploadError::UnsafeFileName {
            name: name.to_string(),
        });
    }
    Ok(base.to_string())
}
