//! Upload error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while processing an upload batch.
///
/// Every variant is terminal for the batch: processing stops at the first
/// error and nothing is retried.
#[derive(Error, Debug)]
pub enum UploadError {
    /// The request body exceeded the whole-request cap while parsing.
    #[error("the uploaded request is too big (limit {limit} bytes)")]
    RequestTooLarge {
        /// Request cap in bytes.
        limit: u64,
    },

    /// The multipart body could not be decoded.
    #[error("malformed multipart form: {0}")]
    MalformedForm(String),

    /// The target directory is missing and could not be created.
    #[error("failed to create upload directory: {}", path.display())]
    DirectoryUnavailable {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A single file exceeded the per-file size limit.
    #[error("file {name} of size {size} exceeds max size of {limit}")]
    FileTooLarge {
        /// Declared file name.
        name: String,
        /// Received size in bytes.
        size: u64,
        /// Per-file limit in bytes.
        limit: u64,
    },

    /// The sniffed content type is not in the allow-list.
    #[error("uploaded file type: {detected_type} is not permitted ({name})")]
    FileTypeNotPermitted {
        /// Declared file name.
        name: String,
        /// Content type detected from the file's leading bytes.
        detected_type: String,
    },

    /// A name kept verbatim would not stay inside the target directory.
    #[error("unsafe file name: {name:?}")]
    UnsafeFileName {
        /// Declared file name.
        name: String,
    },

    /// Reading, seeking, creating or copying a file failed.
    #[error("I/O error on {name}: {source}")]
    StreamIo {
        /// Declared file name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The secure random source could not be read.
    #[error("secure random source unavailable: {0}")]
    EntropyUnavailable(String),

    /// The form did not contain any file parts.
    #[error("no files in upload")]
    NoFiles,
}

impl UploadError {
    /// Wrap an I/O error for the named file.
    pub(crate) fn stream_io(name: &str) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::StreamIo {
            name: name.to_string(),
            source,
        }
    }
}
