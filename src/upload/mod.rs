//! Upload pipeline for filegate.
//!
//! This module turns a multipart form into stored files:
//! - Form parsing with a whole-request size cap
//! - Per-file size and content type validation
//! - Random or verbatim naming
//! - Writes into a target directory created on demand

mod error;
mod form;
mod naming;
mod policy;
mod processor;
mod sniff;
mod storage;

pub use error::UploadError;
pub use form::{parse_form, FilePart, ParsedForm};
pub use naming::{
    client_base_name, generate_token, generated_file_name, GENERATED_NAME_LENGTH, TOKEN_ALPHABET,
};
pub use policy::UploadPolicy;
pub use processor::{UploadProcessor, UploadedFile};
pub use sniff::{detect_content_type, OCTET_STREAM, PLAIN_TEXT, SNIFF_LEN};
pub use storage::{ensure_dir, UploadDir, DIR_MODE};

/// Default per-file size limit (1 GiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Default in-memory spool size per part (32 MiB).
pub const DEFAULT_SPOOL_THRESHOLD: usize = 32 * 1024 * 1024;
