//! Upload policy: size limits, allowed types and naming.

use super::{DEFAULT_MAX_FILE_SIZE, DEFAULT_SPOOL_THRESHOLD};

/// Rules applied to every file in an upload batch.
///
/// Limits are optional: `None` means "use the default", while `Some(0)` is a
/// real zero-byte cap.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Per-file size limit in bytes (default 1 GiB).
    pub max_file_size: Option<u64>,
    /// Whole-request limit applied while parsing the form (default: the
    /// effective per-file limit).
    pub max_request_size: Option<u64>,
    /// Allowed content types, compared case-insensitively. Empty allows all.
    pub allowed_content_types: Vec<String>,
    /// Replace the client's file name with a generated one.
    pub rename: bool,
    /// Remove files already written in a batch when a later file fails.
    pub rollback_on_failure: bool,
    /// Bytes of each part held in memory before spilling to a temp file.
    pub spool_threshold: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: None,
            max_request_size: None,
            allowed_content_types: Vec::new(),
            rename: true,
            rollback_on_failure: false,
            spool_threshold: DEFAULT_SPOOL_THRESHOLD,
        }
    }
}

impl UploadPolicy {
    /// Create a policy with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-file size limit.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Set the whole-request size limit.
    pub fn with_max_request_size(mut self, bytes: u64) -> Self {
        self.max_request_size = Some(bytes);
        self
    }

    /// Add an allowed content type.
    pub fn allow(mut self, content_type: impl Into<String>) -> Self {
        self.allowed_content_types.push(content_type.into());
        self
    }

    /// Replace the allowed content types.
    pub fn with_allowed_content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_content_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set whether uploaded files get generated names.
    pub fn with_rename(mut self, rename: bool) -> Self {
        self.rename = rename;
        self
    }

    /// Set whether a failed batch removes the files it already wrote.
    pub fn with_rollback_on_failure(mut self, rollback: bool) -> Self {
        self.rollback_on_failure = rollback;
        self
    }

    /// Set the in-memory spool threshold.
    pub fn with_spool_threshold(mut self, bytes: usize) -> Self {
        self.spool_threshold = bytes;
        self
    }

    /// Effective per-file limit.
    pub fn file_limit(&self) -> u64 {
        self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE)
    }

    /// Effective whole-request limit.
    pub fn request_limit(&self) -> u64 {
        self.max_request_size.unwrap_or_else(|| self.file_limit())
    }

    /// Check a sniffed content type against the allow-list.
    ///
    /// Entries must equal the sniffed type exactly, ignoring case, so text
    /// uploads need `text/plain; charset=utf-8` rather than `text/plain`.
    pub fn permits(&self, detected_type: &str) -> bool {
        self.allowed_content_types.is_empty()
            || self
                .allowed_content_types
                .iter()
                .any(|allowed| allowed.trim().eq_ignore_ascii_case(detected_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = UploadPolicy::default();

        assert_eq!(policy.file_limit(), 1024 * 1024 * 1024);
        assert_eq!(policy.request_limit(), 1024 * 1024 * 1024);
        assert!(policy.allowed_content_types.is_empty());
        assert!(policy.rename);
        assert!(!policy.rollback_on_failure);
        assert_eq!(policy.spool_threshold, 32 * 1024 * 1024);
    }

    #[test]
    fn test_zero_is_a_real_limit() {
        let policy = UploadPolicy::new().with_max_file_size(0);

        assert_eq!(policy.file_limit(), 0);
        assert_eq!(policy.request_limit(), 0);
    }

    #[test]
    fn test_request_limit_follows_file_limit() {
        let policy = UploadPolicy::new().with_max_file_size(100);
        assert_eq!(policy.request_limit(), 100);

        let policy = policy.with_max_request_size(1000);
        assert_eq!(policy.file_limit(), 100);
        assert_eq!(policy.request_limit(), 1000);
    }

    #[test]
    fn test_empty_allow_list_permits_everything() {
        let policy = UploadPolicy::new();
        assert!(policy.permits("image/png"));
        assert!(policy.permits("application/octet-stream"));
    }

    #[test]
    fn test_permits_case_insensitive() {
        let policy = UploadPolicy::new().allow("IMAGE/PNG").allow("image/jpeg");

        assert!(policy.permits("image/png"));
        assert!(policy.permits("image/jpeg"));
        assert!(!policy.permits("image/gif"));
    }

    #[test]
    fn test_permits_requires_full_type() {
        let policy = UploadPolicy::new().allow("text/plain");
        assert!(!policy.permits("text/plain; charset=utf-8"));

        let policy = UploadPolicy::new().allow("text/plain; charset=utf-8");
        assert!(policy.permits("text/plain; charset=utf-8"));
        assert!(!policy.permits("text/plain; charset=utf-16le"));

        let policy = UploadPolicy::new().allow("Text/Plain; Charset=UTF-8");
        assert!(policy.permits("text/plain; charset=utf-8"));
    }

    #[test]
    fn test_with_allowed_content_types_replaces() {
        let policy = UploadPolicy::new()
            .allow("image/gif")
            .with_allowed_content_types(["image/png", "application/pdf"]);

        assert_eq!(policy.allowed_content_types.len(), 2);
        assert!(!policy.permits("image/gif"));
        assert!(policy.permits("application/pdf"));
    }
}
