//! Configuration module for filegate.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

use crate::upload::{UploadPolicy, DEFAULT_SPOOL_THRESHOLD};
use crate::{FilegateError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Parse the bind address.
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| FilegateError::Config(format!("invalid server address: {e}")))
    }
}

/// Upload configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded files are written to.
    #[serde(default = "default_target_dir")]
    pub target_dir: String,
    /// Per-file size limit in bytes (unset = 1 GiB).
    #[serde(default)]
    pub max_file_size: Option<u64>,
    /// Whole-request size limit in bytes (unset = per-file limit).
    #[serde(default)]
    pub max_request_size: Option<u64>,
    /// Allowed content types (empty = any).
    #[serde(default)]
    pub allowed_content_types: Vec<String>,
    /// Store files under generated names.
    #[serde(default = "default_rename")]
    pub rename: bool,
    /// Remove already-written files when a batch fails.
    #[serde(default)]
    pub rollback_on_failure: bool,
    /// Bytes per part kept in memory before spilling to disk.
    #[serde(default = "default_spool_threshold")]
    pub spool_threshold_bytes: usize,
}

fn default_target_dir() -> String {
    "data/uploads".to_string()
}

fn default_rename() -> bool {
    true
}

fn default_spool_threshold() -> usize {
    DEFAULT_SPOOL_THRESHOLD
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            target_dir: default_target_dir(),
            max_file_size: None,
            max_request_size: None,
            allowed_content_types: vec![],
            rename: default_rename(),
            rollback_on_failure: false,
            spool_threshold_bytes: default_spool_threshold(),
        }
    }
}

impl From<&UploadConfig> for UploadPolicy {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            max_request_size: config.max_request_size,
            allowed_content_types: config.allowed_content_types.clone(),
            rename: config.rename,
            rollback_on_failure: config.rollback_on_failure,
            spool_threshold: config.spool_threshold_bytes,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file; console only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upload configuration.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FilegateError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| FilegateError::Validation(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEGATE_UPLOAD_DIR`: Override the upload target directory
    /// - `FILEGATE_MAX_FILE_SIZE`: Override the per-file limit in bytes
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("FILEGATE_UPLOAD_DIR") {
            if !dir.is_empty() {
                self.upload.target_dir = dir;
            }
        }

        if let Ok(size) = std::env::var("FILEGATE_MAX_FILE_SIZE") {
            match size.trim().parse::<u64>() {
                Ok(bytes) => self.upload.max_file_size = Some(bytes),
                Err(e) => {
                    tracing::warn!(value = %size, error = %e, "Ignoring FILEGATE_MAX_FILE_SIZE");
                }
            }
        }
    }

    /// Build the upload policy described by this configuration.
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::from(&self.upload)
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The server address does not parse
    /// - The upload target directory is empty
    /// - An allowed content type is not of the form `type/subtype`
    pub fn validate(&self) -> Result<()> {
        self.server.addr()?;

        if self.upload.target_dir.trim().is_empty() {
            return Err(FilegateError::Validation(
                "upload.target_dir must not be empty".to_string(),
            ));
        }

        for content_type in &self.upload.allowed_content_types {
            let valid = content_type
                .split(';')
                .next()
                .and_then(|media_type| media_type.trim().split_once('/'))
                .is_some_and(|(ty, sub)| !ty.is_empty() && !sub.is_empty());
            if !valid {
                return Err(FilegateError::Validation(format!(
                    "invalid content type in upload.allowed_content_types: {content_type:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);

        assert_eq!(config.upload.target_dir, "data/uploads");
        assert_eq!(config.upload.max_file_size, None);
        assert_eq!(config.upload.max_request_size, None);
        assert!(config.upload.allowed_content_types.is_empty());
        assert!(config.upload.rename);
        assert!(!config.upload.rollback_on_failure);
        assert_eq!(config.upload.spool_threshold_bytes, 32 * 1024 * 1024);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 3000

[upload]
target_dir = "custom/uploads"
max_file_size = 1048576
max_request_size = 4194304
allowed_content_types = ["image/png", "image/jpeg"]
rename = false
rollback_on_failure = true
spool_threshold_bytes = 65536

[logging]
level = "debug"
file = "custom/logs/app.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);

        assert_eq!(config.upload.target_dir, "custom/uploads");
        assert_eq!(config.upload.max_file_size, Some(1048576));
        assert_eq!(config.upload.max_request_size, Some(4194304));
        assert_eq!(
            config.upload.allowed_content_types,
            vec!["image/png".to_string(), "image/jpeg".to_string()]
        );
        assert!(!config.upload.rename);
        assert!(config.upload.rollback_on_failure);
        assert_eq!(config.upload.spool_threshold_bytes, 65536);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file.as_deref(), Some("custom/logs/app.log"));
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[upload]
max_file_size = 0
"#;

        let config = Config::parse(toml).unwrap();

        // Zero is kept as an explicit limit
        assert_eq!(config.upload.max_file_size, Some(0));

        // Default values
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.upload.target_dir, "data/uploads");
        assert!(config.upload.rename);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.upload.target_dir, "data/uploads");
    }

    #[test]
    fn test_parse_invalid_config() {
        let toml = "this is not valid toml [[[";
        let result = Config::parse(toml);

        assert!(result.is_err());
        if let Err(FilegateError::Validation(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Validation error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");

        assert!(matches!(result, Err(FilegateError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("filegate.toml");
        std::fs::write(&path, "[server]\nport = 9999\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.port, 9999);
    }

    #[test]
    fn test_apply_env_overrides() {
        // Save original values if they exist
        let original_dir = std::env::var("FILEGATE_UPLOAD_DIR").ok();
        let original_size = std::env::var("FILEGATE_MAX_FILE_SIZE").ok();

        std::env::set_var("FILEGATE_UPLOAD_DIR", "/srv/uploads");
        std::env::set_var("FILEGATE_MAX_FILE_SIZE", "2048");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.upload.target_dir, "/srv/uploads");
        assert_eq!(config.upload.max_file_size, Some(2048));

        // Empty and malformed values are ignored
        std::env::set_var("FILEGATE_UPLOAD_DIR", "");
        std::env::set_var("FILEGATE_MAX_FILE_SIZE", "lots");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.upload.target_dir, "data/uploads");
        assert_eq!(config.upload.max_file_size, None);

        // Restore originals
        match original_dir {
            Some(val) => std::env::set_var("FILEGATE_UPLOAD_DIR", val),
            None => std::env::remove_var("FILEGATE_UPLOAD_DIR"),
        }
        match original_size {
            Some(val) => std::env::set_var("FILEGATE_MAX_FILE_SIZE", val),
            None => std::env::remove_var("FILEGATE_MAX_FILE_SIZE"),
        }
    }

    #[test]
    fn test_upload_policy_from_config() {
        let mut config = Config::default();
        config.upload.max_file_size = Some(500);
        config.upload.allowed_content_types = vec!["image/png".to_string()];
        config.upload.rename = false;

        let policy = config.upload_policy();

        assert_eq!(policy.file_limit(), 500);
        assert_eq!(policy.request_limit(), 500);
        assert!(policy.permits("image/png"));
        assert!(!policy.permits("image/gif"));
        assert!(!policy.rename);
    }

    #[test]
    fn test_validate_default() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_content_type() {
        let mut config = Config::default();
        config.upload.allowed_content_types = vec!["png".to_string()];

        let result = config.validate();
        if let Err(FilegateError::Validation(msg)) = result {
            assert!(msg.contains("png"));
        } else {
            panic!("Expected Validation error");
        }
    }

    #[test]
    fn test_validate_content_type_with_parameters() {
        let mut config = Config::default();
        config.upload.allowed_content_types = vec!["text/plain; charset=utf-8".to_string()];

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_address() {
        let mut config = Config::default();
        config.server.host = "not an address".to_string();

        assert!(matches!(config.validate(), Err(FilegateError::Config(_))));
    }

    #[test]
    fn test_validate_empty_target_dir() {
        let mut config = Config::default();
        config.upload.target_dir = "  ".to_string();

        assert!(matches!(
            config.validate(),
            Err(FilegateError::Validation(_))
        ));
    }
}
