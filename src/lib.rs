//! filegate - multipart file upload gateway
//!
//! Validates uploaded files against a size limit and a content type
//! allow-list, names them safely and stores them in a local directory.

pub mod config;
pub mod error;
pub mod logging;
pub mod upload;
pub mod web;

pub use config::Config;
pub use error::{FilegateError, Result};
pub use upload::{
    detect_content_type, ensure_dir, generate_token, FilePart, UploadError, UploadPolicy,
    UploadProcessor, UploadedFile,
};
pub use web::WebServer;
