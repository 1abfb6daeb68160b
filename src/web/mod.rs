//! Web API module for filegate.
//!
//! This module exposes the upload pipeline over HTTP: a multipart upload
//! route and a health check.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
