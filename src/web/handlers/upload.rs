//! Upload handlers for Web API.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::upload::{UploadPolicy, UploadProcessor};
use crate::web::dto::{ApiResponse, UploadResponse};
use crate::web::error::ApiError;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Upload processor with the configured policy.
    pub processor: UploadProcessor,
    /// Directory uploads are stored in.
    pub target_dir: PathBuf,
}

impl AppState {
    /// Create a new application state.
    pub fn new(policy: UploadPolicy, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            processor: UploadProcessor::new(policy),
            target_dir: target_dir.into(),
        }
    }

    /// Get the upload directory.
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }
}

/// POST /upload - Upload one or more files.
///
/// Request body: multipart/form-data; every part with a file name is stored.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let files = state
        .processor
        .process(multipart, state.target_dir())
        .await?;

    tracing::info!(count = files.len(), "Upload batch stored");

    Ok(Json(ApiResponse::new(UploadResponse { files })))
}
