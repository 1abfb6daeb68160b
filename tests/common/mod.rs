//! Test helpers for web API tests.

use std::path::PathBuf;
use std::sync::Arc;

use axum_test::TestServer;
use tempfile::TempDir;

use filegate::upload::UploadPolicy;
use filegate::web::handlers::AppState;
use filegate::web::router::{create_health_router, create_router};

/// Smallest useful PNG header: signature plus the start of an IHDR chunk.
pub const PNG_BYTES: &[u8] = b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR\x00\x00\x00\x01\x00\x00\x00\x01";

/// JPEG SOI marker followed by a JFIF APP0 segment start.
pub const JPEG_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00\x01\x01";

/// A running test server with its upload directory.
pub struct TestApp {
    pub server: TestServer,
    pub upload_dir: PathBuf,
    // Held so the directory lives as long as the server.
    _temp_dir: TempDir,
}

impl TestApp {
    /// Path of a stored file.
    pub fn stored(&self, name: &str) -> PathBuf {
        self.upload_dir.join(name)
    }

    /// Number of entries in the upload directory (0 if it doesn't exist).
    pub fn stored_count(&self) -> usize {
        std::fs::read_dir(&self.upload_dir)
            .map(|d| d.count())
            .unwrap_or(0)
    }
}

/// Create a test server whose uploads go to a fresh, not yet created,
/// directory.
pub fn create_test_app(policy: UploadPolicy) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let upload_dir = temp_dir.path().join("uploads");

    let app_state = Arc::new(AppState::new(policy, &upload_dir));
    let router = create_router(app_state).merge(create_health_router());
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        upload_dir,
        _temp_dir: temp_dir,
    }
}
