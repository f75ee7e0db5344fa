//! Base traits for remote operations

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lunarchat_core::auth::UserRole;
use lunarchat_core::report::{AnalysisMode, AnalysisReport};
use lunarchat_core::session::ImageHandle;

/// Error type for remote operations
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Server confirmation of an uploaded image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedImage {
    /// Handle to pass to subsequent analysis requests
    #[serde(rename = "id")]
    pub handle: ImageHandle,
    /// URL the image is served from
    #[serde(rename = "url")]
    pub serving_url: String,
}

/// Turns raw image data into a durable, server-addressable handle
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Upload one image; resolves with the server handle or a transport
    /// or server error
    async fn upload(&self, filename: &str, bytes: Bytes) -> RemoteResult<UploadedImage>;
}

/// Runs the remote analysis for an uploaded image
#[async_trait]
pub trait SampleAnalyzer: Send + Sync {
    /// Analyze an uploaded image in the given mode
    async fn analyze(&self, handle: &ImageHandle, mode: AnalysisMode)
        -> RemoteResult<AnalysisReport>;
}

/// Credential check at the system boundary.
///
/// `login` always resolves; a transport failure counts as a rejected
/// login rather than an error the caller must handle.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, username: &str, password: &str, role: UserRole) -> bool;
}
