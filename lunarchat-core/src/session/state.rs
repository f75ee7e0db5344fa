//! Upload and analysis state machines
//!
//! Each session carries exactly one [`UploadState`] and one
//! [`AnalysisState`] value. All guards live on the state machines
//! themselves; the coordinator only sequences transitions, so invalid
//! combinations such as "loading while already uploaded" are not
//! representable.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::report::{AnalysisMode, AnalysisReport};
use crate::{Error, Result};

/// Opaque server-issued identifier for an uploaded image, required to
/// request analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageHandle(String);

impl ImageHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A locally selected image not yet confirmed by the server.
///
/// Holds the temporary preview resource; dropping the value releases it.
/// The state machine owns the staged image by value, so every exit path
/// (success, failure, cancel) releases the preview without extra
/// bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedImage {
    /// Original file name, sent with the upload
    pub filename: String,
    /// Raw image data
    pub bytes: Bytes,
    /// Local preview reference for immediate display
    pub preview_url: String,
}

impl StagedImage {
    pub fn new(filename: impl Into<String>, bytes: Bytes) -> Self {
        let filename = filename.into();
        let preview_url = format!("preview://{}", uuid::Uuid::new_v4());
        Self {
            filename,
            bytes,
            preview_url,
        }
    }
}

/// Lifecycle of turning a locally selected image into a server handle
#[derive(Debug, Clone, Default, PartialEq)]
pub enum UploadState {
    /// Nothing staged
    #[default]
    Idle,
    /// A local image is selected and previewable, not yet sent
    Staged(StagedImage),
    /// The upload call is in flight
    Uploading(StagedImage),
    /// The server confirmed the image; analysis may be requested
    Uploaded(ImageHandle),
    /// The upload failed; the staged image is retained so the user can
    /// retry without reselecting the file
    Failed {
        reason: String,
        retained: Option<StagedImage>,
    },
}

impl UploadState {
    /// Stage a new local image. Allowed from `Idle` or `Failed`.
    pub fn stage(&mut self, image: StagedImage) -> Result<()> {
        match self {
            UploadState::Idle | UploadState::Failed { .. } => {
                *self = UploadState::Staged(image);
                Ok(())
            }
            other => Err(Error::InvalidTransition(format!(
                "cannot stage an image while {}",
                other.label()
            ))),
        }
    }

    /// Move to `Uploading` and hand back the image to send.
    ///
    /// Returns `Ok(None)` when an upload is already in flight: a rapid
    /// repeated trigger must not issue a second upload. A failed upload
    /// that retained its image re-enters the flow here.
    pub fn begin(&mut self) -> Result<Option<StagedImage>> {
        match std::mem::take(self) {
            UploadState::Staged(image)
            | UploadState::Failed {
                retained: Some(image),
                ..
            } => {
                let outbound = image.clone();
                *self = UploadState::Uploading(image);
                Ok(Some(outbound))
            }
            UploadState::Uploading(image) => {
                *self = UploadState::Uploading(image);
                Ok(None)
            }
            other => {
                let label = other.label();
                *self = other;
                Err(Error::InvalidTransition(format!(
                    "cannot upload while {}",
                    label
                )))
            }
        }
    }

    /// The server confirmed the upload; the local preview is released.
    pub fn complete(&mut self, handle: ImageHandle) {
        *self = UploadState::Uploaded(handle);
    }

    /// The upload failed; keep the staged image for retry.
    pub fn fail(&mut self, reason: impl Into<String>) {
        let retained = match std::mem::take(self) {
            UploadState::Staged(image) | UploadState::Uploading(image) => Some(image),
            UploadState::Failed { retained, .. } => retained,
            _ => None,
        };
        *self = UploadState::Failed {
            reason: reason.into(),
            retained,
        };
    }

    /// Abandon a staged or in-flight upload. The in-flight network call,
    /// if any, is allowed to complete but its result will be ignored.
    pub fn cancel(&mut self) -> Result<()> {
        match self {
            UploadState::Staged(_) | UploadState::Uploading(_) => {
                *self = UploadState::Idle;
                Ok(())
            }
            other => Err(Error::InvalidTransition(format!(
                "nothing to cancel while {}",
                other.label()
            ))),
        }
    }

    /// A successful analysis consumed the uploaded image.
    pub fn consume(&mut self) {
        *self = UploadState::Idle;
    }

    /// Server handle, if the upload has been confirmed
    pub fn handle(&self) -> Option<&ImageHandle> {
        match self {
            UploadState::Uploaded(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self, UploadState::Uploading(_))
    }

    /// Short name for log lines and transition errors
    pub fn label(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::Staged(_) => "staged",
            UploadState::Uploading(_) => "uploading",
            UploadState::Uploaded(_) => "uploaded",
            UploadState::Failed { .. } => "failed",
        }
    }
}

/// Lifecycle of one analysis request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AnalysisState {
    /// No request made yet
    #[default]
    Idle,
    /// The analysis call is in flight; the loading indicator is derived
    /// from this state, not from a message
    Requesting {
        mode: AnalysisMode,
        handle: ImageHandle,
    },
    /// The last request produced a result
    Succeeded(AnalysisReport),
    /// The last request failed; the uploaded handle is not consumed, so
    /// analysis can be retried without re-uploading
    Failed(String),
}

impl AnalysisState {
    /// Whether the previous request, if any, has settled
    pub fn is_settled(&self) -> bool {
        !matches!(self, AnalysisState::Requesting { .. })
    }

    pub fn is_requesting(&self) -> bool {
        !self.is_settled()
    }

    /// Move to `Requesting`. Allowed whenever the prior request settled.
    pub fn begin(&mut self, mode: AnalysisMode, handle: ImageHandle) -> Result<()> {
        if self.is_requesting() {
            return Err(Error::InvalidTransition(
                "an analysis request is already in flight".to_string(),
            ));
        }
        *self = AnalysisState::Requesting { mode, handle };
        Ok(())
    }

    pub fn succeed(&mut self, report: AnalysisReport) {
        *self = AnalysisState::Succeeded(report);
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        *self = AnalysisState::Failed(reason.into());
    }

    /// Short name for log lines and transition errors
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisState::Idle => "idle",
            AnalysisState::Requesting { .. } => "requesting",
            AnalysisState::Succeeded(_) => "succeeded",
            AnalysisState::Failed(_) => "failed",
        }
    }
}
