//! User actions routed through the coordinator

use bytes::Bytes;
use lunarchat_core::report::AnalysisMode;

/// A locally selected image as handed over by the UI layer
#[derive(Debug, Clone)]
pub struct LocalImage {
    pub filename: String,
    pub bytes: Bytes,
}

impl LocalImage {
    pub fn new(filename: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// Everything the user can do to a session's upload/analysis lifecycle
#[derive(Debug, Clone)]
pub enum UserAction {
    /// Select a local image for the session
    Stage(LocalImage),
    /// Send the staged image to the server
    Upload,
    /// Abandon a staged or in-flight upload
    Cancel,
    /// Request analysis of the uploaded image
    Analyze(AnalysisMode),
}

impl UserAction {
    /// Action name used in gate errors and log lines
    pub fn name(&self) -> &'static str {
        match self {
            UserAction::Stage(_) => "stage",
            UserAction::Upload => "upload",
            UserAction::Cancel => "cancel",
            UserAction::Analyze(_) => "analyze",
        }
    }
}
