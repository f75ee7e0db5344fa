//! Session state machines and the session store

pub mod state;
pub mod store;

pub use state::{AnalysisState, ImageHandle, StagedImage, UploadState};
pub use store::{Session, SessionStore, DEFAULT_TITLE};
