//! Remote boundary for lunarchat
//!
//! Defines the traits the coordinator calls across the system boundary
//! (upload, analyze, login) and the reqwest client that implements them
//! against the LunarChat backend.

pub mod base;
pub mod http;

pub use base::{
    Authenticator, ImageUploader, RemoteError, RemoteResult, SampleAnalyzer, UploadedImage,
};
pub use http::LunarApiClient;
