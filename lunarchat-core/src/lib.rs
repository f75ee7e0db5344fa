//! Core types and session state machines for lunarchat
//!
//! This crate provides the foundational types used by all other
//! lunarchat components: the message log, the per-session upload and
//! analysis state machines, the session store, and the ambient
//! error/config/logging plumbing.

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod report;
pub mod session;

pub use error::{Error, Result};
