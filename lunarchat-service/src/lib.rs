//! Session and request-lifecycle coordinator for lunarchat
//!
//! [`ChatService`] is the façade the UI drives: it owns the session
//! store, gates every mutating action on the authentication snapshot,
//! enforces the per-session upload/analysis state machines, and
//! reconciles remote completions into the originating session even when
//! they arrive out of order or after the user switched sessions.

pub mod action;
pub mod service;

pub use action::{LocalImage, UserAction};
pub use service::ChatService;
