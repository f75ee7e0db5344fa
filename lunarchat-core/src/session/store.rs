//! Session collection and active-session selection

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::state::{AnalysisState, UploadState};
use crate::message::{MessageContent, MessageLog, Role};
use crate::{Error, Result};

/// Title given to every fresh session until the first user text arrives
pub const DEFAULT_TITLE: &str = "New Analysis";

/// Derived titles are cut to this many characters
const TITLE_MAX_LEN: usize = 40;

/// First message of every new session
const WELCOME: &str = "Select an analysis mode, then click 'Upload' and 'Send' to begin.";

/// One independent conversation thread with its own message log and
/// upload/analysis state.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque unique id
    pub id: Uuid,
    /// Derived or default title
    pub title: String,
    /// Conversation history
    pub log: MessageLog,
    /// Upload lifecycle
    pub upload: UploadState,
    /// Analysis lifecycle
    pub analysis: AnalysisState,
    /// Bumped on every upload begin/cancel so stale completions of an
    /// abandoned call are ignored
    pub upload_epoch: u64,
    /// Same, for analysis requests
    pub analysis_epoch: u64,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn new() -> Self {
        let mut log = MessageLog::new();
        log.append(Role::System, MessageContent::text(WELCOME));
        Self {
            id: Uuid::new_v4(),
            title: DEFAULT_TITLE.to_string(),
            log,
            upload: UploadState::Idle,
            analysis: AnalysisState::Idle,
            upload_epoch: 0,
            analysis_epoch: 0,
            created_at: Utc::now(),
        }
    }

    /// Set the title from the first user-authored text; later calls do
    /// nothing, so the session keeps the name of its opening message.
    pub fn derive_title(&mut self, text: &str) {
        if self.title != DEFAULT_TITLE {
            return;
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        self.title = trimmed.chars().take(TITLE_MAX_LEN).collect();
    }

    /// URLs of every image that entered this conversation, in order
    pub fn image_urls(&self) -> Vec<&str> {
        self.log
            .snapshot()
            .iter()
            .filter_map(|msg| match &msg.content {
                MessageContent::Image(attachment) => Some(attachment.url.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Owns the session collection and the active-session selection.
///
/// Sessions are kept in creation order; the store is the only place the
/// collection itself is mutated.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Vec<Session>,
    active: Option<Uuid>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh session, make it active, and return its id
    pub fn create_session(&mut self) -> Uuid {
        let session = Session::new();
        let id = session.id;
        self.sessions.push(session);
        self.active = Some(id);
        tracing::debug!(session = %id, "created session");
        id
    }

    /// Remove a session. If it was active, the most-recently-created
    /// remaining session becomes active, or none.
    pub fn delete_session(&mut self, id: Uuid) -> Result<()> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or(Error::SessionNotFound(id))?;
        self.sessions.remove(index);

        if self.active == Some(id) {
            self.active = self.sessions.last().map(|s| s.id);
        }
        tracing::debug!(session = %id, "deleted session");
        Ok(())
    }

    /// Make an existing session the active one
    pub fn select_session(&mut self, id: Uuid) -> Result<()> {
        if !self.sessions.iter().any(|s| s.id == id) {
            return Err(Error::SessionNotFound(id));
        }
        self.active = Some(id);
        Ok(())
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.active
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: Uuid) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Like [`get_mut`](Self::get_mut) but with a store-level error
    pub fn require_mut(&mut self, id: Uuid) -> Result<&mut Session> {
        self.get_mut(id).ok_or(Error::SessionNotFound(id))
    }

    /// All sessions in creation order
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_makes_session_active() {
        let mut store = SessionStore::new();
        let id = store.create_session();

        assert_eq!(store.active_id(), Some(id));
        let session = store.get(id).unwrap();
        assert_eq!(session.title, DEFAULT_TITLE);
        // fresh sessions open with the welcome line
        assert_eq!(session.log.len(), 1);
        assert_eq!(session.log.snapshot()[0].role, Role::System);
    }

    #[test]
    fn test_delete_falls_back_to_most_recent() {
        let mut store = SessionStore::new();
        let a = store.create_session();
        let b = store.create_session();
        let c = store.create_session();

        store.select_session(c).unwrap();
        store.delete_session(c).unwrap();
        // b was created after a, so it wins
        assert_eq!(store.active_id(), Some(b));

        store.delete_session(b).unwrap();
        store.delete_session(a).unwrap();
        assert_eq!(store.active_id(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_inactive_keeps_selection() {
        let mut store = SessionStore::new();
        let a = store.create_session();
        let b = store.create_session();

        store.select_session(a).unwrap();
        store.delete_session(b).unwrap();
        assert_eq!(store.active_id(), Some(a));
    }

    #[test]
    fn test_select_unknown_session_fails() {
        let mut store = SessionStore::new();
        store.create_session();
        assert!(matches!(
            store.select_session(Uuid::new_v4()),
            Err(Error::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_title_derivation_happens_once() {
        let mut store = SessionStore::new();
        let id = store.create_session();
        let session = store.get_mut(id).unwrap();

        session.derive_title("What minerals are in this sample from the northern ridge site?");
        assert_eq!(session.title.chars().count(), 40);

        let first = session.title.clone();
        session.derive_title("a different message");
        assert_eq!(session.title, first);
    }

    #[test]
    fn test_blank_text_does_not_rename() {
        let mut store = SessionStore::new();
        let id = store.create_session();
        let session = store.get_mut(id).unwrap();

        session.derive_title("   ");
        assert_eq!(session.title, DEFAULT_TITLE);
    }
}
