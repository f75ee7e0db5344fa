//! Message data structures and the append-only message log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::AnalysisReport;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human on the other side of the chat
    User,
    /// The analysis service
    Bot,
    /// Status lines produced by the coordinator itself
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
            Role::System => "system",
        }
    }
}

/// An image reference carried inside a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// URL the image can be displayed from
    pub url: String,
    /// Server-issued handle, present once the upload was confirmed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

/// Message payload, tagged so renderers can match exhaustively
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text
    Text(String),
    /// An uploaded or staged image
    Image(ImageAttachment),
    /// A structured analysis result, displayed as a key/value block
    Report(AnalysisReport),
}

impl MessageContent {
    /// Create a text payload
    pub fn text(text: impl Into<String>) -> Self {
        MessageContent::Text(text.into())
    }
}

/// A single chat message, immutable once appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Monotonically increasing id within one session, never reused
    pub id: u64,
    /// Message author
    pub role: Role,
    /// Message payload
    pub content: MessageContent,
    /// Append time
    pub created_at: DateTime<Utc>,
}

/// Append-only ordered record of one session's conversation.
///
/// There is deliberately no deletion operation; history is permanent for
/// the lifetime of the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageLog {
    messages: Vec<Message>,
    next_id: u64,
}

impl MessageLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, assigning the next monotonic id.
    ///
    /// Never fails; deciding whether a message belongs in the log is the
    /// caller's job.
    pub fn append(&mut self, role: Role, content: MessageContent) -> &Message {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            role,
            content,
            created_at: Utc::now(),
        });
        // push above guarantees the vec is non-empty
        self.messages.last().unwrap()
    }

    /// Ordered view of the log for rendering; callers must not mutate it
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the log
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Last message, if any
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_assigns_monotonic_ids() {
        let mut log = MessageLog::new();
        let a = log.append(Role::User, MessageContent::text("Hello")).id;
        let b = log.append(Role::Bot, MessageContent::text("Hi there!")).id;
        let c = log.append(Role::System, MessageContent::text("note")).id;

        assert!(a < b && b < c);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_snapshot_preserves_append_order() {
        let mut log = MessageLog::new();
        for i in 0..10 {
            log.append(Role::User, MessageContent::text(format!("Message {}", i)));
        }

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 10);
        for (i, msg) in snapshot.iter().enumerate() {
            assert_eq!(msg.content, MessageContent::text(format!("Message {}", i)));
        }
    }

    #[test]
    fn test_earlier_snapshot_is_prefix_of_later() {
        let mut log = MessageLog::new();
        log.append(Role::System, MessageContent::text("first"));
        let before: Vec<Message> = log.snapshot().to_vec();

        log.append(Role::User, MessageContent::text("second"));
        let after = log.snapshot();

        assert_eq!(&after[..before.len()], &before[..]);
    }

    #[test]
    fn test_content_roundtrip() {
        let content = MessageContent::Image(ImageAttachment {
            url: "https://example.com/img/42.png".to_string(),
            handle: Some("img-42".to_string()),
        });

        let json = serde_json::to_string(&content).unwrap();
        let back: MessageContent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, content);
    }
}
