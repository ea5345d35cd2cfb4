//! Chat roles and immutable chat entries.
//!
//! A [`ChatEntry`] is the unit of conversation: one role-tagged line of
//! text, optionally attributed to a named speaker, stamped with the time
//! it was created. Entries are values -- once appended to the shared log
//! or merged into a participant's memory they are never mutated. Ordering
//! is the sole identity of a log entry; the timestamp is informational.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The conversational role of a chat entry.
///
/// Matches the role vocabulary of chat-completion APIs so a memory window
/// can be handed to an LLM backend without translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Framing and room notices (join announcements, instructions).
    System,
    /// Lines spoken into the room, including other participants' published
    /// replies as seen by a reader.
    User,
    /// A participant's own generated reply, before publication.
    Assistant,
}

impl Role {
    /// The lowercase wire name of this role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable line of conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    /// Who is speaking, in chat-completion terms.
    pub role: Role,
    /// The text of the line.
    pub content: String,
    /// Optional display name of the speaker (distinct from any address).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// When the entry was created. Informational only -- position in the
    /// log, not this timestamp, defines ordering.
    pub sent_at: DateTime<Utc>,
}

impl ChatEntry {
    /// Create an entry with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            speaker: None,
            sent_at: Utc::now(),
        }
    }

    /// Create a system-role entry.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user-role entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant-role entry.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Attach a speaker name to this entry.
    #[must_use]
    pub fn spoken_by(mut self, name: impl Into<String>) -> Self {
        self.speaker = Some(name.into());
        self
    }

    /// Whether the entry carries no text. Blank content is the provider
    /// contract's "pass" signal.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap_or_default();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn entry_roundtrip_serde() {
        let entry = ChatEntry::user("hello there").spoken_by("Mira");
        let json = serde_json::to_string(&entry).ok();
        assert!(json.is_some());
        let restored: Result<ChatEntry, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(entry));
    }

    #[test]
    fn speaker_omitted_when_absent() {
        let entry = ChatEntry::system("quiet room");
        let json = serde_json::to_string(&entry).unwrap_or_default();
        assert!(!json.contains("speaker"));
    }

    #[test]
    fn blank_detection_ignores_whitespace() {
        assert!(ChatEntry::assistant("   ").is_blank());
        assert!(ChatEntry::assistant("").is_blank());
        assert!(!ChatEntry::assistant("hi").is_blank());
    }
}
