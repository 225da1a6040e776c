//! UI-agnostic transcript state
//!
//! This module contains the chat transcript data structures and the entry
//! lifecycle. It doesn't depend on any UI framework or on the HTTP layer, so
//! the message lifecycle can be tested without a display surface.

use serde::{Deserialize, Serialize};

/// Bot reply shown when the backend reported an error payload.
pub const SERVER_ERROR_TEXT: &str = "Sorry, I encountered an error. Please try again.";

/// Bot reply shown when the backend answered with neither a response nor an error.
pub const NO_RESPONSE_TEXT: &str = "No response received.";

/// Bot reply shown when the request itself failed (network, bad status, bad JSON).
pub const TRANSPORT_FAILURE_TEXT: &str =
    "Sorry, I couldn't process your request. Please try again later.";

/// Who a transcript entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryRole {
    User,
    Bot,
}

/// Lifecycle state of a transcript entry
///
/// A `Pending` entry is the thinking placeholder shown while a request is in
/// flight. It resolves exactly once, to `Final` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Final,
    Pending,
    Error,
}

/// A single message in the chat transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: EntryRole,
    pub status: EntryStatus,
    pub text: String,
}

impl TranscriptEntry {
    pub fn user(text: &str) -> Self {
        Self {
            role: EntryRole::User,
            status: EntryStatus::Final,
            text: text.to_string(),
        }
    }

    pub fn pending() -> Self {
        Self {
            role: EntryRole::Bot,
            status: EntryStatus::Pending,
            text: String::new(),
        }
    }

    pub fn bot(text: &str) -> Self {
        Self {
            role: EntryRole::Bot,
            status: EntryStatus::Final,
            text: text.to_string(),
        }
    }

    pub fn error(text: &str) -> Self {
        Self {
            role: EntryRole::Bot,
            status: EntryStatus::Error,
            text: text.to_string(),
        }
    }
}

/// A well-formed backend response, classified by which field it carried
#[derive(Debug, Clone)]
pub enum BotReply {
    /// The `response` field was present
    Text(String),
    /// The `error` field was present; the value is kept for diagnostics only
    ServerError(serde_json::Value),
    /// Neither field was present
    Empty,
}

/// Ordered chat transcript, append-only except for resolving a pending entry
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.status == EntryStatus::Pending)
    }

    /// Append a user message
    pub fn push_user(&mut self, text: &str) {
        self.entries.push(TranscriptEntry::user(text));
    }

    /// Append the thinking placeholder for an in-flight request
    pub fn push_pending(&mut self) {
        self.entries.push(TranscriptEntry::pending());
    }

    /// Resolve the pending entry with a well-formed backend response
    pub fn settle(&mut self, reply: BotReply) {
        self.remove_pending();
        let entry = match reply {
            BotReply::Text(text) => TranscriptEntry::bot(&text),
            BotReply::ServerError(_) => TranscriptEntry::error(SERVER_ERROR_TEXT),
            BotReply::Empty => TranscriptEntry::bot(NO_RESPONSE_TEXT),
        };
        self.entries.push(entry);
    }

    /// Resolve the pending entry after a transport failure
    pub fn settle_failed(&mut self) {
        // The pending entry may already be gone; removal is best-effort
        self.remove_pending();
        self.entries.push(TranscriptEntry::error(TRANSPORT_FAILURE_TEXT));
    }

    fn remove_pending(&mut self) {
        if let Some(idx) = self
            .entries
            .iter()
            .rposition(|e| e.status == EntryStatus::Pending)
        {
            self.entries.remove(idx);
        }
    }
}
