//! Persistence boundary.
//!
//! The pipeline hands each finished [`CanonicalChat`] to a [`ChatSink`] and
//! keeps no reference afterwards. The real sink lives in the application's
//! storage layer; [`MemorySink`] ships here for tests and embedding.

use parking_lot::Mutex;

use crate::chat::CanonicalChat;

/// Identifier of a stored chat record, assigned by the sink.
pub type RecordId = String;

/// A failure reported by the persistence collaborator.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct SinkError(pub String);

/// Receives canonical chats for storage.
pub trait ChatSink: Send + Sync {
    /// Stores one chat and returns its record identifier.
    fn store(&self, chat: &CanonicalChat) -> Result<RecordId, SinkError>;
}

/// In-memory sink: appends chats to a vector and hands out positional ids.
#[derive(Default)]
pub struct MemorySink {
    chats: Mutex<Vec<CanonicalChat>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of chats stored so far.
    pub fn len(&self) -> usize {
        self.chats.lock().len()
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.chats.lock().is_empty()
    }

    /// Returns a snapshot of everything stored, in storage order.
    pub fn stored(&self) -> Vec<CanonicalChat> {
        self.chats.lock().clone()
    }
}

impl ChatSink for MemorySink {
    fn store(&self, chat: &CanonicalChat) -> Result<RecordId, SinkError> {
        let mut chats = self.chats.lock();
        chats.push(chat.clone());
        Ok(format!("chat-{}", chats.len()))
    }
}

/// Sink that refuses every store. Test double for persistence outages.
pub struct FailingSink;

impl ChatSink for FailingSink {
    fn store(&self, _chat: &CanonicalChat) -> Result<RecordId, SinkError> {
        Err(SinkError("storage unavailable".to_string()))
    }
}
