//! Claude export parser.
//!
//! Claude data exports carry conversations with a flat `chat_messages`
//! array:
//!
//! ```json
//! {
//!   "uuid": "4be0…",
//!   "name": "Rust question",
//!   "created_at": "2024-01-15T10:30:00Z",
//!   "chat_messages": [
//!     {"sender": "human", "text": "What does ? do?", "created_at": "2024-01-15T10:30:00Z"},
//!     {"sender": "assistant", "content": [{"type": "text", "text": "It propagates errors."}]}
//!   ]
//! }
//! ```
//!
//! Older exports put the body in `text`, newer ones in typed `content`
//! blocks; both are handled. A top-level array of conversations is accepted
//! with the first record imported.

use serde::Deserialize;
use serde_json::Value;

use super::{ChatParser, as_utf8, finish, malformed};
use crate::chat::{ChatDraft, DraftMessage, Timestamp};
use crate::config::PlatformConfig;
use crate::error::Result;
use crate::message::Role;
use crate::platform::Platform;

/// Parser for Claude data exports.
pub struct ClaudeParser;

#[derive(Debug, Deserialize)]
struct ConversationRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    chat_messages: Option<Vec<ChatMessage>>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    sender: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ChatParser for ClaudeParser {
    fn name(&self) -> &'static str {
        "Claude"
    }

    fn platform(&self) -> Platform {
        Platform::Claude
    }

    fn parse(&self, bytes: &[u8], config: &PlatformConfig) -> Result<ChatDraft> {
        let content = as_utf8(bytes, Platform::Claude)?;
        let record = deserialize_record(content)?;

        let messages = record
            .chat_messages
            .ok_or_else(|| malformed(Platform::Claude, "missing 'chat_messages' array"))?;

        let mut draft = ChatDraft::with_title(record.name.clone());

        for entry in &messages {
            let body = body_of(entry);
            if body.trim().is_empty() {
                continue;
            }

            let role = config.mapping.resolve_role(&entry.sender);
            let mut msg = DraftMessage::new(role, body);
            if let Some(ts) = &entry.created_at {
                msg = msg.with_timestamp(Timestamp::Rfc3339(ts.clone()));
            }
            if role == Role::Other {
                msg = msg.with_meta("source_role", entry.sender.as_str());
            }
            draft.messages.push(msg);
        }

        finish(draft, Platform::Claude)
    }
}

fn deserialize_record(content: &str) -> Result<ConversationRecord> {
    let value: Value = serde_json::from_str(content)
        .map_err(|_| malformed(Platform::Claude, "payload is not valid JSON"))?;

    let record_value = match value {
        Value::Array(mut records) => {
            if records.is_empty() {
                return Err(malformed(Platform::Claude, "conversations array is empty"));
            }
            records.remove(0)
        }
        other => other,
    };

    serde_json::from_value(record_value)
        .map_err(|_| malformed(Platform::Claude, "conversation record has unexpected shape"))
}

/// Prefers the flat `text` field, falling back to joined text content
/// blocks.
fn body_of(entry: &ChatMessage) -> String {
    if let Some(text) = &entry.text {
        if !text.is_empty() {
            return text.clone();
        }
    }
    entry
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n")
}
