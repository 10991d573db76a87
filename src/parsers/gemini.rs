//! Gemini export parser.
//!
//! Gemini conversation exports use a flat message array with `author` and
//! `text` fields:
//!
//! ```json
//! {
//!   "title": "Dinner ideas",
//!   "model": "gemini-1.5-pro",
//!   "messages": [
//!     {"author": "user", "text": "Quick pasta dish?", "create_time": "2024-03-01T18:00:00Z"},
//!     {"author": "model", "text": "Aglio e olio takes 15 minutes.", "create_time": "2024-03-01T18:00:04Z"}
//!   ]
//! }
//! ```
//!
//! The `model` author label maps to the assistant role.

use serde::Deserialize;

use super::{ChatParser, as_utf8, finish, malformed};
use crate::chat::{ChatDraft, DraftMessage, Timestamp};
use crate::config::PlatformConfig;
use crate::error::Result;
use crate::message::Role;
use crate::platform::Platform;

/// Parser for Gemini conversation exports.
pub struct GeminiParser;

#[derive(Debug, Deserialize)]
struct Export {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    messages: Option<Vec<ExportMessage>>,
}

#[derive(Debug, Deserialize)]
struct ExportMessage {
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    create_time: Option<String>,
}

impl ChatParser for GeminiParser {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn platform(&self) -> Platform {
        Platform::Gemini
    }

    fn parse(&self, bytes: &[u8], config: &PlatformConfig) -> Result<ChatDraft> {
        let content = as_utf8(bytes, Platform::Gemini)?;
        let export: Export = serde_json::from_str(content)
            .map_err(|_| malformed(Platform::Gemini, "payload is not valid JSON"))?;

        let messages = export
            .messages
            .ok_or_else(|| malformed(Platform::Gemini, "missing 'messages' array"))?;

        let mut draft = ChatDraft::with_title(export.title.clone());
        draft.metadata.model = export.model.clone();

        for entry in &messages {
            let Some(body) = entry.text.as_deref() else {
                continue;
            };
            if body.trim().is_empty() {
                continue;
            }

            let label = entry.author.as_deref().unwrap_or("");
            let role = config.mapping.resolve_role(label);
            let mut msg = DraftMessage::new(role, body);
            if let Some(ts) = &entry.create_time {
                msg = msg.with_timestamp(Timestamp::Rfc3339(ts.clone()));
            }
            if role == Role::Other && !label.is_empty() {
                msg = msg.with_meta("source_role", label);
            }
            draft.messages.push(msg);
        }

        finish(draft, Platform::Gemini)
    }
}
