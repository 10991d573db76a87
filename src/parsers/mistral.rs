//! Mistral Le Chat export parser.
//!
//! Le Chat exports use the familiar flat role/content array:
//!
//! ```json
//! {
//!   "title": "Regex help",
//!   "model": "mistral-large-latest",
//!   "messages": [
//!     {"role": "user", "content": "Anchor a line?", "created_at": 1709316000.0},
//!     {"role": "assistant", "content": "Use ^ and $.", "created_at": 1709316004.5}
//!   ]
//! }
//! ```

use serde::Deserialize;

use super::{ChatParser, as_utf8, finish, malformed};
use crate::chat::{ChatDraft, DraftMessage, Timestamp};
use crate::config::PlatformConfig;
use crate::error::Result;
use crate::message::Role;
use crate::platform::Platform;

/// Parser for Mistral Le Chat exports.
pub struct MistralParser;

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
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    created_at: Option<f64>,
}

impl ChatParser for MistralParser {
    fn name(&self) -> &'static str {
        "Mistral"
    }

    fn platform(&self) -> Platform {
        Platform::Mistral
    }

    fn parse(&self, bytes: &[u8], config: &PlatformConfig) -> Result<ChatDraft> {
        let content = as_utf8(bytes, Platform::Mistral)?;
        let export: Export = serde_json::from_str(content)
            .map_err(|_| malformed(Platform::Mistral, "payload is not valid JSON"))?;

        let messages = export
            .messages
            .ok_or_else(|| malformed(Platform::Mistral, "missing 'messages' array"))?;

        let mut draft = ChatDraft::with_title(export.title.clone());
        draft.metadata.model = export.model.clone();

        for entry in &messages {
            let Some(body) = entry.content.as_deref() else {
                continue;
            };
            if body.trim().is_empty() {
                continue;
            }

            let label = entry.role.as_deref().unwrap_or("");
            let role = config.mapping.resolve_role(label);
            let mut msg = DraftMessage::new(role, body);
            if let Some(ts) = entry.created_at {
                msg = msg.with_timestamp(Timestamp::Unix(ts));
            }
            if role == Role::Other && !label.is_empty() {
                msg = msg.with_meta("source_role", label);
            }
            draft.messages.push(msg);
        }

        finish(draft, Platform::Mistral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
      "title": "Regex help",
      "model": "mistral-large-latest",
      "messages": [
        {"role": "user", "content": "How do I anchor a line?", "created_at": 1709316000.0},
        {"role": "assistant", "content": "Use ^ and $.", "created_at": 1709316004.5}
      ]
    }"#;

    fn config() -> PlatformConfig {
        PlatformConfig::json_default(Platform::Mistral)
    }

    #[test]
    fn test_parse_flat_layout() {
        let draft = MistralParser.parse(FIXTURE.as_bytes(), &config()).unwrap();
        assert_eq!(draft.title.as_deref(), Some("Regex help"));
        assert_eq!(draft.messages.len(), 2);
        assert_eq!(draft.messages[1].role, Role::Assistant);
        assert_eq!(
            draft.messages[0].timestamp,
            Some(Timestamp::Unix(1709316000.0))
        );
        assert_eq!(
            draft.metadata.model.as_deref(),
            Some("mistral-large-latest")
        );
    }

    #[test]
    fn test_missing_messages_is_malformed() {
        let err = MistralParser.parse(b"{}", &config()).unwrap_err();
        assert!(err.to_string().contains("messages"));
    }

    #[test]
    fn test_whitespace_only_content_is_skipped() {
        let fixture = r#"{"messages": [
          {"role": "user", "content": "   "},
          {"role": "user", "content": "real"}
        ]}"#;
        let draft = MistralParser.parse(fixture.as_bytes(), &config()).unwrap();
        assert_eq!(draft.messages.len(), 1);
    }
}
