//! ChatGPT export parser.
//!
//! ChatGPT data exports store each conversation as a record with a node
//! `mapping` instead of a flat message list:
//!
//! ```json
//! {
//!   "title": "Trip planning",
//!   "create_time": 1705314600.12,
//!   "current_node": "n3",
//!   "mapping": {
//!     "n1": {"parent": null, "message": null},
//!     "n2": {"parent": "n1", "message": {
//!       "author": {"role": "user"},
//!       "create_time": 1705314600.5,
//!       "content": {"content_type": "text", "parts": ["Hello"]}
//!     }},
//!     "n3": {"parent": "n2", "message": {
//!       "author": {"role": "assistant"},
//!       "content": {"content_type": "text", "parts": ["Hi!"]},
//!       "metadata": {"model_slug": "gpt-4o"}
//!     }}
//!   }
//! }
//! ```
//!
//! The active conversation path is recovered by walking parents from
//! `current_node` and reversing. A `conversations.json` containing an array
//! of records is accepted too; the first record is imported.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use super::{ChatParser, as_utf8, finish, malformed};
use crate::chat::{ChatDraft, DraftMessage, Timestamp};
use crate::config::PlatformConfig;
use crate::error::Result;
use crate::message::Role;
use crate::platform::Platform;

/// Parser for ChatGPT conversation exports.
pub struct ChatGptParser;

#[derive(Debug, Deserialize)]
struct ConversationRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    current_node: Option<String>,
    mapping: HashMap<String, ConversationNode>,
}

#[derive(Debug, Deserialize)]
struct ConversationNode {
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    message: Option<MessageRecord>,
}

#[derive(Debug, Deserialize)]
struct MessageRecord {
    #[serde(default)]
    author: Option<MessageAuthor>,
    #[serde(default)]
    create_time: Option<f64>,
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct MessageAuthor {
    #[serde(default)]
    role: Option<String>,
}

impl ChatParser for ChatGptParser {
    fn name(&self) -> &'static str {
        "ChatGPT"
    }

    fn platform(&self) -> Platform {
        Platform::ChatGpt
    }

    fn parse(&self, bytes: &[u8], config: &PlatformConfig) -> Result<ChatDraft> {
        let content = as_utf8(bytes, Platform::ChatGpt)?;
        let record = deserialize_record(content)?;

        let mut draft = ChatDraft::with_title(record.title.clone());

        for node in path_through(&record)? {
            let Some(message) = &node.message else {
                continue;
            };
            let Some(body) = extract_parts(message.content.as_ref()) else {
                continue;
            };
            if body.trim().is_empty() {
                continue;
            }

            let label = message
                .author
                .as_ref()
                .and_then(|a| a.role.as_deref())
                .unwrap_or("");
            let role = config.mapping.resolve_role(label);

            let mut msg = DraftMessage::new(role, body);
            if let Some(ts) = message.create_time {
                msg = msg.with_timestamp(Timestamp::Unix(ts));
            }
            if role == Role::Other && !label.is_empty() {
                msg = msg.with_meta("source_role", label);
            }

            if draft.metadata.model.is_none() {
                draft.metadata.model = model_slug(message.metadata.as_ref());
            }

            draft.messages.push(msg);
        }

        finish(draft, Platform::ChatGpt)
    }
}

/// Accepts a single conversation record or an array of them.
fn deserialize_record(content: &str) -> Result<ConversationRecord> {
    let value: Value = serde_json::from_str(content)
        .map_err(|_| malformed(Platform::ChatGpt, "payload is not valid JSON"))?;

    let record_value = match value {
        Value::Array(mut records) => {
            if records.is_empty() {
                return Err(malformed(
                    Platform::ChatGpt,
                    "conversations array is empty",
                ));
            }
            records.remove(0)
        }
        other => other,
    };

    serde_json::from_value(record_value)
        .map_err(|_| malformed(Platform::ChatGpt, "missing 'mapping' object"))
}

/// Walks the active path from `current_node` to the root, returning nodes in
/// conversation order. Falls back to every node in the mapping ordered by
/// message time when `current_node` is absent or dangling. A mapping whose
/// parent pointers form a cycle is malformed.
fn path_through(record: &ConversationRecord) -> Result<Vec<&ConversationNode>> {
    let mut path = Vec::new();
    let mut visited = HashSet::new();
    let mut cursor = record.current_node.as_deref();

    while let Some(id) = cursor {
        let Some(node) = record.mapping.get(id) else {
            break;
        };
        if !visited.insert(id) {
            return Err(malformed(
                Platform::ChatGpt,
                "mapping parent pointers form a cycle",
            ));
        }
        path.push(node);
        cursor = node.parent.as_deref();
    }

    if path.is_empty() {
        let mut nodes: Vec<&ConversationNode> = record.mapping.values().collect();
        nodes.sort_by(|a, b| {
            let ta = a.message.as_ref().and_then(|m| m.create_time);
            let tb = b.message.as_ref().and_then(|m| m.create_time);
            ta.partial_cmp(&tb).unwrap_or(std::cmp::Ordering::Equal)
        });
        return Ok(nodes);
    }

    path.reverse();
    Ok(path)
}

/// Joins the string entries of `content.parts`.
fn extract_parts(content: Option<&Value>) -> Option<String> {
    let parts = content?.get("parts")?.as_array()?;
    let text: Vec<&str> = parts.iter().filter_map(|p| p.as_str()).collect();
    Some(text.join("\n"))
}

fn model_slug(metadata: Option<&Value>) -> Option<String> {
    metadata?
        .get("model_slug")
        .and_then(|v| v.as_str())
        .map(ToString::to_string)
}
