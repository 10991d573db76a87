//! Chat-level types: parser drafts and the canonical record.
//!
//! Parsers produce a [`ChatDraft`] — messages in conversation order with
//! timestamps still in their platform-native representation. The sanitizer
//! normalizes the draft in place, and the orchestrator seals it into a
//! [`CanonicalChat`] once quota and persistence concerns are settled.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::caller::CallerId;
use crate::message::{CanonicalMessage, MetaValue, Role};
use crate::platform::Platform;

/// A timestamp as found in an export, before normalization.
///
/// Each platform encodes time differently; parsers carry the raw value and
/// the sanitizer converts everything to UTC. Unparseable values normalize to
/// absent rather than failing the chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Timestamp {
    /// Seconds since the epoch, possibly fractional (ChatGPT, Mistral).
    Unix(f64),
    /// Milliseconds since the epoch.
    Millis(i64),
    /// An RFC 3339 string (Claude, Gemini).
    Rfc3339(String),
    /// Already normalized.
    Utc(DateTime<Utc>),
}

/// A single turn as extracted by a parser, prior to sanitization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftMessage {
    /// Canonical role mapped from the platform's vocabulary.
    pub role: Role,
    /// Raw body text; may still contain markup.
    pub body: String,
    /// Raw timestamp, if the export carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    /// Per-message scalar metadata.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(default)]
    pub metadata: BTreeMap<String, MetaValue>,
}

impl DraftMessage {
    /// Creates a draft turn with only role and body.
    pub fn new(role: Role, body: impl Into<String>) -> Self {
        Self {
            role,
            body: body.into(),
            timestamp: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Builder method to set the raw timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, ts: Timestamp) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Builder method to add one metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Chat-level metadata carried through the pipeline untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMetadata {
    /// Model name reported by the export, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub model: Option<String>,

    /// Export schema/platform version, if the export reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub platform_version: Option<String>,

    /// Caller-supplied or export-supplied tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub tags: Vec<String>,

    /// Any additional scalar metadata.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(default)]
    pub extra: BTreeMap<String, MetaValue>,
}

/// A conversation as produced by a parser: ordered turns plus metadata,
/// not yet sanitized or owned by anyone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatDraft {
    /// Conversation title from the export, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub title: Option<String>,
    /// Turns in conversation order (never arrival order).
    pub messages: Vec<DraftMessage>,
    /// Chat-level metadata.
    #[serde(default)]
    pub metadata: ChatMetadata,
}

impl ChatDraft {
    /// Creates an empty draft with a title.
    pub fn with_title(title: Option<String>) -> Self {
        Self {
            title,
            ..Self::default()
        }
    }
}

/// The platform-independent record of an imported conversation.
///
/// Invariant: `messages` is never empty — an import that would produce zero
/// turns fails as malformed content instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalChat {
    /// Turns in conversation order.
    pub messages: Vec<CanonicalMessage>,
    /// Where the export came from.
    pub platform: Platform,
    /// Conversation title, if the export or the caller provided one.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub title: Option<String>,
    /// Chat-level metadata (model, platform version, tags).
    #[serde(default)]
    pub metadata: ChatMetadata,
    /// Identity that owns the stored record.
    pub owner: CallerId,
    /// When the pipeline produced this record.
    pub imported_at: DateTime<Utc>,
}
