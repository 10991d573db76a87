//! Canonical message type shared by all platform parsers.
//!
//! This module provides [`CanonicalMessage`], the normalized representation
//! of a single conversation turn. All platform parsers convert their native
//! export formats into this structure (via the draft types in
//! [`crate::chat`]), enabling uniform storage and display regardless of
//! source.
//!
//! # Overview
//!
//! A message consists of:
//! - **Required**: `role` and `body`
//! - **Optional**: `timestamp` (absolute UTC) and scalar `metadata`
//!
//! # Examples
//!
//! ```
//! use chatstitch::message::{CanonicalMessage, Role};
//! use chrono::Utc;
//!
//! let msg = CanonicalMessage::new(Role::User, "Hello!")
//!     .with_timestamp(Utc::now())
//!     .with_meta("lang", "en");
//!
//! assert_eq!(msg.role, Role::User);
//! assert!(msg.timestamp.is_some());
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The speaker of a conversation turn, normalized across platforms.
///
/// Platform vocabularies differ ("human", "model", "tool", ...); parsers map
/// them here via [`Role::from_alias`], optionally extended by the platform's
/// configured alias table. Anything unrecognized becomes [`Role::Other`] and
/// the original label is preserved in message metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person driving the conversation.
    User,
    /// The AI side of the conversation.
    Assistant,
    /// System or instruction turns.
    System,
    /// Any role the platform uses that has no canonical equivalent.
    Other,
}

impl Role {
    /// Maps a platform-native role label to a canonical role.
    ///
    /// Matching is case-insensitive. Unknown labels map to [`Role::Other`]
    /// rather than failing: a strange role must not reject an otherwise
    /// valid export.
    pub fn from_alias(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "user" | "human" => Role::User,
            "assistant" | "model" | "ai" | "bot" | "agent" => Role::Assistant,
            "system" => Role::System,
            _ => Role::Other,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
            Role::Other => write!(f, "other"),
        }
    }
}

/// A scalar metadata value.
///
/// Chat-level and message-level metadata are string-keyed maps of scalars;
/// nested structures from the source export are not carried through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// Text value
    Str(String),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Bool(bool),
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Str(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Str(s)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

/// A normalized conversation turn from any supported platform.
///
/// # Serialization
///
/// Implements `Serialize` and `Deserialize` with these behaviors:
/// - `timestamp` is omitted from JSON when `None`, and uses RFC 3339
/// - `metadata` is omitted when empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMessage {
    /// Who spoke this turn.
    pub role: Role,

    /// Sanitized text content of the turn.
    ///
    /// May be empty: an empty body is a valid (if unusual) turn, and the
    /// sanitizer prefers an empty body over rejecting a whole chat.
    pub body: String,

    /// When the turn happened, normalized to UTC.
    ///
    /// Absent when the export carried no timestamp or an unparseable one.
    /// Never defaulted to the import time, which would corrupt
    /// conversation ordering.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    /// Per-message scalar metadata (for example the original author label
    /// of an [`Role::Other`] turn).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(default)]
    pub metadata: BTreeMap<String, MetaValue>,
}

impl CanonicalMessage {
    /// Creates a message with only role and body.
    pub fn new(role: Role, body: impl Into<String>) -> Self {
        Self {
            role,
            body: body.into(),
            timestamp: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Builder method to set the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Builder method to add one metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if the body is empty or whitespace-only.
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}
