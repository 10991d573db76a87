//! Supported AI chat platforms.
//!
//! [`Platform`] is the closed set of export formats the pipeline can ingest.
//! Adding a platform means adding a variant here, a parser under
//! [`crate::parsers`], and a registry arm in
//! [`parser_for`](crate::parsers::parser_for) — there is no runtime
//! discovery.
//!
//! # Example
//!
//! ```rust
//! use chatstitch::platform::Platform;
//! use std::str::FromStr;
//!
//! let platform = Platform::from_str("chatgpt").unwrap();
//! assert_eq!(platform, Platform::ChatGpt);
//!
//! // Aliases are supported
//! let platform = Platform::from_str("anthropic").unwrap();
//! assert_eq!(platform, Platform::Claude);
//! ```

use serde::{Deserialize, Serialize};

/// Identifies the source platform of a chat export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Platform {
    /// ChatGPT `conversations.json` exports (mapping-tree layout)
    #[serde(rename = "chatgpt", alias = "gpt", alias = "openai")]
    ChatGpt,

    /// Claude data exports (`chat_messages` layout)
    #[serde(alias = "anthropic")]
    Claude,

    /// Gemini conversation exports (flat author/text layout)
    #[serde(alias = "bard", alias = "google")]
    Gemini,

    /// Mistral Le Chat exports (flat role/content layout)
    #[serde(alias = "lechat")]
    Mistral,
}

impl Platform {
    /// Returns the canonical lowercase identifier for this platform.
    ///
    /// This is the value recorded in chat-level metadata and the form
    /// accepted (among aliases) by [`FromStr`](std::str::FromStr).
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::ChatGpt => "chatgpt",
            Platform::Claude => "claude",
            Platform::Gemini => "gemini",
            Platform::Mistral => "mistral",
        }
    }

    /// Returns all platform identifiers including aliases.
    pub fn all_names() -> &'static [&'static str] {
        &[
            "chatgpt", "gpt", "openai", "claude", "anthropic", "gemini", "bard", "google",
            "mistral", "lechat",
        ]
    }

    /// Returns all supported platforms.
    pub fn all() -> &'static [Platform] {
        &[
            Platform::ChatGpt,
            Platform::Claude,
            Platform::Gemini,
            Platform::Mistral,
        ]
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::ChatGpt => write!(f, "ChatGPT"),
            Platform::Claude => write!(f, "Claude"),
            Platform::Gemini => write!(f, "Gemini"),
            Platform::Mistral => write!(f, "Mistral"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chatgpt" | "gpt" | "openai" => Ok(Platform::ChatGpt),
            "claude" | "anthropic" => Ok(Platform::Claude),
            "gemini" | "bard" | "google" => Ok(Platform::Gemini),
            "mistral" | "lechat" => Ok(Platform::Mistral),
            _ => Err(format!(
                "Unknown platform: '{}'. Expected one of: {}",
                s,
                Platform::all_names().join(", ")
            )),
        }
    }
}
