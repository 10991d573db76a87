//! Export parsers for the supported AI chat platforms.
//!
//! Each parser implements the [`ChatParser`] trait: validated raw bytes in,
//! a [`ChatDraft`] in conversation order out. All parsers share one error
//! taxonomy, so the orchestrator never special-cases a platform.
//!
//! # Available Parsers
//!
//! - [`ChatGptParser`] - ChatGPT `conversations.json` (mapping-tree layout)
//! - [`ClaudeParser`] - Claude data exports (`chat_messages` layout)
//! - [`GeminiParser`] - Gemini exports (flat author/text layout)
//! - [`MistralParser`] - Mistral Le Chat exports (flat role/content layout)
//!
//! # Example
//!
//! ```rust
//! use chatstitch::parsers::parser_for;
//! use chatstitch::platform::Platform;
//!
//! let parser = parser_for(Platform::Claude);
//! assert_eq!(parser.name(), "Claude");
//! ```

mod chatgpt;
mod claude;
mod gemini;
mod mistral;

pub use chatgpt::ChatGptParser;
pub use claude::ClaudeParser;
pub use gemini::GeminiParser;
pub use mistral::MistralParser;

use crate::chat::ChatDraft;
use crate::config::PlatformConfig;
use crate::error::{ImportError, Result};
use crate::platform::Platform;

/// Trait for turning one platform's export bytes into a chat draft.
///
/// Implementations must:
/// - keep messages in conversation order (never arrival order)
/// - report structural problems as [`ImportError::MalformedContent`] with a
///   description of the failed expectation, never file content
/// - treat a structurally valid export that yields zero messages as
///   malformed, not as an empty success
pub trait ChatParser: Send + Sync {
    /// Returns the human-readable name of this parser.
    fn name(&self) -> &'static str;

    /// Returns the platform this parser handles.
    fn platform(&self) -> Platform;

    /// Parses validated export bytes into a draft.
    ///
    /// `config` supplies the platform's field-mapping rules; parsers
    /// resolve role labels through it so config edits can absorb vocabulary
    /// changes.
    fn parse(&self, bytes: &[u8], config: &PlatformConfig) -> Result<ChatDraft>;
}

static CHATGPT: ChatGptParser = ChatGptParser;
static CLAUDE: ClaudeParser = ClaudeParser;
static GEMINI: GeminiParser = GeminiParser;
static MISTRAL: MistralParser = MistralParser;

/// Returns the parser for a platform.
///
/// The set is closed and resolved at compile time; adding a platform means
/// adding a variant, a parser, and an arm here.
pub fn parser_for(platform: Platform) -> &'static dyn ChatParser {
    match platform {
        Platform::ChatGpt => &CHATGPT,
        Platform::Claude => &CLAUDE,
        Platform::Gemini => &GEMINI,
        Platform::Mistral => &MISTRAL,
    }
}

/// Decodes payload bytes as UTF-8 or reports the export as malformed.
pub(crate) fn as_utf8(bytes: &[u8], platform: Platform) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| ImportError::MalformedContent {
        platform,
        detail: "payload is not valid UTF-8".to_string(),
    })
}

/// Shorthand for a structural failure on `platform`.
pub(crate) fn malformed(platform: Platform, detail: impl Into<String>) -> ImportError {
    ImportError::MalformedContent {
        platform,
        detail: detail.into(),
    }
}

/// Enforces the non-empty invariant after extraction.
pub(crate) fn finish(draft: ChatDraft, platform: Platform) -> Result<ChatDraft> {
    if draft.messages.is_empty() {
        return Err(malformed(platform, "export contains no usable messages"));
    }
    Ok(draft)
}
