//! # Chatstitch
//!
//! A Rust library for ingesting exported conversations from AI chat
//! platforms and converting them into one canonical record the rest of an
//! application can store, search, and display.
//!
//! ## Overview
//!
//! Chatstitch provides a unified import pipeline for exports from:
//! - **ChatGPT** — `conversations.json` mapping-tree exports
//! - **Claude** — data exports with `chat_messages` arrays
//! - **Gemini** — flat author/text conversation exports
//! - **Mistral** — Le Chat role/content exports
//!
//! The pipeline handles format validation, per-platform parsing, content
//! sanitization, guest quota enforcement, and batch orchestration with
//! partial-failure semantics. Authentication, storage, and HTTP wiring are
//! external collaborators reached through small traits
//! ([`ConfigSource`](config::ConfigSource), [`ChatSink`](store::ChatSink)).
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use chatstitch::prelude::*;
//! use chatstitch::store::MemorySink;
//!
//! let importer = Importer::with_defaults(Arc::new(MemorySink::new()));
//!
//! let export = r#"{"messages": [{"role": "user", "content": "hi"}]}"#;
//! let request = ImportRequest::new(
//!     export.as_bytes().to_vec(),
//!     "application/json",
//!     "mistral",
//!     Caller::unrestricted("user-1"),
//! );
//!
//! let outcome = importer.import(request);
//! assert!(outcome.is_success());
//! ```
//!
//! ## Batches
//!
//! [`Importer::import_batch`](import::Importer::import_batch) processes N
//! files into exactly N ordered outcomes: files parse in parallel, quota is
//! charged in submission order, and one file's failure never aborts its
//! siblings.
//!
//! ## Module Structure
//!
//! - [`import`] — [`Importer`](import::Importer), the pipeline orchestrator
//! - [`platform`] — [`Platform`](platform::Platform), the closed platform set
//! - [`parsers`] — per-platform export parsers behind one trait
//! - [`validate`] — pre-parse content-type and size policy
//! - [`sanitize`] — markup allow-list and timestamp normalization
//! - [`quota`] — bounded import allowance for restricted callers
//! - [`config`] — per-platform policy with a TTL cache
//! - [`message`] / [`chat`] — the canonical data model
//! - [`store`] — the persistence boundary
//! - [`error`] — the closed error taxonomy ([`ImportError`], [`Result`])

pub mod caller;
pub mod chat;
pub mod config;
pub mod error;
pub mod import;
pub mod message;
pub mod parsers;
pub mod platform;
pub mod quota;
pub mod sanitize;
pub mod store;
pub mod validate;

// Re-export the main types at the crate root for convenience
pub use error::{ImportError, Result};
pub use message::{CanonicalMessage, Role};
pub use platform::Platform;

/// Convenient re-exports for common usage.
///
/// Import everything you need with a single line:
///
/// ```rust
/// use chatstitch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::caller::{Caller, CallerId, Tier};
    pub use crate::chat::{CanonicalChat, ChatDraft, ChatMetadata};
    pub use crate::config::{PlatformConfig, PlatformConfigStore, StaticConfigSource};
    pub use crate::error::{ImportError, Result};
    pub use crate::import::{ImportOutcome, ImportRequest, Importer, StoredChat};
    pub use crate::message::{CanonicalMessage, MetaValue, Role};
    pub use crate::platform::Platform;
    pub use crate::quota::QuotaEnforcer;
    pub use crate::sanitize::Sanitizer;
    pub use crate::store::{ChatSink, MemorySink};
}
