//! Unified error types for the import pipeline.
//!
//! This module provides a single [`ImportError`] enum that covers every way
//! an import can fail. The taxonomy is closed: each inbound file ends in
//! either a stored chat or exactly one of these variants, and the pipeline
//! never retries on its own.
//!
//! # Error Handling Philosophy
//!
//! - **Library users** get typed errors they can match on
//! - **End users** get one specific failure kind per file, with the platform
//!   and a structural description where that helps
//! - **Raw file bytes are never echoed** into error payloads or logs

use thiserror::Error;

use crate::caller::CallerId;
use crate::platform::Platform;

/// A specialized [`Result`] type for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;

/// The error type for all import operations.
///
/// Every variant is terminal for the affected file. Batch imports report one
/// outcome per file and never abort siblings on a single file's error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ImportError {
    /// The declared platform identifier is not in the supported set, or no
    /// configuration could be established for it.
    #[error("unsupported platform: '{0}'")]
    UnsupportedPlatform(String),

    /// The declared content type is not accepted for this platform.
    #[error("content type '{declared}' is not accepted for {platform} imports")]
    InvalidFileType {
        /// Platform whose policy rejected the type
        platform: Platform,
        /// The content type the caller declared
        declared: String,
    },

    /// The payload exceeds the platform's configured size limit.
    ///
    /// A payload exactly at the limit is accepted; one byte over is not.
    #[error("{size} byte file exceeds the {limit} byte limit for {platform} imports")]
    FileTooLarge {
        /// Platform whose policy rejected the size
        platform: Platform,
        /// Declared payload length in bytes
        size: u64,
        /// Effective limit in bytes
        limit: u64,
    },

    /// The payload is not a structurally valid export for the platform.
    ///
    /// `detail` names the structural expectation that failed (for example
    /// "missing 'messages' array"). It never contains file content.
    #[error("malformed {platform} export: {detail}")]
    MalformedContent {
        /// Platform whose layout was expected
        platform: Platform,
        /// Which structural expectation failed
        detail: String,
    },

    /// The restricted caller's import allowance is exhausted.
    #[error("import allowance exhausted for caller '{0}'")]
    QuotaExceeded(CallerId),

    /// The persistence collaborator refused or failed to store the chat.
    #[error("failed to persist imported chat: {0}")]
    PersistenceError(String),

    /// The batch deadline passed before this file's processing started.
    ///
    /// Outcomes already produced by the same batch are left intact.
    #[error("import cancelled: batch deadline exceeded")]
    Cancelled,
}

impl ImportError {
    /// Returns the platform the error is scoped to, where one applies.
    pub fn platform(&self) -> Option<Platform> {
        match self {
            ImportError::InvalidFileType { platform, .. }
            | ImportError::FileTooLarge { platform, .. }
            | ImportError::MalformedContent { platform, .. } => Some(*platform),
            _ => None,
        }
    }

    /// Returns `true` for failures the caller may resolve by resubmitting
    /// later (quota refill, storage recovery), as opposed to failures that
    /// will repeat for the same input.
    pub fn is_resubmittable(&self) -> bool {
        matches!(
            self,
            ImportError::QuotaExceeded(_)
                | ImportError::PersistenceError(_)
                | ImportError::Cancelled
        )
    }
}
