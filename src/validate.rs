//! Pre-parse format validation.
//!
//! [`validate`] checks an inbound file's declared content type and size
//! against the platform's policy before any byte of the payload is parsed,
//! so obviously invalid input fails fast and cheap. It is a pure function
//! of its inputs and the config snapshot it is handed.

use crate::config::PlatformConfig;
use crate::error::{ImportError, Result};

/// Checks the declared content type and payload length against policy.
///
/// The declared type is compared case-insensitively and without parameters
/// (`application/json; charset=utf-8` matches `application/json`). A payload
/// exactly at the size limit passes; one byte over fails with
/// [`ImportError::FileTooLarge`].
pub fn validate(declared_type: &str, byte_len: u64, config: &PlatformConfig) -> Result<()> {
    let essence = media_essence(declared_type);
    if !config.allowed_types.iter().any(|t| t == &essence) {
        return Err(ImportError::InvalidFileType {
            platform: config.platform,
            declared: declared_type.to_string(),
        });
    }

    let limit = config.effective_max_size();
    if byte_len > limit {
        return Err(ImportError::FileTooLarge {
            platform: config.platform,
            size: byte_len,
            limit,
        });
    }

    Ok(())
}

/// Lowercases a MIME type and drops everything from the first `;` on.
fn media_essence(declared: &str) -> String {
    declared
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}
