//! Caller identity and tier.
//!
//! The pipeline never authenticates. It receives an already-verified
//! [`Caller`] from the authentication collaborator and only distinguishes
//! whether the caller is subject to an import allowance.

use serde::{Deserialize, Serialize};

/// Opaque identity of the caller that owns an import.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerId(String);

impl CallerId {
    /// Creates a caller identity from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Whether a caller is subject to the bounded import allowance.
///
/// The broader role system (admin, registered, guest) collapses to this one
/// attribute for the pipeline: restricted callers are metered by
/// [`QuotaEnforcer`](crate::quota::QuotaEnforcer), unrestricted callers are
/// never checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// No allowance; imports are never metered.
    Unrestricted,
    /// Metered by a per-caller remaining-imports counter.
    Restricted,
}

/// A verified caller: identity plus tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Opaque identity supplied by the authentication collaborator.
    pub id: CallerId,
    /// Allowance tier.
    pub tier: Tier,
}

impl Caller {
    /// Creates an unrestricted caller.
    pub fn unrestricted(id: impl Into<String>) -> Self {
        Self {
            id: CallerId::new(id),
            tier: Tier::Unrestricted,
        }
    }

    /// Creates a restricted (metered) caller.
    pub fn restricted(id: impl Into<String>) -> Self {
        Self {
            id: CallerId::new(id),
            tier: Tier::Restricted,
        }
    }

    /// Returns `true` if this caller is subject to the import allowance.
    pub fn is_restricted(&self) -> bool {
        self.tier == Tier::Restricted
    }
}
