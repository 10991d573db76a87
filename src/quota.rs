//! Import allowance tracking for restricted callers.
//!
//! [`QuotaEnforcer`] keeps one remaining-imports counter per restricted
//! caller. Unrestricted callers are never checked and never get a counter.
//!
//! The contract is three calls, driven by the orchestrator:
//!
//! 1. [`check_and_reserve`](QuotaEnforcer::check_and_reserve) — peek before
//!    any parsing; a caller at zero fails fast without invoking a parser.
//! 2. [`commit`](QuotaEnforcer::commit) — the actual decrement, only after
//!    parse + sanitize produced a valid chat. The decrement is refused, not
//!    clamped, at zero: of two concurrent imports racing one remaining
//!    unit, exactly one commits.
//! 3. [`release`](QuotaEnforcer::release) — undoes one committed unit when
//!    a later stage (persistence) fails, so a caller is never charged for
//!    an import that did not succeed.
//!
//! Counters for different callers are independent locks: imports from
//! different callers never block each other.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::caller::{Caller, CallerId};
use crate::error::{ImportError, Result};

/// Default number of imports a previously unseen restricted caller gets.
pub const DEFAULT_ALLOWANCE: u32 = 5;

/// Tracks and decrements the bounded import allowance of restricted callers.
pub struct QuotaEnforcer {
    default_allowance: u32,
    counters: Mutex<HashMap<CallerId, Arc<Mutex<u32>>>>,
}

impl Default for QuotaEnforcer {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWANCE)
    }
}

impl QuotaEnforcer {
    /// Creates an enforcer that grants `default_allowance` imports to each
    /// new restricted caller.
    pub fn new(default_allowance: u32) -> Self {
        Self {
            default_allowance,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the caller's counter, creating it at the default allowance.
    ///
    /// The outer map lock is held only for the lookup; callers then operate
    /// on the per-caller lock, so one caller's critical section never
    /// blocks another caller.
    fn counter_for(&self, id: &CallerId) -> Arc<Mutex<u32>> {
        let mut counters = self.counters.lock();
        Arc::clone(
            counters
                .entry(id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(self.default_allowance))),
        )
    }

    /// Checks that the caller could be charged for one import, without
    /// charging anything.
    ///
    /// Unrestricted callers are always granted and no counter is touched.
    pub fn check_and_reserve(&self, caller: &Caller) -> Result<()> {
        if !caller.is_restricted() {
            return Ok(());
        }
        let counter = self.counter_for(&caller.id);
        let remaining = *counter.lock();
        if remaining == 0 {
            debug!(caller = %caller.id, "import allowance exhausted at pre-check");
            return Err(ImportError::QuotaExceeded(caller.id.clone()));
        }
        Ok(())
    }

    /// Charges the caller one import.
    ///
    /// The decrement is atomic per caller: at zero it is refused with
    /// [`ImportError::QuotaExceeded`], never clamped, so concurrent commits
    /// cannot both succeed on one remaining unit.
    pub fn commit(&self, caller: &Caller) -> Result<()> {
        if !caller.is_restricted() {
            return Ok(());
        }
        let counter = self.counter_for(&caller.id);
        let mut remaining = counter.lock();
        if *remaining == 0 {
            debug!(caller = %caller.id, "import allowance exhausted at commit");
            return Err(ImportError::QuotaExceeded(caller.id.clone()));
        }
        *remaining -= 1;
        debug!(caller = %caller.id, remaining = *remaining, "import committed against allowance");
        Ok(())
    }

    /// Returns one previously committed unit.
    ///
    /// Only valid after a successful [`commit`](Self::commit) whose import
    /// then failed downstream; a reservation holds no state, so there is
    /// nothing to release before commit.
    pub fn release(&self, caller: &Caller) {
        if !caller.is_restricted() {
            return;
        }
        let counter = self.counter_for(&caller.id);
        let mut remaining = counter.lock();
        *remaining += 1;
        debug!(caller = %caller.id, remaining = *remaining, "committed unit released");
    }

    /// Administrative override of a restricted caller's remaining allowance.
    pub fn set_allowance(&self, id: &CallerId, allowance: u32) {
        let counter = self.counter_for(id);
        *counter.lock() = allowance;
    }

    /// Returns the remaining allowance, or `None` for unrestricted callers
    /// (no counter exists for them).
    pub fn remaining(&self, caller: &Caller) -> Option<u32> {
        if !caller.is_restricted() {
            return None;
        }
        Some(*self.counter_for(&caller.id).lock())
    }

    /// Returns `true` if any counter has ever been created.
    ///
    /// Exists so tests can assert that unrestricted traffic leaves the
    /// enforcer untouched.
    pub fn has_counters(&self) -> bool {
        !self.counters.lock().is_empty()
    }
}
