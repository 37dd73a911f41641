//! Local mirror of on-chain access grants.
//!
//! The chain is the source of truth. Entries here are what the client last
//! believed, tagged with how much that belief is worth.
//!
//! # State Transitions
//! ```text
//! begin()          → Pending (optimistic value applied)
//! Pending → Confirmed:  confirm() after the transaction committed
//! Pending → previous:   rollback() after rejection or abort
//! Pending → Unverified: mark_unverified() after a confirmation timeout;
//!                       the pre-toggle value is restored, not the requested one
//! any → Confirmed:      record_observed() after a fresh chain read
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::blockchain::types::AccountAddress;

/// How trustworthy a mirrored value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantState {
    /// Applied optimistically; the transaction is still in flight.
    Pending,
    /// Matches a committed transaction or a chain read.
    Confirmed,
    /// Outcome unknown (confirmation timed out). Re-check later.
    Unverified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessEntry {
    pub granted: bool,
    pub state: GrantState,
}

/// Handle for an optimistic update; settle it exactly once.
#[derive(Debug)]
#[must_use = "an optimistic update must be confirmed, rolled back or marked unverified"]
pub struct PendingToggle {
    key: (AccountAddress, AccountAddress),
    granted: bool,
    previous: Option<AccessEntry>,
}

impl PendingToggle {
    /// What the entry held before this toggle. Without an earlier entry the
    /// patient is assumed to have had the opposite of what they asked for.
    fn previous_granted(&self) -> bool {
        self.previous.map_or(!self.granted, |entry| entry.granted)
    }
}

#[derive(Debug, Default)]
pub struct AccessBook {
    entries: Mutex<HashMap<(AccountAddress, AccountAddress), AccessEntry>>,
}

impl AccessBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<(AccountAddress, AccountAddress), AccessEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, patient: &AccountAddress, doctor: &AccountAddress) -> Option<AccessEntry> {
        self.entries().get(&(*patient, *doctor)).copied()
    }

    /// Apply `granted` optimistically.
    pub fn begin(&self, patient: AccountAddress, doctor: AccountAddress, granted: bool) -> PendingToggle {
        let key = (patient, doctor);
        let previous = self.entries().insert(
            key,
            AccessEntry {
                granted,
                state: GrantState::Pending,
            },
        );
        PendingToggle { key, granted, previous }
    }

    /// The transaction committed: the requested value is now the chain's.
    pub fn confirm(&self, toggle: PendingToggle) {
        self.entries().insert(
            toggle.key,
            AccessEntry {
                granted: toggle.granted,
                state: GrantState::Confirmed,
            },
        );
    }

    /// Restore whatever was there before `begin`.
    pub fn rollback(&self, toggle: PendingToggle) {
        let mut entries = self.entries();
        match toggle.previous {
            Some(previous) => {
                entries.insert(toggle.key, previous);
            }
            None => {
                entries.remove(&toggle.key);
            }
        }
        tracing::debug!(patient = %toggle.key.0, doctor = %toggle.key.1, "Access toggle rolled back");
    }

    /// The transaction may or may not land. Show the last known value and
    /// flag it until a chain read settles it.
    pub fn mark_unverified(&self, toggle: PendingToggle) {
        let granted = toggle.previous_granted();
        self.entries().insert(
            toggle.key,
            AccessEntry {
                granted,
                state: GrantState::Unverified,
            },
        );
        tracing::debug!(patient = %toggle.key.0, doctor = %toggle.key.1, granted, "Access toggle unverified");
    }

    /// Overwrite with a value just read from the chain.
    pub fn record_observed(&self, patient: AccountAddress, doctor: AccountAddress, granted: bool) {
        self.entries().insert(
            (patient, doctor),
            AccessEntry {
                granted,
                state: GrantState::Confirmed,
            },
        );
    }
}
