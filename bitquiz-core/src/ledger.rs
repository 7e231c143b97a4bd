//! Resource Ledger
//!
//! Single owner of every ephemeral media locator created during a session.
//! The orchestrator registers locators; only session replacement, teardown
//! or a failed conversion's rollback revokes them.

use crate::media::{Locator, MediaError, MediaHost};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tracks live locators and revokes each exactly once
pub struct ResourceLedger {
    host: Arc<dyn MediaHost>,
    live: HashSet<Locator>,
}

impl ResourceLedger {
    pub fn new(host: Arc<dyn MediaHost>) -> Self {
        Self {
            host,
            live: HashSet::new(),
        }
    }

    /// Add a locator to the live set (idempotent)
    pub fn register(&mut self, locator: Locator) {
        if self.live.insert(locator.clone()) {
            debug!(locator = %locator, live = self.live.len(), "Locator registered");
        }
    }

    /// Whether `locator` is still owned by the ledger
    pub fn contains(&self, locator: &Locator) -> bool {
        self.live.contains(locator)
    }

    /// Number of live locators
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Revoke the given locators if the ledger owns them
    ///
    /// Locators not in the live set are skipped, so nothing is revoked twice.
    /// Returns the number of locators removed from the live set.
    pub fn release(&mut self, locators: &[Locator]) -> usize {
        let mut released = 0;
        for locator in locators {
            if self.live.remove(locator) {
                self.revoke(locator);
                released += 1;
            }
        }
        released
    }

    /// Revoke every registered locator and clear the set
    ///
    /// Safe to call on an empty ledger. Returns the number released.
    pub fn release_all(&mut self) -> usize {
        let drained: Vec<Locator> = self.live.drain().collect();
        for locator in &drained {
            self.revoke(locator);
        }
        if !drained.is_empty() {
            debug!(released = drained.len(), "Ledger released all locators");
        }
        drained.len()
    }

    fn revoke(&self, locator: &Locator) {
        match self.host.revoke(locator) {
            Ok(()) => {}
            // Already invalid: the resource is gone, which is what we wanted
            Err(MediaError::UnknownLocator(_)) => {
                debug!(locator = %locator, "Locator already invalid, treating revoke as complete");
            }
            Err(e) => {
                warn!(locator = %locator, error = %e, "Locator revoke failed (continuing)");
            }
        }
    }
}

impl std::fmt::Debug for ResourceLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceLedger")
            .field("live", &self.live.len())
            .finish()
    }
}
