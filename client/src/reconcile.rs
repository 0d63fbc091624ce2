//! Decides when a change from another editor may replace local state.
//!
//! Remote changes arriving within the suppression window of a local
//! interaction are held back so an organizer's booth does not jump under
//! their finger. A held-back change is remembered and released once the
//! window has passed.

use crate::clock::Millis;

pub const SUPPRESSION_WINDOW_MS: Millis = 3000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteDecision {
    Reload,
    Suppressed,
}

#[derive(Debug)]
pub struct Reconciler {
    window: Millis,
    last_local: Option<Millis>,
    deferred: bool,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(SUPPRESSION_WINDOW_MS)
    }
}

impl Reconciler {
    pub fn new(window: Millis) -> Self {
        Self {
            window,
            last_local: None,
            deferred: false,
        }
    }

    pub fn note_local_interaction(&mut self, now: Millis) {
        self.last_local = Some(now);
    }

    pub fn last_local_interaction(&self) -> Option<Millis> {
        self.last_local
    }

    pub fn is_suppressed(&self, now: Millis) -> bool {
        self.last_local
            .is_some_and(|last| now < last.saturating_add(self.window))
    }

    pub fn on_remote_change(&mut self, now: Millis) -> RemoteDecision {
        if self.is_suppressed(now) {
            self.deferred = true;
            tracing::debug!(now, "remote change suppressed");
            RemoteDecision::Suppressed
        } else {
            self.deferred = false;
            RemoteDecision::Reload
        }
    }

    /// Holds a change back for reasons other than the window.
    pub fn defer(&mut self) {
        self.deferred = true;
    }

    pub fn has_deferred(&self) -> bool {
        self.deferred
    }

    /// Releases a held-back change once the window is over.
    pub fn take_deferred(&mut self, now: Millis) -> bool {
        if self.deferred && !self.is_suppressed(now) {
            self.deferred = false;
            return true;
        }
        false
    }
}
