//! Debounced write-back of booth positions.
//!
//! Every mutation restarts a single idle timer; when it fires, one batch
//! containing every saved booth goes to the store. Drafts stay local until
//! they have been created with their details. A failed write keeps local
//! state as it is and leaves the layer dirty so the next save carries it.
//! The layer also remembers which booths the store has not acknowledged
//! yet, so a reload can keep them.

use std::collections::BTreeSet;

use floorplan_shared::BoothRecord;

use crate::clock::{DebounceTimer, Millis};
use crate::editor::{BoothKey, PlacementEditor};
use crate::notify::Notifier;
use crate::store::StoreError;

pub const POINTER_IDLE_MS: Millis = 2000;
pub const TOUCH_IDLE_MS: Millis = 3000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Pointer,
    Touch,
}

impl InputKind {
    pub fn idle_delay(self) -> Millis {
        match self {
            InputKind::Pointer => POINTER_IDLE_MS,
            InputKind::Touch => TOUCH_IDLE_MS,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SaveBatch {
    pub records: Vec<BoothRecord>,
    pub skipped_drafts: usize,
}

#[derive(Debug, Default)]
pub struct PersistenceLayer {
    timer: DebounceTimer,
    dirty: bool,
    in_flight: bool,
    pending: BTreeSet<BoothKey>,
    sending: BTreeSet<BoothKey>,
}

impl PersistenceLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a local change and restarts the idle timer.
    pub fn note_mutation(&mut self, now: Millis, input: InputKind) {
        self.dirty = true;
        self.timer.schedule(now, input.idle_delay());
    }

    /// Marks a booth as changed locally until a write carrying it succeeds.
    pub fn track(&mut self, key: BoothKey) {
        self.pending.insert(key);
    }

    /// Booths whose local state the store has not confirmed.
    pub fn unacknowledged(&self) -> BTreeSet<BoothKey> {
        self.pending.union(&self.sending).cloned().collect()
    }

    pub fn is_due(&self, now: Millis) -> bool {
        self.timer.deadline().is_some_and(|deadline| now >= deadline)
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.timer.deadline()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether local edits exist that the store has not acknowledged.
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty || self.in_flight || self.timer.is_pending()
    }

    /// Fires the idle timer. A timer that expires while a write is still
    /// running is pushed back by another pointer delay.
    pub fn poll(&mut self, now: Millis) -> bool {
        if !self.timer.poll(now) {
            return false;
        }
        if self.in_flight {
            self.timer.schedule(now, POINTER_IDLE_MS);
            return false;
        }
        true
    }

    /// Starts a write: collects every saved booth and locks the scene.
    /// Returns `None` while another write is outstanding.
    pub fn begin_save(&mut self, editor: &mut PlacementEditor) -> Option<SaveBatch> {
        if self.in_flight {
            return None;
        }
        self.timer.cancel();
        let (records, skipped_drafts) = editor.save_records();
        self.dirty = false;
        self.sending = std::mem::take(&mut self.pending);
        self.in_flight = true;
        editor.set_interactive(false);
        Some(SaveBatch {
            records,
            skipped_drafts,
        })
    }

    pub fn finish_save(
        &mut self,
        editor: &mut PlacementEditor,
        batch: &SaveBatch,
        result: Result<(), StoreError>,
        notifier: &mut Notifier,
    ) {
        self.in_flight = false;
        editor.set_interactive(true);
        match result {
            Ok(()) => {
                self.sending.clear();
                tracing::debug!(count = batch.records.len(), "booth positions saved");
            }
            Err(error) => {
                self.dirty = true;
                let sent = std::mem::take(&mut self.sending);
                self.pending.extend(sent);
                notifier.error(format!("Could not save booth positions: {error}"));
            }
        }
        if batch.skipped_drafts > 0 {
            notifier.warn(format!(
                "{} new booth(s) need details before saving",
                batch.skipped_drafts
            ));
        }
    }

    /// Drops any pending write, e.g. when the editor goes away.
    pub fn cancel(&mut self) -> bool {
        self.timer.cancel()
    }
}
