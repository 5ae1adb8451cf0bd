//! Single-item edit buffer with dirty tracking and debounced autosave.
//!
//! The buffer holds a working copy of the open item (`current`) and the
//! last-known-persisted snapshot (`original`); the accumulated difference
//! between them is a typed [`ItemPatch`]. Field edits re-arm a debounce
//! deadline, so a burst of keystrokes coalesces into a single save once
//! editing pauses for the configured quiet period.
//!
//! Time is injected: the engine never reads a clock. Callers pass `now_us`
//! into every time-sensitive method and pump [`EditorStore::tick`] from
//! their event loop; the deadline fires when `now_us` passes it.
//!
//! Save ordering matters: the history entry (with the `previous_state`
//! captured off `original` for exactly the changed fields) is recorded
//! **before** the persistence call, so an undo is available even while the
//! save is in flight or after it fails. A failed save keeps the pending
//! diff and dirty flag — edits are never thrown away on error, and the
//! next edit or a manual retry clears `save_error`.
//!
//! Switching items flushes first: an outgoing dirty buffer is saved before
//! the buffer resets, so navigation never silently discards edits.

#![allow(clippy::must_use_candidate)]

use crate::api::{ApiError, PersistenceApi};
use crate::config::EngineConfig;
use crate::history::{ChangeData, HistoryStore};
use crate::model::{FieldPatch, ItemPatch, WorkItem};

/// Edit buffer for the currently open work item.
#[derive(Debug, Clone, Default)]
pub struct EditorStore {
    current: Option<WorkItem>,
    original: Option<WorkItem>,
    pending: ItemPatch,
    dirty: bool,
    saving: bool,
    last_saved_us: Option<i64>,
    save_error: Option<String>,
    flush_due_us: Option<i64>,
    debounce_us: i64,
}

impl EditorStore {
    /// Create an empty buffer with the given tunables.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            debounce_us: config.debounce_us,
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------------
    // Buffer lifecycle
    // -----------------------------------------------------------------------

    /// Open `item` for editing.
    ///
    /// If the outgoing buffer is dirty it is flushed first (the history
    /// entry lands either way; a failed flush is logged and does not block
    /// the switch). Any armed debounce deadline is cancelled and the
    /// buffer resets to the new item with an empty diff.
    pub fn open(
        &mut self,
        item: WorkItem,
        history: &mut HistoryStore,
        api: &mut dyn PersistenceApi,
        now_us: i64,
    ) {
        self.flush_outgoing(history, api, now_us);
        self.flush_due_us = None;
        self.current = Some(item.clone());
        self.original = Some(item);
        self.pending.clear();
        self.dirty = false;
        self.save_error = None;
    }

    /// Deselect: flush an outgoing dirty buffer, then clear everything.
    pub fn close(
        &mut self,
        history: &mut HistoryStore,
        api: &mut dyn PersistenceApi,
        now_us: i64,
    ) {
        self.flush_outgoing(history, api, now_us);
        self.flush_due_us = None;
        self.current = None;
        self.original = None;
        self.pending.clear();
        self.dirty = false;
        self.save_error = None;
    }

    fn flush_outgoing(
        &mut self,
        history: &mut HistoryStore,
        api: &mut dyn PersistenceApi,
        now_us: i64,
    ) {
        if !self.dirty {
            return;
        }
        // A failed flush is already recorded in save_error and logged; the
        // pending diff was captured to history before the call, so the
        // edit stays recoverable after the buffer switches.
        let _ = self.save(history, api, now_us);
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Apply one field edit to the working copy.
    ///
    /// Accumulates into the pending diff (last write per field wins),
    /// marks the buffer dirty, clears any previous save error, and
    /// re-arms the debounce deadline — only a pause in editing of the
    /// full debounce window triggers a save, not one save per keystroke.
    /// Ignored when no item is open.
    pub fn set_field(&mut self, edit: FieldPatch, now_us: i64) {
        let Some(current) = self.current.as_mut() else {
            tracing::debug!("field edit with no open item ignored");
            return;
        };
        edit.apply_to(current);
        self.pending.set(edit);
        self.dirty = true;
        self.save_error = None;
        self.flush_due_us = Some(now_us + self.debounce_us);
    }

    /// Fire the debounced save if its deadline has passed.
    ///
    /// Hosts pump this from their event loop. Returns `true` when a save
    /// attempt fired (its outcome lands in the status fields).
    pub fn tick(
        &mut self,
        history: &mut HistoryStore,
        api: &mut dyn PersistenceApi,
        now_us: i64,
    ) -> bool {
        match self.flush_due_us {
            Some(due) if now_us >= due => {
                // A failure lands in save_error; the deadline stays
                // disarmed until the next edit re-arms it.
                let _ = self.save(history, api, now_us);
                true
            }
            _ => false,
        }
    }

    /// Persist the pending diff.
    ///
    /// No-op (returns `Ok(false)`) when the buffer is clean. Otherwise
    /// cancels the debounce deadline, records the `update` history entry —
    /// previous values captured off `original` for exactly the changed
    /// fields — and then calls the persistence service. On success the
    /// buffer adopts the returned entity as both working copy and
    /// persisted snapshot. On failure the pending diff and dirty flag are
    /// left untouched so a retry is possible.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] from the persistence service; the same
    /// failure is also surfaced via [`Self::save_error`].
    pub fn save(
        &mut self,
        history: &mut HistoryStore,
        api: &mut dyn PersistenceApi,
        now_us: i64,
    ) -> Result<bool, ApiError> {
        if !self.dirty || self.pending.is_empty() {
            return Ok(false);
        }
        let Some(item) = self.current.clone() else {
            return Ok(false);
        };

        self.flush_due_us = None;
        self.saving = true;

        let baseline = self.original.as_ref().unwrap_or(&item);
        let before = ItemPatch::capture(baseline, self.pending.fields());
        let description = format!("Updated {} on '{}'", self.pending.summary(), item.title);
        history.record(
            item.id.clone(),
            description,
            ChangeData::Update {
                before,
                after: self.pending.clone(),
            },
            now_us,
        );

        match api.update(&item.id, &self.pending) {
            Ok(updated) => {
                self.current = Some(updated.clone());
                self.original = Some(updated);
                self.pending.clear();
                self.dirty = false;
                self.saving = false;
                self.save_error = None;
                self.last_saved_us = Some(now_us);
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(item = %item.id, "save failed: {err}");
                self.save_error = Some(err.to_string());
                self.saving = false;
                Err(err)
            }
        }
    }

    /// Throw away the pending diff and revert the working copy to the
    /// last persisted snapshot.
    pub fn discard(&mut self) {
        self.flush_due_us = None;
        if let Some(original) = self.original.clone() {
            self.current = Some(original);
        }
        self.pending.clear();
        self.dirty = false;
        self.save_error = None;
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    pub fn current(&self) -> Option<&WorkItem> {
        self.current.as_ref()
    }

    /// The last-known-persisted snapshot of the open item.
    pub fn original(&self) -> Option<&WorkItem> {
        self.original.as_ref()
    }

    /// The accumulated diff since the last persisted snapshot.
    pub fn pending(&self) -> &ItemPatch {
        &self.pending
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn last_saved_us(&self) -> Option<i64> {
        self.last_saved_us
    }

    pub fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    /// When the armed debounce deadline fires, if one is armed.
    pub fn flush_due_us(&self) -> Option<i64> {
        self.flush_due_us
    }
}
