//! Undo/redo coordination: pop a history entry, replay it against the
//! persistence service, refresh.
//!
//! The coordinator owns the side effects the [`crate::history`] store
//! deliberately avoids. An undo replays the entry's **before** side, a
//! redo the **after** side:
//!
//! | entry kind | remote replay |
//! |---|---|
//! | `update` | `update` with the previous/new field patch |
//! | `move` | `move_item` to the previous/new placement |
//! | `create`, `delete`, `split`, `merge` | skipped with a reason |
//!
//! Multi-item and lifecycle kinds are skipped because the persistence
//! service exposes no inverse operation for them; the stacks still flip
//! so local history stays consistent, and the refresh callback lets the
//! host re-fetch canonical state.
//!
//! Replay is best-effort by design: a remote failure is logged and
//! reported in the outcome, the stacks flip anyway, and the refresh
//! callback always fires. The engine favors local history consistency
//! over strict agreement with the server; reconciliation is the refresh's
//! job. Re-entrancy is guarded through the history store's
//! [`ReplayMode`]: a second undo/redo while one is in flight is a no-op,
//! and any mutation a replay triggers is suppressed from recording.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::api::{ApiError, PersistenceApi};
use crate::history::{ChangeData, HistoryEntry, HistoryStore, ReplayMode};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// What happened on the remote side of a replay.
#[derive(Debug)]
pub enum RemoteReplay {
    /// The persistence service accepted the replayed operation.
    Applied,
    /// This entry kind has no remote inverse; nothing was sent.
    Skipped { reason: String },
    /// The persistence service refused; the stacks flipped anyway.
    Failed { error: ApiError },
}

impl RemoteReplay {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Result of one undo or redo: the entry that moved stacks and how the
/// remote replay went.
#[derive(Debug)]
pub struct ReplayOutcome {
    pub entry: HistoryEntry,
    pub remote: RemoteReplay,
}

// ---------------------------------------------------------------------------
// Coordinator entry points
// ---------------------------------------------------------------------------

/// Undo the most recent command.
///
/// Returns `None` when there is nothing to undo or a replay is already in
/// progress. The refresh callback fires on every actual replay, success
/// or handled failure, so the host can re-fetch canonical state.
pub fn undo(
    history: &mut HistoryStore,
    api: &mut dyn PersistenceApi,
    refresh: &mut dyn FnMut(),
) -> Option<ReplayOutcome> {
    replay(history, api, refresh, ReplayMode::Undoing)
}

/// Redo the most recently undone command. Mirror of [`undo`].
pub fn redo(
    history: &mut HistoryStore,
    api: &mut dyn PersistenceApi,
    refresh: &mut dyn FnMut(),
) -> Option<ReplayOutcome> {
    replay(history, api, refresh, ReplayMode::Redoing)
}

fn replay(
    history: &mut HistoryStore,
    api: &mut dyn PersistenceApi,
    refresh: &mut dyn FnMut(),
    mode: ReplayMode,
) -> Option<ReplayOutcome> {
    if !history.begin_replay(mode) {
        tracing::debug!("replay ignored: another replay is in progress");
        return None;
    }

    let entry = match mode {
        ReplayMode::Undoing => history.undo(),
        ReplayMode::Redoing => history.redo(),
        ReplayMode::Idle => None, // begin_replay rejects Idle
    };
    let Some(entry) = entry else {
        history.end_replay();
        return None;
    };

    let remote = replay_remote(&entry, mode, api);
    refresh();
    history.end_replay();

    Some(ReplayOutcome { entry, remote })
}

/// Send the appropriate side of `entry` to the persistence service.
fn replay_remote(
    entry: &HistoryEntry,
    mode: ReplayMode,
    api: &mut dyn PersistenceApi,
) -> RemoteReplay {
    let undoing = mode == ReplayMode::Undoing;
    match &entry.data {
        ChangeData::Update { before, after } => {
            let patch = if undoing { before } else { after };
            if patch.is_empty() {
                return RemoteReplay::Skipped {
                    reason: "empty field snapshot".to_string(),
                };
            }
            match api.update(&entry.item_id, patch) {
                Ok(_) => RemoteReplay::Applied,
                Err(error) => {
                    tracing::warn!(item = %entry.item_id, "replay update failed: {error}");
                    RemoteReplay::Failed { error }
                }
            }
        }
        ChangeData::Move { before, after } => {
            let placement = if undoing { before } else { after };
            match api.move_item(
                &entry.item_id,
                placement.parent_id.as_ref(),
                placement.order_index,
            ) {
                Ok(()) => RemoteReplay::Applied,
                Err(error) => {
                    tracing::warn!(item = %entry.item_id, "replay move failed: {error}");
                    RemoteReplay::Failed { error }
                }
            }
        }
        ChangeData::Create { .. }
        | ChangeData::Delete { .. }
        | ChangeData::Split { .. }
        | ChangeData::Merge { .. } => {
            let reason = format!(
                "no remote inverse for {} commands; refresh reconciles",
                entry.kind()
            );
            tracing::warn!(item = %entry.item_id, "replay skipped: {reason}");
            RemoteReplay::Skipped { reason }
        }
    }
}

// ---------------------------------------------------------------------------
// Keyboard contract
// ---------------------------------------------------------------------------

/// What a key chord asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayIntent {
    Undo,
    Redo,
}

/// Map a key event to an undo/redo intent.
///
/// Ctrl+Z (or Cmd+Z) undoes; Ctrl+Shift+Z and Ctrl+Y (or their Cmd
/// variants) redo. `Some(..)` means the host must consume the event
/// instead of forwarding it. The mapping is pure — the in-flight guard
/// lives in [`undo`]/[`redo`] themselves.
#[must_use]
pub fn replay_intent(key: &KeyEvent) -> Option<ReplayIntent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let mods = key.modifiers;
    if !mods.contains(KeyModifiers::CONTROL) && !mods.contains(KeyModifiers::SUPER) {
        return None;
    }
    match key.code {
        KeyCode::Char('z' | 'Z') if mods.contains(KeyModifiers::SHIFT) => Some(ReplayIntent::Redo),
        KeyCode::Char('z') => Some(ReplayIntent::Undo),
        KeyCode::Char('y' | 'Y') => Some(ReplayIntent::Redo),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{RemoteReplay, ReplayIntent, redo, replay_intent, undo};
    use crate::api::{ApiError, PersistenceApi};
    use crate::history::{ChangeData, HistoryStore, ReplayMode};
    use crate::model::item::WorkItem;
    use crate::model::item_id::ItemId;
    use crate::model::patch::{Field, FieldPatch, ItemPatch, Placement};
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

    #[derive(Default)]
    struct StubApi {
        updates: Vec<(ItemId, ItemPatch)>,
        moves: Vec<(ItemId, Option<ItemId>, i64)>,
        fail_all: bool,
    }

    fn refused() -> ApiError {
        ApiError::Rejected {
            status: 500,
            message: "replay refused".into(),
        }
    }

    impl PersistenceApi for StubApi {
        fn update(&mut self, id: &ItemId, patch: &ItemPatch) -> Result<WorkItem, ApiError> {
            self.updates.push((id.clone(), patch.clone()));
            if self.fail_all {
                return Err(refused());
            }
            Ok(WorkItem {
                id: id.clone(),
                ..WorkItem::default()
            })
        }

        fn move_item(
            &mut self,
            id: &ItemId,
            parent_id: Option<&ItemId>,
            order_index: i64,
        ) -> Result<(), ApiError> {
            self.moves.push((id.clone(), parent_id.cloned(), order_index));
            if self.fail_all {
                return Err(refused());
            }
            Ok(())
        }

        fn merge(&mut self, _ids: &[ItemId], _merged: &ItemPatch) -> Result<WorkItem, ApiError> {
            unimplemented!("not exercised by replay tests")
        }

        fn split(
            &mut self,
            _id: &ItemId,
            _suggestions: &[ItemPatch],
        ) -> Result<Vec<WorkItem>, ApiError> {
            unimplemented!("not exercised by replay tests")
        }
    }

    fn update_entry(history: &mut HistoryStore) {
        history.record(
            "s1".into(),
            "Updated title on 'Login flow'",
            ChangeData::Update {
                before: [FieldPatch::Title("old".into())].into_iter().collect(),
                after: [FieldPatch::Title("new".into())].into_iter().collect(),
            },
            0,
        );
    }

    fn move_entry(history: &mut HistoryStore) {
        history.record(
            "s1".into(),
            "Moved 'Login flow' under 'Checkout'",
            ChangeData::Move {
                before: Placement {
                    parent_id: Some("f1".into()),
                    order_index: 0,
                },
                after: Placement {
                    parent_id: Some("f2".into()),
                    order_index: 0,
                },
            },
            0,
        );
    }

    #[test]
    fn undo_update_replays_previous_state() {
        let mut history = HistoryStore::new(50);
        let mut api = StubApi::default();
        update_entry(&mut history);

        let mut refreshed = 0;
        let outcome = undo(&mut history, &mut api, &mut || refreshed += 1).expect("outcome");

        assert!(outcome.remote.is_applied());
        assert_eq!(refreshed, 1, "refresh fired");
        assert_eq!(api.updates.len(), 1);
        assert_eq!(
            api.updates[0].1.get(Field::Title),
            Some(&FieldPatch::Title("old".into())),
            "undo sends the before side"
        );
        assert!(history.can_redo());
        assert!(!history.can_undo());
        assert_eq!(history.mode(), ReplayMode::Idle, "flag cleared");
    }

    #[test]
    fn redo_update_replays_new_state() {
        let mut history = HistoryStore::new(50);
        let mut api = StubApi::default();
        update_entry(&mut history);

        undo(&mut history, &mut api, &mut || {});
        let outcome = redo(&mut history, &mut api, &mut || {}).expect("outcome");

        assert!(outcome.remote.is_applied());
        assert_eq!(api.updates.len(), 2);
        assert_eq!(
            api.updates[1].1.get(Field::Title),
            Some(&FieldPatch::Title("new".into())),
            "redo sends the after side"
        );
        assert!(history.can_undo());
    }

    #[test]
    fn undo_move_replays_previous_placement() {
        let mut history = HistoryStore::new(50);
        let mut api = StubApi::default();
        move_entry(&mut history);

        undo(&mut history, &mut api, &mut || {}).expect("outcome");
        assert_eq!(api.moves.len(), 1);
        assert_eq!(api.moves[0], ("s1".into(), Some("f1".into()), 0));

        redo(&mut history, &mut api, &mut || {}).expect("outcome");
        assert_eq!(api.moves[1], ("s1".into(), Some("f2".into()), 0));
    }

    #[test]
    fn empty_stack_is_a_no_op() {
        let mut history = HistoryStore::new(50);
        let mut api = StubApi::default();
        let mut refreshed = 0;

        assert!(undo(&mut history, &mut api, &mut || refreshed += 1).is_none());
        assert!(redo(&mut history, &mut api, &mut || refreshed += 1).is_none());
        assert_eq!(refreshed, 0, "no refresh without a replay");
        assert_eq!(history.mode(), ReplayMode::Idle);
    }

    #[test]
    fn remote_failure_still_flips_the_stacks_and_refreshes() {
        let mut history = HistoryStore::new(50);
        let mut api = StubApi::default();
        api.fail_all = true;
        update_entry(&mut history);

        let mut refreshed = 0;
        let outcome = undo(&mut history, &mut api, &mut || refreshed += 1).expect("outcome");

        assert!(matches!(outcome.remote, RemoteReplay::Failed { .. }));
        assert!(history.can_redo(), "stacks flipped regardless");
        assert_eq!(refreshed, 1, "refresh reconciles the divergence");
        assert_eq!(history.mode(), ReplayMode::Idle, "flag cleared on failure");
    }

    #[test]
    fn replay_in_progress_blocks_reentry() {
        let mut history = HistoryStore::new(50);
        let mut api = StubApi::default();
        update_entry(&mut history);

        assert!(history.begin_replay(ReplayMode::Undoing));
        assert!(undo(&mut history, &mut api, &mut || {}).is_none());
        assert!(api.updates.is_empty());
        history.end_replay();
    }

    #[test]
    fn merge_and_split_are_skipped_with_reason() {
        let mut history = HistoryStore::new(50);
        let mut api = StubApi::default();
        history.record(
            "s3".into(),
            "Merged 2 stories into 'Combined'",
            ChangeData::Merge {
                absorbed: vec![WorkItem {
                    id: "s1".into(),
                    ..WorkItem::default()
                }],
                into: "s3".into(),
            },
            0,
        );

        let mut refreshed = 0;
        let outcome = undo(&mut history, &mut api, &mut || refreshed += 1).expect("outcome");
        let RemoteReplay::Skipped { reason } = &outcome.remote else {
            panic!("expected skip");
        };
        assert!(reason.contains("merge"), "reason: {reason}");
        assert!(api.updates.is_empty());
        assert!(api.moves.is_empty());
        assert_eq!(refreshed, 1, "refresh still fires");
        assert!(history.can_redo(), "stacks still flip");
    }

    #[test]
    fn replay_does_not_rerecord_history() {
        let mut history = HistoryStore::new(50);
        let mut api = StubApi::default();
        update_entry(&mut history);

        undo(&mut history, &mut api, &mut || {});
        // One entry total, now on the redo stack; nothing re-entered undo.
        assert_eq!(history.undo_entries().len(), 0);
        assert_eq!(history.redo_entries().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Key chords
    // -----------------------------------------------------------------------

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn ctrl_z_is_undo() {
        let key = press(KeyCode::Char('z'), KeyModifiers::CONTROL);
        assert_eq!(replay_intent(&key), Some(ReplayIntent::Undo));
    }

    #[test]
    fn cmd_z_is_undo() {
        let key = press(KeyCode::Char('z'), KeyModifiers::SUPER);
        assert_eq!(replay_intent(&key), Some(ReplayIntent::Undo));
    }

    #[test]
    fn ctrl_shift_z_is_redo() {
        let key = press(
            KeyCode::Char('Z'),
            KeyModifiers::CONTROL | KeyModifiers::SHIFT,
        );
        assert_eq!(replay_intent(&key), Some(ReplayIntent::Redo));
    }

    #[test]
    fn ctrl_y_is_redo() {
        let key = press(KeyCode::Char('y'), KeyModifiers::CONTROL);
        assert_eq!(replay_intent(&key), Some(ReplayIntent::Redo));
    }

    #[test]
    fn unmodified_or_unrelated_keys_pass_through() {
        assert_eq!(
            replay_intent(&press(KeyCode::Char('z'), KeyModifiers::NONE)),
            None
        );
        assert_eq!(
            replay_intent(&press(KeyCode::Char('x'), KeyModifiers::CONTROL)),
            None
        );
    }

    #[test]
    fn key_release_is_ignored() {
        let mut key = press(KeyCode::Char('z'), KeyModifiers::CONTROL);
        key.kind = KeyEventKind::Release;
        assert_eq!(replay_intent(&key), None);
    }
}
