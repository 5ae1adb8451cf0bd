//! Bounded undo/redo command history.
//!
//! Every mutating operation records a [`HistoryEntry`] at the moment it is
//! applied locally — before any network call resolves — so the undo stack
//! is never ahead of or behind the optimistic state. The store itself
//! applies no side effects: [`HistoryStore::undo`] and
//! [`HistoryStore::redo`] only move entries between the two stacks and
//! return them; replaying against the persistence service is the
//! coordinator's job (see [`crate::replay`]).
//!
//! Recording is suppressed while a replay is in progress, via the
//! [`ReplayMode`] state machine, so replay-triggered mutations cannot
//! re-enter history as new commands.
//!
//! Stack lifecycle:
//!
//! - a new entry always clears the redo stack;
//! - the undo stack is bounded; the oldest entry is evicted past capacity;
//! - `undo` moves the top undo entry to the redo stack, `redo` the reverse.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::item::ParseEnumError;
use crate::model::{ItemId, ItemPatch, Placement, WorkItem};

// ---------------------------------------------------------------------------
// Action catalog
// ---------------------------------------------------------------------------

/// The kinds of reversible command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Update,
    Move,
    Split,
    Merge,
    Create,
    Delete,
}

impl ActionKind {
    /// All action kinds in catalog order.
    pub const ALL: [Self; 6] = [
        Self::Update,
        Self::Move,
        Self::Split,
        Self::Merge,
        Self::Create,
        Self::Delete,
    ];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Move => "move",
            Self::Split => "split",
            Self::Merge => "merge",
            Self::Create => "create",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update" => Ok(Self::Update),
            "move" => Ok(Self::Move),
            "split" => Ok(Self::Split),
            "merge" => Ok(Self::Merge),
            "create" => Ok(Self::Create),
            "delete" => Ok(Self::Delete),
            _ => Err(ParseEnumError {
                expected: "action kind",
                got: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Command payloads
// ---------------------------------------------------------------------------

/// Typed before/after payload for each command kind.
///
/// Multi-item commands (`Split`, `Merge`) store the full payloads of every
/// item they removed, so no information needed for a future reconstruction
/// policy is lost — even though remote replay currently skips them (the
/// persistence service exposes no inverse operation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeData {
    /// Field edit: partial snapshots of only the changed fields.
    Update { before: ItemPatch, after: ItemPatch },
    /// Reparent/reorder: placement snapshots.
    Move { before: Placement, after: Placement },
    /// Item created; payload is the created entity.
    Create { item: WorkItem },
    /// Item deleted; payload is the entity as it was at deletion.
    Delete { item: WorkItem },
    /// One item split into several.
    Split { source: WorkItem, produced: Vec<ItemId> },
    /// Several items merged into one.
    Merge { absorbed: Vec<WorkItem>, into: ItemId },
}

impl ChangeData {
    /// The action kind this payload belongs to.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Update { .. } => ActionKind::Update,
            Self::Move { .. } => ActionKind::Move,
            Self::Create { .. } => ActionKind::Create,
            Self::Delete { .. } => ActionKind::Delete,
            Self::Split { .. } => ActionKind::Split,
            Self::Merge { .. } => ActionKind::Merge,
        }
    }

    /// Other items affected besides the primary one (split products,
    /// merge sources). Empty for single-item commands.
    pub fn related_ids(&self) -> Vec<ItemId> {
        match self {
            Self::Split { produced, .. } => produced.clone(),
            Self::Merge { absorbed, .. } => absorbed.iter().map(|i| i.id.clone()).collect(),
            _ => Vec::new(),
        }
    }
}

/// One reversible command, as recorded on the stacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Store-local monotonic id.
    pub id: u64,
    /// When the command was applied locally, in microseconds.
    pub recorded_at_us: i64,
    /// The primary affected item.
    pub item_id: ItemId,
    /// Human-readable description ("Updated title on 'Login flow'").
    pub description: String,
    pub data: ChangeData,
}

impl HistoryEntry {
    pub const fn kind(&self) -> ActionKind {
        self.data.kind()
    }

    pub fn related_ids(&self) -> Vec<ItemId> {
        self.data.related_ids()
    }
}

// ---------------------------------------------------------------------------
// Replay mode
// ---------------------------------------------------------------------------

/// What the coordinator is currently replaying, if anything.
///
/// A single mode value (rather than independent undoing/redoing booleans)
/// makes the illegal "both at once" state unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayMode {
    #[default]
    Idle,
    Undoing,
    Redoing,
}

impl ReplayMode {
    pub const fn is_replaying(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Two-stack bounded command history.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    mode: ReplayMode,
    next_id: u64,
    max_entries: usize,
}

impl HistoryStore {
    /// Create an empty history bounded at `max_entries`.
    pub fn new(max_entries: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            mode: ReplayMode::Idle,
            next_id: 0,
            max_entries,
        }
    }

    /// Record a new command.
    ///
    /// Returns the entry id, or `None` while a replay is in progress —
    /// replay-triggered mutations must not re-enter history. Recording
    /// unconditionally clears the redo stack and evicts the oldest undo
    /// entry once the stack exceeds its capacity.
    pub fn record(
        &mut self,
        item_id: ItemId,
        description: impl Into<String>,
        data: ChangeData,
        now_us: i64,
    ) -> Option<u64> {
        if self.mode.is_replaying() {
            tracing::debug!("history record suppressed during replay");
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        let entry = HistoryEntry {
            id,
            recorded_at_us: now_us,
            item_id,
            description: description.into(),
            data,
        };
        tracing::debug!(id, kind = %entry.kind(), "history recorded: {}", entry.description);

        self.redo.clear();
        self.undo.push(entry);
        if self.undo.len() > self.max_entries {
            let evicted = self.undo.remove(0);
            tracing::debug!(id = evicted.id, "history evicted oldest entry");
        }
        Some(id)
    }

    /// Pop the most recent command onto the redo stack and return it.
    ///
    /// No side effects beyond the stacks: the caller replays the entry's
    /// `before` side against the persistence service.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        let entry = self.undo.pop()?;
        self.redo.push(entry.clone());
        Some(entry)
    }

    /// Pop the most recently undone command back onto the undo stack and
    /// return it. The caller replays the entry's `after` side.
    pub fn redo(&mut self) -> Option<HistoryEntry> {
        let entry = self.redo.pop()?;
        self.undo.push(entry.clone());
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Description of the command `undo` would pop, for UI affordances.
    pub fn undo_description(&self) -> Option<&str> {
        self.undo.last().map(|e| e.description.as_str())
    }

    /// Description of the command `redo` would pop.
    pub fn redo_description(&self) -> Option<&str> {
        self.redo.last().map(|e| e.description.as_str())
    }

    /// The undo stack, oldest first.
    pub fn undo_entries(&self) -> &[HistoryEntry] {
        &self.undo
    }

    /// The redo stack, oldest first.
    pub fn redo_entries(&self) -> &[HistoryEntry] {
        &self.redo
    }

    pub fn mode(&self) -> ReplayMode {
        self.mode
    }

    /// Enter a replay. Returns `false` (and changes nothing) when a replay
    /// is already in progress or `mode` is `Idle`.
    pub fn begin_replay(&mut self, mode: ReplayMode) -> bool {
        if self.mode.is_replaying() || !mode.is_replaying() {
            return false;
        }
        self.mode = mode;
        true
    }

    /// Leave replay mode.
    pub fn end_replay(&mut self) {
        self.mode = ReplayMode::Idle;
    }

    /// Drop both stacks (session reset). Replay mode is untouched.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(crate::config::EngineConfig::default().max_history)
    }
}
