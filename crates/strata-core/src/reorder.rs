//! Drag-and-drop intent resolution: legality, placement, optimistic
//! mutation, and rollback.
//!
//! The legality rules are the sole gate keeping the tree's type-pairing
//! invariant (and with it, acyclicity):
//!
//! | dragged | target            | outcome |
//! |---|---|---|
//! | epic    | none (root)       | legal — root placement |
//! | any     | same type         | legal — reorder within the target's sibling group |
//! | story   | feature           | legal — reparent as first child |
//! | feature | epic              | legal — reparent as first child |
//! | anything else | —           | rejected, no mutation, no history |
//!
//! [`plan_drop`] computes the placement without side effects; the hover
//! affordance re-evaluates it on every drag-over event via
//! [`drop_allowed`]. [`execute_drop`] performs the real thing: it records
//! the `move` history entry, commits the new flat list optimistically so
//! the UI reflects the move before the network confirms it, and rolls the
//! whole snapshot back if the persistence service refuses.

use std::fmt;

use crate::api::{ApiError, PersistenceApi};
use crate::history::{ChangeData, HistoryStore};
use crate::model::item::{ItemType, is_legal_parent};
use crate::model::{ItemId, Placement, WorkItem};
use crate::tree::TreeStore;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Why a drop was refused.
#[derive(Debug)]
pub enum ReorderError {
    /// The type pairing is not allowed by the hierarchy rules.
    IllegalDrop {
        dragged: ItemType,
        /// `None` means the root level.
        target: Option<ItemType>,
    },
    /// Dragged item or drop target is not in the tree.
    ItemNotFound(ItemId),
    /// The persistence service refused the move; the tree was rolled back.
    Api(ApiError),
}

impl fmt::Display for ReorderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalDrop { dragged, target } => match target {
                Some(target) => {
                    write!(f, "cannot drop a {dragged} onto a {target}")
                }
                None => write!(f, "cannot drop a {dragged} at the root level"),
            },
            Self::ItemNotFound(id) => write!(f, "item not found: '{id}'"),
            Self::Api(e) => write!(f, "move failed remotely: {e}"),
        }
    }
}

impl std::error::Error for ReorderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Api(e) = self {
            Some(e)
        } else {
            None
        }
    }
}

impl From<ApiError> for ReorderError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

// ---------------------------------------------------------------------------
// Planning (side-effect-free)
// ---------------------------------------------------------------------------

/// Decide whether dropping `dragged` onto `target` is legal and where the
/// item would land. `target = None` means a drop at the root level.
///
/// Pure: no state is touched. This is the same decision `execute_drop`
/// makes, so the hover affordance and the actual drop can never disagree.
///
/// # Errors
///
/// [`ReorderError::ItemNotFound`] when either id is unknown;
/// [`ReorderError::IllegalDrop`] when the type pairing is not allowed.
pub fn plan_drop(
    items: &[WorkItem],
    dragged: &ItemId,
    target: Option<&ItemId>,
) -> Result<Placement, ReorderError> {
    let dragged_item = items
        .iter()
        .find(|item| &item.id == dragged)
        .ok_or_else(|| ReorderError::ItemNotFound(dragged.clone()))?;

    let Some(target_id) = target else {
        // Rule 1: only epics live at the root.
        if dragged_item.item_type == ItemType::Epic {
            return Ok(Placement {
                parent_id: None,
                order_index: 0,
            });
        }
        return Err(ReorderError::IllegalDrop {
            dragged: dragged_item.item_type,
            target: None,
        });
    };

    let target_item = items
        .iter()
        .find(|item| &item.id == target_id)
        .ok_or_else(|| ReorderError::ItemNotFound(target_id.clone()))?;

    if dragged_item.item_type == target_item.item_type {
        // Rule 2: same type — reorder within the target's sibling group,
        // taking the target's position. Sibling re-sequencing is the
        // persistence service's responsibility.
        return Ok(Placement {
            parent_id: target_item.parent_id.clone(),
            order_index: target_item.order_index,
        });
    }

    if is_legal_parent(dragged_item.item_type, Some(target_item.item_type)) {
        // Rule 3: legal reparent — inserted as first child.
        return Ok(Placement {
            parent_id: Some(target_item.id.clone()),
            order_index: 0,
        });
    }

    // Rule 4: everything else is rejected.
    Err(ReorderError::IllegalDrop {
        dragged: dragged_item.item_type,
        target: Some(target_item.item_type),
    })
}

/// Hover-validity check for the drop affordance while dragging.
#[must_use]
pub fn drop_allowed(items: &[WorkItem], dragged: &ItemId, target: Option<&ItemId>) -> bool {
    plan_drop(items, dragged, target).is_ok()
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Perform a drop: record history, mutate the tree optimistically, and
/// confirm with the persistence service.
///
/// On remote failure the tree is restored to the pre-optimistic snapshot —
/// a full rollback, not a partial correction; the history entry recorded
/// before the optimistic commit is left in place (undoing it replays a
/// move to the placement the item already occupies, which is harmless).
///
/// # Errors
///
/// [`ReorderError::ItemNotFound`] / [`ReorderError::IllegalDrop`] reject
/// the drop before any state change; [`ReorderError::Api`] reports a
/// remote refusal after the rollback.
pub fn execute_drop(
    tree: &mut TreeStore,
    history: &mut HistoryStore,
    api: &mut dyn PersistenceApi,
    dragged: &ItemId,
    target: Option<&ItemId>,
    now_us: i64,
) -> Result<Placement, ReorderError> {
    let after = plan_drop(tree.items(), dragged, target)?;

    // plan_drop proved the item exists.
    let Some(dragged_item) = tree.item(dragged) else {
        return Err(ReorderError::ItemNotFound(dragged.clone()));
    };
    let before = dragged_item.placement();
    let description = match &after.parent_id {
        Some(parent_id) => {
            let parent_title = tree
                .item(parent_id)
                .map_or_else(|| parent_id.to_string(), |parent| parent.title.clone());
            format!("Moved '{}' under '{}'", dragged_item.title, parent_title)
        }
        None => format!("Moved '{}' to the root level", dragged_item.title),
    };
    history.record(
        dragged.clone(),
        description,
        ChangeData::Move {
            before: before.clone(),
            after: after.clone(),
        },
        now_us,
    );

    // Optimistic commit: the UI reflects the move before the network
    // confirms it.
    let snapshot = tree.items().to_vec();
    let mut next = snapshot.clone();
    for item in &mut next {
        if &item.id == dragged {
            item.parent_id.clone_from(&after.parent_id);
            item.order_index = after.order_index;
        }
    }
    tree.set_items(next);

    match api.move_item(dragged, after.parent_id.as_ref(), after.order_index) {
        Ok(()) => {
            tracing::debug!(item = %dragged, "move persisted");
            Ok(after)
        }
        Err(err) => {
            tracing::warn!(item = %dragged, "move rejected remotely, rolling back: {err}");
            tree.set_items(snapshot);
            Err(ReorderError::Api(err))
        }
    }
}
