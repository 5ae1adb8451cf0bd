//! Shared test support: item constructors and a scripted persistence
//! collaborator.
//!
//! Included from sibling test files via `#[path = "support.rs"]`, mirroring
//! how the core test suites share their generators.

use strata_core::api::{ApiError, PersistenceApi};
use strata_core::model::{ItemId, ItemPatch, ItemType, WorkItem};

/// One observed call on the collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Update {
        id: ItemId,
        patch: ItemPatch,
    },
    Move {
        id: ItemId,
        parent_id: Option<ItemId>,
        order_index: i64,
    },
}

/// Scripted collaborator: records every call and fails on demand.
///
/// `update` answers with the patch applied to a fresh entity carrying the
/// requested id, which is close enough to "the server's returned entity"
/// for buffer-adoption assertions.
#[derive(Debug, Default)]
pub struct RecordingApi {
    pub calls: Vec<ApiCall>,
    pub fail_updates: bool,
    pub fail_moves: bool,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_calls(&self) -> Vec<&ApiCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, ApiCall::Update { .. }))
            .collect()
    }

    pub fn move_calls(&self) -> Vec<&ApiCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, ApiCall::Move { .. }))
            .collect()
    }

    fn rejected(status: u16) -> ApiError {
        ApiError::Rejected {
            status,
            message: "scripted failure".into(),
        }
    }
}

impl PersistenceApi for RecordingApi {
    fn update(&mut self, id: &ItemId, patch: &ItemPatch) -> Result<WorkItem, ApiError> {
        self.calls.push(ApiCall::Update {
            id: id.clone(),
            patch: patch.clone(),
        });
        if self.fail_updates {
            return Err(Self::rejected(500));
        }
        let mut updated = WorkItem {
            id: id.clone(),
            ..WorkItem::default()
        };
        patch.apply_to(&mut updated);
        Ok(updated)
    }

    fn move_item(
        &mut self,
        id: &ItemId,
        parent_id: Option<&ItemId>,
        order_index: i64,
    ) -> Result<(), ApiError> {
        self.calls.push(ApiCall::Move {
            id: id.clone(),
            parent_id: parent_id.cloned(),
            order_index,
        });
        if self.fail_moves {
            return Err(Self::rejected(409));
        }
        Ok(())
    }

    fn merge(&mut self, _ids: &[ItemId], _merged: &ItemPatch) -> Result<WorkItem, ApiError> {
        unimplemented!("merge is not exercised by these suites")
    }

    fn split(
        &mut self,
        _id: &ItemId,
        _suggestions: &[ItemPatch],
    ) -> Result<Vec<WorkItem>, ApiError> {
        unimplemented!("split is not exercised by these suites")
    }
}

/// Build a work item with minimal ceremony.
pub fn item(id: &str, item_type: ItemType, parent: Option<&str>, order: i64) -> WorkItem {
    WorkItem {
        id: id.into(),
        item_type,
        parent_id: parent.map(ItemId::new),
        order_index: order,
        title: format!("Title for {id}"),
        ..WorkItem::default()
    }
}
