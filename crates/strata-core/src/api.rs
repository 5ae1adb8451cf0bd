//! Persistence collaborator interface.
//!
//! The engine never talks to a transport directly; it calls this trait and
//! lets the host decide what sits behind it (HTTP client, IPC, in-memory
//! fake). Calls are synchronous from the engine's point of view — the
//! engine is single-threaded and cooperative, and a host that needs an
//! async transport blocks inside its impl.
//!
//! Engine code takes `&mut dyn PersistenceApi` as a parameter rather than
//! holding the collaborator, so stores stay plain data and tests can hand
//! in a scripted fake per call.

use crate::model::{ItemId, ItemPatch, WorkItem};

/// Failure reported by the persistence service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The service answered and rejected the request (non-2xx).
    #[error("persistence rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never completed (connection, timeout, serialization).
    #[error("persistence transport failure: {0}")]
    Transport(#[from] anyhow::Error),
}

/// Remote persistence operations for work items.
///
/// Retry and backoff are the implementor's concern; the engine treats a
/// returned error as final for the operation at hand.
pub trait PersistenceApi {
    /// Apply a partial field update and return the updated entity.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the service rejects the patch or the
    /// request does not complete.
    fn update(&mut self, id: &ItemId, patch: &ItemPatch) -> Result<WorkItem, ApiError>;

    /// Reparent and/or reorder an item. `parent_id = None` moves it to the
    /// root level. The service re-sequences siblings as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the service rejects the move or the
    /// request does not complete.
    fn move_item(
        &mut self,
        id: &ItemId,
        parent_id: Option<&ItemId>,
        order_index: i64,
    ) -> Result<(), ApiError>;

    /// Merge several items into one, returning the merged entity.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the service rejects the merge or the
    /// request does not complete.
    fn merge(&mut self, ids: &[ItemId], merged: &ItemPatch) -> Result<WorkItem, ApiError>;

    /// Split one item into several, returning the produced entities.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the service rejects the split or the
    /// request does not complete.
    fn split(&mut self, id: &ItemId, suggestions: &[ItemPatch])
    -> Result<Vec<WorkItem>, ApiError>;
}
