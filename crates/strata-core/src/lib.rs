//! strata-core: the work-item hierarchy mutation engine.
//!
//! Strata breaks specification documents into an Epic → Feature → Story
//! backlog. Most of the product is CRUD surface; this crate is the part
//! with real invariants — the in-memory tree model, drag-and-drop
//! reparenting rules, and the command history that makes every edit
//! reversible while staying consistent with a remote persistence API
//! that can fail mid-operation.
//!
//! # Architecture
//!
//! - [`model`] — the entity, typed field patches, and the pure hierarchy
//!   projection (`build_hierarchy`).
//! - [`tree`] — the canonical flat list with a rebuild-on-write tree
//!   index, expansion/selection/filter state, and visibility traversal.
//! - [`history`] — the bounded undo/redo command stacks.
//! - [`editor`] — the single-item edit buffer with debounced autosave.
//! - [`reorder`] — drop legality, optimistic moves, rollback.
//! - [`replay`] — the undo/redo coordinator and its key-chord contract.
//! - [`api`] — the persistence collaborator trait the host implements.
//! - [`config`] — engine tunables.
//!
//! Stores are plain values with explicit lifecycles: construct one set
//! per session or view, pass them where they are needed. There are no
//! process-wide singletons, and time is always injected (`now_us`
//! parameters, a host-pumped [`editor::EditorStore::tick`]) so behavior
//! is deterministic under test.
//!
//! # Conventions
//!
//! - **Errors**: typed per-module error enums, propagated with `?`.
//! - **Logging**: `tracing` macros (`debug!` for applied mutations,
//!   `warn!` for rollbacks and best-effort remote failures).

pub mod api;
pub mod config;
pub mod editor;
pub mod history;
pub mod model;
pub mod reorder;
pub mod replay;
pub mod tree;
