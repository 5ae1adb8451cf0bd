//! Work-item model: entity, identifiers, typed patches, and the tree
//! projection.

pub mod hierarchy;
pub mod item;
pub mod item_id;
pub mod patch;

pub use hierarchy::{TreeNode, build_hierarchy};
pub use item::{ItemType, ParseEnumError, SizeEstimate, Status, WorkItem, is_legal_parent};
pub use item_id::ItemId;
pub use patch::{Field, FieldPatch, ItemPatch, Placement};
