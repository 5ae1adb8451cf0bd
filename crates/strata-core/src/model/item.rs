//! Work-item entity and its enums, plus the hierarchy-legality predicate.
//!
//! The breakdown tree has a fixed three-level type hierarchy: epics contain
//! features, features contain stories. The type of an item fully determines
//! the type its parent must have, which is what makes cycles structurally
//! impossible as long as [`is_legal_parent`] holds at every edge.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::item_id::ItemId;
use super::patch::Placement;

/// The three strata of the breakdown tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Epic,
    Feature,
    Story,
}

impl ItemType {
    /// All item types, top of the hierarchy first.
    pub const ALL: [Self; 3] = [Self::Epic, Self::Feature, Self::Story];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Epic => "epic",
            Self::Feature => "feature",
            Self::Story => "story",
        }
    }

    /// The parent type this item type requires: `None` means the item must
    /// be a root.
    pub const fn required_parent(self) -> Option<Self> {
        match self {
            Self::Epic => None,
            Self::Feature => Some(Self::Epic),
            Self::Story => Some(Self::Feature),
        }
    }
}

/// Whether `parent` is a legal parent type for a `child` of the given type.
///
/// `None` stands for the root level. Exactly one pairing is legal per child
/// type: epics at root, features under epics, stories under features.
pub fn is_legal_parent(child: ItemType, parent: Option<ItemType>) -> bool {
    child.required_parent() == parent
}

/// Review lifecycle of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Draft,
    ReadyForReview,
    Approved,
    Exported,
}

impl Status {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::ReadyForReview => "ready_for_review",
            Self::Approved => "approved",
            Self::Exported => "exported",
        }
    }
}

/// T-shirt size estimate. Meaningful only for stories; the persistence
/// service owns that validation, the engine just carries the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeEstimate {
    Xs,
    S,
    M,
    L,
    Xl,
}

impl SizeEstimate {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Xs => "xs",
            Self::S => "s",
            Self::M => "m",
            Self::L => "l",
            Self::Xl => "xl",
        }
    }
}

/// A node in the breakdown tree, in its canonical flat form.
///
/// `children` is deliberately not a field: the hierarchical view is a pure
/// projection built by [`super::hierarchy::build_hierarchy`] from
/// `parent_id` and `order_index` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkItem {
    pub id: ItemId,
    pub item_type: ItemType,
    /// Containing item, or `None` for a root (only epics may be roots).
    pub parent_id: Option<ItemId>,
    /// Sort key among siblings sharing the same `parent_id`. Values need
    /// not be contiguous; ties break on stable insertion order.
    pub order_index: i64,
    pub title: String,
    pub description: String,
    pub acceptance_criteria: String,
    pub technical_notes: String,
    pub status: Status,
    pub size_estimate: Option<SizeEstimate>,
}

impl Default for WorkItem {
    fn default() -> Self {
        Self {
            id: ItemId::new(""),
            item_type: ItemType::Story,
            parent_id: None,
            order_index: 0,
            title: String::new(),
            description: String::new(),
            acceptance_criteria: String::new(),
            technical_notes: String::new(),
            status: Status::Draft,
            size_estimate: None,
        }
    }
}

impl WorkItem {
    /// The item's current position in the tree as a snapshot pair payload.
    pub fn placement(&self) -> Placement {
        Placement {
            parent_id: self.parent_id.clone(),
            order_index: self.order_index,
        }
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SizeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for ItemType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "epic" => Ok(Self::Epic),
            "feature" => Ok(Self::Feature),
            "story" => Ok(Self::Story),
            _ => Err(ParseEnumError {
                expected: "item type",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "draft" => Ok(Self::Draft),
            "ready_for_review" => Ok(Self::ReadyForReview),
            "approved" => Ok(Self::Approved),
            "exported" => Ok(Self::Exported),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for SizeEstimate {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "xs" => Ok(Self::Xs),
            "s" => Ok(Self::S),
            "m" => Ok(Self::M),
            "l" => Ok(Self::L),
            "xl" => Ok(Self::Xl),
            _ => Err(ParseEnumError {
                expected: "size estimate",
                got: s.to_string(),
            }),
        }
    }
}
