//! Typed partial snapshots of a work item.
//!
//! Every reversible command stores a pair of partial snapshots covering
//! only the fields it touched. Rather than an untyped bag of keys, a
//! snapshot is an [`ItemPatch`]: an ordered set of [`FieldPatch`] values,
//! at most one per [`Field`], so applying and replaying a snapshot is an
//! exhaustive `match` over field kinds.
//!
//! Move commands snapshot a [`Placement`] pair instead — parent and sibling
//! order are never edited field-wise.
//!
//! # Serde
//!
//! `ItemPatch` serializes as a plain JSON object keyed by field name
//! (`{"title": "...", "status": "draft"}`), which is exactly the payload
//! the persistence service's `update` operation accepts. `Deserialize` is
//! implemented by hand for the same reason [`FieldPatch`] variants carry
//! heterogeneous payloads: the field name decides the payload schema.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::item::{ParseEnumError, SizeEstimate, Status, WorkItem};
use super::item_id::ItemId;

/// A position in the tree: containing parent and sibling sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub parent_id: Option<ItemId>,
    pub order_index: i64,
}

/// The independently editable fields of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Description,
    AcceptanceCriteria,
    TechnicalNotes,
    Status,
    SizeEstimate,
}

impl Field {
    /// All editable fields in display order.
    pub const ALL: [Self; 6] = [
        Self::Title,
        Self::Description,
        Self::AcceptanceCriteria,
        Self::TechnicalNotes,
        Self::Status,
        Self::SizeEstimate,
    ];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::AcceptanceCriteria => "acceptance_criteria",
            Self::TechnicalNotes => "technical_notes",
            Self::Status => "status",
            Self::SizeEstimate => "size_estimate",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "description" => Ok(Self::Description),
            "acceptance_criteria" => Ok(Self::AcceptanceCriteria),
            "technical_notes" => Ok(Self::TechnicalNotes),
            "status" => Ok(Self::Status),
            "size_estimate" => Ok(Self::SizeEstimate),
            _ => Err(ParseEnumError {
                expected: "field",
                got: s.to_string(),
            }),
        }
    }
}

/// A single field-level value, tagged by the field it belongs to.
///
/// `SizeEstimate(None)` is a real value — it clears the estimate — which is
/// why the payload is `Option` there and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPatch {
    Title(String),
    Description(String),
    AcceptanceCriteria(String),
    TechnicalNotes(String),
    Status(Status),
    SizeEstimate(Option<SizeEstimate>),
}

impl FieldPatch {
    /// The field this value belongs to.
    pub const fn field(&self) -> Field {
        match self {
            Self::Title(_) => Field::Title,
            Self::Description(_) => Field::Description,
            Self::AcceptanceCriteria(_) => Field::AcceptanceCriteria,
            Self::TechnicalNotes(_) => Field::TechnicalNotes,
            Self::Status(_) => Field::Status,
            Self::SizeEstimate(_) => Field::SizeEstimate,
        }
    }

    /// Write this value onto `item`.
    pub fn apply_to(&self, item: &mut WorkItem) {
        match self {
            Self::Title(v) => item.title = v.clone(),
            Self::Description(v) => item.description = v.clone(),
            Self::AcceptanceCriteria(v) => item.acceptance_criteria = v.clone(),
            Self::TechnicalNotes(v) => item.technical_notes = v.clone(),
            Self::Status(v) => item.status = *v,
            Self::SizeEstimate(v) => item.size_estimate = *v,
        }
    }
}

/// A partial snapshot: an insertion-ordered set of field values, at most
/// one per field (the last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    edits: Vec<FieldPatch>,
}

impl ItemPatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Add or replace the value for a field. A repeated write to the same
    /// field keeps its original position in the patch.
    pub fn set(&mut self, edit: FieldPatch) {
        match self.edits.iter_mut().find(|e| e.field() == edit.field()) {
            Some(slot) => *slot = edit,
            None => self.edits.push(edit),
        }
    }

    /// The value recorded for `field`, if any.
    pub fn get(&self, field: Field) -> Option<&FieldPatch> {
        self.edits.iter().find(|e| e.field() == field)
    }

    /// The fields this patch touches, in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.edits.iter().map(FieldPatch::field)
    }

    /// The recorded values, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldPatch> {
        self.edits.iter()
    }

    pub fn clear(&mut self) {
        self.edits.clear();
    }

    /// Write every recorded value onto `item`.
    pub fn apply_to(&self, item: &mut WorkItem) {
        for edit in &self.edits {
            edit.apply_to(item);
        }
    }

    /// Read the current values of exactly the given fields off `item`.
    ///
    /// This is how a command captures its `previous_state`: the pre-change
    /// values of the fields about to change, and nothing else.
    pub fn capture(item: &WorkItem, fields: impl IntoIterator<Item = Field>) -> Self {
        let mut patch = Self::new();
        for field in fields {
            let edit = match field {
                Field::Title => FieldPatch::Title(item.title.clone()),
                Field::Description => FieldPatch::Description(item.description.clone()),
                Field::AcceptanceCriteria => {
                    FieldPatch::AcceptanceCriteria(item.acceptance_criteria.clone())
                }
                Field::TechnicalNotes => FieldPatch::TechnicalNotes(item.technical_notes.clone()),
                Field::Status => FieldPatch::Status(item.status),
                Field::SizeEstimate => FieldPatch::SizeEstimate(item.size_estimate),
            };
            patch.set(edit);
        }
        patch
    }

    /// Comma-joined field names, for human-readable command descriptions.
    pub fn summary(&self) -> String {
        let names: Vec<&str> = self.edits.iter().map(|e| e.field().as_str()).collect();
        names.join(", ")
    }
}

impl FromIterator<FieldPatch> for ItemPatch {
    fn from_iter<I: IntoIterator<Item = FieldPatch>>(iter: I) -> Self {
        let mut patch = Self::new();
        for edit in iter {
            patch.set(edit);
        }
        patch
    }
}

impl Serialize for ItemPatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.edits.len()))?;
        for edit in &self.edits {
            match edit {
                FieldPatch::Title(v) => map.serialize_entry("title", v)?,
                FieldPatch::Description(v) => map.serialize_entry("description", v)?,
                FieldPatch::AcceptanceCriteria(v) => {
                    map.serialize_entry("acceptance_criteria", v)?;
                }
                FieldPatch::TechnicalNotes(v) => map.serialize_entry("technical_notes", v)?,
                FieldPatch::Status(v) => map.serialize_entry("status", v)?,
                FieldPatch::SizeEstimate(v) => map.serialize_entry("size_estimate", v)?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ItemPatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut patch = Self::new();
        for (key, value) in raw {
            let field: Field = key.parse().map_err(DeError::custom)?;
            let edit = match field {
                Field::Title => {
                    FieldPatch::Title(serde_json::from_value(value).map_err(DeError::custom)?)
                }
                Field::Description => {
                    FieldPatch::Description(serde_json::from_value(value).map_err(DeError::custom)?)
                }
                Field::AcceptanceCriteria => FieldPatch::AcceptanceCriteria(
                    serde_json::from_value(value).map_err(DeError::custom)?,
                ),
                Field::TechnicalNotes => FieldPatch::TechnicalNotes(
                    serde_json::from_value(value).map_err(DeError::custom)?,
                ),
                Field::Status => {
                    FieldPatch::Status(serde_json::from_value(value).map_err(DeError::custom)?)
                }
                Field::SizeEstimate => FieldPatch::SizeEstimate(
                    serde_json::from_value(value).map_err(DeError::custom)?,
                ),
            };
            patch.set(edit);
        }
        Ok(patch)
    }
}
