//! Hierarchical projection of the flat work-item list.
//!
//! The flat list is the single source of truth; the tree is a pure
//! projection rebuilt from `parent_id` and `order_index` alone. This module
//! provides the projection itself plus the traversal helpers the stores
//! need:
//!
//! - [`build_hierarchy`] — flat list to sorted tree, deterministic and
//!   non-mutating.
//! - [`flatten`] — depth-first back to a flat list.
//! - [`subtree_ids`] — BFS over a subtree, root first.
//! - [`ancestor_ids`] — parent chain from immediate parent to root.
//!
//! # Determinism
//!
//! Sibling groups (and roots) sort ascending by `order_index`; the sort is
//! stable, so equal keys keep their insertion order from the flat list.
//! Building twice from the same flat list yields structurally identical
//! trees.
//!
//! # Malformed input
//!
//! An item whose `parent_id` points at a missing id is dropped from the
//! projection — it stays in the canonical flat list and reappears once its
//! parent loads. Cycles cannot occur while the type-pairing invariant
//! holds; a visited guard still protects the builder against malformed
//! input.

#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};

use super::item::WorkItem;
use super::item_id::ItemId;

/// A work item with its children attached, as rendered by the tree view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub item: WorkItem,
    pub children: Vec<TreeNode>,
}

/// Sibling-group index: item positions keyed by their parent id.
///
/// Groups come out sorted ascending by `order_index`, ties in insertion
/// order (the sort is stable).
fn group_by_parent<'a>(items: &'a [WorkItem]) -> BTreeMap<Option<&'a ItemId>, Vec<usize>> {
    let mut by_parent: BTreeMap<Option<&ItemId>, Vec<usize>> = BTreeMap::new();
    for (pos, item) in items.iter().enumerate() {
        by_parent.entry(item.parent_id.as_ref()).or_default().push(pos);
    }
    for group in by_parent.values_mut() {
        group.sort_by_key(|&pos| items[pos].order_index);
    }
    by_parent
}

/// Build the hierarchical view of a flat item list.
///
/// Pure: the input is not mutated and every node holds a fresh copy of its
/// item. Roots are the items with no parent, sorted like any sibling group.
pub fn build_hierarchy(items: &[WorkItem]) -> Vec<TreeNode> {
    let by_parent = group_by_parent(items);
    let mut visited: HashSet<&ItemId> = HashSet::new();
    attach_children(items, &by_parent, None, &mut visited)
}

fn attach_children<'a>(
    items: &'a [WorkItem],
    by_parent: &BTreeMap<Option<&'a ItemId>, Vec<usize>>,
    parent: Option<&'a ItemId>,
    visited: &mut HashSet<&'a ItemId>,
) -> Vec<TreeNode> {
    let Some(group) = by_parent.get(&parent) else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(group.len());
    for &pos in group {
        let item = &items[pos];
        if !visited.insert(&item.id) {
            continue; // guard against malformed input
        }
        let children = attach_children(items, by_parent, Some(&item.id), visited);
        nodes.push(TreeNode {
            item: item.clone(),
            children,
        });
    }
    nodes
}

/// Flatten a tree back into a flat list, depth-first.
///
/// `flatten(&build_hierarchy(items))` reproduces the parent/order structure
/// of `items` (modulo dropped orphans), which is what the idempotence tests
/// lean on.
pub fn flatten(nodes: &[TreeNode]) -> Vec<WorkItem> {
    let mut flat = Vec::new();
    collect_flat(nodes, &mut flat);
    flat
}

fn collect_flat(nodes: &[TreeNode], out: &mut Vec<WorkItem>) {
    for node in nodes {
        out.push(node.item.clone());
        collect_flat(&node.children, out);
    }
}

/// All ids in the subtree rooted at `root_id`, including `root_id` itself,
/// in BFS order (root first, then breadth by breadth).
pub fn subtree_ids(items: &[WorkItem], root_id: &ItemId) -> Vec<ItemId> {
    let by_parent = group_by_parent(items);
    let mut visited: HashSet<ItemId> = HashSet::new();
    let mut queue: VecDeque<ItemId> = VecDeque::new();
    let mut result: Vec<ItemId> = Vec::new();

    queue.push_back(root_id.clone());
    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        result.push(current.clone());
        if let Some(group) = by_parent.get(&Some(&current)) {
            for &pos in group {
                if !visited.contains(&items[pos].id) {
                    queue.push_back(items[pos].id.clone());
                }
            }
        }
    }
    result
}

/// The ancestor chain of `id`, from immediate parent up to the root.
///
/// Empty when the item is unknown or has no parent. A repeated id truncates
/// the chain (cycle guard).
pub fn ancestor_ids(items: &[WorkItem], id: &ItemId) -> Vec<ItemId> {
    let by_id: BTreeMap<&ItemId, &WorkItem> =
        items.iter().map(|item| (&item.id, item)).collect();

    let mut ancestors: Vec<ItemId> = Vec::new();
    let mut visited: HashSet<&ItemId> = HashSet::new();
    visited.insert(id);

    let mut current = by_id.get(id).and_then(|item| item.parent_id.as_ref());
    while let Some(parent_id) = current {
        if !visited.insert(parent_id) {
            break; // cycle guard
        }
        ancestors.push(parent_id.clone());
        current = by_id.get(parent_id).and_then(|item| item.parent_id.as_ref());
    }
    ancestors
}
