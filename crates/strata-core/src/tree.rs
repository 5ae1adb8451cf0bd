//! Tree store: the canonical flat item list plus everything the tree view
//! needs around it.
//!
//! The flat list is the arena and the hierarchical view is an index over
//! it: every mutation goes through [`TreeStore::set_items`], which replaces
//! the list and rebuilds the projection atomically. There is no lazy
//! recomputation anywhere else, so the projection can never drift from the
//! arena.
//!
//! Expansion, selection/focus, and filtering are view state layered on
//! top. Traversal queries ([`TreeStore::next_visible`] /
//! [`TreeStore::prev_visible`]) walk the flattened depth-first order of
//! what is actually on screen: a node's children count only if the node is
//! expanded, and an active filter hides everything outside its id set.
//! Filter producers are expected to include ancestor chains explicitly —
//! [`TreeStore::filter_by`] does — so parent chains stay navigable.

#![allow(clippy::must_use_candidate)]

use std::collections::BTreeSet;

use crate::config::EngineConfig;
use crate::model::hierarchy::{TreeNode, ancestor_ids, build_hierarchy};
use crate::model::{ItemId, WorkItem};

/// Reactive tree state: canonical flat list, derived hierarchy, and view
/// state (expansion, selection, focus, filter).
#[derive(Debug, Clone, Default)]
pub struct TreeStore {
    items: Vec<WorkItem>,
    roots: Vec<TreeNode>,
    expanded: BTreeSet<ItemId>,
    selected: Option<ItemId>,
    focused: Option<ItemId>,
    /// `None` means "no filter" — distinct from an empty (match-nothing)
    /// filter set.
    filter: Option<BTreeSet<ItemId>>,
    loaded: bool,
    auto_expand_roots: bool,
}

impl TreeStore {
    /// Create an empty store with the given tunables.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            auto_expand_roots: config.auto_expand_roots,
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------------
    // Arena writes
    // -----------------------------------------------------------------------

    /// Replace the flat list and rebuild the hierarchical view atomically.
    ///
    /// This is the only mutation path for item data. On the first
    /// non-empty load every root is auto-expanded (a UX default, not an
    /// invariant — collapse-all undoes it).
    pub fn set_items(&mut self, items: Vec<WorkItem>) {
        self.items = items;
        self.roots = build_hierarchy(&self.items);
        tracing::debug!(
            items = self.items.len(),
            roots = self.roots.len(),
            "tree rebuilt"
        );

        if !self.loaded && !self.items.is_empty() {
            self.loaded = true;
            if self.auto_expand_roots {
                for root in &self.roots {
                    self.expanded.insert(root.item.id.clone());
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The canonical flat list.
    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    /// The derived hierarchical view.
    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    /// Look up an item in the flat list.
    pub fn item(&self, id: &ItemId) -> Option<&WorkItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// The currently selected item, looked up in the flat list (the
    /// canonical side, never the projection).
    pub fn selected_item(&self) -> Option<&WorkItem> {
        self.selected.as_ref().and_then(|id| self.item(id))
    }

    pub fn selected(&self) -> Option<&ItemId> {
        self.selected.as_ref()
    }

    pub fn focused(&self) -> Option<&ItemId> {
        self.focused.as_ref()
    }

    // -----------------------------------------------------------------------
    // Selection and focus
    // -----------------------------------------------------------------------

    /// Select an item (or clear the selection). Selection implies focus.
    pub fn set_selected(&mut self, id: Option<ItemId>) {
        self.focused.clone_from(&id);
        self.selected = id;
    }

    /// Move focus without changing the selection.
    pub fn set_focused(&mut self, id: Option<ItemId>) {
        self.focused = id;
    }

    // -----------------------------------------------------------------------
    // Expansion
    // -----------------------------------------------------------------------

    pub fn is_expanded(&self, id: &ItemId) -> bool {
        self.expanded.contains(id)
    }

    pub fn toggle_expanded(&mut self, id: &ItemId) {
        if !self.expanded.remove(id) {
            self.expanded.insert(id.clone());
        }
    }

    /// Mark every item expanded.
    pub fn expand_all(&mut self) {
        self.expanded = self
            .items
            .iter()
            .map(|item| item.id.clone())
            .collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    // -----------------------------------------------------------------------
    // Filtering
    // -----------------------------------------------------------------------

    /// Restrict visibility to the given id set. Callers are responsible
    /// for including ancestor chains; prefer [`Self::filter_by`].
    pub fn set_filter(&mut self, ids: BTreeSet<ItemId>) {
        self.filter = Some(ids);
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    pub fn filter(&self) -> Option<&BTreeSet<ItemId>> {
        self.filter.as_ref()
    }

    /// Filter to the items matching `predicate`, plus every ancestor of a
    /// match so the parent chains stay navigable.
    pub fn filter_by<F: Fn(&WorkItem) -> bool>(&mut self, predicate: F) {
        let mut ids: BTreeSet<ItemId> = BTreeSet::new();
        for item in &self.items {
            if predicate(item) {
                ids.insert(item.id.clone());
                ids.extend(ancestor_ids(&self.items, &item.id));
            }
        }
        self.filter = Some(ids);
    }

    // -----------------------------------------------------------------------
    // Visibility-respecting traversal
    // -----------------------------------------------------------------------

    /// The flattened depth-first order of visible nodes: a node is listed
    /// iff it passes the active filter and every ancestor is expanded.
    pub fn visible_ids(&self) -> Vec<ItemId> {
        let mut out = Vec::new();
        self.collect_visible(&self.roots, &mut out);
        out
    }

    fn collect_visible(&self, nodes: &[TreeNode], out: &mut Vec<ItemId>) {
        for node in nodes {
            if let Some(filter) = &self.filter {
                if !filter.contains(&node.item.id) {
                    continue; // node and its whole subtree are filtered out
                }
            }
            out.push(node.item.id.clone());
            if self.expanded.contains(&node.item.id) {
                self.collect_visible(&node.children, out);
            }
        }
    }

    /// The visible node after `id`, or `None` at the end (or when `id`
    /// itself is not visible).
    pub fn next_visible(&self, id: &ItemId) -> Option<ItemId> {
        let order = self.visible_ids();
        let pos = order.iter().position(|v| v == id)?;
        order.get(pos + 1).cloned()
    }

    /// The visible node before `id`, or `None` at the start (or when `id`
    /// itself is not visible).
    pub fn prev_visible(&self, id: &ItemId) -> Option<ItemId> {
        let order = self.visible_ids();
        let pos = order.iter().position(|v| v == id)?;
        pos.checked_sub(1).map(|prev| order[prev].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::TreeStore;
    use crate::config::EngineConfig;
    use crate::model::item::{ItemType, WorkItem};
    use crate::model::item_id::ItemId;

    fn item(id: &str, item_type: ItemType, parent: Option<&str>, order: i64) -> WorkItem {
        WorkItem {
            id: id.into(),
            item_type,
            parent_id: parent.map(ItemId::new),
            order_index: order,
            title: format!("Title for {id}"),
            ..WorkItem::default()
        }
    }

    fn forest() -> Vec<WorkItem> {
        vec![
            item("e1", ItemType::Epic, None, 0),
            item("f1", ItemType::Feature, Some("e1"), 0),
            item("s1", ItemType::Story, Some("f1"), 0),
            item("s2", ItemType::Story, Some("f1"), 1),
            item("e2", ItemType::Epic, None, 1),
            item("f2", ItemType::Feature, Some("e2"), 0),
        ]
    }

    fn loaded_store() -> TreeStore {
        let mut store = TreeStore::new(&EngineConfig::default());
        store.set_items(forest());
        store
    }

    fn visible(store: &TreeStore) -> Vec<String> {
        store.visible_ids().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn first_load_expands_roots_only() {
        let store = loaded_store();
        assert!(store.is_expanded(&"e1".into()));
        assert!(store.is_expanded(&"e2".into()));
        assert!(!store.is_expanded(&"f1".into()));
        // Roots expanded, features collapsed: stories hidden.
        assert_eq!(visible(&store), vec!["e1", "f1", "e2", "f2"]);
    }

    #[test]
    fn auto_expand_happens_once() {
        let mut store = loaded_store();
        store.collapse_all();
        store.set_items(forest());
        assert_eq!(visible(&store), vec!["e1", "e2"], "no re-expansion on reload");
    }

    #[test]
    fn auto_expand_can_be_disabled() {
        let config = EngineConfig {
            auto_expand_roots: false,
            ..EngineConfig::default()
        };
        let mut store = TreeStore::new(&config);
        store.set_items(forest());
        assert_eq!(visible(&store), vec!["e1", "e2"]);
    }

    #[test]
    fn toggle_expand_shows_and_hides_children() {
        let mut store = loaded_store();
        store.toggle_expanded(&"f1".into());
        assert_eq!(visible(&store), vec!["e1", "f1", "s1", "s2", "e2", "f2"]);
        store.toggle_expanded(&"f1".into());
        assert_eq!(visible(&store), vec!["e1", "f1", "e2", "f2"]);
    }

    #[test]
    fn expand_all_and_collapse_all() {
        let mut store = loaded_store();
        store.expand_all();
        assert_eq!(visible(&store), vec!["e1", "f1", "s1", "s2", "e2", "f2"]);
        store.collapse_all();
        assert_eq!(visible(&store), vec!["e1", "e2"]);
    }

    #[test]
    fn collapsed_ancestor_hides_descendants_transitively() {
        let mut store = loaded_store();
        store.expand_all();
        store.toggle_expanded(&"e1".into());
        assert_eq!(visible(&store), vec!["e1", "e2", "f2"]);
    }

    #[test]
    fn selection_implies_focus() {
        let mut store = loaded_store();
        store.set_selected(Some("f1".into()));
        assert_eq!(store.selected(), Some(&"f1".into()));
        assert_eq!(store.focused(), Some(&"f1".into()));

        store.set_focused(Some("s1".into()));
        assert_eq!(store.selected(), Some(&"f1".into()), "focus moves alone");

        store.set_selected(None);
        assert_eq!(store.focused(), None);
    }

    #[test]
    fn selected_item_reads_the_flat_list() {
        let mut store = loaded_store();
        store.set_selected(Some("s2".into()));
        assert_eq!(store.selected_item().map(|i| i.id.as_str()), Some("s2"));

        store.set_selected(Some("gone".into()));
        assert!(store.selected_item().is_none());
    }

    #[test]
    fn next_and_prev_follow_visible_order() {
        let mut store = loaded_store();
        store.expand_all();
        // Order: e1 f1 s1 s2 e2 f2
        assert_eq!(store.next_visible(&"s2".into()), Some("e2".into()));
        assert_eq!(store.prev_visible(&"e2".into()), Some("s2".into()));
        assert_eq!(store.prev_visible(&"e1".into()), None);
        assert_eq!(store.next_visible(&"f2".into()), None);
    }

    #[test]
    fn traversal_skips_hidden_nodes() {
        let store = loaded_store();
        // Stories are hidden while f1 is collapsed.
        assert_eq!(store.next_visible(&"f1".into()), Some("e2".into()));
        assert_eq!(store.next_visible(&"s1".into()), None, "hidden id has no neighbors");
    }

    #[test]
    fn filter_by_includes_ancestors() {
        let mut store = loaded_store();
        store.expand_all();
        store.filter_by(|item| item.id.as_str() == "s2");
        assert_eq!(visible(&store), vec!["e1", "f1", "s2"]);
        assert_eq!(store.next_visible(&"f1".into()), Some("s2".into()));

        store.clear_filter();
        assert_eq!(visible(&store).len(), 6);
    }

    #[test]
    fn raw_filter_without_ancestors_hides_subtrees() {
        let mut store = loaded_store();
        store.expand_all();
        // s2 without its ancestors: e1 is filtered out, so nothing under it
        // shows either.
        store.set_filter(["s2".into()].into_iter().collect());
        assert!(visible(&store).is_empty());
    }

    #[test]
    fn empty_load_does_not_consume_auto_expand() {
        let mut store = TreeStore::new(&EngineConfig::default());
        store.set_items(Vec::new());
        store.set_items(forest());
        assert!(store.is_expanded(&"e1".into()), "first non-empty load expands");
    }
}
