use std::ops::Range;

use tracing::{debug, trace};

use crate::action::{TreeAction, TreeEvent};
use crate::config::TreeViewConfig;
use crate::dnd::{DragItem, DropTarget, move_node};
use crate::flatten::{DragPreview, FlatView, drag_preview};
use crate::forest::{Forest, TreeStats};
use crate::loader::{FetchApplied, FetchOutcome, apply_outcome, begin_load};
use crate::model::{Node, NodeId, NodeKind, NodeSeed};
use crate::nav::{NavCommand, NavKey, Navigation, navigate};
use crate::viewport::{Expander, RowPayload, RowSource, scroll_offset_for, visible_range};

#[cfg(feature = "keymap")]
use crate::keymap::TreeKeyBindings;
#[cfg(feature = "keymap")]
use crossterm::event::KeyEvent;

/// What an expand or toggle request did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Expansion flipped on a node with known children.
    Toggled,
    /// Children were unknown; the node is now loading and a fetch is queued.
    LoadRequested,
    /// Missing node, fetch already in flight, or nothing to change.
    Ignored,
}

/// Interactive state over one forest: the current snapshot, its flattened rows,
/// selection, an active drag gesture, queued fetches and the scroll position.
///
/// Every structural change goes through a persistent [`Forest`] operation and
/// then rebuilds the flat view, so `row_at` never has to recompute anything.
pub struct TreeViewState<K: NodeKind> {
    forest: Forest<K>,
    view: FlatView<K>,
    selected: Option<NodeId>,
    drag: Option<DragItem>,
    scroll_request: Option<usize>,
    // Nodes marked loading whose fetch has not been dispatched yet.
    fetch_requests: Vec<NodeId>,
    offset: usize,
    // Height of the last synced viewport; 0 before the first render.
    height: usize,
    config: TreeViewConfig,
    #[cfg(feature = "keymap")]
    keymap: TreeKeyBindings,
}

impl<K: NodeKind> TreeViewState<K> {
    pub fn new(forest: Forest<K>) -> Self {
        Self::with_config(forest, TreeViewConfig::default())
    }

    pub fn with_config(forest: Forest<K>, config: TreeViewConfig) -> Self {
        let view = FlatView::build(&forest);
        Self {
            forest,
            view,
            selected: None,
            drag: None,
            scroll_request: None,
            fetch_requests: Vec::new(),
            offset: 0,
            height: 0,
            config,
            #[cfg(feature = "keymap")]
            keymap: TreeKeyBindings::default(),
        }
    }

    #[cfg(feature = "keymap")]
    /// Returns mutable access to key bindings.
    pub const fn keymap_mut(&mut self) -> &mut TreeKeyBindings {
        &mut self.keymap
    }

    #[inline]
    pub const fn forest(&self) -> &Forest<K> {
        &self.forest
    }

    /// The rows currently visible, in display order.
    #[inline]
    pub const fn view(&self) -> &FlatView<K> {
        &self.view
    }

    #[inline]
    pub const fn config(&self) -> &TreeViewConfig {
        &self.config
    }

    pub const fn set_config(&mut self, config: TreeViewConfig) {
        self.config = config;
    }

    /// Replaces the whole forest, e.g. after an external source of truth changed.
    ///
    /// Selection and drag state are kept when their nodes survive.
    pub fn replace_forest(&mut self, forest: Forest<K>) {
        self.commit(forest);
    }

    pub fn stats(&self) -> TreeStats {
        self.forest.stats()
    }

    // Selection.

    pub const fn selected_id(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected.as_ref().and_then(|id| self.view.index_of(id))
    }

    pub fn selected_node(&self) -> Option<&Node<K>> {
        self.selected
            .as_ref()
            .and_then(|id| self.forest.get(id))
            .map(|node| &**node)
    }

    /// Selects a visible row and asks for it to be scrolled into view.
    pub fn select(&mut self, id: &NodeId) -> bool {
        let Some(index) = self.view.index_of(id) else {
            return false;
        };
        self.selected = Some(id.clone());
        self.scroll_request = Some(index);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // Structure.

    /// Flips expansion of `id`, starting a lazy load when its children are unknown.
    pub fn toggle(&mut self, id: &NodeId) -> ToggleOutcome {
        let Some(node) = self.forest.get(id) else {
            return ToggleOutcome::Ignored;
        };
        if node.is_loading() {
            return ToggleOutcome::Ignored;
        }
        if !node.children().is_known() {
            return self.request_load(id);
        }
        let next = self.forest.toggle_expanded(id);
        self.commit(next);
        ToggleOutcome::Toggled
    }

    /// Expands `id`, starting a lazy load when its children are unknown.
    pub fn expand(&mut self, id: &NodeId) -> ToggleOutcome {
        let Some(node) = self.forest.get(id) else {
            return ToggleOutcome::Ignored;
        };
        if node.is_loading() || node.is_expanded() {
            return ToggleOutcome::Ignored;
        }
        if !node.children().is_known() {
            return self.request_load(id);
        }
        let next = self.forest.set_expanded(id, true);
        self.commit(next);
        ToggleOutcome::Toggled
    }

    pub fn collapse(&mut self, id: &NodeId) -> bool {
        if !self.forest.get(id).is_some_and(|node| node.is_expanded()) {
            return false;
        }
        let next = self.forest.set_expanded(id, false);
        self.commit(next);
        true
    }

    pub fn expand_all(&mut self) {
        let next = self.forest.expand_all();
        self.commit(next);
    }

    pub fn collapse_all(&mut self) {
        let next = self.forest.collapse_all();
        self.commit(next);
    }

    /// Back to the initial view: only roots expanded, no selection, no drag,
    /// scrolled to the top.
    pub fn reset(&mut self) {
        self.selected = None;
        self.drag = None;
        self.scroll_request = None;
        self.offset = 0;
        let next = self.forest.collapse_all();
        self.commit(next);
    }

    /// Adds a seeded node under `parent`, or as a new root.
    pub fn add_node(&mut self, parent: Option<&NodeId>, seed: NodeSeed<K>) -> bool {
        let before = self.forest.len();
        let next = self.forest.add_node(parent, seed);
        if next.len() == before {
            return false;
        }
        self.commit(next);
        true
    }

    /// Removes `id` and its subtree.
    pub fn delete(&mut self, id: &NodeId) -> bool {
        if !self.forest.contains(id) {
            return false;
        }
        let next = self.forest.delete(id);
        self.commit(next);
        true
    }

    // Lazy loading.

    /// Drains fetches queued by expand/toggle, skipping nodes that no longer wait.
    pub fn take_fetch_requests(&mut self) -> Vec<NodeId> {
        let forest = &self.forest;
        let mut requests = std::mem::take(&mut self.fetch_requests);
        requests.retain(|id| forest.get(id).is_some_and(|node| node.is_loading()));
        requests
    }

    pub fn has_fetch_requests(&self) -> bool {
        !self.fetch_requests.is_empty()
    }

    /// Merges a completed fetch.
    pub fn apply_fetch(&mut self, outcome: FetchOutcome<K>) -> FetchApplied {
        let (next, applied) = apply_outcome(&self.forest, outcome);
        if applied != FetchApplied::Stale {
            self.commit(next);
        }
        applied
    }

    // Drag and drop.

    /// Starts dragging a visible row. Navigation keys are ignored until the
    /// gesture ends.
    pub fn drag_start(&mut self, id: &NodeId) -> Option<DragItem> {
        self.view.index_of(id)?;
        let item = DragItem::of::<K>(self.forest.origin(), id.clone());
        trace!(kind = K::KIND, %id, "drag started");
        self.drag = Some(item.clone());
        Some(item)
    }

    pub fn drag_cancel(&mut self) {
        self.drag = None;
    }

    #[inline]
    pub const fn dragged(&self) -> Option<&DragItem> {
        self.drag.as_ref()
    }

    #[inline]
    pub const fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Ends a drag gesture, moving `item` if it was dropped on a valid target.
    ///
    /// Returns whether the forest changed. Invalid drops (foreign kind or
    /// forest, a cycle, a vanished node) leave the forest untouched.
    pub fn drag_end(&mut self, item: &DragItem, drop: Option<&DropTarget>) -> bool {
        self.drag = None;
        let Some(drop) = drop else {
            return false;
        };
        match move_node(&self.forest, &self.view, item, drop) {
            Ok(next) => {
                debug!(kind = K::KIND, id = %item.id, %drop, "node moved");
                self.commit(next);
                true
            }
            Err(err) => {
                debug!(kind = K::KIND, id = %item.id, %drop, error = %err, "drop rejected");
                false
            }
        }
    }

    /// Preview rows for the active drag, capped by the configured limit.
    pub fn drag_preview(&self) -> Option<DragPreview<K>> {
        let item = self.drag.as_ref()?;
        drag_preview(&self.view, &item.id, self.config.drag_preview_limit)
    }

    // Keyboard.

    /// Applies one navigation key to the selection and the forest.
    pub fn navigate(&mut self, key: NavKey) -> Navigation {
        let navigation = navigate(&self.view, self.selected.as_ref(), key, self.drag.is_some());
        if let Some(id) = &navigation.select {
            self.selected = Some(id.clone());
        }
        match &navigation.command {
            Some(NavCommand::Expand(id)) => {
                self.expand(id);
            }
            Some(NavCommand::Collapse(id)) => {
                self.collapse(id);
            }
            Some(NavCommand::Toggle(id)) => {
                self.toggle(id);
            }
            None => {}
        }
        if let Some(index) = navigation.scroll_to {
            self.scroll_request = Some(index);
        }
        navigation
    }

    /// Handles a tree action.
    pub fn handle_action<C>(&mut self, action: TreeAction<C>) -> TreeEvent<C> {
        if let Some(key) = action.nav_key() {
            self.navigate(key);
            return TreeEvent::Handled;
        }
        match action {
            TreeAction::ExpandAll => self.expand_all(),
            TreeAction::CollapseAll => self.collapse_all(),
            TreeAction::Reset => self.reset(),
            TreeAction::DeleteNode => {
                if !self.is_dragging()
                    && let Some(id) = self.selected.clone()
                {
                    self.delete(&id);
                }
            }
            TreeAction::Custom(_) => return TreeEvent::Action(action),
            _ => return TreeEvent::Unhandled,
        }
        TreeEvent::Handled
    }

    #[cfg(feature = "keymap")]
    /// Resolves a key event into an action and handles it.
    pub fn handle_key(&mut self, key: KeyEvent) -> TreeEvent<()> {
        let Some(action) = self.keymap.resolve(key) else {
            return TreeEvent::Unhandled;
        };
        self.handle_action(action)
    }

    #[cfg(feature = "keymap")]
    /// Resolves a key event with a custom mapping and handles it.
    pub fn handle_key_with<C, F>(&mut self, key: KeyEvent, custom: F) -> TreeEvent<C>
    where
        F: Fn(KeyEvent) -> Option<C>,
    {
        let Some(action) = self.keymap.resolve_with(key, custom) else {
            return TreeEvent::Unhandled;
        };
        self.handle_action(action)
    }

    // Viewport.

    /// Pending scroll-into-view row, left for the viewport to consume.
    pub const fn scroll_request(&self) -> Option<usize> {
        self.scroll_request
    }

    pub const fn take_scroll_request(&mut self) -> Option<usize> {
        self.scroll_request.take()
    }

    /// First row of the viewport.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Sets the first row, clamped so the last synced viewport stays filled.
    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset.min(self.max_offset());
    }

    /// Applies any pending scroll request for a viewport of `height` rows and
    /// clamps the offset to the current row count.
    pub fn sync_viewport(&mut self, height: usize) -> usize {
        self.height = height;
        let total = self.view.len();
        if let Some(target) = self.scroll_request.take()
            && total > 0
        {
            self.offset = scroll_offset_for(
                target.min(total - 1),
                self.offset,
                height,
                total,
                self.config.scroll_policy,
            );
        }
        self.offset = self.offset.min(self.max_offset());
        self.offset
    }

    fn max_offset(&self) -> usize {
        self.view.len().saturating_sub(self.height.max(1))
    }

    /// Rows to materialize for a viewport of `height` rows, overscan included.
    pub fn visible_window(&self, height: usize) -> Range<usize> {
        visible_range(self.offset, height, self.config.overscan, self.view.len())
    }

    fn request_load(&mut self, id: &NodeId) -> ToggleOutcome {
        let Some(next) = begin_load(&self.forest, id) else {
            return ToggleOutcome::Ignored;
        };
        trace!(kind = K::KIND, %id, "fetch queued");
        self.fetch_requests.push(id.clone());
        self.commit(next);
        ToggleOutcome::LoadRequested
    }

    fn commit(&mut self, forest: Forest<K>) {
        self.forest = forest;
        self.view = FlatView::build(&self.forest);
        self.heal_selection();
        if let Some(item) = &self.drag
            && !self.view.contains(&item.id)
        {
            self.drag = None;
        }
    }

    // A removed selection is dropped; one hidden by a collapse moves to the
    // nearest visible ancestor.
    fn heal_selection(&mut self) {
        let Some(selected) = &self.selected else {
            return;
        };
        if self.view.contains(selected) {
            return;
        }
        let mut current = self.forest.parent(selected).cloned();
        while let Some(id) = current {
            if self.view.contains(&id) {
                if let Some(index) = self.view.index_of(&id) {
                    self.scroll_request = Some(index);
                }
                self.selected = Some(id);
                return;
            }
            current = self.forest.parent(&id).cloned();
        }
        self.selected = None;
    }
}

impl<K: NodeKind> RowSource<K> for TreeViewState<K> {
    fn total_row_count(&self) -> usize {
        self.view.len()
    }

    fn row_at(&self, index: usize) -> Option<RowPayload<'_, K>> {
        let row = self.view.get(index)?;
        let id = row.id();
        Some(RowPayload {
            index,
            row,
            expander: Expander::of(row.node()),
            is_selected: self.selected.as_ref() == Some(id),
            is_dragged: self.drag.as_ref().is_some_and(|item| &item.id == id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{Folder, FolderFields};
    use crate::model::ForestOrigin;
    use crate::style::TreeScrollPolicy;

    fn id(value: &str) -> NodeId {
        NodeId::from(value)
    }

    fn folder(name: &str, children: Vec<NodeSeed<Folder>>) -> NodeSeed<Folder> {
        NodeSeed::branch(name, FolderFields::new(name), children)
    }

    fn leaf(name: &str) -> NodeSeed<Folder> {
        NodeSeed::leaf(name, FolderFields::new(name))
    }

    // root -> [a -> [a1, a2], b (lazy), c]
    fn state() -> TreeViewState<Folder> {
        let forest = Forest::from_seeds(
            ForestOrigin(0),
            [folder(
                "root",
                vec![
                    folder("a", vec![leaf("a1"), leaf("a2")]),
                    NodeSeed::lazy("b", FolderFields::new("b")),
                    leaf("c"),
                ],
            )
            .expanded(true)],
        );
        TreeViewState::new(forest)
    }

    fn rows(state: &TreeViewState<Folder>) -> Vec<&str> {
        state.view().ids().map(NodeId::as_str).collect()
    }

    #[test]
    fn navigation_walks_rows_and_requests_scroll() {
        let mut state = state();
        assert!(state.select(&id("root")));
        state.take_scroll_request();

        state.handle_action::<()>(TreeAction::SelectNext);
        assert_eq!(state.selected_id(), Some(&id("a")));
        assert_eq!(state.take_scroll_request(), Some(1));

        state.handle_action::<()>(TreeAction::ExpandOrSelectChild);
        assert_eq!(rows(&state), vec!["root", "a", "a1", "a2", "b", "c"]);
        assert_eq!(state.selected_id(), Some(&id("a")));
        assert_eq!(state.take_scroll_request(), Some(1));

        state.handle_action::<()>(TreeAction::ExpandOrSelectChild);
        assert_eq!(state.selected_id(), Some(&id("a1")));
    }

    #[test]
    fn toggle_unknown_children_queues_one_fetch() {
        let mut state = state();
        let b = id("b");

        assert_eq!(state.toggle(&b), ToggleOutcome::LoadRequested);
        assert_eq!(state.toggle(&b), ToggleOutcome::Ignored);
        assert_eq!(state.row_at(2).map(|row| row.expander), Some(Expander::Loading));
        assert_eq!(state.take_fetch_requests(), vec![b]);
        assert!(state.take_fetch_requests().is_empty());
    }

    #[test]
    fn deleting_selection_clears_it() {
        let mut state = state();
        state.select(&id("b"));

        state.handle_action::<()>(TreeAction::DeleteNode);

        assert_eq!(rows(&state), vec!["root", "a", "c"]);
        assert_eq!(state.selected_id(), None);
    }

    #[test]
    fn collapsing_ancestor_moves_selection_up() {
        let mut state = state();
        state.expand(&id("a"));
        state.select(&id("a2"));

        assert!(state.collapse(&id("root")));

        assert_eq!(state.selected_id(), Some(&id("root")));
        assert_eq!(state.take_scroll_request(), Some(0));
    }

    #[test]
    fn queued_fetch_for_deleted_node_is_dropped() {
        let mut state = state();
        state.toggle(&id("b"));
        state.delete(&id("b"));

        assert!(state.take_fetch_requests().is_empty());
    }

    #[test]
    fn drag_blocks_navigation_and_moves_on_drop() {
        let mut state = state();
        state.select(&id("c"));
        let item = state.drag_start(&id("c")).unwrap();

        state.handle_action::<()>(TreeAction::SelectPrev);
        assert_eq!(state.selected_id(), Some(&id("c")));
        assert!(state.row_at(3).is_some_and(|row| row.is_dragged));

        assert!(state.drag_end(&item, Some(&DropTarget::onto("a"))));
        assert!(!state.is_dragging());
        assert_eq!(rows(&state), vec!["root", "a", "a1", "a2", "c", "b"]);
        assert_eq!(state.selected_id(), Some(&id("c")));
    }

    #[test]
    fn rejected_drop_leaves_forest_untouched() {
        let mut state = state();
        let before = state.forest().clone();
        let item = state.drag_start(&id("root")).unwrap();

        assert!(!state.drag_end(&item, Some(&DropTarget::onto("c"))));
        assert!(!state.drag_end(&item, None));
        assert_eq!(rows(&state), vec!["root", "a", "b", "c"]);
        assert_eq!(state.forest().len(), before.len());
    }

    #[test]
    fn drag_preview_follows_active_drag() {
        let mut state = state();
        assert!(state.drag_preview().is_none());

        state.drag_start(&id("root"));
        let preview = state.drag_preview().unwrap();

        assert_eq!(preview.rows.len(), 4);
        state.drag_cancel();
        assert!(state.drag_preview().is_none());
    }

    #[test]
    fn row_at_is_repeatable_and_bounded() {
        let mut state = state();
        state.select(&id("a"));

        let first = state.row_at(1).map(|row| (row.id().clone(), row.expander, row.is_selected));
        let second = state.row_at(1).map(|row| (row.id().clone(), row.expander, row.is_selected));

        assert_eq!(first, second);
        assert_eq!(first, Some((id("a"), Expander::Collapsed, true)));
        assert_eq!(state.total_row_count(), 4);
        assert!(state.row_at(4).is_none());
    }

    #[test]
    fn sync_viewport_applies_scroll_policy() {
        let seeds: Vec<_> = (0..50).map(|i| leaf(&format!("n{i}"))).collect();
        let forest = Forest::from_seeds(ForestOrigin(0), [folder("root", seeds).expanded(true)]);
        let config = TreeViewConfig::new().scroll_policy(TreeScrollPolicy::CenterOnSelect);
        let mut state = TreeViewState::with_config(forest, config);

        state.select(&id("n29"));
        assert_eq!(state.sync_viewport(10), 25);
        assert_eq!(state.scroll_request(), None);

        state.set_config(TreeViewConfig::new());
        state.select(&id("n49"));
        assert_eq!(state.sync_viewport(10), 41);
        assert_eq!(state.visible_window(10), 37..51);
    }

    #[test]
    fn set_offset_and_sync_share_one_clamp() {
        let seeds: Vec<_> = (0..20).map(|i| leaf(&format!("n{i}"))).collect();
        let forest = Forest::from_seeds(ForestOrigin(0), [folder("root", seeds).expanded(true)]);
        let mut state = TreeViewState::new(forest);

        state.set_offset(100);
        assert_eq!(state.offset(), 20);

        assert_eq!(state.sync_viewport(5), 16);
        state.set_offset(100);
        assert_eq!(state.offset(), 16);
        assert_eq!(state.sync_viewport(5), 16);
    }

    #[test]
    fn expand_and_collapse_all_via_actions() {
        let mut state = state();

        state.handle_action::<()>(TreeAction::ExpandAll);
        assert_eq!(rows(&state), vec!["root", "a", "a1", "a2", "b", "c"]);

        state.select(&id("a2"));
        state.handle_action::<()>(TreeAction::CollapseAll);
        assert_eq!(rows(&state), vec!["root", "a", "b", "c"]);
        assert_eq!(state.selected_id(), Some(&id("a")));
    }

    #[test]
    fn reset_keeps_roots_open_and_clears_selection() {
        let mut state = state();
        state.expand_all();
        state.select(&id("a1"));
        state.set_offset(2);
        state.drag_start(&id("c"));

        assert_eq!(state.handle_action::<()>(TreeAction::Reset), TreeEvent::Handled);

        assert_eq!(rows(&state), vec!["root", "a", "b", "c"]);
        assert_eq!(state.selected_id(), None);
        assert!(!state.is_dragging());
        assert_eq!(state.offset(), 0);
        assert_eq!(state.scroll_request(), None);
    }

    #[test]
    fn custom_actions_are_forwarded() {
        let mut state = state();

        let event = state.handle_action(TreeAction::Custom(7_u8));

        assert_eq!(event, TreeEvent::Action(TreeAction::Custom(7)));
    }
}
