//! Keyboard navigation over the flattened rows.
//!
//! [`navigate`] is a pure function of the key, the visible rows and the
//! current selection. It never touches the forest; expand/collapse decisions
//! come back as a [`NavCommand`] for the owner of the forest to apply.

use crate::flatten::FlatView;
use crate::model::{NodeId, NodeKind};

/// Discrete navigation keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavKey {
    Up,
    Down,
    Left,
    Right,
    /// Enter or Space.
    Toggle,
    Home,
    End,
}

/// Structural change requested by a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavCommand {
    /// Expand, starting a lazy load if children are unknown.
    Expand(NodeId),
    Collapse(NodeId),
    Toggle(NodeId),
}

impl NavCommand {
    pub const fn id(&self) -> &NodeId {
        match self {
            Self::Expand(id) | Self::Collapse(id) | Self::Toggle(id) => id,
        }
    }
}

/// Effect of one key press. An empty navigation is still a consumed key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Navigation {
    /// New selection, when it changed.
    pub select: Option<NodeId>,
    pub command: Option<NavCommand>,
    /// Row index to bring into view.
    pub scroll_to: Option<usize>,
}

impl Navigation {
    /// Returns `true` if the key changed nothing.
    pub const fn is_noop(&self) -> bool {
        self.select.is_none() && self.command.is_none()
    }

    fn select_row<K: NodeKind>(view: &FlatView<K>, index: usize) -> Self {
        Self {
            select: view.get(index).map(|row| row.id().clone()),
            command: None,
            scroll_to: Some(index),
        }
    }

    const fn with_command(command: NavCommand, index: usize) -> Self {
        Self {
            select: None,
            command: Some(command),
            scroll_to: Some(index),
        }
    }
}

/// Resolves one key press.
///
/// No-op when nothing is selected, the selection is not a visible row, or a
/// drag gesture is in progress.
pub fn navigate<K: NodeKind>(
    view: &FlatView<K>,
    selected: Option<&NodeId>,
    key: NavKey,
    dragging: bool,
) -> Navigation {
    if dragging {
        return Navigation::default();
    }
    let Some(index) = selected.and_then(|id| view.index_of(id)) else {
        return Navigation::default();
    };
    let Some(row) = view.get(index) else {
        return Navigation::default();
    };
    let node = row.node();
    let last = view.len().saturating_sub(1);

    match key {
        NavKey::Down if index < last => Navigation::select_row(view, index + 1),
        NavKey::Up if index > 0 => Navigation::select_row(view, index - 1),
        NavKey::Home if index > 0 => Navigation::select_row(view, 0),
        NavKey::End if index < last => Navigation::select_row(view, last),
        NavKey::Right => {
            if !node.is_expanded() {
                if node.may_have_children() && !node.is_loading() {
                    return Navigation::with_command(NavCommand::Expand(node.id().clone()), index);
                }
                return Navigation::default();
            }
            // The first child, if any, is the very next row.
            match view.get(index + 1) {
                Some(child) if child.parent() == Some(node.id()) => {
                    Navigation::select_row(view, index + 1)
                }
                _ => Navigation::default(),
            }
        }
        NavKey::Left => {
            if node.is_expanded() {
                return Navigation::with_command(NavCommand::Collapse(node.id().clone()), index);
            }
            match node.parent().and_then(|parent| view.index_of(parent)) {
                Some(parent_index) => Navigation::select_row(view, parent_index),
                None => Navigation::default(),
            }
        }
        NavKey::Toggle if node.may_have_children() && !node.is_loading() => {
            Navigation::with_command(NavCommand::Toggle(node.id().clone()), index)
        }
        _ => Navigation::default(),
    }
}
