use crate::nav::NavKey;

/// Actions that a user or application can initiate on the tree view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeAction<Custom = ()> {
    /// Move selection to the previous visible row.
    SelectPrev,
    /// Move selection to the next visible row.
    SelectNext,
    /// Collapse the selected node, or select its parent if already collapsed.
    CollapseOrSelectParent,
    /// Expand the selected node (fetching unknown children), or select its first child.
    ExpandOrSelectChild,
    /// Toggle expansion for the selected node only.
    ToggleNode,
    /// Select the first visible row.
    SelectFirst,
    /// Select the last visible row.
    SelectLast,
    /// Expand every node with known children.
    ExpandAll,
    /// Collapse everything below the roots.
    CollapseAll,
    /// Collapse below the roots and clear the selection.
    Reset,
    /// Remove the selected node and its subtree.
    DeleteNode,
    /// Custom action forwarded to the caller without internal handling.
    Custom(Custom),
}

impl<C> TreeAction<C> {
    /// Navigator key driving this action, if it is a navigation action.
    pub const fn nav_key(&self) -> Option<NavKey> {
        match self {
            Self::SelectPrev => Some(NavKey::Up),
            Self::SelectNext => Some(NavKey::Down),
            Self::CollapseOrSelectParent => Some(NavKey::Left),
            Self::ExpandOrSelectChild => Some(NavKey::Right),
            Self::ToggleNode => Some(NavKey::Toggle),
            Self::SelectFirst => Some(NavKey::Home),
            Self::SelectLast => Some(NavKey::End),
            Self::ExpandAll
            | Self::CollapseAll
            | Self::Reset
            | Self::DeleteNode
            | Self::Custom(_) => None,
        }
    }
}

/// Result of handling an action or key event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeEvent<Custom = ()> {
    /// The event was consumed; state may or may not have changed.
    Handled,
    /// The event is not a tree event.
    Unhandled,
    /// The action is forwarded to the caller for handling.
    Action(TreeAction<Custom>),
}
