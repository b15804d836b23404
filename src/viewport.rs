//! The contract between the tree core and whatever draws it.
//!
//! A viewport only ever asks two things: how many rows exist, and what row `i`
//! contains. Rows are addressed by index, never by pixel or cell geometry.

use std::ops::Range;

use crate::flatten::FlatRow;
use crate::model::{Children, Node, NodeId, NodeKind};
use crate::style::TreeScrollPolicy;

/// Expander state shown next to a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expander {
    /// Known, empty children.
    Leaf,
    Collapsed,
    Expanded,
    /// Children never fetched; expanding starts a load.
    Unloaded,
    /// A fetch is in flight.
    Loading,
}

impl Expander {
    pub fn of<K: NodeKind>(node: &Node<K>) -> Self {
        if node.is_loading() {
            return Self::Loading;
        }
        match node.children() {
            Children::Unknown => Self::Unloaded,
            Children::Known(ids) if ids.is_empty() => Self::Leaf,
            Children::Known(_) if node.is_expanded() => Self::Expanded,
            Children::Known(_) => Self::Collapsed,
        }
    }
}

/// Everything a viewport needs to draw one row.
pub struct RowPayload<'a, K: NodeKind> {
    pub index: usize,
    pub row: &'a FlatRow<K>,
    pub expander: Expander,
    pub is_selected: bool,
    /// The row is the subject of an active drag gesture.
    pub is_dragged: bool,
}

impl<'a, K: NodeKind> RowPayload<'a, K> {
    #[inline]
    pub fn id(&self) -> &'a NodeId {
        self.row.id()
    }

    #[inline]
    pub fn fields(&self) -> &'a K::Fields {
        self.row.node().fields()
    }

    #[inline]
    pub const fn depth(&self) -> usize {
        self.row.depth
    }
}

/// Row provider consumed by a virtualizing viewport.
///
/// `row_at` must be side-effect free; viewports call it repeatedly for the
/// same index across frames.
pub trait RowSource<K: NodeKind> {
    fn total_row_count(&self) -> usize;
    fn row_at(&self, index: usize) -> Option<RowPayload<'_, K>>;
}

/// Rows to materialize for a viewport starting at `offset`, with `overscan`
/// extra rows on both sides, clamped to `total`.
pub fn visible_range(offset: usize, height: usize, overscan: usize, total: usize) -> Range<usize> {
    let start = offset.saturating_sub(overscan).min(total);
    let end = offset
        .saturating_add(height)
        .saturating_add(overscan)
        .min(total);
    start..end.max(start)
}

/// New scroll offset that brings row `target` into a viewport of `height` rows.
pub fn scroll_offset_for(
    target: usize,
    offset: usize,
    height: usize,
    total: usize,
    policy: TreeScrollPolicy,
) -> usize {
    let height = height.max(1);
    let max_offset = total.saturating_sub(height);
    let offset = match policy {
        TreeScrollPolicy::KeepInView => {
            if target < offset {
                target
            } else if target >= offset + height {
                target + 1 - height
            } else {
                offset
            }
        }
        TreeScrollPolicy::CenterOnSelect => target.saturating_sub(height / 2),
    };
    offset.min(max_offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_includes_overscan_and_clamps() {
        assert_eq!(visible_range(10, 5, 2, 100), 8..17);
        assert_eq!(visible_range(0, 5, 2, 100), 0..7);
        assert_eq!(visible_range(98, 5, 2, 100), 96..100);
        assert_eq!(visible_range(0, 5, 2, 0), 0..0);
    }

    #[test]
    fn keep_in_view_scrolls_minimally() {
        let policy = TreeScrollPolicy::KeepInView;

        assert_eq!(scroll_offset_for(3, 0, 10, 100, policy), 0);
        assert_eq!(scroll_offset_for(12, 0, 10, 100, policy), 3);
        assert_eq!(scroll_offset_for(4, 8, 10, 100, policy), 4);
    }

    #[test]
    fn center_policy_clamps_to_scroll_range() {
        let policy = TreeScrollPolicy::CenterOnSelect;

        assert_eq!(scroll_offset_for(50, 0, 10, 100, policy), 45);
        assert_eq!(scroll_offset_for(2, 30, 10, 100, policy), 0);
        assert_eq!(scroll_offset_for(99, 0, 10, 100, policy), 90);
        assert_eq!(scroll_offset_for(3, 0, 10, 6, policy), 0);
    }
}
