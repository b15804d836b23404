use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxBuildHasher, FxHashMap};
use smallvec::SmallVec;

use crate::forest::Forest;
use crate::model::{ForestOrigin, Node, NodeId, NodeKind};

/// One visible line: a node snapshot plus its depth.
pub struct FlatRow<K: NodeKind> {
    pub(crate) node: Arc<Node<K>>,
    pub(crate) depth: usize,
    pub(crate) origin: ForestOrigin,
}

impl<K: NodeKind> Clone for FlatRow<K> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            depth: self.depth,
            origin: self.origin,
        }
    }
}

impl<K: NodeKind> fmt::Debug for FlatRow<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatRow")
            .field("id", &self.node.id)
            .field("depth", &self.depth)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl<K: NodeKind> FlatRow<K> {
    #[inline]
    pub fn node(&self) -> &Node<K> {
        &self.node
    }

    #[inline]
    pub fn id(&self) -> &NodeId {
        &self.node.id
    }

    #[inline]
    pub fn parent(&self) -> Option<&NodeId> {
        self.node.parent.as_ref()
    }

    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub const fn origin(&self) -> ForestOrigin {
        self.origin
    }
}

/// Depth-first, pre-order list of visible rows.
///
/// Descends into a node only while it is expanded with known children, so the
/// cost is proportional to the number of visible rows, not to the forest size.
/// Uses an explicit stack; tree depth is not bounded by the call stack.
pub fn flatten<K: NodeKind>(forest: &Forest<K>) -> Vec<FlatRow<K>> {
    let origin = forest.origin();
    let mut rows = Vec::new();
    let mut stack: Vec<(&NodeId, usize)> = forest.roots().iter().rev().map(|id| (id, 0)).collect();

    while let Some((id, depth)) = stack.pop() {
        let Some(node) = forest.get(id) else {
            continue;
        };
        if node.is_expanded() {
            stack.extend(node.child_ids().iter().rev().map(|child| (child, depth + 1)));
        }
        rows.push(FlatRow {
            node: Arc::clone(node),
            depth,
            origin,
        });
    }

    rows
}

/// Guide-line flags for `id`, outermost level first: one per level below the
/// roots, `true` where the node or its ancestor at that level is the last
/// sibling.
///
/// Walks parent links, so it costs O(depth) and is meant for the rows actually
/// drawn, not for the whole view.
pub fn tail_stack<K: NodeKind>(forest: &Forest<K>, id: &NodeId) -> SmallVec<[bool; 8]> {
    let mut tails = SmallVec::new();
    let mut current = id;
    while let Some(parent) = forest.parent(current) {
        tails.push(forest.children(parent).last() == Some(current));
        current = parent;
    }
    tails.reverse();
    tails
}

/// Flattened rows plus an id -> row index lookup.
pub struct FlatView<K: NodeKind> {
    rows: Vec<FlatRow<K>>,
    index: FxHashMap<NodeId, usize>,
}

impl<K: NodeKind> Clone for FlatView<K> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
            index: self.index.clone(),
        }
    }
}

impl<K: NodeKind> Default for FlatView<K> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            index: FxHashMap::with_hasher(FxBuildHasher),
        }
    }
}

impl<K: NodeKind> fmt::Debug for FlatView<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows.iter()).finish()
    }
}

impl<K: NodeKind> FlatView<K> {
    /// Flattens `forest` and indexes the visible rows.
    pub fn build(forest: &Forest<K>) -> Self {
        let rows = flatten(forest);
        let mut index = FxHashMap::with_capacity_and_hasher(rows.len(), FxBuildHasher);
        for (idx, row) in rows.iter().enumerate() {
            index.insert(row.id().clone(), idx);
        }
        Self { rows, index }
    }

    #[inline]
    pub fn rows(&self) -> &[FlatRow<K>] {
        &self.rows
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&FlatRow<K>> {
        self.rows.get(index)
    }

    /// Row index of a visible node.
    #[inline]
    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    #[inline]
    pub fn row_of(&self, id: &NodeId) -> Option<&FlatRow<K>> {
        self.index_of(id).and_then(|idx| self.rows.get(idx))
    }

    #[inline]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.rows.iter().map(FlatRow::id)
    }
}

/// A row of a drag preview, depth relative to the dragged row.
pub struct PreviewRow<K: NodeKind> {
    pub node: Arc<Node<K>>,
    pub depth: usize,
}

/// The dragged row followed by its visible descendants.
pub struct DragPreview<K: NodeKind> {
    pub rows: Vec<PreviewRow<K>>,
    /// More descendants were visible than the limit allowed.
    pub truncated: bool,
}

/// Collects the preview for dragging `id`, capped at `limit` rows.
pub fn drag_preview<K: NodeKind>(view: &FlatView<K>, id: &NodeId, limit: usize) -> Option<DragPreview<K>> {
    let start = view.index_of(id)?;
    let base = view.rows[start].depth;
    let subtree = view.rows[start..]
        .iter()
        .enumerate()
        .take_while(|(offset, row)| *offset == 0 || row.depth > base)
        .map(|(_, row)| row);

    let mut rows = Vec::new();
    let mut truncated = false;
    for row in subtree {
        if rows.len() >= limit {
            truncated = true;
            break;
        }
        rows.push(PreviewRow {
            node: Arc::clone(&row.node),
            depth: row.depth - base,
        });
    }
    Some(DragPreview { rows, truncated })
}
