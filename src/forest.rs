use std::fmt;
use std::mem;
use std::sync::Arc;

use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::{trace, warn};

use crate::model::{Children, ForestOrigin, Node, NodeId, NodeKind, NodeSeed};

type NodeMap<K> = FxHashMap<NodeId, Arc<Node<K>>>;

/// An ordered set of root nodes and everything reachable from them.
///
/// A forest is a persistent value: every operation takes `&self` and returns a
/// new forest, sharing untouched nodes with the original. Holding on to an old
/// forest is a consistent snapshot for as long as it is needed.
///
/// Invariants kept by every operation:
/// - ids are unique across the forest;
/// - a non-root node's `parent` is the node whose child list contains it;
/// - no node is its own ancestor.
pub struct Forest<K: NodeKind> {
    origin: ForestOrigin,
    roots: Arc<Vec<NodeId>>,
    nodes: Arc<NodeMap<K>>,
}

impl<K: NodeKind> Clone for Forest<K> {
    fn clone(&self) -> Self {
        Self {
            origin: self.origin,
            roots: Arc::clone(&self.roots),
            nodes: Arc::clone(&self.nodes),
        }
    }
}

impl<K: NodeKind> fmt::Debug for Forest<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forest")
            .field("kind", &K::KIND)
            .field("origin", &self.origin)
            .field("roots", &self.roots)
            .field("len", &self.nodes.len())
            .finish()
    }
}

/// A node detached from a forest together with its whole subtree.
///
/// Nodes are stored in pre-order; the first one is the subtree root.
pub struct Subtree<K: NodeKind> {
    nodes: Vec<Arc<Node<K>>>,
}

impl<K: NodeKind> Subtree<K> {
    /// Returns the subtree root.
    pub fn root(&self) -> &Node<K> {
        &self.nodes[0]
    }

    pub fn root_id(&self) -> &NodeId {
        &self.nodes[0].id
    }

    /// Number of nodes, root included.
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids in pre-order.
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|node| &node.id)
    }
}

impl<K: NodeKind> fmt::Debug for Subtree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

/// Aggregate counters over a forest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub total: usize,
    pub roots: usize,
    /// Nodes whose children are known and currently shown.
    pub expanded: usize,
    /// Nodes with a fetch in flight.
    pub loading: usize,
    /// Nodes whose children were never fetched.
    pub unloaded: usize,
    /// Nodes with a known, empty child list.
    pub leaves: usize,
}

impl<K: NodeKind> Forest<K> {
    /// Creates an empty forest.
    pub fn new(origin: ForestOrigin) -> Self {
        Self {
            origin,
            roots: Arc::new(Vec::new()),
            nodes: Arc::new(FxHashMap::with_hasher(FxBuildHasher)),
        }
    }

    /// Builds a forest from externally supplied seeds.
    ///
    /// Seeds whose id is already taken are skipped together with their subtree.
    pub fn from_seeds<I>(origin: ForestOrigin, seeds: I) -> Self
    where
        I: IntoIterator<Item = NodeSeed<K>>,
    {
        let mut forest = Self::new(origin);
        let nodes = Arc::make_mut(&mut forest.nodes);
        let roots = Arc::make_mut(&mut forest.roots);
        for seed in seeds {
            if let Some(id) = plant(nodes, seed, None) {
                roots.push(id);
            }
        }
        forest
    }

    #[inline]
    pub const fn origin(&self) -> ForestOrigin {
        self.origin
    }

    /// Total number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Returns the node snapshot for `id`.
    #[inline]
    pub fn get(&self, id: &NodeId) -> Option<&Arc<Node<K>>> {
        self.nodes.get(id)
    }

    #[inline]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Known children of `id` (empty if unknown or absent).
    pub fn children(&self, id: &NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |node| node.child_ids())
    }

    pub fn parent(&self, id: &NodeId) -> Option<&NodeId> {
        self.nodes.get(id).and_then(|node| node.parent())
    }

    /// Iterates over all nodes in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Node<K>>> {
        self.nodes.values()
    }

    /// Position of `id` among its siblings (or among the roots).
    pub fn sibling_index(&self, id: &NodeId) -> Option<usize> {
        let node = self.nodes.get(id)?;
        let siblings = match node.parent() {
            Some(parent) => self.children(parent),
            None => self.roots.as_slice(),
        };
        siblings.iter().position(|sibling| sibling == id)
    }

    /// Flips the expand flag of `id`.
    ///
    /// No-op if the node is absent, its children are unknown, or a fetch is in flight.
    pub fn toggle_expanded(&self, id: &NodeId) -> Self {
        match self.nodes.get(id) {
            Some(node) if node.children.is_known() && !node.loading => {
                let expanded = !node.expanded;
                self.with_node(id, |node| node.expanded = expanded)
            }
            _ => {
                trace!(kind = K::KIND, %id, "toggle ignored");
                self.clone()
            }
        }
    }

    /// Sets the expand flag of `id`, with the same preconditions as [`Self::toggle_expanded`].
    pub fn set_expanded(&self, id: &NodeId, expanded: bool) -> Self {
        match self.nodes.get(id) {
            Some(node) if node.children.is_known() && !node.loading && node.expanded != expanded => {
                self.with_node(id, |node| node.expanded = expanded)
            }
            _ => self.clone(),
        }
    }

    /// Sets the in-flight fetch flag of `id`.
    pub fn set_loading(&self, id: &NodeId, loading: bool) -> Self {
        match self.nodes.get(id) {
            Some(node) if node.loading != loading => {
                self.with_node(id, |node| node.loading = loading)
            }
            _ => self.clone(),
        }
    }

    /// Installs fetched children under `id`, clears `loading` and expands the node.
    ///
    /// Children already present under `id` (for example dropped there while the
    /// fetch was in flight) are kept after the fetched ones. Fetched ids that
    /// already exist anywhere in the forest are skipped.
    pub fn set_children(&self, id: &NodeId, children: Vec<NodeSeed<K>>) -> Self {
        if !self.nodes.contains_key(id) {
            trace!(kind = K::KIND, %id, "children for unknown node dropped");
            return self.clone();
        }

        let mut next = self.clone();
        let nodes = Arc::make_mut(&mut next.nodes);
        let retained = nodes.get_mut(id).map_or_else(Vec::new, |node| {
            let node = Arc::make_mut(node);
            node.loading = false;
            node.expanded = true;
            let previous = mem::replace(
                &mut node.children,
                Children::Known(Vec::with_capacity(children.len())),
            );
            match previous {
                Children::Known(ids) => ids,
                Children::Unknown => Vec::new(),
            }
        });

        for seed in children {
            if let Some(child) = plant(nodes, seed, Some(id.clone()))
                && let Some(ids) = child_list_mut(nodes, id)
            {
                ids.push(child);
            }
        }
        if let Some(ids) = child_list_mut(nodes, id) {
            ids.extend(retained);
        }
        next
    }

    /// Detaches `id` and its whole subtree.
    ///
    /// Returns the unchanged forest and `None` if `id` is absent.
    pub fn remove(&self, id: &NodeId) -> (Self, Option<Subtree<K>>) {
        let Some(node) = self.nodes.get(id) else {
            trace!(kind = K::KIND, %id, "remove of unknown node ignored");
            return (self.clone(), None);
        };
        let parent = node.parent.clone();

        let mut next = self.clone();
        let nodes = Arc::make_mut(&mut next.nodes);
        let siblings = match &parent {
            Some(parent) => child_list_mut(nodes, parent),
            None => Some(Arc::make_mut(&mut next.roots)),
        };
        if let Some(siblings) = siblings
            && let Some(pos) = siblings.iter().position(|sibling| sibling == id)
        {
            siblings.remove(pos);
        }

        let mut removed = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            let Some(node) = nodes.remove(&current) else {
                continue;
            };
            stack.extend(node.child_ids().iter().rev().cloned());
            removed.push(node);
        }

        (next, Some(Subtree { nodes: removed }))
    }

    /// Removes `id` and its subtree, discarding them.
    pub fn delete(&self, id: &NodeId) -> Self {
        self.remove(id).0
    }

    /// Inserts a detached subtree under `parent` (or as a root) at `index`.
    ///
    /// `index` out of range (or `None`) appends. The subtree root is reparented
    /// and the target parent is expanded. Rejected as a no-op if `parent` is
    /// absent or any subtree id already exists in the forest; acyclicity of the
    /// move itself is checked by the caller.
    pub fn insert(&self, subtree: Subtree<K>, parent: Option<&NodeId>, index: Option<usize>) -> Self {
        if let Some(parent) = parent
            && !self.nodes.contains_key(parent)
        {
            trace!(kind = K::KIND, %parent, "insert under unknown parent ignored");
            return self.clone();
        }
        if let Some(clash) = subtree.ids().find(|id| self.nodes.contains_key(*id)) {
            warn!(kind = K::KIND, id = %clash, "insert would duplicate an id");
            return self.clone();
        }

        let mut next = self.clone();
        let nodes = Arc::make_mut(&mut next.nodes);
        let mut detached = subtree.nodes.into_iter();
        let Some(mut root) = detached.next() else {
            return next;
        };
        Arc::make_mut(&mut root).parent = parent.cloned();
        let root_id = root.id.clone();
        nodes.insert(root_id.clone(), root);
        for node in detached {
            nodes.insert(node.id.clone(), node);
        }

        attach(nodes, &mut next.roots, parent, root_id, index);
        next
    }

    /// Appends a new node (and its seeded subtree) under `parent`, or as a root.
    ///
    /// No-op if `parent` is absent or the seed id is already taken.
    pub fn add_node(&self, parent: Option<&NodeId>, seed: NodeSeed<K>) -> Self {
        if let Some(parent) = parent
            && !self.nodes.contains_key(parent)
        {
            trace!(kind = K::KIND, %parent, "add under unknown parent ignored");
            return self.clone();
        }
        if self.nodes.contains_key(&seed.id) {
            warn!(kind = K::KIND, id = %seed.id, "add would duplicate an id");
            return self.clone();
        }

        let mut next = self.clone();
        let nodes = Arc::make_mut(&mut next.nodes);
        if let Some(id) = plant(nodes, seed, parent.cloned()) {
            attach(nodes, &mut next.roots, parent, id, None);
        }
        next
    }

    /// Returns `true` if `node` is `ancestor` or lies somewhere below it.
    ///
    /// Walks parent links upward, so it runs in O(depth).
    pub fn is_descendant_or_self(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        if ancestor == node {
            return true;
        }
        let mut current = node;
        // Bounded by node count so a corrupted parent chain cannot spin forever.
        for _ in 0..self.nodes.len() {
            let Some(parent) = self.nodes.get(current).and_then(|n| n.parent.as_ref()) else {
                return false;
            };
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Expands every node with known, non-empty children.
    pub fn expand_all(&self) -> Self {
        self.map_expanded(|node| node.has_children() && !node.loading)
    }

    /// Collapses every node below the roots; roots with known children stay
    /// expanded so their first level remains visible.
    pub fn collapse_all(&self) -> Self {
        self.map_expanded(|node| node.is_root() && node.has_children() && !node.loading)
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            total: self.nodes.len(),
            roots: self.roots.len(),
            ..TreeStats::default()
        };
        for node in self.nodes.values() {
            if node.loading {
                stats.loading += 1;
            }
            match &node.children {
                Children::Unknown => stats.unloaded += 1,
                Children::Known(ids) if ids.is_empty() => stats.leaves += 1,
                Children::Known(_) => {}
            }
            if node.is_expanded() {
                stats.expanded += 1;
            }
        }
        stats
    }

    fn with_node(&self, id: &NodeId, update: impl FnOnce(&mut Node<K>)) -> Self {
        let mut next = self.clone();
        if let Some(node) = Arc::make_mut(&mut next.nodes).get_mut(id) {
            update(Arc::make_mut(node));
        }
        next
    }

    fn map_expanded(&self, expand: impl Fn(&Node<K>) -> bool) -> Self {
        let mut next = self.clone();
        for node in Arc::make_mut(&mut next.nodes).values_mut() {
            let expanded = expand(node);
            if node.expanded != expanded {
                Arc::make_mut(node).expanded = expanded;
            }
        }
        next
    }
}

/// Known child list of `id`, turning unknown children into a known empty list.
fn child_list_mut<'a, K: NodeKind>(
    nodes: &'a mut NodeMap<K>,
    id: &NodeId,
) -> Option<&'a mut Vec<NodeId>> {
    let node = Arc::make_mut(nodes.get_mut(id)?);
    if !node.children.is_known() {
        node.children = Children::Known(Vec::new());
    }
    match &mut node.children {
        Children::Known(ids) => Some(ids),
        Children::Unknown => None,
    }
}

/// Links an already stored node into its parent's child list (or the roots).
fn attach<K: NodeKind>(
    nodes: &mut NodeMap<K>,
    roots: &mut Arc<Vec<NodeId>>,
    parent: Option<&NodeId>,
    id: NodeId,
    index: Option<usize>,
) {
    let siblings = match parent {
        Some(parent) => {
            if let Some(node) = nodes.get_mut(parent) {
                Arc::make_mut(node).expanded = true;
            }
            child_list_mut(nodes, parent)
        }
        None => Some(Arc::make_mut(roots)),
    };
    if let Some(siblings) = siblings {
        let at = index
            .filter(|&at| at <= siblings.len())
            .unwrap_or(siblings.len());
        siblings.insert(at, id);
    }
}

/// Stores `seed` and its descendants under `parent`; returns the stored root id.
///
/// Descendants are linked into their parents here; the root is left for the
/// caller to link. Uses an explicit stack so seed depth is not bounded by the
/// call stack.
fn plant<K: NodeKind>(
    nodes: &mut NodeMap<K>,
    seed: NodeSeed<K>,
    parent: Option<NodeId>,
) -> Option<NodeId> {
    if nodes.contains_key(&seed.id) {
        warn!(kind = K::KIND, id = %seed.id, "duplicate node id skipped");
        return None;
    }
    let root_id = seed.id.clone();

    let mut stack = vec![(seed, parent, false)];
    while let Some((seed, parent, link)) = stack.pop() {
        let NodeSeed {
            id,
            fields,
            children,
            expanded,
        } = seed;
        if nodes.contains_key(&id) {
            warn!(kind = K::KIND, %id, "duplicate node id skipped");
            continue;
        }

        let (children, pending) = match children {
            None => (Children::Unknown, Vec::new()),
            Some(seeds) => (Children::Known(Vec::with_capacity(seeds.len())), seeds),
        };
        if link
            && let Some(parent) = parent.as_ref()
            && let Some(ids) = child_list_mut(nodes, parent)
        {
            ids.push(id.clone());
        }
        stack.extend(
            pending
                .into_iter()
                .rev()
                .map(|child| (child, Some(id.clone()), true)),
        );
        nodes.insert(
            id.clone(),
            Arc::new(Node {
                id,
                fields,
                parent,
                children,
                expanded,
                loading: false,
            }),
        );
    }

    Some(root_id)
}
