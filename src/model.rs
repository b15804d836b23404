use std::borrow::Borrow;
use std::fmt;

use compact_str::CompactString;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque node identifier.
///
/// Ids are stable for the lifetime of a node (moves keep them) and unique within
/// a forest. Short ids are stored inline, so cloning is cheap.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(CompactString);

impl NodeId {
    /// Creates an id from any string-like value.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

/// Node-kind capability shared by every forest.
///
/// A kind only decides what a node displays and how it is tagged; structure
/// (ids, parents, children, expand state) is owned by the generic engine.
pub trait NodeKind: Send + Sync + 'static {
    /// Kind-specific display payload, opaque to the engine.
    type Fields: Clone + fmt::Debug + Send + Sync + 'static;

    /// Tag used to reject drops of a foreign node kind.
    const KIND: &'static str;
}

/// Identifies the forest a row or drag gesture came from.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ForestOrigin(pub u16);

/// Children of a node: not fetched yet, or a known (possibly empty) list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Children {
    #[default]
    Unknown,
    Known(Vec<NodeId>),
}

impl Children {
    /// Returns the known child ids (empty while unknown).
    #[inline]
    pub fn as_slice(&self) -> &[NodeId] {
        match self {
            Self::Unknown => &[],
            Self::Known(ids) => ids,
        }
    }

    #[inline]
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

/// Loading lifecycle of a node's children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

/// A single node of a forest.
///
/// Nodes are immutable snapshots shared between forest versions; every
/// structural change produces new node values along the affected path.
pub struct Node<K: NodeKind> {
    pub(crate) id: NodeId,
    pub(crate) fields: K::Fields,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Children,
    pub(crate) expanded: bool,
    pub(crate) loading: bool,
}

impl<K: NodeKind> Clone for Node<K> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            fields: self.fields.clone(),
            parent: self.parent.clone(),
            children: self.children.clone(),
            expanded: self.expanded,
            loading: self.loading,
        }
    }
}

impl<K: NodeKind> fmt::Debug for Node<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &K::KIND)
            .field("id", &self.id)
            .field("fields", &self.fields)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("expanded", &self.expanded)
            .field("loading", &self.loading)
            .finish()
    }
}

impl<K: NodeKind> Node<K> {
    #[inline]
    pub const fn id(&self) -> &NodeId {
        &self.id
    }

    #[inline]
    pub const fn fields(&self) -> &K::Fields {
        &self.fields
    }

    /// Parent id, or `None` for a root.
    #[inline]
    pub const fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    #[inline]
    pub const fn children(&self) -> &Children {
        &self.children
    }

    /// Known child ids (empty while unknown).
    #[inline]
    pub fn child_ids(&self) -> &[NodeId] {
        self.children.as_slice()
    }

    /// Expand flag; only meaningful while children are known.
    #[inline]
    pub const fn is_expanded(&self) -> bool {
        self.expanded && self.children.is_known()
    }

    #[inline]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[inline]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns `true` if the node has at least one known child.
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.as_slice().is_empty()
    }

    /// Returns `true` if expanding could reveal rows: children are unknown or non-empty.
    #[inline]
    pub fn may_have_children(&self) -> bool {
        match &self.children {
            Children::Unknown => true,
            Children::Known(ids) => !ids.is_empty(),
        }
    }

    pub const fn load_state(&self) -> LoadState {
        if self.loading {
            LoadState::Loading
        } else if self.children.is_known() {
            LoadState::Loaded
        } else {
            LoadState::Unloaded
        }
    }
}

/// External description of a node, used to seed a forest and to deliver fetched children.
///
/// `children: None` means the children are unknown and will be fetched lazily.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(bound(
        serialize = "K::Fields: Serialize",
        deserialize = "K::Fields: Deserialize<'de>"
    ))
)]
pub struct NodeSeed<K: NodeKind> {
    pub id: NodeId,
    pub fields: K::Fields,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Option<Vec<NodeSeed<K>>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub expanded: bool,
}

impl<K: NodeKind> NodeSeed<K> {
    /// A node whose children will be fetched on first expansion.
    pub fn lazy(id: impl Into<NodeId>, fields: K::Fields) -> Self {
        Self {
            id: id.into(),
            fields,
            children: None,
            expanded: false,
        }
    }

    /// A node with a known, empty child list.
    pub fn leaf(id: impl Into<NodeId>, fields: K::Fields) -> Self {
        Self {
            id: id.into(),
            fields,
            children: Some(Vec::new()),
            expanded: false,
        }
    }

    /// A node with known children.
    pub fn branch(id: impl Into<NodeId>, fields: K::Fields, children: Vec<Self>) -> Self {
        Self {
            id: id.into(),
            fields,
            children: Some(children),
            expanded: false,
        }
    }

    #[must_use]
    pub const fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }
}

impl<K: NodeKind> Clone for NodeSeed<K> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            fields: self.fields.clone(),
            children: self.children.clone(),
            expanded: self.expanded,
        }
    }
}

impl<K: NodeKind> fmt::Debug for NodeSeed<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSeed")
            .field("id", &self.id)
            .field("fields", &self.fields)
            .field("children", &self.children)
            .field("expanded", &self.expanded)
            .finish()
    }
}
