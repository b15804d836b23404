use std::fmt;
use std::str::FromStr;

use crate::error::{MoveError, ParseDropError};
use crate::flatten::FlatView;
use crate::forest::Forest;
use crate::model::{ForestOrigin, NodeId, NodeKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where a dragged node lands relative to the target row.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropZone {
    /// Become the last child of the target.
    Onto,
    /// Become the sibling just before the target.
    Before,
    /// Become the sibling just after the target.
    After,
}

impl DropZone {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Onto => "onto",
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

/// Drop descriptor reported by the drag sensor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DropTarget {
    pub zone: DropZone,
    pub target: NodeId,
}

impl DropTarget {
    pub fn onto(target: impl Into<NodeId>) -> Self {
        Self {
            zone: DropZone::Onto,
            target: target.into(),
        }
    }

    pub fn before(target: impl Into<NodeId>) -> Self {
        Self {
            zone: DropZone::Before,
            target: target.into(),
        }
    }

    pub fn after(target: impl Into<NodeId>) -> Self {
        Self {
            zone: DropZone::After,
            target: target.into(),
        }
    }
}

/// Formats as a drop-zone id, `drop:<zone>:<id>`.
impl fmt::Display for DropTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drop:{}:{}", self.zone.as_str(), self.target)
    }
}

/// Parses a drop-zone id. `folder` is accepted as an alias of `onto`.
impl FromStr for DropTarget {
    type Err = ParseDropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("drop:")
            .ok_or_else(|| ParseDropError::MissingPrefix(s.to_owned()))?;
        let (zone, target) = rest
            .split_once(':')
            .ok_or_else(|| ParseDropError::UnknownZone(rest.to_owned()))?;
        let zone = match zone {
            "onto" | "folder" => DropZone::Onto,
            "before" => DropZone::Before,
            "after" => DropZone::After,
            other => return Err(ParseDropError::UnknownZone(other.to_owned())),
        };
        if target.is_empty() {
            return Err(ParseDropError::EmptyTarget);
        }
        Ok(Self {
            zone,
            target: NodeId::from(target),
        })
    }
}

/// The node carried by an active drag gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragItem {
    pub origin: ForestOrigin,
    pub kind: &'static str,
    pub id: NodeId,
}

impl DragItem {
    /// Creates a drag item for a node of kind `K`.
    pub fn of<K: NodeKind>(origin: ForestOrigin, id: NodeId) -> Self {
        Self {
            origin,
            kind: K::KIND,
            id,
        }
    }
}

/// Moves the dragged node according to `drop`, returning the new forest.
///
/// Both nodes must be rows of `view`, the flattened rows the user dropped on,
/// and still exist in `forest`; placement is always read from `forest`, so a
/// stale view can reject a drop but never lose the dragged subtree. For
/// `Before`/`After`, the insert position is the target's index among its
/// siblings after the dragged node has been detached, so dragging a node past
/// its own siblings lands exactly next to the target.
pub fn move_node<K: NodeKind>(
    forest: &Forest<K>,
    view: &FlatView<K>,
    item: &DragItem,
    drop: &DropTarget,
) -> Result<Forest<K>, MoveError> {
    if item.kind != K::KIND {
        return Err(MoveError::KindMismatch {
            expected: K::KIND,
            found: item.kind,
        });
    }
    if item.origin != forest.origin() {
        return Err(MoveError::ForeignOrigin);
    }
    if !view.contains(&item.id) || !forest.contains(&item.id) {
        return Err(MoveError::DraggedMissing(item.id.clone()));
    }
    if !view.contains(&drop.target) || !forest.contains(&drop.target) {
        return Err(MoveError::TargetMissing(drop.target.clone()));
    }

    if forest.is_descendant_or_self(&item.id, &drop.target) {
        return Err(MoveError::WouldCycle {
            dragged: item.id.clone(),
            target: drop.target.clone(),
        });
    }

    // The target is outside the dragged subtree, so it and its parent survive
    // the detach below and the insert cannot be refused.
    let parent = match drop.zone {
        DropZone::Onto => Some(drop.target.clone()),
        DropZone::Before | DropZone::After => forest.parent(&drop.target).cloned(),
    };
    if let Some(parent) = &parent
        && !forest.contains(parent)
    {
        return Err(MoveError::TargetMissing(drop.target.clone()));
    }

    let (detached, subtree) = forest.remove(&item.id);
    let Some(subtree) = subtree else {
        return Err(MoveError::DraggedMissing(item.id.clone()));
    };

    let moved = match drop.zone {
        DropZone::Onto => detached.insert(subtree, parent.as_ref(), None),
        DropZone::Before | DropZone::After => {
            let Some(mut index) = detached.sibling_index(&drop.target) else {
                return Err(MoveError::TargetMissing(drop.target.clone()));
            };
            if drop.zone == DropZone::After {
                index += 1;
            }
            detached.insert(subtree, parent.as_ref(), Some(index))
        }
    };
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{Book, Folder, FolderFields};
    use crate::model::NodeSeed;

    fn seed(name: &str, children: Vec<NodeSeed<Folder>>) -> NodeSeed<Folder> {
        NodeSeed::branch(name, FolderFields::new(name), children).expanded(true)
    }

    fn leaf(name: &str) -> NodeSeed<Folder> {
        NodeSeed::leaf(name, FolderFields::new(name))
    }

    // r -> [a, b -> [b1], c], s
    fn sample() -> Forest<Folder> {
        Forest::from_seeds(
            ForestOrigin(1),
            [
                seed("r", vec![leaf("a"), seed("b", vec![leaf("b1")]), leaf("c")]),
                leaf("s"),
            ],
        )
    }

    fn drag(id: &str) -> DragItem {
        DragItem::of::<Folder>(ForestOrigin(1), NodeId::from(id))
    }

    fn apply(forest: &Forest<Folder>, id: &str, drop: DropTarget) -> Result<Forest<Folder>, MoveError> {
        let view = FlatView::build(forest);
        move_node(forest, &view, &drag(id), &drop)
    }

    fn names(forest: &Forest<Folder>, id: &str) -> Vec<String> {
        forest
            .children(&NodeId::from(id))
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn drop_onto_appends_and_expands() {
        let forest = sample();
        let moved = apply(&forest, "a", DropTarget::onto("c")).unwrap();

        assert_eq!(names(&moved, "r"), vec!["b", "c"]);
        assert_eq!(names(&moved, "c"), vec!["a"]);
        assert!(moved.get(&NodeId::from("c")).is_some_and(|n| n.is_expanded()));
    }

    #[test]
    fn drop_after_later_sibling_uses_post_removal_index() {
        let moved = apply(&sample(), "a", DropTarget::after("b")).unwrap();
        assert_eq!(names(&moved, "r"), vec!["b", "a", "c"]);

        let moved = apply(&sample(), "a", DropTarget::before("c")).unwrap();
        assert_eq!(names(&moved, "r"), vec!["b", "a", "c"]);
    }

    #[test]
    fn drop_before_earlier_sibling() {
        let moved = apply(&sample(), "c", DropTarget::before("a")).unwrap();
        assert_eq!(names(&moved, "r"), vec!["c", "a", "b"]);
    }

    #[test]
    fn drop_between_roots() {
        let moved = apply(&sample(), "b1", DropTarget::after("r")).unwrap();

        let roots: Vec<_> = moved.roots().iter().map(ToString::to_string).collect();
        assert_eq!(roots, vec!["r", "b1", "s"]);
        assert_eq!(moved.parent(&NodeId::from("b1")), None);
    }

    #[test]
    fn rejects_drop_into_own_subtree() {
        let forest = sample();

        assert!(matches!(
            apply(&forest, "b", DropTarget::onto("b1")),
            Err(MoveError::WouldCycle { .. })
        ));
        assert!(matches!(
            apply(&forest, "b", DropTarget::before("b")),
            Err(MoveError::WouldCycle { .. })
        ));
    }

    #[test]
    fn rejects_hidden_or_missing_rows() {
        let forest = sample().toggle_expanded(&NodeId::from("b"));

        assert_eq!(
            apply(&forest, "b1", DropTarget::onto("a")).unwrap_err(),
            MoveError::DraggedMissing(NodeId::from("b1"))
        );
        assert_eq!(
            apply(&forest, "a", DropTarget::onto("zzz")).unwrap_err(),
            MoveError::TargetMissing(NodeId::from("zzz"))
        );
    }

    #[test]
    fn stale_view_never_loses_the_dragged_node() {
        let forest = sample();
        let stale = FlatView::build(&forest);
        let pruned = forest.delete(&NodeId::from("c"));

        assert_eq!(
            move_node(&pruned, &stale, &drag("a"), &DropTarget::onto("c")).unwrap_err(),
            MoveError::TargetMissing(NodeId::from("c"))
        );
        assert_eq!(
            move_node(&pruned, &stale, &drag("a"), &DropTarget::after("c")).unwrap_err(),
            MoveError::TargetMissing(NodeId::from("c"))
        );

        let without_a = forest.delete(&NodeId::from("a"));
        assert_eq!(
            move_node(&without_a, &stale, &drag("a"), &DropTarget::onto("s")).unwrap_err(),
            MoveError::DraggedMissing(NodeId::from("a"))
        );
        assert!(pruned.contains(&NodeId::from("a")));
    }

    #[test]
    fn sibling_drop_uses_current_parent() {
        let forest = sample();
        let stale = FlatView::build(&forest);
        // "c" moves under "s" after the view was taken.
        let moved = apply(&forest, "c", DropTarget::onto("s")).unwrap();

        let next = move_node(&moved, &stale, &drag("a"), &DropTarget::before("c")).unwrap();

        assert_eq!(names(&next, "s"), vec!["a", "c"]);
        assert_eq!(next.len(), forest.len());
    }

    #[test]
    fn rejects_foreign_kind_and_origin() {
        let forest = sample();
        let view = FlatView::build(&forest);
        let book = DragItem::of::<Book>(ForestOrigin(1), NodeId::from("a"));
        let other = DragItem::of::<Folder>(ForestOrigin(9), NodeId::from("a"));

        assert!(matches!(
            move_node(&forest, &view, &book, &DropTarget::onto("c")),
            Err(MoveError::KindMismatch { expected: "folder", found: "book" })
        ));
        assert_eq!(
            move_node(&forest, &view, &other, &DropTarget::onto("c")).unwrap_err(),
            MoveError::ForeignOrigin
        );
    }

    #[test]
    fn parses_drop_zone_ids() {
        assert_eq!("drop:before:x-1".parse(), Ok(DropTarget::before("x-1")));
        assert_eq!("drop:folder:root:2".parse(), Ok(DropTarget::onto("root:2")));
        assert_eq!(DropTarget::after("n").to_string(), "drop:after:n");
        assert_eq!(
            "drag:onto:x".parse::<DropTarget>(),
            Err(ParseDropError::MissingPrefix("drag:onto:x".into()))
        );
        assert_eq!(
            "drop:inside:x".parse::<DropTarget>(),
            Err(ParseDropError::UnknownZone("inside".into()))
        );
        assert_eq!("drop:onto:".parse::<DropTarget>(), Err(ParseDropError::EmptyTarget));
    }
}
