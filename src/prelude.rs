pub use crate::{
    Book, BookFields, ChildSource, DragItem, DropTarget, DropZone, Expander, FetchApplied,
    FetchError, FetchFuture, Folder, FolderFields, Forest, ForestOrigin, KindLabels, LazyLoader,
    MoveError, NodeId, NodeKind, NodeSeed, RowPayload, RowSource, ToggleOutcome, TreeAction,
    TreeEvent, TreeGlyphs, TreeLabelPrefix, TreeLabelProvider, TreeListView, TreeListViewStyle,
    TreeRowContext, TreeScrollPolicy, TreeViewConfig, TreeViewState, tree_label_line,
};

#[cfg(feature = "keymap")]
pub use crate::{KeymapProfile, TreeKeyBindings};
