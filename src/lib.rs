//! Lazily loaded, drag-and-drop tree views for ratatui.
//!
//! The core is a persistent [`Forest`]: every structural operation returns a new
//! snapshot and leaves the old one intact. [`TreeViewState`] owns the current
//! snapshot, its flattened rows, the selection and any drag gesture;
//! [`LazyLoader`] fetches unknown children from a [`ChildSource`] and
//! [`TreeListView`] renders only the rows inside the viewport.
//!
//! Feature flags:
//! - `keymap`: crossterm-based key bindings and `TreeViewState::handle_key*` helpers.
//! - `serde`: serde support for `NodeSeed`, the built-in kinds, `TreeViewConfig` and `DropZone`.

mod action;
mod config;
mod context;
mod dnd;
mod error;
mod flatten;
mod forest;
mod glyphs;
#[cfg(feature = "keymap")]
mod keymap;
mod kinds;
mod loader;
mod model;
mod nav;
pub mod prelude;
mod state;
mod style;
mod viewport;
mod widget;

pub use action::{TreeAction, TreeEvent};
pub use config::TreeViewConfig;
pub use context::TreeRowContext;
pub use dnd::{DragItem, DropTarget, DropZone, move_node};
pub use error::{FetchError, MoveError, ParseDropError};
pub use flatten::{
    DragPreview, FlatRow, FlatView, PreviewRow, drag_preview, flatten, tail_stack,
};
pub use forest::{Forest, Subtree, TreeStats};
pub use glyphs::{
    KindLabels, TreeGlyphs, TreeLabelPrefix, TreeLabelProvider, tree_label_line, tree_name_cell,
};
#[cfg(feature = "keymap")]
pub use keymap::{KeymapProfile, TreeKeyBindings};
pub use kinds::{Book, BookFields, Folder, FolderFields};
pub use loader::{
    ChildSource, FetchApplied, FetchFuture, FetchOutcome, FetchResult, LazyLoader, apply_outcome,
    begin_load,
};
pub use model::{Children, ForestOrigin, LoadState, Node, NodeId, NodeKind, NodeSeed};
pub use nav::{NavCommand, NavKey, Navigation, navigate};
pub use state::{ToggleOutcome, TreeViewState};
pub use style::{TreeListViewStyle, TreeScrollPolicy};
pub use viewport::{Expander, RowPayload, RowSource, scroll_offset_for, visible_range};
pub use widget::TreeListView;
