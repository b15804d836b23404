//! Error types. None of them is fatal: callers degrade to a no-op and keep rendering.

use std::error::Error as StdError;

use thiserror::Error;

use crate::model::NodeId;

/// A data source failed to deliver children.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source answered with an error.
    #[error("children request rejected: {message}")]
    Rejected { message: String },

    /// The source could not be reached.
    #[error("data source unavailable")]
    Unavailable {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl FetchError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn unavailable(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Unavailable {
            source: source.into(),
        }
    }
}

/// Why a drag-and-drop move was not performed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    /// The dragged node is not a visible row of this forest.
    #[error("dragged node {0} is not visible")]
    DraggedMissing(NodeId),

    /// The drop target is not a visible row of this forest.
    #[error("drop target {0} is not visible")]
    TargetMissing(NodeId),

    /// A node of another kind was dropped on this forest.
    #[error("cannot drop a {found} node on a {expected} forest")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The drag started in a different forest.
    #[error("drag originated in another forest")]
    ForeignOrigin,

    /// The target is the dragged node itself or one of its descendants.
    #[error("cannot move {dragged} into its own subtree at {target}")]
    WouldCycle { dragged: NodeId, target: NodeId },
}

/// A drop-zone id did not match `drop:<zone>:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDropError {
    #[error("missing `drop:` prefix in {0:?}")]
    MissingPrefix(String),

    #[error("unknown drop zone {0:?}")]
    UnknownZone(String),

    #[error("empty drop target id")]
    EmptyTarget,
}
