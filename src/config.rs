use crate::style::TreeScrollPolicy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Behavioural settings of a tree view.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeViewConfig {
    /// How scroll-into-view requests move the viewport.
    pub scroll_policy: TreeScrollPolicy,
    /// Extra rows materialized above and below the viewport.
    pub overscan: usize,
    /// Maximum rows in a drag preview.
    pub drag_preview_limit: usize,
    /// Draw guide lines between parents and children.
    pub draw_lines: bool,
}

impl TreeViewConfig {
    pub const DEFAULT_OVERSCAN: usize = 4;
    pub const DEFAULT_DRAG_PREVIEW_LIMIT: usize = 20;

    pub const fn new() -> Self {
        Self {
            scroll_policy: TreeScrollPolicy::KeepInView,
            overscan: Self::DEFAULT_OVERSCAN,
            drag_preview_limit: Self::DEFAULT_DRAG_PREVIEW_LIMIT,
            draw_lines: true,
        }
    }

    #[must_use]
    pub const fn scroll_policy(mut self, policy: TreeScrollPolicy) -> Self {
        self.scroll_policy = policy;
        self
    }

    #[must_use]
    pub const fn overscan(mut self, rows: usize) -> Self {
        self.overscan = rows;
        self
    }

    #[must_use]
    pub const fn drag_preview_limit(mut self, rows: usize) -> Self {
        self.drag_preview_limit = rows;
        self
    }

    #[must_use]
    pub const fn draw_lines(mut self, draw: bool) -> Self {
        self.draw_lines = draw;
        self
    }
}

impl Default for TreeViewConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: TreeViewConfig =
            serde_json::from_str(r#"{"scroll_policy":"CenterOnSelect","overscan":2}"#).unwrap();

        assert_eq!(config.scroll_policy, TreeScrollPolicy::CenterOnSelect);
        assert_eq!(config.overscan, 2);
        assert_eq!(config.drag_preview_limit, TreeViewConfig::DEFAULT_DRAG_PREVIEW_LIMIT);
        assert!(config.draw_lines);
    }
}
