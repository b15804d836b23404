use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Borders;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the viewport follows a scroll-into-view request.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TreeScrollPolicy {
    /// Scroll the minimum amount that makes the row visible.
    #[default]
    KeepInView,
    /// Put the row in the middle of the viewport when possible.
    CenterOnSelect,
}

/// Visual settings for [`crate::TreeListView`].
#[derive(Clone)]
pub struct TreeListViewStyle<'a> {
    pub title: Option<Line<'a>>,
    pub block_style: Style,
    pub border_style: Style,
    pub highlight_style: Style,
    /// Applied to the row being dragged.
    pub drag_style: Style,
    pub line_style: Style,
    pub highlight_symbol: &'a str,
    pub borders: Borders,
}

impl Default for TreeListViewStyle<'_> {
    fn default() -> Self {
        Self {
            title: None,
            block_style: Style::default(),
            border_style: Style::default(),
            highlight_style: Style::default().add_modifier(Modifier::REVERSED),
            drag_style: Style::default().add_modifier(Modifier::DIM),
            line_style: Style::default(),
            highlight_symbol: ">> ",
            borders: Borders::ALL,
        }
    }
}
