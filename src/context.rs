use ratatui::style::Style;

use crate::viewport::Expander;

#[derive(Clone, Copy)]
pub struct TreeRowContext<'a> {
    pub depth: usize,
    pub is_tail_stack: &'a [bool],
    pub expander: Expander,
    pub draw_lines: bool,
    pub line_style: Style,
}
