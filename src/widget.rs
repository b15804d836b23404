use std::marker::PhantomData;
use std::ops::Range;

use ratatui::layout::{Constraint, Rect};
use ratatui::prelude::Buffer;
use ratatui::widgets::{
    Block, Borders, Row, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Table,
    TableState,
};
use smallvec::SmallVec;

use crate::context::TreeRowContext;
use crate::flatten::tail_stack;
use crate::glyphs::{TreeGlyphs, TreeLabelProvider};
use crate::model::NodeKind;
use crate::state::TreeViewState;
use crate::style::TreeListViewStyle;
use crate::viewport::RowSource;

/// Virtualized tree widget: only rows in the viewport window are built.
pub struct TreeListView<'a, K, L>
where
    K: NodeKind,
    L: TreeLabelProvider<K>,
{
    label: &'a L,
    style: TreeListViewStyle<'a>,
    glyphs: TreeGlyphs<'a>,
    _kind: PhantomData<K>,
}

impl<'a, K, L> TreeListView<'a, K, L>
where
    K: NodeKind,
    L: TreeLabelProvider<K>,
{
    pub const fn new(label: &'a L, style: TreeListViewStyle<'a>) -> Self {
        Self {
            label,
            style,
            glyphs: TreeGlyphs::unicode(),
            _kind: PhantomData,
        }
    }

    #[must_use]
    pub const fn glyphs(mut self, glyphs: TreeGlyphs<'a>) -> Self {
        self.glyphs = glyphs;
        self
    }

    fn build_rows<'s>(&self, state: &'s TreeViewState<K>, window: Range<usize>) -> Vec<Row<'s>>
    where
        'a: 's,
    {
        let draw_lines = state.config().draw_lines;
        let mut rows = Vec::with_capacity(window.len());
        for index in window {
            let Some(payload) = state.row_at(index) else {
                break;
            };
            let tails = if draw_lines {
                tail_stack(state.forest(), payload.id())
            } else {
                SmallVec::new()
            };
            let ctx = TreeRowContext {
                depth: payload.depth(),
                is_tail_stack: &tails,
                expander: payload.expander,
                draw_lines,
                line_style: self.style.line_style,
            };
            let cell = self.label.cell(payload.fields(), &ctx, &self.glyphs);
            let mut row = Row::new([cell]);
            if payload.is_dragged {
                row = row.style(self.style.drag_style);
            }
            rows.push(row);
        }
        rows
    }

    #[inline]
    fn render_scrollbar(
        area: Rect,
        buf: &mut Buffer,
        offset: usize,
        inner_height: usize,
        scroll_rows: usize,
    ) {
        let scroll_len = scroll_rows.saturating_add(1);
        let position = offset.min(scroll_len.saturating_sub(1));
        let mut scrollbar_state = ScrollbarState::new(scroll_len)
            .position(position)
            .viewport_content_length(inner_height);
        Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .render(area, buf, &mut scrollbar_state);
    }
}

impl<K, L> StatefulWidget for TreeListView<'_, K, L>
where
    K: NodeKind,
    L: TreeLabelProvider<K>,
{
    type State = TreeViewState<K>;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let mut block = Block::default().borders(self.style.borders);
        if let Some(title) = self.style.title.clone() {
            block = block.title(title);
        }
        block = block
            .style(self.style.block_style)
            .border_style(self.style.border_style);

        let inner_height = block.inner(area).height as usize;
        let offset = state.sync_viewport(inner_height);
        let total_rows = state.total_row_count();
        let scroll_rows = total_rows.saturating_sub(inner_height);

        // Rows outside the window are never built; the table only sees the
        // window, with the offset and selection rebased onto it.
        let window = state.visible_window(inner_height);
        let mut table_state = TableState::default().with_offset(offset - window.start);
        if let Some(selected) = state.selected_index()
            && window.contains(&selected)
        {
            table_state.select(Some(selected - window.start));
        }

        let (table_area, table_block, scrollbar_area) = if scroll_rows > 0 {
            let table_area = Rect {
                width: area.width.saturating_sub(1),
                ..area
            };
            let scrollbar_area = Rect {
                x: area.x + area.width.saturating_sub(1),
                y: area.y,
                width: 1,
                height: area.height,
            };
            let mut table_borders = self.style.borders;
            table_borders.remove(Borders::RIGHT);
            (table_area, block.borders(table_borders), Some(scrollbar_area))
        } else {
            (area, block, None)
        };

        let rows = self.build_rows(state, window);
        let table = Table::new(rows, [Constraint::Fill(1)])
            .style(self.style.block_style)
            .block(table_block)
            .row_highlight_style(self.style.highlight_style)
            .highlight_symbol(self.style.highlight_symbol);
        StatefulWidget::render(table, table_area, buf, &mut table_state);

        if let Some(scrollbar_area) = scrollbar_area {
            Self::render_scrollbar(scrollbar_area, buf, offset, inner_height, scroll_rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::Forest;
    use crate::glyphs::KindLabels;
    use crate::kinds::{Folder, FolderFields};
    use crate::model::{ForestOrigin, NodeId, NodeSeed};

    fn state(child_count: usize) -> TreeViewState<Folder> {
        let children = (1..=child_count)
            .map(|idx| {
                let name = format!("node-{idx}");
                NodeSeed::leaf(name.as_str(), FolderFields::new(name.as_str()))
            })
            .collect();
        let root = NodeSeed::branch("root", FolderFields::new("root"), children).expanded(true);
        TreeViewState::new(Forest::from_seeds(ForestOrigin(0), [root]))
    }

    fn line(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn render_smoke_with_scrollbar() {
        let label = KindLabels;
        let widget = TreeListView::new(&label, TreeListViewStyle::default());
        let mut state = state(12);

        let area = Rect::new(0, 0, 20, 6);
        let mut buffer = Buffer::empty(area);

        widget.render(area, &mut buffer, &mut state);
    }

    #[test]
    fn render_draws_guide_lines_for_window_rows() {
        let label = KindLabels;
        let widget =
            TreeListView::new(&label, TreeListViewStyle::default()).glyphs(TreeGlyphs::ascii());
        let mut state = state(2);

        let area = Rect::new(0, 0, 24, 5);
        let mut buffer = Buffer::empty(area);
        widget.render(area, &mut buffer, &mut state);

        assert!(line(&buffer, 2).contains("|--* node-1"));
        assert!(line(&buffer, 3).contains("`--* node-2"));
    }

    #[test]
    fn render_scrolls_selection_into_view() {
        let label = KindLabels;
        let widget = TreeListView::new(&label, TreeListViewStyle::default());
        let mut state = state(12);
        state.select(&NodeId::from("node-10"));

        let area = Rect::new(0, 0, 24, 6);
        let mut buffer = Buffer::empty(area);
        widget.render(area, &mut buffer, &mut state);

        assert_eq!(state.offset(), 7);
        assert!(state.scroll_request().is_none());
        assert!(line(&buffer, 1).contains("node-7"));
        let last = line(&buffer, 4);
        assert!(last.contains(">>"));
        assert!(last.contains("node-10"));
    }
}
