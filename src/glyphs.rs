use std::borrow::Cow;

use ratatui::text::{Line, Span};
use ratatui::widgets::Cell;

use crate::context::TreeRowContext;
use crate::kinds::{Book, Folder};
use crate::model::NodeKind;
use crate::viewport::Expander;

#[derive(Clone, Copy)]
pub struct TreeGlyphs<'a> {
    pub indent: &'a str,
    pub branch_last: &'a str,
    pub branch: &'a str,
    pub vert: &'a str,
    pub empty: &'a str,
    pub leaf: &'a str,
    pub expanded: &'a str,
    pub collapsed: &'a str,
    /// Children not fetched yet.
    pub unloaded: &'a str,
    pub loading: &'a str,
}

impl TreeGlyphs<'static> {
    pub const fn unicode() -> Self {
        Self {
            indent: "   ",
            branch_last: "└──",
            branch: "├──",
            vert: "│  ",
            empty: "   ",
            leaf: "•",
            expanded: "▼",
            collapsed: "▶",
            unloaded: "▷",
            loading: "…",
        }
    }

    pub const fn ascii() -> Self {
        Self {
            indent: "   ",
            branch_last: "`--",
            branch: "|--",
            vert: "|  ",
            empty: "   ",
            leaf: "*",
            expanded: "v",
            collapsed: ">",
            unloaded: "+",
            loading: "~",
        }
    }
}

impl<'a> TreeGlyphs<'a> {
    const fn expander(&self, expander: Expander) -> &'a str {
        match expander {
            Expander::Leaf => self.leaf,
            Expander::Collapsed => self.collapsed,
            Expander::Expanded => self.expanded,
            Expander::Unloaded => self.unloaded,
            Expander::Loading => self.loading,
        }
    }
}

#[derive(Clone)]
pub struct TreeLabelPrefix<'a> {
    pub name: &'a str,
    pub prefix: Option<Cow<'a, str>>,
}

/// Text shown for a node of kind `K`.
pub trait TreeLabelProvider<K: NodeKind> {
    fn label_parts<'a>(&'a self, fields: &'a K::Fields) -> TreeLabelPrefix<'a>;

    fn cell<'a>(
        &'a self,
        fields: &'a K::Fields,
        ctx: &TreeRowContext,
        glyphs: &TreeGlyphs<'a>,
    ) -> Cell<'a> {
        tree_name_cell(ctx, self.label_parts(fields), glyphs)
    }
}

/// Labels the built-in kinds: folders by name, books by title.
#[derive(Clone, Copy, Debug, Default)]
pub struct KindLabels;

impl TreeLabelProvider<Folder> for KindLabels {
    fn label_parts<'a>(&'a self, fields: &'a <Folder as NodeKind>::Fields) -> TreeLabelPrefix<'a> {
        TreeLabelPrefix {
            name: &fields.name,
            prefix: None,
        }
    }
}

impl TreeLabelProvider<Book> for KindLabels {
    fn label_parts<'a>(&'a self, fields: &'a <Book as NodeKind>::Fields) -> TreeLabelPrefix<'a> {
        TreeLabelPrefix {
            name: &fields.title,
            prefix: None,
        }
    }
}

pub fn tree_label_line<'a>(
    ctx: &TreeRowContext<'_>,
    parts: TreeLabelPrefix<'a>,
    glyphs: &TreeGlyphs<'a>,
) -> Line<'a> {
    let TreeLabelPrefix { name, prefix } = parts;
    let prefix = prefix.filter(|value| !value.is_empty());

    if ctx.depth == 0 || !ctx.draw_lines {
        // Roots without children get no marker.
        let expander = if ctx.depth == 0 && ctx.expander == Expander::Leaf {
            ""
        } else {
            glyphs.expander(ctx.expander)
        };

        let mut spans = Vec::with_capacity(ctx.depth + 4);
        for _ in 0..ctx.depth {
            spans.push(Span::raw(glyphs.empty));
        }
        if !expander.is_empty() {
            spans.push(Span::raw(expander));
        }
        if let Some(prefix) = prefix {
            spans.push(Span::raw(prefix));
        }
        spans.push(Span::raw(" "));
        spans.push(Span::raw(name));
        return Line::from(spans);
    }

    let mut spans = Vec::with_capacity(ctx.is_tail_stack.len() + 5);
    let last_level = ctx.depth - 1;
    for (level, is_last) in ctx.is_tail_stack.iter().enumerate() {
        let part = match (level == last_level, *is_last) {
            (true, true) => glyphs.branch_last,
            (true, false) => glyphs.branch,
            (false, true) => glyphs.indent,
            (false, false) => glyphs.vert,
        };
        spans.push(Span::styled(part, ctx.line_style));
    }

    let expander = glyphs.expander(ctx.expander);
    if !expander.is_empty() {
        spans.push(Span::raw(expander));
        spans.push(Span::raw(" "));
    }
    if let Some(prefix) = prefix {
        spans.push(Span::raw(prefix));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(name));
    Line::from(spans)
}

pub fn tree_name_cell<'a>(
    ctx: &TreeRowContext<'_>,
    parts: TreeLabelPrefix<'a>,
    glyphs: &TreeGlyphs<'a>,
) -> Cell<'a> {
    Cell::from(tree_label_line(ctx, parts, glyphs))
}
