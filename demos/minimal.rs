// Minimal example: a small book forest rendered with default styling.
use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;

use tui_lazytree::{
    Book, BookFields, Forest, ForestOrigin, KindLabels, NodeId, NodeSeed, TreeAction,
    TreeListView, TreeListViewStyle, TreeViewState,
};

fn book(id: &str, title: &str) -> NodeSeed<Book> {
    NodeSeed::leaf(id, BookFields::new(title, "Tolkien"))
}

fn main() {
    // One series with two volumes; the series starts expanded.
    let series = NodeSeed::branch(
        "lotr",
        BookFields::new("The Lord of the Rings", "Tolkien"),
        vec![
            book("fellowship", "The Fellowship of the Ring"),
            book("towers", "The Two Towers"),
        ],
    )
    .expanded(true);
    let forest = Forest::from_seeds(ForestOrigin(1), [series, book("hobbit", "The Hobbit")]);

    // State owns the forest snapshot, selection and scroll position.
    let mut state = TreeViewState::new(forest);
    state.select(&NodeId::from("towers"));
    state.handle_action::<()>(TreeAction::SelectFirst);

    let label = KindLabels;
    let widget = TreeListView::<Book, _>::new(&label, TreeListViewStyle::default());

    // Render into an in-memory buffer (no terminal required for the example).
    let area = Rect::new(0, 0, 40, 8);
    let mut buffer = Buffer::empty(area);

    widget.render(area, &mut buffer, &mut state);
}
