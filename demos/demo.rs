// Lazy filesystem browser: directories are read only when first expanded.
//
// Keys: arrows/hjkl navigate, Enter/Space toggle, x cuts the selected node,
// p/b/a paste it onto/before/after the selection, Delete removes, r resets the
// view, q quits.
// Moves and deletes only rearrange the view; nothing on disk changes.
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::FutureExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::{DefaultTerminal, Frame};

use tui_lazytree::{
    ChildSource, DragItem, DropTarget, FetchError, FetchFuture, Folder, FolderFields, Forest,
    ForestOrigin, KindLabels, LazyLoader, NodeId, NodeKind, NodeSeed, TreeAction, TreeEvent,
    TreeListView, TreeListViewStyle, TreeViewState,
};

// Reads one directory per request. The future is already resolved when
// returned; a real application would hand the read to a runtime.
struct DirSource;

impl ChildSource<Folder> for DirSource {
    fn fetch_children(&self, id: &NodeId) -> FetchFuture<Folder> {
        let path = PathBuf::from(id.as_str());
        futures::future::ready(read_dir_seeds(&path)).boxed()
    }
}

fn read_dir_seeds(path: &Path) -> Result<Vec<NodeSeed<Folder>>, FetchError> {
    let read_dir = fs::read_dir(path).map_err(FetchError::unavailable)?;
    let mut entries: Vec<(bool, String, PathBuf)> = read_dir
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let path = entry.path();
            let is_dir = fs::symlink_metadata(&path).ok()?.is_dir();
            let name = entry.file_name().to_string_lossy().to_string();
            Some((is_dir, name, path))
        })
        .collect();

    // Directories first, then by name.
    entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    Ok(entries
        .into_iter()
        .map(|(is_dir, name, path)| {
            let id = path.display().to_string();
            if is_dir {
                NodeSeed::lazy(id, FolderFields::new(name))
            } else {
                NodeSeed::leaf(id, FolderFields::new(name))
            }
        })
        .collect())
}

#[derive(Clone, Copy)]
enum DemoAction {
    Cut,
    Paste(Zone),
}

#[derive(Clone, Copy)]
enum Zone {
    Onto,
    Before,
    After,
}

fn map_key(key: KeyEvent) -> Option<DemoAction> {
    if key.modifiers != KeyModifiers::NONE {
        return None;
    }
    match key.code {
        KeyCode::Char('x') => Some(DemoAction::Cut),
        KeyCode::Char('p') => Some(DemoAction::Paste(Zone::Onto)),
        KeyCode::Char('b') => Some(DemoAction::Paste(Zone::Before)),
        KeyCode::Char('a') => Some(DemoAction::Paste(Zone::After)),
        _ => None,
    }
}

fn apply_demo_action(
    state: &mut TreeViewState<Folder>,
    clipboard: &mut Option<DragItem>,
    action: DemoAction,
) {
    let Some(selected) = state.selected_id().cloned() else {
        return;
    };
    match action {
        DemoAction::Cut => {
            *clipboard = Some(DragItem::of::<Folder>(state.forest().origin(), selected));
        }
        DemoAction::Paste(zone) => {
            let Some(item) = clipboard.take() else {
                return;
            };
            let target = match zone {
                Zone::Onto => DropTarget::onto(selected),
                Zone::Before => DropTarget::before(selected),
                Zone::After => DropTarget::after(selected),
            };
            if state.drag_end(&item, Some(&target)) {
                state.select(&item.id);
            }
        }
    }
}

fn drain_fetches<S: ChildSource<Folder>>(
    loader: &mut LazyLoader<Folder, S>,
    state: &mut TreeViewState<Folder>,
) {
    loader.dispatch_pending(state);
    loop {
        let Some(Some(outcome)) = loader.next_outcome().now_or_never() else {
            break;
        };
        state.apply_fetch(outcome);
        loader.dispatch_pending(state);
    }
}

fn render(
    frame: &mut Frame,
    label: &KindLabels,
    state: &mut TreeViewState<Folder>,
    style: &TreeListViewStyle<'_>,
) {
    let widget = TreeListView::<Folder, _>::new(label, style.clone());
    frame.render_stateful_widget(widget, frame.area(), state);
}

fn run_app(
    mut terminal: DefaultTerminal,
    mut state: TreeViewState<Folder>,
    style: &TreeListViewStyle<'_>,
) -> io::Result<()> {
    let label = KindLabels;
    let mut loader = LazyLoader::new(DirSource);
    let mut clipboard: Option<DragItem> = None;

    loop {
        drain_fetches(&mut loader, &mut state);
        terminal.draw(|frame| render(frame, &label, &mut state, style))?;

        if event::poll(Duration::from_millis(200))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                _ => {
                    if let TreeEvent::Action(TreeAction::Custom(action)) =
                        state.handle_key_with(key, map_key)
                    {
                        apply_demo_action(&mut state, &mut clipboard, action);
                    }
                }
            }
        }
    }

    Ok(())
}

fn main() -> io::Result<()> {
    let root = env::args()
        .nth(1)
        .map_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")), PathBuf::from);
    let root = root.canonicalize().unwrap_or(root);
    if !root.is_dir() {
        eprintln!("Path is not a directory: {}", root.display());
        return Ok(());
    }

    let root_id = NodeId::from(root.display().to_string());
    let forest = Forest::from_seeds(
        ForestOrigin(0),
        [NodeSeed::lazy(root_id.clone(), FolderFields::new(root_id.as_str()))],
    );
    let mut state = TreeViewState::new(forest);
    state.toggle(&root_id);
    state.select(&root_id);

    let mut style = TreeListViewStyle::default();
    style.block_style = Style::default()
        .fg(Color::Rgb(221, 227, 235))
        .bg(Color::Rgb(24, 28, 36));
    style.border_style = Style::default().fg(Color::Rgb(92, 110, 140));
    style.line_style = Style::default().fg(Color::Rgb(86, 98, 120));
    style.drag_style = Style::default()
        .fg(Color::Rgb(136, 192, 208))
        .add_modifier(Modifier::BOLD);
    style.highlight_style = Style::default()
        .fg(Color::Rgb(255, 255, 255))
        .bg(Color::Rgb(52, 66, 96))
        .add_modifier(Modifier::BOLD);
    style.title = Some(Line::from(format!("{} [{}]", root.display(), Folder::KIND)));

    let terminal = ratatui::init();
    let result = run_app(terminal, state, &style);
    ratatui::restore();
    result
}
