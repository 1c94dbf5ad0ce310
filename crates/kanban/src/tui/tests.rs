use super::app::*;
use super::handlers::handle_ui_action;
use super::view::*;
use super::widgets::truncate_with_ellipsis;
use crate::config::KeyBindingsConfig;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use kanban_app::{
    BoardStore, Engine, JsonBoardStore, Point, ProjectConfig, StoreError, SyncFailure,
    SyncObserver,
};
use kanban_core::id::{BoardId, ItemId, TaskId};
use kanban_store_json::JsonStore;
use ratatui::{Terminal, backend::TestBackend};
use std::borrow::Cow;
use std::fmt::Display;
use std::result::Result as StdResult;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

fn expect_ok<T, E: Display>(result: StdResult<T, E>, ctx: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{ctx}: {err}"),
    }
}

fn expect_some<T>(value: Option<T>, ctx: &str) -> T {
    value.map_or_else(|| panic!("{ctx}"), |inner| inner)
}

struct Harness {
    ui: Ui,
    feed: Arc<StatusFeed>,
    terminal: Terminal<TestBackend>,
    boards: Vec<BoardId>,
    tasks: Vec<Vec<TaskId>>,
    runtime: Runtime,
}

/// Boards seeded in order, each with its task titles.
fn harness(layout: &[(&str, &[&str])]) -> Harness {
    let runtime = expect_ok(
        Builder::new_multi_thread().worker_threads(1).enable_all().build(),
        "runtime",
    );
    let feed = Arc::new(StatusFeed::default());
    let observer: Arc<dyn SyncObserver> = feed.clone();
    let store: Arc<dyn BoardStore> = Arc::new(JsonBoardStore::new(JsonStore::in_memory()));
    let mut config = ProjectConfig::default();
    config.sync.debounce_ms = 10;

    let engine = expect_ok(
        runtime.block_on(Engine::start(store, &config, observer)),
        "engine starts",
    );
    let (boards, tasks) = expect_ok(runtime.block_on(seed(&engine, layout)), "seed boards");

    let ui = Ui::new(App::new(engine, Arc::clone(&feed)), KeyBindingsConfig::default());
    let terminal = expect_ok(Terminal::new(TestBackend::new(80, 24)), "terminal");
    Harness {
        ui,
        feed,
        terminal,
        boards,
        tasks,
        runtime,
    }
}

async fn seed(engine: &Engine, layout: &[(&str, &[&str])]) -> Result<(Vec<BoardId>, Vec<Vec<TaskId>>)> {
    let service = engine.service();
    let mut boards = Vec::new();
    let mut tasks = Vec::new();
    for (title, task_titles) in layout {
        let board = service.create_board().await?;
        service.rename_board(board, title).await?;
        let mut ids = Vec::new();
        for task_title in *task_titles {
            let task = service.create_task(board).await?;
            service.rename_task(task.id, task_title).await?;
            ids.push(task.id);
        }
        boards.push(board);
        tasks.push(ids);
    }
    Ok((boards, tasks))
}

impl Harness {
    fn frame(&mut self) {
        self.ui.on_frame();
        let ui = &mut self.ui;
        expect_ok(self.terminal.draw(|f| ui.draw(f)), "draw");
    }

    fn press(&mut self, code: KeyCode) -> Option<UiAction> {
        self.ui.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn run(&mut self, action: UiAction) -> Result<()> {
        handle_ui_action(&self.runtime, &mut self.ui, action)
    }

    fn mouse(&mut self, kind: MouseEventKind, at: Point) {
        self.ui.handle_mouse(MouseEvent {
            kind,
            column: at.x,
            row: at.y,
            modifiers: KeyModifiers::NONE,
        });
    }

    fn center_of(&self, item: ItemId) -> Point {
        let id = expect_some(self.ui.regions.region_of(item), "item has a region");
        let bounds = expect_some(self.ui.regions.get(id), "region registered").bounds;
        Point::new(bounds.x + bounds.width / 2, bounds.y + bounds.height / 2)
    }

    fn board_of(&self, task: TaskId) -> Option<BoardId> {
        self.ui.app.boards().owning_board(ItemId::Task(task))
    }

    fn screen(&self) -> String {
        let buffer = self.terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn settle(&self) {
        let sync = self.ui.app.engine.sync().clone();
        sync.flush();
        self.runtime.block_on(sync.idle());
    }
}

fn message_text(ui: &Ui) -> Option<(&str, MessageLevel)> {
    ui.message.as_ref().map(|m| (m.text.as_str(), m.level))
}

#[test]
fn draw_registers_boards_and_cards() {
    let mut h = harness(&[("Todo", &["Write docs", "Review"]), ("Done", &[])]);
    h.frame();

    for board in &h.boards {
        assert!(h.ui.regions.region_of(ItemId::Board(*board)).is_some());
    }
    for task in &h.tasks[0] {
        assert!(h.ui.regions.region_of(ItemId::Task(*task)).is_some());
    }
    let screen = h.screen();
    assert!(screen.contains("Todo (2)"));
    assert!(screen.contains("Done (0)"));
    assert!(screen.contains("Write docs"));
    assert!(screen.contains("2 boards, 2 tasks"));
}

#[test]
fn empty_workspace_shows_hint_and_no_regions() {
    let mut h = harness(&[]);
    h.frame();

    assert!(h.ui.regions.is_empty());
    assert!(h.screen().contains("No boards yet"));
}

#[test]
fn focus_starts_on_first_card_and_walks_the_grid() {
    let mut h = harness(&[("Todo", &["a", "b"]), ("Done", &["c"])]);
    let first = ItemId::Task(h.tasks[0][0]);
    assert_eq!(h.ui.app.focus(), Some(first));

    h.press(KeyCode::Char('j'));
    assert_eq!(h.ui.app.focus(), Some(ItemId::Task(h.tasks[0][1])));

    h.press(KeyCode::Char('l'));
    assert_eq!(h.ui.app.focus(), Some(ItemId::Task(h.tasks[1][0])));

    h.press(KeyCode::Char('k'));
    h.press(KeyCode::Char('k'));
    assert_eq!(h.ui.app.focus(), Some(ItemId::Board(h.boards[1])));

    h.press(KeyCode::Char('h'));
    assert_eq!(h.ui.app.focus(), Some(ItemId::Board(h.boards[0])));
}

#[test]
fn keyboard_drag_moves_task_to_empty_board() {
    let mut h = harness(&[("Todo", &["a"]), ("Done", &[])]);
    let task = h.tasks[0][0];
    h.frame();

    assert!(h.press(KeyCode::Char(' ')).is_none());
    assert!(h.ui.app.engine.drag().is_dragging());
    h.frame();
    assert!(h.screen().contains("Moving a"));

    h.press(KeyCode::Char('l'));
    h.frame();
    assert_eq!(h.board_of(task), Some(h.boards[1]));

    h.press(KeyCode::Char(' '));
    assert!(!h.ui.app.engine.drag().is_dragging());
    assert_eq!(h.ui.app.focus(), Some(ItemId::Task(task)));

    h.settle();
    let stored = expect_ok(
        h.runtime.block_on(h.ui.app.engine.service().load()),
        "reload from store",
    );
    assert_eq!(stored.owning_board(ItemId::Task(task)), Some(h.boards[1]));
}

#[test]
fn escape_cancels_keyboard_drag_and_restores_board() {
    let mut h = harness(&[("Todo", &["a"]), ("Done", &[])]);
    let task = h.tasks[0][0];
    h.frame();

    h.press(KeyCode::Char(' '));
    h.press(KeyCode::Char('l'));
    h.frame();
    assert_eq!(h.board_of(task), Some(h.boards[1]));

    h.press(KeyCode::Esc);
    assert!(!h.ui.app.engine.drag().is_dragging());
    assert_eq!(h.board_of(task), Some(h.boards[0]));
    assert_eq!(message_text(&h.ui), Some(("Drag cancelled", MessageLevel::Info)));
}

#[test]
fn mouse_drag_moves_task_between_columns() {
    let mut h = harness(&[("Todo", &["a", "b"]), ("Done", &[])]);
    let task = h.tasks[0][1];
    h.frame();

    let from = h.center_of(ItemId::Task(task));
    let to = h.center_of(ItemId::Board(h.boards[1]));
    h.mouse(MouseEventKind::Down(MouseButton::Left), from);
    assert_eq!(h.ui.app.focus(), Some(ItemId::Task(task)));
    assert!(!h.ui.app.engine.drag().is_dragging());

    h.mouse(MouseEventKind::Drag(MouseButton::Left), to);
    assert!(h.ui.app.engine.sensors().is_dragging());
    h.frame();
    assert_eq!(h.board_of(task), Some(h.boards[1]));

    h.mouse(MouseEventKind::Up(MouseButton::Left), to);
    assert!(!h.ui.app.engine.drag().is_dragging());
    assert_eq!(h.board_of(task), Some(h.boards[1]));
    assert_eq!(h.ui.app.boards().board(h.boards[0]).map(|b| b.tasks.len()), Some(1));
}

#[test]
fn losing_terminal_focus_cancels_pointer_drag() {
    let mut h = harness(&[("Todo", &["a"]), ("Done", &[])]);
    let task = h.tasks[0][0];
    h.frame();

    let from = h.center_of(ItemId::Task(task));
    let to = h.center_of(ItemId::Board(h.boards[1]));
    h.mouse(MouseEventKind::Down(MouseButton::Left), from);
    h.mouse(MouseEventKind::Drag(MouseButton::Left), to);
    h.frame();
    assert_eq!(h.board_of(task), Some(h.boards[1]));

    h.ui.cancel_gesture();
    assert!(!h.ui.app.engine.sensors().is_dragging());
    assert_eq!(h.board_of(task), Some(h.boards[0]));
}

#[test]
fn keys_other_than_cancel_are_ignored_during_pointer_drag() {
    let mut h = harness(&[("Todo", &["a"]), ("Done", &[])]);
    let task = h.tasks[0][0];
    h.frame();

    let from = h.center_of(ItemId::Task(task));
    let to = h.center_of(ItemId::Board(h.boards[1]));
    h.mouse(MouseEventKind::Down(MouseButton::Left), from);
    h.mouse(MouseEventKind::Drag(MouseButton::Left), to);

    assert!(h.press(KeyCode::Char('n')).is_none());
    assert!(h.ui.app.engine.sensors().is_dragging());
    h.press(KeyCode::Esc);
    assert!(!h.ui.app.engine.sensors().is_dragging());
}

#[test]
fn rename_through_inline_editor() {
    let mut h = harness(&[("Todo", &["a"])]);
    let task = ItemId::Task(h.tasks[0][0]);

    assert!(h.press(KeyCode::Char('e')).is_none());
    assert_eq!(h.ui.editor.as_ref().map(|e| e.text().to_owned()), Some("a".to_owned()));

    h.press(KeyCode::Backspace);
    for ch in "Ship it".chars() {
        h.press(KeyCode::Char(ch));
    }
    let action = expect_some(h.press(KeyCode::Enter), "confirm yields rename");
    assert_eq!(
        action,
        UiAction::Rename {
            item: task,
            title: "Ship it".to_owned(),
        }
    );
    assert!(h.ui.editor.is_none());

    expect_ok(h.run(action), "rename");
    let list = h.ui.app.boards();
    assert_eq!(list.task(h.tasks[0][0]).map(|t| t.title.as_str()), Some("Ship it"));
    assert_eq!(message_text(&h.ui), Some(("Saved", MessageLevel::Info)));
}

#[test]
fn escape_discards_edit() {
    let mut h = harness(&[("Todo", &["a"])]);
    h.press(KeyCode::Char('e'));
    h.press(KeyCode::Char('z'));
    assert!(h.press(KeyCode::Esc).is_none());

    assert!(h.ui.editor.is_none());
    assert_eq!(h.ui.app.boards().task(h.tasks[0][0]).map(|t| t.title.as_str()), Some("a"));
}

#[test]
fn press_inside_editor_does_not_arm_a_drag() {
    let mut h = harness(&[("Todo", &["a"]), ("Done", &[])]);
    let task = ItemId::Task(h.tasks[0][0]);
    h.press(KeyCode::Char('e'));
    h.frame();

    let from = h.center_of(task);
    let to = h.center_of(ItemId::Board(h.boards[1]));
    assert!(h.ui.regions.is_drag_blocked(from));
    h.mouse(MouseEventKind::Down(MouseButton::Left), from);
    h.mouse(MouseEventKind::Drag(MouseButton::Left), to);

    assert!(!h.ui.app.engine.sensors().is_dragging());
    assert_eq!(h.board_of(h.tasks[0][0]), Some(h.boards[0]));
}

#[test]
fn new_board_opens_editor_on_created_board() {
    let mut h = harness(&[]);
    let action = expect_some(
        h.ui.handle_key(KeyEvent::new(KeyCode::Char('B'), KeyModifiers::SHIFT)),
        "new board action",
    );
    assert_eq!(action, UiAction::NewBoard);

    expect_ok(h.run(action), "create board");
    let list = h.ui.app.boards();
    assert_eq!(list.len(), 1);
    let board = ItemId::Board(list.boards()[0].id);
    assert_eq!(h.ui.editor.as_ref().map(|e| e.target), Some(board));
    assert_eq!(h.ui.app.focus(), Some(board));
}

#[test]
fn new_task_requires_a_board() {
    let mut h = harness(&[]);
    assert!(h.press(KeyCode::Char('n')).is_none());
    assert_eq!(message_text(&h.ui), Some(("Create a board first", MessageLevel::Error)));
}

#[test]
fn new_task_lands_on_focused_board() {
    let mut h = harness(&[("Todo", &[]), ("Done", &[])]);
    h.press(KeyCode::Char('l'));
    let action = expect_some(h.press(KeyCode::Char('n')), "new task action");
    assert_eq!(action, UiAction::NewTask { board: h.boards[1] });

    expect_ok(h.run(action), "create task");
    let done = expect_some(h.ui.app.boards().board(h.boards[1]).cloned(), "board exists");
    assert_eq!(done.tasks.len(), 1);
    assert_eq!(h.ui.editor.as_ref().map(|e| e.target), Some(ItemId::Task(done.tasks[0].id)));
}

#[test]
fn delete_moves_focus_to_next_sibling() {
    let mut h = harness(&[("Todo", &["a", "b"])]);
    let action = expect_some(h.press(KeyCode::Char('x')), "delete action");
    assert_eq!(
        action,
        UiAction::Delete {
            item: ItemId::Task(h.tasks[0][0]),
        }
    );

    expect_ok(h.run(action), "delete");
    assert_eq!(h.ui.app.focus(), Some(ItemId::Task(h.tasks[0][1])));
    assert_eq!(message_text(&h.ui), Some(("Deleted", MessageLevel::Info)));
}

#[test]
fn blank_rename_surfaces_as_error() {
    let mut h = harness(&[("Todo", &["a"])]);
    let result = h.run(UiAction::Rename {
        item: ItemId::Task(h.tasks[0][0]),
        title: "   ".to_owned(),
    });
    assert!(result.is_err());
    assert_eq!(h.ui.app.boards().task(h.tasks[0][0]).map(|t| t.title.as_str()), Some("a"));
}

#[test]
fn rollback_is_reported_on_next_frame() {
    let mut h = harness(&[("Todo", &["a"])]);
    let restored = h.ui.app.boards();
    h.feed.on_rollback(&SyncFailure {
        error: StoreError::Backend("disk full".to_owned()),
        restored,
    });

    h.frame();
    let (text, level) = expect_some(message_text(&h.ui), "rollback message");
    assert!(text.contains("Saving failed"));
    assert!(text.contains("disk full"));
    assert_eq!(level, MessageLevel::Error);
    assert!(h.feed.drain().is_empty());
}

#[test]
fn quit_key_sets_should_quit() {
    let mut h = harness(&[("Todo", &[])]);
    h.press(KeyCode::Char('q'));
    assert!(h.ui.should_quit);
}

#[test]
fn quit_during_keyboard_drag_restores_board() {
    let mut h = harness(&[("Todo", &["a"]), ("Done", &[])]);
    let task = h.tasks[0][0];
    h.frame();
    h.press(KeyCode::Char(' '));
    h.press(KeyCode::Char('l'));
    h.frame();

    h.press(KeyCode::Char('q'));
    assert!(h.ui.should_quit);
    assert_eq!(h.board_of(task), Some(h.boards[0]));
}

#[test]
fn truncate_with_ellipsis_returns_borrowed_when_short() {
    let result = truncate_with_ellipsis("short", 10);
    assert!(matches!(result, Cow::Borrowed("short")));
}

#[test]
fn truncate_with_ellipsis_handles_multibyte() {
    let result = truncate_with_ellipsis("こんにちは世界", 5);
    assert_eq!(result, "こん...");
}

#[test]
fn truncate_with_ellipsis_respects_grapheme_clusters() {
    let result = truncate_with_ellipsis("🇯🇵🇺🇸🇬🇧🇫🇷", 3);
    assert_eq!(result, "🇯🇵🇺🇸🇬🇧");
}
