use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use kanban_app::{DragEnd, DragSelection, InputModality, KeyInput, Point, RawInput, RegionMap};
use kanban_core::id::{BoardId, ItemId};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
};

use super::app::App;
use super::constants::UI_MESSAGE_TTL_SECS;
use super::editor::TitleEditor;
use crate::config::{Action, KeyBindingsConfig, ViewType};

const BOARD_ACTIONS: [Action; 11] = [
    Action::Quit,
    Action::Up,
    Action::Down,
    Action::Left,
    Action::Right,
    Action::Lift,
    Action::Cancel,
    Action::NewBoard,
    Action::NewTask,
    Action::Rename,
    Action::Delete,
];

const EDITOR_ACTIONS: [Action; 2] = [Action::Confirm, Action::Cancel];

pub(super) struct Ui {
    pub(super) app: App,
    pub(super) message: Option<Message>,
    pub(super) should_quit: bool,
    /// Inline title editor, when open.
    pub(super) editor: Option<TitleEditor>,
    /// Hit regions registered by the last draw.
    pub(super) regions: RegionMap,
    /// Last pointer position, for the drag overlay.
    pub(super) pointer: Option<Point>,
    /// Index of the leftmost board column on screen.
    pub(super) scroll: usize,
    /// Keybindings configuration.
    pub(super) keybindings: KeyBindingsConfig,
}

impl Ui {
    pub(super) const MAIN_MIN_HEIGHT: u16 = 5;
    pub(super) const INSTRUCTIONS_HEIGHT: u16 = 3;
    pub(super) const STATUS_MESSAGE_MIN_HEIGHT: u16 = 3;
    pub(super) const STATUS_FOOTER_MIN_HEIGHT: u16 =
        Self::INSTRUCTIONS_HEIGHT + Self::STATUS_MESSAGE_MIN_HEIGHT;

    pub(super) const fn new(app: App, keybindings: KeyBindingsConfig) -> Self {
        Self {
            app,
            message: None,
            should_quit: false,
            editor: None,
            regions: RegionMap::new(),
            pointer: None,
            scroll: 0,
            keybindings,
        }
    }

    /// Per-frame work that must happen before drawing.
    pub(super) fn on_frame(&mut self) {
        self.app.engine.on_frame();
        for failure in self.app.take_failures() {
            self.error(failure);
        }
        self.app.repair_focus();
        let list = self.app.boards();
        if self.editor.as_ref().is_some_and(|e| !list.contains(e.target)) {
            self.editor = None;
        }
    }

    pub(super) fn draw(&mut self, f: &mut Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(Self::MAIN_MIN_HEIGHT),
                Constraint::Length(Self::STATUS_FOOTER_MIN_HEIGHT),
            ])
            .split(f.area());

        self.regions = self.draw_boards(f, chunks[0]);
        self.draw_status(f, chunks[1]);
        self.draw_drag_overlay(f);
    }

    pub(super) fn handle_key(&mut self, key: KeyEvent) -> Option<UiAction> {
        if self.editor.is_some() {
            return self.handle_editor_key(key);
        }
        let action = self.keybindings.action_for(ViewType::Board, &key, &BOARD_ACTIONS)?;
        match self.app.engine.sensors().modality() {
            Some(InputModality::Keyboard) => {
                self.handle_keyboard_drag(action);
                None
            }
            Some(_) => {
                if matches!(action, Action::Cancel | Action::Quit) {
                    self.cancel_gesture();
                    self.should_quit = action == Action::Quit;
                }
                None
            }
            None => self.handle_browse(action),
        }
    }

    fn handle_browse(&mut self, action: Action) -> Option<UiAction> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Up => self.app.move_focus(kanban_app::Direction::Up),
            Action::Down => self.app.move_focus(kanban_app::Direction::Down),
            Action::Left => self.app.move_focus(kanban_app::Direction::Left),
            Action::Right => self.app.move_focus(kanban_app::Direction::Right),
            Action::Lift => self.feed(RawInput::Key {
                key: KeyInput::Activate,
                focused: self.app.focus(),
            }),
            Action::NewBoard => return Some(UiAction::NewBoard),
            Action::NewTask => {
                if let Some(board) = self.focused_board() {
                    return Some(UiAction::NewTask { board });
                }
                self.error("Create a board first");
            }
            Action::Rename => self.start_rename(),
            Action::Delete => return self.app.focus().map(|item| UiAction::Delete { item }),
            Action::Cancel | Action::Confirm => {}
        }
        None
    }

    fn handle_keyboard_drag(&mut self, action: Action) {
        let key = match action {
            Action::Up => KeyInput::Move(kanban_app::Direction::Up),
            Action::Down => KeyInput::Move(kanban_app::Direction::Down),
            Action::Left => KeyInput::Move(kanban_app::Direction::Left),
            Action::Right => KeyInput::Move(kanban_app::Direction::Right),
            Action::Lift => KeyInput::Activate,
            Action::Cancel => KeyInput::Cancel,
            Action::Quit => {
                self.cancel_gesture();
                self.should_quit = true;
                return;
            }
            _ => return,
        };
        self.feed(RawInput::Key {
            key,
            focused: self.app.focus(),
        });
    }

    fn handle_editor_key(&mut self, key: KeyEvent) -> Option<UiAction> {
        match self.keybindings.action_for(ViewType::Editor, &key, &EDITOR_ACTIONS) {
            Some(Action::Confirm) => {
                let editor = self.editor.take()?;
                return Some(UiAction::Rename {
                    item: editor.target,
                    title: editor.text().to_owned(),
                });
            }
            Some(_) => {
                self.editor = None;
                return None;
            }
            None => {}
        }

        let editor = self.editor.as_mut()?;
        match key.code {
            KeyCode::Char(ch) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                editor.insert(ch);
            }
            KeyCode::Backspace => editor.backspace(),
            KeyCode::Delete => editor.delete(),
            KeyCode::Left => editor.left(),
            KeyCode::Right => editor.right(),
            KeyCode::Home => editor.home(),
            KeyCode::End => editor.end(),
            _ => {}
        }
        None
    }

    pub(super) fn handle_mouse(&mut self, event: MouseEvent) {
        let at = Point::new(event.column, event.row);
        let time = Instant::now();
        let input = match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if !self.regions.is_drag_blocked(at)
                    && let Some(item) = self.regions.draggable_at(at)
                {
                    self.app.set_focus(item);
                }
                RawInput::PointerDown { at, time }
            }
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => RawInput::PointerMove { at, time },
            MouseEventKind::Up(MouseButton::Left) => RawInput::PointerUp { at, time },
            _ => return,
        };
        self.pointer = Some(at);
        self.feed(input);
    }

    /// Abort the gesture in progress, e.g. when the terminal loses focus.
    pub(super) fn cancel_gesture(&mut self) {
        if let Some(end) = self.app.engine.cancel_gesture() {
            self.report_end(end);
        }
    }

    /// Open the inline editor on `item` with `initial` text.
    pub(super) fn begin_edit(&mut self, item: ItemId, initial: &str) {
        self.app.set_focus(item);
        self.editor = Some(TitleEditor::new(item, initial));
    }

    fn start_rename(&mut self) {
        let Some(item) = self.app.focus() else {
            return;
        };
        let list = self.app.boards();
        let title = match item {
            ItemId::Board(id) => list.board(id).map(|b| b.title.clone()),
            ItemId::Task(id) => list.task(id).map(|t| t.title.clone()),
        };
        if let Some(title) = title {
            self.begin_edit(item, &title);
        }
    }

    fn feed(&mut self, input: RawInput) {
        let end = self.app.engine.input(&self.regions, input);
        if let Some(item) = self.app.engine.drag().selection().map(DragSelection::item) {
            self.app.set_focus(item);
        }
        if let Some(end) = end {
            self.report_end(end);
        }
    }

    fn report_end(&mut self, end: DragEnd) {
        if end == DragEnd::Cancelled {
            self.info("Drag cancelled");
        }
    }

    fn focused_board(&self) -> Option<BoardId> {
        let focus = self.app.focus()?;
        self.app.boards().owning_board(focus)
    }

    pub(super) fn info(&mut self, message: impl Into<String>) {
        self.message = Some(Message::info(message));
    }

    pub(super) fn error(&mut self, message: impl Into<String>) {
        self.message = Some(Message::error(message));
    }

    pub(super) fn tick(&mut self) {
        if let Some(msg) = &self.message
            && msg.is_expired(Duration::from_secs(UI_MESSAGE_TTL_SECS))
        {
            self.message = None;
        }
    }
}

/// Work that needs the store and therefore runs outside key handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum UiAction {
    NewBoard,
    NewTask { board: BoardId },
    Rename { item: ItemId, title: String },
    Delete { item: ItemId },
}

pub(super) struct Message {
    pub(super) text: String,
    pub(super) level: MessageLevel,
    created_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MessageLevel {
    Info,
    Error,
}

impl Message {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: MessageLevel::Info,
            created_at: Instant::now(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: MessageLevel::Error,
            created_at: Instant::now(),
        }
    }

    pub(super) fn style(&self) -> Style {
        match self.level {
            MessageLevel::Info => Style::default().fg(Color::Green),
            MessageLevel::Error => Style::default().fg(Color::Red),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}
