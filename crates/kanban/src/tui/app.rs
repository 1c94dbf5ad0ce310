use std::sync::{Arc, Mutex, PoisonError};

use kanban_app::{Direction, Engine, SyncFailure, SyncObserver};
use kanban_core::BoardList;
use kanban_core::id::ItemId;

/// Collects rollbacks reported by the sync worker until the UI drains them.
#[derive(Debug, Default)]
pub(super) struct StatusFeed {
    failures: Mutex<Vec<String>>,
}

impl StatusFeed {
    pub(super) fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.failures.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl SyncObserver for StatusFeed {
    fn on_rollback(&self, failure: &SyncFailure) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("Saving failed ({}); board restored", failure.error));
    }
}

/// Application state shared between the TUI event loop and rendering.
pub(super) struct App {
    pub(super) engine: Engine,
    feed: Arc<StatusFeed>,
    focus: Option<ItemId>,
}

impl App {
    pub(super) fn new(engine: Engine, feed: Arc<StatusFeed>) -> Self {
        let mut app = Self {
            engine,
            feed,
            focus: None,
        };
        app.repair_focus();
        app
    }

    pub(super) fn boards(&self) -> Arc<BoardList> {
        self.engine.state().snapshot()
    }

    pub(super) const fn focus(&self) -> Option<ItemId> {
        self.focus
    }

    pub(super) fn set_focus(&mut self, item: ItemId) {
        if self.boards().contains(item) {
            self.focus = Some(item);
        }
    }

    /// Keep focus on an item that still exists, preferring its old board.
    pub(super) fn repair_focus(&mut self) {
        let list = self.boards();
        if self.focus.is_some_and(|item| list.contains(item)) {
            return;
        }
        self.focus = list
            .boards()
            .first()
            .map(|board| board.tasks.first().map_or(ItemId::Board(board.id), |t| ItemId::Task(t.id)));
    }

    /// Move focus to `item` after a removal, or repair it.
    pub(super) fn focus_or_repair(&mut self, item: Option<ItemId>) {
        self.focus = item;
        self.repair_focus();
    }

    /// Step focus through the board grid: up and down walk the header and
    /// cards of one board, left and right keep the row in the next board.
    pub(super) fn move_focus(&mut self, direction: Direction) {
        let list = self.boards();
        let Some((board_index, slot)) = self.focus.and_then(|item| grid_position(&list, item)) else {
            self.repair_focus();
            return;
        };
        let boards = list.boards();
        let (board_index, slot) = match direction {
            Direction::Up => (board_index, slot.and_then(|i| i.checked_sub(1))),
            Direction::Down => {
                let len = boards[board_index].tasks.len();
                let next = slot.map_or(0, |i| i + 1);
                (board_index, if next < len { Some(next) } else { slot })
            }
            Direction::Left => (board_index.saturating_sub(1), slot),
            Direction::Right => ((board_index + 1).min(boards.len() - 1), slot),
        };
        let board = &boards[board_index];
        let slot = slot.and_then(|i| board.tasks.len().checked_sub(1).map(|last| i.min(last)));
        self.focus = Some(slot.map_or(ItemId::Board(board.id), |i| ItemId::Task(board.tasks[i].id)));
    }

    /// Item to focus once `item` is gone: the next sibling, else the previous
    /// one, else the owning board.
    pub(super) fn focus_after_removal(&self, item: ItemId) -> Option<ItemId> {
        let list = self.boards();
        let (board_index, slot) = grid_position(&list, item)?;
        let boards = list.boards();
        match slot {
            Some(i) => {
                let board = &boards[board_index];
                let sibling = board.tasks.get(i + 1).or_else(|| i.checked_sub(1).and_then(|p| board.tasks.get(p)));
                Some(sibling.map_or(ItemId::Board(board.id), |t| ItemId::Task(t.id)))
            }
            None => boards
                .get(board_index + 1)
                .or_else(|| board_index.checked_sub(1).and_then(|p| boards.get(p)))
                .map(|b| ItemId::Board(b.id)),
        }
    }

    pub(super) fn take_failures(&self) -> Vec<String> {
        self.feed.drain()
    }
}

/// Board index and card slot (`None` for the header) of `item`.
fn grid_position(list: &BoardList, item: ItemId) -> Option<(usize, Option<usize>)> {
    match item {
        ItemId::Board(id) => list.board_index(id).map(|index| (index, None)),
        ItemId::Task(id) => list
            .locate_task(id)
            .map(|loc| (loc.board_index, Some(loc.task_index))),
    }
}
