//! Domain types & ordering logic for kanban boards.

/// Validation errors.
pub mod error;
/// Identifier types.
pub mod id;
/// Positional ordering helpers.
pub mod order;

use crate::id::{BoardId, ItemId, TaskId};
use crate::order::Ordered;
use serde::{Deserialize, Serialize};

pub use crate::error::ValidationError;

/// Task card owned by a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable identity.
    pub id: TaskId,
    /// Card title (empty right after creation).
    pub title: String,
    /// Position within the owning board.
    pub order: u32,
}

impl Task {
    /// Create a task with the given title and order.
    #[must_use]
    pub fn new(id: TaskId, title: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            title: title.into(),
            order,
        }
    }
}

impl Ordered for Task {
    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

/// Board (column) with its ordered tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Stable identity.
    pub id: BoardId,
    /// Column title (empty right after creation).
    pub title: String,
    /// Display position among boards.
    pub order: u32,
    /// Tasks in display order. Always present; empty means "no tasks".
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Board {
    /// Create an empty board.
    #[must_use]
    pub fn new(id: BoardId, title: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            title: title.into(),
            order,
            tasks: Vec::new(),
        }
    }

    /// Attach tasks, replacing any existing ones.
    #[must_use]
    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Index of a task inside this board.
    #[must_use]
    pub fn task_index(&self, task: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task)
    }

    fn same_cards(&self, other: &Self) -> bool {
        self.tasks.len() == other.tasks.len()
            && self
                .tasks
                .iter()
                .zip(&other.tasks)
                .all(|(a, b)| a.id == b.id && a.title == b.title)
    }
}

impl Ordered for Board {
    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

/// Where a task currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskLocation {
    /// Owning board.
    pub board: BoardId,
    /// Index of the owning board in the list.
    pub board_index: usize,
    /// Index of the task inside its board.
    pub task_index: usize,
}

/// Ordered working set of boards; the source of truth for rendering and diffs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardList {
    boards: Vec<Board>,
}

impl BoardList {
    /// Wrap boards that are already in display order.
    #[must_use]
    pub const fn new(boards: Vec<Board>) -> Self {
        Self { boards }
    }

    /// Build a list from store records, sorting boards and nested tasks by `order`.
    #[must_use]
    pub fn from_unsorted(mut boards: Vec<Board>) -> Self {
        boards.sort_by_key(|board| board.order);
        for board in &mut boards {
            board.tasks.sort_by_key(|task| task.order);
        }
        Self { boards }
    }

    /// Boards in display order.
    #[must_use]
    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    /// Consume the list.
    #[must_use]
    pub fn into_boards(self) -> Vec<Board> {
        self.boards
    }

    /// Number of boards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    /// Whether there are no boards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    /// Look up a board.
    #[must_use]
    pub fn board(&self, id: BoardId) -> Option<&Board> {
        self.boards.iter().find(|board| board.id == id)
    }

    /// Position of a board.
    #[must_use]
    pub fn board_index(&self, id: BoardId) -> Option<usize> {
        self.boards.iter().position(|board| board.id == id)
    }

    /// Locate a task.
    #[must_use]
    pub fn locate_task(&self, task: TaskId) -> Option<TaskLocation> {
        self.boards
            .iter()
            .enumerate()
            .find_map(|(board_index, board)| {
                board.task_index(task).map(|task_index| TaskLocation {
                    board: board.id,
                    board_index,
                    task_index,
                })
            })
    }

    /// Look up a task.
    #[must_use]
    pub fn task(&self, task: TaskId) -> Option<&Task> {
        let loc = self.locate_task(task)?;
        self.boards
            .get(loc.board_index)
            .and_then(|board| board.tasks.get(loc.task_index))
    }

    /// Board owning `item`: the board itself, or the board holding the task.
    #[must_use]
    pub fn owning_board(&self, item: ItemId) -> Option<BoardId> {
        match item {
            ItemId::Board(id) => self.board(id).map(|board| board.id),
            ItemId::Task(id) => self.locate_task(id).map(|loc| loc.board),
        }
    }

    /// Whether `item` resolves in this list.
    #[must_use]
    pub fn contains(&self, item: ItemId) -> bool {
        self.owning_board(item).is_some()
    }

    /// Iterate over every task together with its owning board.
    pub fn tasks(&self) -> impl Iterator<Item = (BoardId, &Task)> + '_ {
        self.boards
            .iter()
            .flat_map(|board| board.tasks.iter().map(move |task| (board.id, task)))
    }

    /// Structural comparison used for change detection.
    ///
    /// Same board sequence, titles and orders, and per board the same task
    /// identity sequence and titles. Task `order` fields are derived and not
    /// compared.
    #[must_use]
    pub fn same_arrangement(&self, other: &Self) -> bool {
        self.boards.len() == other.boards.len()
            && self.boards.iter().zip(&other.boards).all(|(a, b)| {
                a.id == b.id && a.title == b.title && a.order == b.order && a.same_cards(b)
            })
    }

    /// Whether boards and every board's tasks satisfy `index == order`.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        order::is_contiguous(&self.boards)
            && self.boards.iter().all(|board| order::is_contiguous(&board.tasks))
    }

    /// Copy of this list with every `order` field re-derived from position.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut boards = self.boards.clone();
        order::renumber(&mut boards);
        for board in &mut boards {
            order::renumber(&mut board.tasks);
        }
        Self { boards }
    }

    /// Copy of this list with one board replaced through `f`.
    ///
    /// Returns `None` when the board is unknown.
    #[must_use]
    pub fn map_board(&self, id: BoardId, f: impl FnOnce(&mut Board)) -> Option<Self> {
        let index = self.board_index(id)?;
        let mut boards = self.boards.clone();
        let board = boards.get_mut(index)?;
        f(board);
        Some(Self { boards })
    }
}

impl From<Vec<Board>> for BoardList {
    fn from(boards: Vec<Board>) -> Self {
        Self::new(boards)
    }
}
