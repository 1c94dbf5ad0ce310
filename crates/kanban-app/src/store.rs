//! Remote persistence contract used by the sync adapter and the board service.

use async_trait::async_trait;
use kanban_core::id::{BoardId, TaskId};
use kanban_core::{Board, Task, ValidationError};
use thiserror::Error;

/// Failure reported by a [`BoardStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Input rejected before or by the backend.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Referenced entity does not exist remotely.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind (`board` or `task`).
        kind: &'static str,
        /// Identifier text.
        id: String,
    },

    /// Transport or storage failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Build a [`StoreError::NotFound`] for a board.
    #[must_use]
    pub fn board_not_found(id: BoardId) -> Self {
        Self::NotFound {
            kind: "board",
            id: id.to_string(),
        }
    }

    /// Build a [`StoreError::NotFound`] for a task.
    #[must_use]
    pub fn task_not_found(id: TaskId) -> Self {
        Self::NotFound {
            kind: "task",
            id: id.to_string(),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Asynchronous board/task persistence.
///
/// Every call is independent; there is no cross-call transaction. Callers
/// issue a cross-board reassignment before the order updates that depend on it.
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Create an empty, untitled board appended after existing ones.
    async fn create_board(&self) -> Result<BoardId, StoreError>;

    /// Create an empty, untitled task at the end of `board`.
    async fn create_task(&self, board: BoardId) -> Result<Task, StoreError>;

    /// Persist a board title; `order` is the board's current position.
    async fn update_board_title(
        &self,
        id: BoardId,
        title: &str,
        order: u32,
    ) -> Result<(), StoreError>;

    /// Persist a task title; `order` is the task's current position.
    async fn update_task_title(&self, id: TaskId, title: &str, order: u32)
    -> Result<(), StoreError>;

    /// Persist a board position.
    async fn update_board_order(&self, id: BoardId, order: u32) -> Result<(), StoreError>;

    /// Persist a task position within its board.
    async fn update_task_order(&self, id: TaskId, order: u32) -> Result<(), StoreError>;

    /// Reassign a task from one board to another.
    async fn update_task_board(
        &self,
        task: TaskId,
        from: BoardId,
        to: BoardId,
    ) -> Result<(), StoreError>;

    /// Delete a board and every task it owns.
    async fn delete_board(&self, id: BoardId) -> Result<(), StoreError>;

    /// Delete a task.
    async fn delete_task(&self, id: TaskId) -> Result<(), StoreError>;

    /// Fetch every board with its nested tasks. Ordering is not guaranteed.
    async fn get_boards(&self) -> Result<Vec<Board>, StoreError>;
}
