use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::try_join_all;
use kanban_core::error::normalize_title;
use kanban_core::id::{BoardId, TaskId};
use kanban_core::order::renumber;
use kanban_core::{Board, BoardList, Task, ValidationError};
use tracing::{error, info};

use crate::state::BoardState;
use crate::store::BoardStore;
use crate::sync::SyncHandle;

/// Service façade for board and task lifecycle operations.
///
/// Drag gestures go through [`crate::drag::DragMachine`]; everything else that
/// changes the arrangement goes through here.
#[derive(Clone)]
pub struct BoardService {
    store: Arc<dyn BoardStore>,
    state: BoardState,
    sync: SyncHandle,
}

impl BoardService {
    /// Service writing through `store` and keeping `state` and `sync` current.
    #[must_use]
    pub fn new(store: Arc<dyn BoardStore>, state: BoardState, sync: SyncHandle) -> Self {
        Self { store, state, sync }
    }

    /// Shared state this service writes to.
    pub const fn state(&self) -> &BoardState {
        &self.state
    }

    /// Fetch every board from the store and install it as the current and
    /// known-good arrangement.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub async fn load(&self) -> Result<Arc<BoardList>> {
        let boards = self.store.get_boards().await.context("failed to load boards")?;
        let list = Arc::new(BoardList::from_unsorted(boards));
        info!(boards = list.len(), "Loaded boards");
        self.state.replace(Arc::clone(&list));
        self.sync.reset(Arc::clone(&list));
        Ok(list)
    }

    /// Create an empty board after the existing ones.
    ///
    /// # Errors
    /// Returns an error if the store rejects the creation.
    pub async fn create_board(&self) -> Result<BoardId> {
        let id = self.store.create_board().await.context("failed to create board")?;
        let order = self.state.select(|list| kanban_core::order::next_order(list.boards()));
        let board = Board::new(id, "", order);
        self.commit(|list| {
            let mut boards = list.clone().into_boards();
            boards.push(board.clone());
            Some(BoardList::new(boards))
        });
        info!(%id, "Created board");
        Ok(id)
    }

    /// Create an empty task at the end of `board`.
    ///
    /// # Errors
    /// Returns an error if `board` is unknown or the store rejects the creation.
    pub async fn create_task(&self, board: BoardId) -> Result<Task> {
        self.ensure_board(board)?;
        let task = self
            .store
            .create_task(board)
            .await
            .with_context(|| format!("failed to create task in board {board}"))?;
        let created = task.clone();
        self.commit(|list| {
            list.map_board(board, |b| {
                b.tasks.push(created.clone());
                renumber(&mut b.tasks);
            })
        });
        info!(task = %task.id, %board, "Created task");
        Ok(task)
    }

    /// Rename a board. Applied locally first, reverted if the store rejects it.
    ///
    /// # Errors
    /// Returns an error for blank titles, unknown boards, or store failures.
    pub async fn rename_board(&self, id: BoardId, title: &str) -> Result<()> {
        let title = normalize_title(title)?;
        let (previous, order) = self
            .state
            .select(|list| list.board(id).map(|b| (b.title.clone(), b.order)))
            .ok_or_else(|| unknown("board", id))?;
        if previous == title {
            return Ok(());
        }

        self.install(|list| list.map_board(id, |b| b.title.clone_from(&title)));
        if let Err(err) = self.store.update_board_title(id, &title, order).await {
            error!(%id, error = %err, "Board rename rejected; restoring title");
            self.install(|list| list.map_board(id, |b| b.title.clone_from(&previous)));
            return Err(err).context("failed to rename board");
        }
        self.sync
            .acknowledge(|list| list.map_board(id, |b| b.title.clone_from(&title)));
        info!(%id, "Renamed board");
        Ok(())
    }

    /// Rename a task. Applied locally first, reverted if the store rejects it.
    ///
    /// # Errors
    /// Returns an error for blank titles, unknown tasks, or store failures.
    pub async fn rename_task(&self, id: TaskId, title: &str) -> Result<()> {
        let title = normalize_title(title)?;
        let (board, previous, order) = self
            .state
            .select(|list| {
                let loc = list.locate_task(id)?;
                let task = list.task(id)?;
                Some((loc.board, task.title.clone(), task.order))
            })
            .ok_or_else(|| unknown("task", id))?;
        if previous == title {
            return Ok(());
        }

        self.install(|list| set_task_title(list, board, id, &title));
        if let Err(err) = self.store.update_task_title(id, &title, order).await {
            error!(%id, error = %err, "Task rename rejected; restoring title");
            self.install(|list| {
                let owner = list.locate_task(id)?.board;
                set_task_title(list, owner, id, &previous)
            });
            return Err(err).context("failed to rename task");
        }
        self.sync.acknowledge(|list| {
            let owner = list.locate_task(id)?.board;
            set_task_title(list, owner, id, &title)
        });
        info!(%id, "Renamed task");
        Ok(())
    }

    /// Delete a board and its tasks, then close the gap in board orders.
    ///
    /// # Errors
    /// Returns an error if the board is unknown, the store rejects the
    /// deletion, or the recompacted orders cannot be written.
    pub async fn delete_board(&self, id: BoardId) -> Result<()> {
        self.ensure_board(id)?;
        let shifted = self.state.select(|list| {
            shifted_orders(list.boards().iter().filter(|b| b.id != id), |b| (b.id, b.order))
        });
        self.store
            .delete_board(id)
            .await
            .with_context(|| format!("failed to delete board {id}"))?;
        self.commit(|list| {
            list.board_index(id)?;
            let boards = list
                .boards()
                .iter()
                .filter(|b| b.id != id)
                .cloned()
                .collect();
            Some(BoardList::new(boards))
        });
        info!(%id, "Deleted board");

        try_join_all(
            shifted
                .iter()
                .map(|&(board, order)| self.store.update_board_order(board, order)),
        )
        .await
        .context("failed to recompact board orders")?;
        self.commit(|list| {
            let mut boards = list.clone().into_boards();
            renumber(&mut boards);
            Some(BoardList::new(boards))
        });
        Ok(())
    }

    /// Delete a task, then close the gap in its board's task orders.
    ///
    /// The store keeps the removed task's slot until the shifted orders are
    /// written, so local state follows it in two steps.
    ///
    /// # Errors
    /// Returns an error if the task is unknown, the store rejects the
    /// deletion, or the recompacted orders cannot be written.
    pub async fn delete_task(&self, id: TaskId) -> Result<()> {
        let (board, shifted) = self
            .state
            .select(|list| {
                let board = list.locate_task(id)?.board;
                let tasks = list.board(board)?.tasks.iter().filter(|t| t.id != id);
                Some((board, shifted_orders(tasks, |t| (t.id, t.order))))
            })
            .ok_or_else(|| unknown("task", id))?;
        self.store
            .delete_task(id)
            .await
            .with_context(|| format!("failed to delete task {id}"))?;
        self.commit(|list| {
            let owner = list.locate_task(id)?.board;
            list.map_board(owner, |b| b.tasks.retain(|t| t.id != id))
        });
        info!(%id, "Deleted task");

        try_join_all(
            shifted
                .iter()
                .map(|&(task, order)| self.store.update_task_order(task, order)),
        )
        .await
        .with_context(|| format!("failed to recompact task orders in board {board}"))?;
        self.commit(|list| list.map_board(board, |b| renumber(&mut b.tasks)));
        Ok(())
    }

    fn ensure_board(&self, id: BoardId) -> Result<(), ValidationError> {
        if self.state.select(|list| list.board(id).is_some()) {
            Ok(())
        } else {
            Err(unknown("board", id))
        }
    }

    /// Apply `f` to the current arrangement only.
    fn install(&self, f: impl FnOnce(&BoardList) -> Option<BoardList>) {
        let current = self.state.snapshot();
        if let Some(next) = f(&current) {
            self.state.replace_if_changed(next);
        }
    }

    /// Apply a change the store already accepted to both the current and the
    /// known-good arrangement.
    fn commit(&self, f: impl Fn(&BoardList) -> Option<BoardList>) {
        self.install(&f);
        self.sync.acknowledge(&f);
    }
}

fn set_task_title(list: &BoardList, board: BoardId, id: TaskId, title: &str) -> Option<BoardList> {
    list.map_board(board, |b| {
        if let Some(task) = b.tasks.iter_mut().find(|t| t.id == id) {
            title.clone_into(&mut task.title);
        }
    })
}

/// Items whose stored order differs from their position once the removed
/// one is gone.
fn shifted_orders<'a, T: 'a, I>(
    items: impl Iterator<Item = &'a T>,
    key: impl Fn(&T) -> (I, u32),
) -> Vec<(I, u32)> {
    items
        .zip(0u32..)
        .filter_map(|(item, position)| {
            let (id, order) = key(item);
            (order != position).then_some((id, position))
        })
        .collect()
}

fn unknown(kind: &'static str, id: impl ToString) -> ValidationError {
    ValidationError::Unknown {
        kind,
        id: id.to_string(),
    }
}
