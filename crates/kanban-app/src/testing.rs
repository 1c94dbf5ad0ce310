//! Shared fixtures for unit tests: a recording store and small board lists.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use kanban_core::id::{BoardId, TaskId};
use kanban_core::order::next_order;
use kanban_core::{Board, BoardList, Task};

use crate::store::{BoardStore, StoreError};
use crate::sync::{SyncFailure, SyncObserver};

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateBoard(BoardId),
    CreateTask(BoardId),
    BoardTitle(BoardId, String),
    TaskTitle(TaskId, String),
    BoardOrder(BoardId, u32),
    TaskOrder(TaskId, u32),
    TaskBoard { task: TaskId, from: BoardId, to: BoardId },
    DeleteBoard(BoardId),
    DeleteTask(TaskId),
    GetBoards,
}

type FailRule = Box<dyn Fn(&Call) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct MockStore {
    inner: Arc<MockStoreInner>,
}

#[derive(Default)]
struct MockStoreInner {
    calls: Mutex<Vec<Call>>,
    boards: Mutex<Vec<Board>>,
    fail: Mutex<Option<FailRule>>,
}

impl MockStore {
    pub fn with_boards(list: &BoardList) -> Self {
        let store = Self::default();
        *guard(&store.inner.boards) = list.boards().to_vec();
        store
    }

    pub fn calls(&self) -> Vec<Call> {
        guard(&self.inner.calls).clone()
    }

    pub fn clear_calls(&self) {
        guard(&self.inner.calls).clear();
    }

    pub fn fail_when(&self, rule: impl Fn(&Call) -> bool + Send + Sync + 'static) {
        *guard(&self.inner.fail) = Some(Box::new(rule));
    }

    fn record(&self, call: Call) -> Result<(), StoreError> {
        let rejected = guard(&self.inner.fail)
            .as_ref()
            .is_some_and(|rule| rule(&call));
        guard(&self.inner.calls).push(call.clone());
        if rejected {
            return Err(StoreError::Backend(format!("injected failure: {call:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl BoardStore for MockStore {
    async fn create_board(&self) -> Result<BoardId, StoreError> {
        let id = BoardId::new();
        self.record(Call::CreateBoard(id))?;
        let mut boards = guard(&self.inner.boards);
        let order = next_order(&boards);
        boards.push(Board::new(id, "", order));
        Ok(id)
    }

    async fn create_task(&self, board: BoardId) -> Result<Task, StoreError> {
        self.record(Call::CreateTask(board))?;
        let mut boards = guard(&self.inner.boards);
        let owner = boards
            .iter_mut()
            .find(|b| b.id == board)
            .ok_or_else(|| StoreError::board_not_found(board))?;
        let task = Task::new(TaskId::new(), "", next_order(&owner.tasks));
        owner.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_board_title(
        &self,
        id: BoardId,
        title: &str,
        _order: u32,
    ) -> Result<(), StoreError> {
        self.record(Call::BoardTitle(id, title.to_owned()))
    }

    async fn update_task_title(
        &self,
        id: TaskId,
        title: &str,
        _order: u32,
    ) -> Result<(), StoreError> {
        self.record(Call::TaskTitle(id, title.to_owned()))
    }

    async fn update_board_order(&self, id: BoardId, order: u32) -> Result<(), StoreError> {
        self.record(Call::BoardOrder(id, order))
    }

    async fn update_task_order(&self, id: TaskId, order: u32) -> Result<(), StoreError> {
        self.record(Call::TaskOrder(id, order))
    }

    async fn update_task_board(
        &self,
        task: TaskId,
        from: BoardId,
        to: BoardId,
    ) -> Result<(), StoreError> {
        self.record(Call::TaskBoard { task, from, to })
    }

    async fn delete_board(&self, id: BoardId) -> Result<(), StoreError> {
        self.record(Call::DeleteBoard(id))
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), StoreError> {
        self.record(Call::DeleteTask(id))
    }

    async fn get_boards(&self) -> Result<Vec<Board>, StoreError> {
        self.record(Call::GetBoards)?;
        Ok(guard(&self.inner.boards).clone())
    }
}

/// Observer that remembers every rollback.
#[derive(Default)]
pub struct RecordingObserver {
    failures: Mutex<Vec<SyncFailure>>,
}

impl RecordingObserver {
    pub fn failures(&self) -> Vec<SyncFailure> {
        guard(&self.failures).clone()
    }
}

impl SyncObserver for RecordingObserver {
    fn on_rollback(&self, failure: &SyncFailure) {
        guard(&self.failures).push(failure.clone());
    }
}

/// Normalized list: board `i` is titled `B{i+1}` and holds `counts[i]` tasks
/// titled `t{i+1}-{j+1}`.
pub fn sample_list(counts: &[usize]) -> BoardList {
    let boards = counts
        .iter()
        .enumerate()
        .map(|(b, &count)| {
            let tasks = (0..count)
                .map(|t| Task::new(TaskId::new(), format!("t{}-{}", b + 1, t + 1), 0))
                .collect();
            Board::new(BoardId::new(), format!("B{}", b + 1), 0).with_tasks(tasks)
        })
        .collect();
    BoardList::new(boards).normalized()
}

pub fn board_at(list: &BoardList, index: usize) -> &Board {
    &list.boards()[index]
}

pub fn task_ids(list: &BoardList, board: BoardId) -> Vec<TaskId> {
    list.board(board)
        .map(|b| b.tasks.iter().map(|t| t.id).collect())
        .unwrap_or_default()
}

pub fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
