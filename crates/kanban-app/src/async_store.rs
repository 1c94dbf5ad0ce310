//! Async adapter over the blocking JSON document store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kanban_core::id::{BoardId, TaskId};
use kanban_core::{Board, Task};
use kanban_store_json::{JsonStore, JsonStoreError};

use crate::store::{BoardStore, StoreError};

impl From<JsonStoreError> for StoreError {
    fn from(err: JsonStoreError) -> Self {
        match err {
            JsonStoreError::BoardNotFound(id) => Self::NotFound { kind: "board", id },
            JsonStoreError::TaskNotFound(id) => Self::NotFound { kind: "task", id },
            other => Self::Backend(other.to_string()),
        }
    }
}

/// [`BoardStore`] backed by a [`JsonStore`] file.
///
/// Every call runs on the blocking pool so file I/O never stalls the runtime.
#[derive(Clone)]
pub struct JsonBoardStore {
    inner: Arc<Mutex<JsonStore>>,
}

impl JsonBoardStore {
    /// Wrap an opened store.
    #[must_use]
    pub fn new(store: JsonStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    async fn with_store<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut JsonStore) -> Result<T, JsonStoreError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut store = inner.lock().map_err(|_| JsonStoreError::LockError)?;
            op(&mut store)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("Task join error: {e}")))?
        .map_err(StoreError::from)
    }
}

#[async_trait]
impl BoardStore for JsonBoardStore {
    async fn create_board(&self) -> Result<BoardId, StoreError> {
        self.with_store(JsonStore::create_board).await
    }

    async fn create_task(&self, board: BoardId) -> Result<Task, StoreError> {
        self.with_store(move |store| store.create_task(board)).await
    }

    async fn update_board_title(
        &self,
        id: BoardId,
        title: &str,
        _order: u32,
    ) -> Result<(), StoreError> {
        let title = title.to_owned();
        self.with_store(move |store| store.update_board_title(id, &title))
            .await
    }

    async fn update_task_title(
        &self,
        id: TaskId,
        title: &str,
        _order: u32,
    ) -> Result<(), StoreError> {
        let title = title.to_owned();
        self.with_store(move |store| store.update_task_title(id, &title))
            .await
    }

    async fn update_board_order(&self, id: BoardId, order: u32) -> Result<(), StoreError> {
        self.with_store(move |store| store.update_board_order(id, order))
            .await
    }

    async fn update_task_order(&self, id: TaskId, order: u32) -> Result<(), StoreError> {
        self.with_store(move |store| store.update_task_order(id, order))
            .await
    }

    async fn update_task_board(
        &self,
        task: TaskId,
        from: BoardId,
        to: BoardId,
    ) -> Result<(), StoreError> {
        self.with_store(move |store| store.update_task_board(task, from, to))
            .await
    }

    async fn delete_board(&self, id: BoardId) -> Result<(), StoreError> {
        self.with_store(move |store| store.delete_board(id)).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), StoreError> {
        self.with_store(move |store| store.delete_task(id)).await
    }

    async fn get_boards(&self) -> Result<Vec<Board>, StoreError> {
        self.with_store(|store| store.get_boards()).await
    }
}
