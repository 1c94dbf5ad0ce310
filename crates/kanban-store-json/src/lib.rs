//! JSON document storage for kanban boards.
//!
//! Boards and tasks live in two collections. A board document references its
//! tasks by id (in insertion order); a task document carries its own `order`.
//! Every mutation rewrites the database file atomically.

mod error;

pub use error::JsonStoreError;

use kanban_core::id::{BoardId, TaskId};
use kanban_core::order::next_order;
use kanban_core::{Board, Task};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, JsonStoreError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BoardDocument {
    title: String,
    order: u32,
    #[serde(default)]
    tasks: Vec<TaskId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskDocument {
    title: String,
    order: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Database {
    #[serde(default)]
    boards: BTreeMap<BoardId, BoardDocument>,
    #[serde(default)]
    tasks: BTreeMap<TaskId, TaskDocument>,
}

/// Document store backed by a single JSON file (or memory only).
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: Option<PathBuf>,
    db: Database,
}

impl JsonStore {
    /// Open the database at `path`, starting empty when the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                Database::default()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            Database::default()
        };
        debug!(path = %path.display(), boards = db.boards.len(), tasks = db.tasks.len(), "Opened store");
        Ok(Self {
            path: Some(path),
            db,
        })
    }

    /// Store that never touches the filesystem.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            db: Database::default(),
        }
    }

    /// Location of the database file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create an untitled board after every existing board.
    ///
    /// # Errors
    /// Returns an error if the database cannot be written.
    pub fn create_board(&mut self) -> Result<BoardId> {
        let order = self
            .db
            .boards
            .values()
            .map(|doc| doc.order)
            .max()
            .map_or(0, |max| max.saturating_add(1));
        let id = BoardId::new();
        self.db.boards.insert(
            id,
            BoardDocument {
                title: String::new(),
                order,
                tasks: Vec::new(),
            },
        );
        self.flush()?;
        info!(%id, order, "Created board");
        Ok(id)
    }

    /// Create an untitled task at the end of `board`.
    ///
    /// # Errors
    /// Returns an error if the board is missing or the database cannot be written.
    pub fn create_task(&mut self, board: BoardId) -> Result<Task> {
        let siblings = self.populate(board)?;
        let order = next_order(&siblings);
        let id = TaskId::new();
        self.db.tasks.insert(
            id,
            TaskDocument {
                title: String::new(),
                order,
            },
        );
        self.board_mut(board)?.tasks.push(id);
        self.flush()?;
        info!(%id, %board, order, "Created task");
        Ok(Task::new(id, String::new(), order))
    }

    /// Overwrite a board title.
    ///
    /// # Errors
    /// Returns an error if the board is missing or the database cannot be written.
    pub fn update_board_title(&mut self, id: BoardId, title: &str) -> Result<()> {
        self.board_mut(id)?.title = title.to_owned();
        self.flush()?;
        info!(%id, "Updated board title");
        Ok(())
    }

    /// Overwrite a task title.
    ///
    /// # Errors
    /// Returns an error if the task is missing or the database cannot be written.
    pub fn update_task_title(&mut self, id: TaskId, title: &str) -> Result<()> {
        self.task_mut(id)?.title = title.to_owned();
        self.flush()?;
        info!(%id, "Updated task title");
        Ok(())
    }

    /// Overwrite a board's order field.
    ///
    /// # Errors
    /// Returns an error if the board is missing or the database cannot be written.
    pub fn update_board_order(&mut self, id: BoardId, order: u32) -> Result<()> {
        self.board_mut(id)?.order = order;
        self.flush()?;
        debug!(%id, order, "Updated board order");
        Ok(())
    }

    /// Overwrite a task's order field.
    ///
    /// # Errors
    /// Returns an error if the task is missing or the database cannot be written.
    pub fn update_task_order(&mut self, id: TaskId, order: u32) -> Result<()> {
        self.task_mut(id)?.order = order;
        self.flush()?;
        debug!(%id, order, "Updated task order");
        Ok(())
    }

    /// Pull the task reference from `from` and push it onto `to`.
    ///
    /// Pulling a reference that is not present is a no-op, as is pushing one
    /// that is already there.
    ///
    /// # Errors
    /// Returns an error if the task or either board is missing, or the database
    /// cannot be written.
    pub fn update_task_board(&mut self, task: TaskId, from: BoardId, to: BoardId) -> Result<()> {
        if !self.db.tasks.contains_key(&task) {
            return Err(JsonStoreError::TaskNotFound(task.to_string()));
        }
        if !self.db.boards.contains_key(&to) {
            return Err(JsonStoreError::BoardNotFound(to.to_string()));
        }
        self.board_mut(from)?.tasks.retain(|id| *id != task);
        let target = self.board_mut(to)?;
        if !target.tasks.contains(&task) {
            target.tasks.push(task);
        }
        self.flush()?;
        info!(%task, %from, %to, "Moved task");
        Ok(())
    }

    /// Delete a board and every task it references.
    ///
    /// # Errors
    /// Returns an error if the board is missing or the database cannot be written.
    pub fn delete_board(&mut self, id: BoardId) -> Result<()> {
        let doc = self
            .db
            .boards
            .remove(&id)
            .ok_or_else(|| JsonStoreError::BoardNotFound(id.to_string()))?;
        for task in &doc.tasks {
            self.db.tasks.remove(task);
        }
        self.flush()?;
        info!(%id, tasks = doc.tasks.len(), "Deleted board");
        Ok(())
    }

    /// Delete a task and drop its reference from the owning board.
    ///
    /// # Errors
    /// Returns an error if the task is missing or the database cannot be written.
    pub fn delete_task(&mut self, id: TaskId) -> Result<()> {
        if self.db.tasks.remove(&id).is_none() {
            return Err(JsonStoreError::TaskNotFound(id.to_string()));
        }
        for board in self.db.boards.values_mut() {
            board.tasks.retain(|task| *task != id);
        }
        self.flush()?;
        info!(%id, "Deleted task");
        Ok(())
    }

    /// Every board with its populated tasks, both sorted by `order`.
    ///
    /// Task references without a document are skipped. Ties keep reference
    /// order.
    ///
    /// # Errors
    /// Currently infallible; kept fallible for parity with remote stores.
    pub fn get_boards(&self) -> Result<Vec<Board>> {
        let mut boards = self
            .db
            .boards
            .iter()
            .map(|(&id, doc)| {
                let mut tasks = self.tasks_of(doc);
                tasks.sort_by_key(|task| task.order);
                Board::new(id, doc.title.clone(), doc.order).with_tasks(tasks)
            })
            .collect::<Vec<_>>();
        boards.sort_by_key(|board| (board.order, board.id));
        Ok(boards)
    }

    fn populate(&self, board: BoardId) -> Result<Vec<Task>> {
        self.db
            .boards
            .get(&board)
            .map(|doc| self.tasks_of(doc))
            .ok_or_else(|| JsonStoreError::BoardNotFound(board.to_string()))
    }

    fn tasks_of(&self, doc: &BoardDocument) -> Vec<Task> {
        doc.tasks
            .iter()
            .filter_map(|id| {
                self.db
                    .tasks
                    .get(id)
                    .map(|task| Task::new(*id, task.title.clone(), task.order))
            })
            .collect()
    }

    fn board_mut(&mut self, id: BoardId) -> Result<&mut BoardDocument> {
        self.db
            .boards
            .get_mut(&id)
            .ok_or_else(|| JsonStoreError::BoardNotFound(id.to_string()))
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut TaskDocument> {
        self.db
            .tasks
            .get_mut(&id)
            .ok_or_else(|| JsonStoreError::TaskNotFound(id.to_string()))
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let tmp = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, &self.db)?;
            writer.flush()?;
        }
        tmp.persist(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn create_board_assigns_next_order() -> TestResult {
        let mut store = JsonStore::in_memory();
        let first = store.create_board()?;
        let second = store.create_board()?;
        store.update_board_order(first, 7)?;
        let third = store.create_board()?;

        let boards = store.get_boards()?;
        let ids: Vec<_> = boards.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![second, first, third]);
        assert_eq!(boards[2].order, 8);
        assert!(boards.iter().all(|b| b.title.is_empty()));
        Ok(())
    }

    #[test]
    fn create_task_appends_within_board() -> TestResult {
        let mut store = JsonStore::in_memory();
        let board = store.create_board()?;
        let a = store.create_task(board)?;
        let b = store.create_task(board)?;
        assert_eq!(a.order, 0);
        assert_eq!(b.order, 1);
        assert!(matches!(
            store.create_task(BoardId::new()),
            Err(JsonStoreError::BoardNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn get_boards_sorts_tasks_by_order() -> TestResult {
        let mut store = JsonStore::in_memory();
        let board = store.create_board()?;
        let a = store.create_task(board)?;
        let b = store.create_task(board)?;
        store.update_task_order(a.id, 1)?;
        store.update_task_order(b.id, 0)?;

        let boards = store.get_boards()?;
        let ids: Vec<_> = boards[0].tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
        Ok(())
    }

    #[test]
    fn update_task_board_moves_reference() -> TestResult {
        let mut store = JsonStore::in_memory();
        let from = store.create_board()?;
        let to = store.create_board()?;
        let task = store.create_task(from)?;

        store.update_task_board(task.id, from, to)?;
        // Repeating the move is harmless.
        store.update_task_board(task.id, from, to)?;

        let boards = store.get_boards()?;
        assert!(boards[0].tasks.is_empty());
        assert_eq!(boards[1].tasks.len(), 1);
        assert_eq!(boards[1].tasks[0].id, task.id);
        Ok(())
    }

    #[test]
    fn update_task_board_rejects_unknown_ids() -> TestResult {
        let mut store = JsonStore::in_memory();
        let board = store.create_board()?;
        assert!(matches!(
            store.update_task_board(TaskId::new(), board, board),
            Err(JsonStoreError::TaskNotFound(_))
        ));
        let task = store.create_task(board)?;
        assert!(matches!(
            store.update_task_board(task.id, board, BoardId::new()),
            Err(JsonStoreError::BoardNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn delete_board_cascades_to_tasks() -> TestResult {
        let mut store = JsonStore::in_memory();
        let board = store.create_board()?;
        let task = store.create_task(board)?;
        store.delete_board(board)?;

        assert!(store.get_boards()?.is_empty());
        assert!(matches!(
            store.update_task_title(task.id, "gone"),
            Err(JsonStoreError::TaskNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn delete_task_removes_board_reference() -> TestResult {
        let mut store = JsonStore::in_memory();
        let board = store.create_board()?;
        let task = store.create_task(board)?;
        store.delete_task(task.id)?;
        assert!(store.get_boards()?[0].tasks.is_empty());
        Ok(())
    }
}
