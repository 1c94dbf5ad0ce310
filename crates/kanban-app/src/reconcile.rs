//! Translate `(active, over)` pairs into new board arrangements.

use std::sync::Arc;

use kanban_core::id::{BoardId, ItemId, TaskId};
use kanban_core::order::{insert_at, move_item, renumber};
use kanban_core::BoardList;
use tracing::debug;

use crate::state::BoardState;

/// Classified drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// A board lifted over another board.
    BoardReorder {
        /// Board being dragged.
        active: BoardId,
        /// Current index of the dragged board.
        from: usize,
        /// Index of the hovered board.
        to: usize,
    },
    /// A task dropped inside its own board.
    TaskReorder {
        /// Task being dragged.
        task: TaskId,
        /// Board owning the task.
        board: BoardId,
        /// Current index of the task.
        from: usize,
        /// Target index.
        to: usize,
    },
    /// A task carried into another board.
    TaskMove {
        /// Task being dragged.
        task: TaskId,
        /// Board currently owning the task.
        from_board: BoardId,
        /// Board receiving the task.
        to_board: BoardId,
        /// Insertion index inside the receiving board (clamped on apply).
        index: usize,
    },
    /// Nothing to do: unresolved ids, mixed kinds, or hovering the item itself.
    NoMatch,
}

impl Gesture {
    /// Whether this gesture moves a task between boards.
    #[must_use]
    pub const fn is_cross_board(&self) -> bool {
        matches!(self, Self::TaskMove { .. })
    }
}

/// Classify a gesture against `list`.
///
/// Boards only reorder against boards. A task hovering a task or board in its
/// own board reorders in place; hovering another board (or one of its tasks)
/// moves it there. Hovering a board rather than a card targets the end of
/// that board's list.
#[must_use]
pub fn classify(list: &BoardList, active: ItemId, over: ItemId) -> Gesture {
    if active == over {
        return Gesture::NoMatch;
    }
    match (active, over) {
        (ItemId::Board(active), ItemId::Board(over)) => {
            match (list.board_index(active), list.board_index(over)) {
                (Some(from), Some(to)) => Gesture::BoardReorder { active, from, to },
                _ => Gesture::NoMatch,
            }
        }
        (ItemId::Task(task), over) => {
            let Some(origin) = list.locate_task(task) else {
                return Gesture::NoMatch;
            };
            let Some(target_board) = list.owning_board(over) else {
                return Gesture::NoMatch;
            };
            let Some(target) = list.board(target_board) else {
                return Gesture::NoMatch;
            };
            let index = match over {
                ItemId::Task(over_task) => target.task_index(over_task).unwrap_or(target.tasks.len()),
                ItemId::Board(_) => target.tasks.len(),
            };
            if target_board == origin.board {
                Gesture::TaskReorder {
                    task,
                    board: origin.board,
                    from: origin.task_index,
                    to: index.min(target.tasks.len().saturating_sub(1)),
                }
            } else {
                Gesture::TaskMove {
                    task,
                    from_board: origin.board,
                    to_board: target_board,
                    index,
                }
            }
        }
        (ItemId::Board(_), ItemId::Task(_)) => Gesture::NoMatch,
    }
}

/// Compute the arrangement a gesture produces, with every touched sequence
/// renumbered. Returns `None` for [`Gesture::NoMatch`] or stale indices.
#[must_use]
pub fn arrange(list: &BoardList, gesture: Gesture) -> Option<BoardList> {
    match gesture {
        Gesture::BoardReorder { from, to, .. } => {
            let mut boards = move_item(list.boards(), from, to)?;
            renumber(&mut boards);
            Some(BoardList::new(boards))
        }
        Gesture::TaskReorder {
            board, from, to, ..
        } => {
            let source = list.board(board)?;
            let mut tasks = move_item(&source.tasks, from, to)?;
            renumber(&mut tasks);
            list.map_board(board, |b| b.tasks = tasks)
        }
        Gesture::TaskMove {
            task,
            from_board,
            to_board,
            index,
        } => {
            let mut boards = list.clone().into_boards();
            let source = boards.iter_mut().find(|b| b.id == from_board)?;
            let position = source.task_index(task)?;
            let moved = source.tasks.remove(position);
            renumber(&mut source.tasks);
            let target = boards.iter_mut().find(|b| b.id == to_board)?;
            insert_at(&mut target.tasks, index, moved);
            renumber(&mut target.tasks);
            Some(BoardList::new(boards))
        }
        Gesture::NoMatch => None,
    }
}

/// Arrangement change installed into [`BoardState`].
#[derive(Debug, Clone)]
pub struct Transition {
    /// Gesture that produced the change.
    pub gesture: Gesture,
    /// Arrangement before the change.
    pub before: Arc<BoardList>,
    /// Arrangement after the change.
    pub after: Arc<BoardList>,
}

/// Result of applying a gesture.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// State was replaced.
    Applied(Transition),
    /// The gesture resolved to the current arrangement.
    Unchanged,
    /// The gesture did not classify; nothing happened.
    Rejected,
}

/// Applies gestures to shared [`BoardState`].
#[derive(Clone)]
pub struct Reconciler {
    state: BoardState,
}

impl Reconciler {
    /// Reconcile against `state`.
    #[must_use]
    pub const fn new(state: BoardState) -> Self {
        Self { state }
    }

    /// Shared state this reconciler writes to.
    #[must_use]
    pub const fn state(&self) -> &BoardState {
        &self.state
    }

    /// Classify `(active, over)` against the current arrangement.
    #[must_use]
    pub fn classify(&self, active: ItemId, over: ItemId) -> Gesture {
        self.state.select(|list| classify(list, active, over))
    }

    /// Apply `gesture` to the current arrangement.
    pub fn apply(&self, gesture: Gesture) -> Outcome {
        let current = self.state.snapshot();
        let Some(next) = arrange(&current, gesture) else {
            debug!(?gesture, "Gesture did not resolve");
            return Outcome::Rejected;
        };
        match self.state.replace_if_changed(next) {
            Some((before, after)) => {
                debug!(?gesture, "Applied arrangement");
                Outcome::Applied(Transition {
                    gesture,
                    before,
                    after,
                })
            }
            None => Outcome::Unchanged,
        }
    }

    /// Put `snapshot` back when it differs from the current arrangement.
    ///
    /// Returns the arrangement that was replaced.
    pub fn restore(&self, snapshot: &Arc<BoardList>) -> Option<Arc<BoardList>> {
        let current = self.state.snapshot();
        if current.same_arrangement(snapshot) {
            return None;
        }
        Some(self.state.replace(Arc::clone(snapshot)))
    }
}
