//! Remote sync adapter.
//!
//! Arrangement changes are coalesced into batches on a trailing-edge debounce
//! window and written through [`BoardStore`]. A batch remembers the
//! arrangement it started from and the latest arrangement it should reach; only
//! the difference between the two is sent. A rejected call restores the last
//! arrangement the store is known to hold.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{try_join, try_join_all};
use kanban_core::id::{BoardId, TaskId};
use kanban_core::BoardList;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::state::BoardState;
use crate::store::{BoardStore, StoreError};

/// One remote call family in a [`SyncPlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOp {
    /// Reassign a task to another board.
    MoveTask {
        /// Task changing owner.
        task: TaskId,
        /// Owner in the baseline.
        from: BoardId,
        /// Owner in the target.
        to: BoardId,
    },
    /// Persist one board position.
    BoardOrder {
        /// Board whose position changed.
        board: BoardId,
        /// New position.
        order: u32,
    },
    /// Persist every task position of one board.
    TaskOrders {
        /// Board whose task sequence changed.
        board: BoardId,
        /// Final `(task, order)` pairs in display order.
        orders: Vec<(TaskId, u32)>,
    },
}

/// Calls needed to take the store from one arrangement to another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    ops: Vec<SyncOp>,
}

impl SyncPlan {
    /// Compute the plan from `baseline` to `target`.
    ///
    /// Boards and tasks absent from the baseline were persisted by whoever
    /// created them and only receive order updates.
    #[must_use]
    pub fn diff(baseline: &BoardList, target: &BoardList) -> Self {
        let owners: HashMap<TaskId, BoardId> =
            baseline.tasks().map(|(board, task)| (task.id, board)).collect();
        let mut ops = Vec::new();

        for (to, task) in target.tasks() {
            if let Some(&from) = owners.get(&task.id)
                && from != to
            {
                ops.push(SyncOp::MoveTask {
                    task: task.id,
                    from,
                    to,
                });
            }
        }

        for board in target.boards() {
            let Some(prior) = baseline.board(board.id) else {
                continue;
            };
            if prior.order != board.order {
                ops.push(SyncOp::BoardOrder {
                    board: board.id,
                    order: board.order,
                });
            }
        }

        for board in target.boards() {
            let Some(prior) = baseline.board(board.id) else {
                continue;
            };
            let unchanged = prior.tasks.len() == board.tasks.len()
                && prior
                    .tasks
                    .iter()
                    .zip(&board.tasks)
                    .all(|(a, b)| a.id == b.id && a.order == b.order);
            if unchanged || board.tasks.is_empty() {
                continue;
            }
            ops.push(SyncOp::TaskOrders {
                board: board.id,
                orders: board.tasks.iter().map(|t| (t.id, t.order)).collect(),
            });
        }

        Self { ops }
    }

    /// Operations in dispatch order: reassignments first.
    #[must_use]
    pub fn ops(&self) -> &[SyncOp] {
        &self.ops
    }

    /// Whether there is nothing to send.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of individual store calls this plan issues.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                SyncOp::MoveTask { .. } | SyncOp::BoardOrder { .. } => 1,
                SyncOp::TaskOrders { orders, .. } => orders.len(),
            })
            .sum()
    }

    /// Replay this plan onto `list` as the store would apply it.
    #[must_use]
    pub fn apply_to(&self, list: &BoardList) -> BoardList {
        let mut boards = list.clone().into_boards();
        for op in &self.ops {
            match op {
                SyncOp::MoveTask { task, from, to } => {
                    let Some(dest) = boards.iter().position(|b| b.id == *to) else {
                        continue;
                    };
                    let moved = boards.iter_mut().find(|b| b.id == *from).and_then(|source| {
                        source
                            .task_index(*task)
                            .map(|index| source.tasks.remove(index))
                    });
                    if let (Some(moved), Some(dest)) = (moved, boards.get_mut(dest)) {
                        dest.tasks.push(moved);
                    }
                }
                SyncOp::BoardOrder { board, order } => {
                    if let Some(board) = boards.iter_mut().find(|b| b.id == *board) {
                        board.order = *order;
                    }
                }
                SyncOp::TaskOrders { board, orders } => {
                    let Some(board) = boards.iter_mut().find(|b| b.id == *board) else {
                        continue;
                    };
                    for (id, order) in orders {
                        if let Some(task) = board.tasks.iter_mut().find(|t| t.id == *id) {
                            task.order = *order;
                        }
                    }
                }
            }
        }
        BoardList::from_unsorted(boards)
    }
}

/// A rejected batch and the arrangement that was restored.
#[derive(Debug, Clone)]
pub struct SyncFailure {
    /// First error reported by the store.
    pub error: StoreError,
    /// Arrangement installed in place of the optimistic one.
    pub restored: Arc<BoardList>,
}

/// Hook for surfacing sync outcomes to the user.
pub trait SyncObserver: Send + Sync {
    /// A batch was rejected and local state rolled back.
    fn on_rollback(&self, failure: &SyncFailure);

    /// A batch was written successfully.
    fn on_synced(&self, _plan: &SyncPlan) {}
}

/// Observer that relies on the adapter's own logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl SyncObserver for LogObserver {
    fn on_rollback(&self, _failure: &SyncFailure) {}
}

/// Counters describing adapter activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncActivity {
    /// Commands sent to the worker but not yet processed.
    pub queued: usize,
    /// Whether a batch is waiting for its debounce window.
    pub pending: bool,
    /// Dispatched batches that have not settled.
    pub in_flight: usize,
    /// Batches dispatched since start.
    pub dispatched: u64,
    /// Batches rolled back since start.
    pub failed: u64,
}

impl SyncActivity {
    /// Nothing queued, pending or in flight.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.queued == 0 && !self.pending && self.in_flight == 0
    }
}

enum Command {
    Schedule {
        before: Arc<BoardList>,
        after: Arc<BoardList>,
    },
    Flush,
    Discard,
}

struct Batch {
    baseline: Arc<BoardList>,
    target: Arc<BoardList>,
}

struct Shared {
    store: Arc<dyn BoardStore>,
    state: BoardState,
    observer: Arc<dyn SyncObserver>,
    last_good: Mutex<Arc<BoardList>>,
    activity: watch::Sender<SyncActivity>,
}

/// Handle to the sync worker. Cheap to clone.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<Command>,
    shared: Arc<Shared>,
}

impl SyncHandle {
    /// Start the worker on the current Tokio runtime.
    ///
    /// The current contents of `state` become the initial known-good
    /// arrangement.
    #[must_use]
    pub fn spawn(
        store: Arc<dyn BoardStore>,
        state: BoardState,
        config: &SyncConfig,
        observer: Arc<dyn SyncObserver>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (activity, _) = watch::channel(SyncActivity::default());
        let shared = Arc::new(Shared {
            store,
            last_good: Mutex::new(state.snapshot()),
            state,
            observer,
            activity,
        });
        tokio::spawn(run(rx, Arc::clone(&shared), config.debounce()));
        Self { tx, shared }
    }

    /// Record a change from `before` to `after`, opening or extending the
    /// pending batch and restarting the debounce window.
    pub fn schedule(&self, before: Arc<BoardList>, after: Arc<BoardList>) {
        self.send(Command::Schedule { before, after });
    }

    /// Dispatch the pending batch now.
    pub fn flush(&self) {
        self.send(Command::Flush);
    }

    /// Drop the pending batch without writing it.
    pub fn discard(&self) {
        self.send(Command::Discard);
    }

    /// Snapshot of the activity counters.
    #[must_use]
    pub fn activity(&self) -> SyncActivity {
        *self.shared.activity.borrow()
    }

    /// Whether a batch is waiting for its window (or a command is queued).
    #[must_use]
    pub fn pending(&self) -> bool {
        let activity = self.activity();
        activity.pending || activity.queued > 0
    }

    /// Batches dispatched but not yet settled.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.activity().in_flight
    }

    /// Batches dispatched since start.
    #[must_use]
    pub fn dispatched(&self) -> u64 {
        self.activity().dispatched
    }

    /// Wait until nothing is queued, pending or in flight.
    pub async fn idle(&self) {
        let mut rx = self.shared.activity.subscribe();
        // The sender lives in `shared`, which `self` keeps alive.
        let _ = rx.wait_for(SyncActivity::is_idle).await;
    }

    /// Arrangement the store is known to hold.
    #[must_use]
    pub fn last_good(&self) -> Arc<BoardList> {
        Arc::clone(&lock(&self.shared.last_good))
    }

    /// Replace the known-good arrangement, e.g. after a fresh load.
    pub(crate) fn reset(&self, list: Arc<BoardList>) {
        *lock(&self.shared.last_good) = list;
    }

    /// Fold a change the store has already accepted into the known-good
    /// arrangement. `f` returns `None` when it does not apply.
    pub(crate) fn acknowledge(&self, f: impl FnOnce(&BoardList) -> Option<BoardList>) {
        let mut last_good = lock(&self.shared.last_good);
        if let Some(next) = f(&last_good) {
            *last_good = Arc::new(next);
        }
    }

    fn send(&self, command: Command) {
        self.shared.activity.send_modify(|a| a.queued += 1);
        if self.tx.send(command).is_err() {
            self.shared
                .activity
                .send_modify(|a| a.queued = a.queued.saturating_sub(1));
            warn!("Sync worker stopped; dropping command");
        }
    }
}

async fn run(mut rx: mpsc::UnboundedReceiver<Command>, shared: Arc<Shared>, window: Duration) {
    let mut batch: Option<Batch> = None;
    let mut deadline = Instant::now();
    loop {
        let command = if batch.is_some() {
            tokio::select! {
                command = rx.recv() => command,
                () = sleep_until(deadline) => {
                    if let Some(ready) = batch.take() {
                        shared.dispatch(ready);
                    }
                    shared.activity.send_modify(|a| a.pending = false);
                    continue;
                }
            }
        } else {
            rx.recv().await
        };
        let Some(command) = command else {
            break;
        };

        match command {
            Command::Schedule { before, after } => {
                match batch.as_mut() {
                    Some(open) => open.target = after,
                    None => {
                        batch = Some(Batch {
                            baseline: before,
                            target: after,
                        });
                    }
                }
                deadline = Instant::now() + window;
            }
            Command::Flush => {
                if let Some(ready) = batch.take() {
                    shared.dispatch(ready);
                }
            }
            Command::Discard => {
                if batch.take().is_some() {
                    debug!("Discarded pending sync batch");
                }
            }
        }

        let pending = batch.is_some();
        shared.activity.send_modify(|a| {
            a.queued = a.queued.saturating_sub(1);
            a.pending = pending;
        });
    }

    if let Some(ready) = batch.take() {
        shared.dispatch(ready);
        shared.activity.send_modify(|a| a.pending = false);
    }
}

impl Shared {
    fn dispatch(self: &Arc<Self>, batch: Batch) {
        let plan = SyncPlan::diff(&batch.baseline, &batch.target);
        if plan.is_empty() {
            debug!("Batch resolved to no changes; nothing to send");
            return;
        }
        info!(
            ops = plan.ops().len(),
            calls = plan.call_count(),
            "Dispatching sync batch"
        );
        self.activity.send_modify(|a| {
            a.in_flight += 1;
            a.dispatched += 1;
        });
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let result = execute(shared.store.as_ref(), &plan).await;
            shared.settle(&plan, result);
        });
    }

    fn settle(&self, plan: &SyncPlan, result: Result<(), StoreError>) {
        let failed = result.is_err();
        match result {
            Ok(()) => {
                {
                    let mut last_good = lock(&self.last_good);
                    *last_good = Arc::new(plan.apply_to(&last_good));
                }
                debug!("Sync batch settled");
                self.observer.on_synced(plan);
            }
            Err(error) => {
                let restored = Arc::clone(&lock(&self.last_good));
                error!(%error, "Sync failed; rolling back to last synced arrangement");
                self.state.replace(Arc::clone(&restored));
                self.observer.on_rollback(&SyncFailure { error, restored });
            }
        }
        self.activity.send_modify(|a| {
            a.in_flight = a.in_flight.saturating_sub(1);
            if failed {
                a.failed += 1;
            }
        });
    }
}

/// Reassignments run first and in sequence; order updates follow concurrently.
async fn execute(store: &dyn BoardStore, plan: &SyncPlan) -> Result<(), StoreError> {
    for op in plan.ops() {
        if let SyncOp::MoveTask { task, from, to } = op {
            store.update_task_board(*task, *from, *to).await?;
        }
    }

    let boards = plan.ops().iter().filter_map(|op| match op {
        SyncOp::BoardOrder { board, order } => Some(store.update_board_order(*board, *order)),
        _ => None,
    });
    let tasks = plan
        .ops()
        .iter()
        .filter_map(|op| match op {
            SyncOp::TaskOrders { orders, .. } => Some(orders),
            _ => None,
        })
        .flatten()
        .map(|&(task, order)| store.update_task_order(task, order));

    try_join(try_join_all(boards), try_join_all(tasks)).await?;
    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
