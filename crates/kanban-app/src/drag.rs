//! Drag state machine.
//!
//! `Idle -> Dragging -> Idle`. Hover updates are buffered in a single slot and
//! processed once per frame; cross-board moves are previewed live, everything
//! else is decided when the gesture ends.

use std::sync::Arc;

use kanban_core::id::ItemId;
use kanban_core::{Board, BoardList, Task};
use tracing::{debug, info, warn};

use crate::reconcile::{Gesture, Outcome, Reconciler};
use crate::sensors::DragEvent;
use crate::state::BoardState;
use crate::sync::SyncHandle;

/// The item currently lifted, cloned at drag start for overlay rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSelection {
    /// A whole board.
    Board(Board),
    /// A single task card.
    Task(Task),
}

impl DragSelection {
    fn resolve(list: &BoardList, item: ItemId) -> Option<Self> {
        match item {
            ItemId::Board(id) => list.board(id).cloned().map(Self::Board),
            ItemId::Task(id) => list.task(id).cloned().map(Self::Task),
        }
    }

    /// Identity of the lifted item.
    #[must_use]
    pub const fn item(&self) -> ItemId {
        match self {
            Self::Board(board) => ItemId::Board(board.id),
            Self::Task(task) => ItemId::Task(task.id),
        }
    }
}

#[derive(Debug)]
struct DragSession {
    selection: DragSelection,
    origin: Arc<BoardList>,
    over: Option<ItemId>,
    previewed_over: Option<ItemId>,
    dispatched_at_start: u64,
}

/// How a gesture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEnd {
    /// The final arrangement was applied and flushed.
    Committed(Gesture),
    /// The arrangement was already final; only a flush was issued.
    ///
    /// A drop whose target no longer resolves also ends here. The current
    /// arrangement, including any cross-board preview made during the
    /// gesture, is kept and flushed as final.
    Unchanged,
    /// The drag-origin arrangement was restored.
    Cancelled,
    /// No drag was in progress.
    Ignored,
}

/// Owns the transient drag session and drives reconciliation and sync.
pub struct DragMachine {
    reconciler: Reconciler,
    sync: SyncHandle,
    session: Option<DragSession>,
    pending_over: Option<ItemId>,
}

impl DragMachine {
    /// Machine writing to `state` and persisting through `sync`.
    #[must_use]
    pub fn new(state: BoardState, sync: SyncHandle) -> Self {
        Self {
            reconciler: Reconciler::new(state),
            sync,
            session: None,
            pending_over: None,
        }
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// The lifted item, for the drag overlay.
    #[must_use]
    pub fn selection(&self) -> Option<&DragSelection> {
        self.session.as_ref().map(|s| &s.selection)
    }

    /// Latest hover target, including one not yet processed this frame.
    #[must_use]
    pub fn hover(&self) -> Option<ItemId> {
        self.pending_over
            .or_else(|| self.session.as_ref().and_then(|s| s.over))
    }

    /// Route a sensor event.
    pub fn handle(&mut self, event: DragEvent) -> Option<DragEnd> {
        match event {
            DragEvent::Start { active } => {
                self.drag_start(active);
                None
            }
            DragEvent::Over { active, over } => {
                self.drag_over(active, over);
                None
            }
            DragEvent::End { active, over } => Some(self.drag_end(active, over)),
        }
    }

    /// Lift `active` when it resolves in the current arrangement.
    pub fn drag_start(&mut self, active: ItemId) -> bool {
        if self.session.is_some() {
            warn!(%active, "Drag already in progress; ignoring start");
            return false;
        }
        let origin = self.reconciler.state().snapshot();
        let Some(selection) = DragSelection::resolve(&origin, active) else {
            warn!(%active, "Drag start for unknown item; staying idle");
            return false;
        };
        debug!(%active, "Drag started");
        self.session = Some(DragSession {
            selection,
            origin,
            over: None,
            previewed_over: None,
            dispatched_at_start: self.sync.dispatched(),
        });
        self.pending_over = None;
        true
    }

    /// Record the latest hover target; replaces any unprocessed one.
    pub fn drag_over(&mut self, active: ItemId, over: ItemId) {
        match &self.session {
            Some(session) if session.selection.item() == active => {
                self.pending_over = Some(over);
            }
            Some(_) => debug!(%active, "Hover for a different item; ignoring"),
            None => {}
        }
    }

    /// Process the buffered hover target. Call once per rendered frame.
    pub fn on_frame(&mut self) -> Option<Outcome> {
        let over = self.pending_over.take()?;
        let session = self.session.as_mut()?;
        session.over = Some(over);
        let active = session.selection.item();
        if over == active {
            return None;
        }

        let gesture = self.reconciler.classify(active, over);
        if !gesture.is_cross_board() {
            return None;
        }
        let outcome = self.reconciler.apply(gesture);
        if let Outcome::Applied(transition) = &outcome {
            debug!(%active, %over, "Previewing cross-board move");
            session.previewed_over = Some(over);
            self.sync
                .schedule(Arc::clone(&transition.before), Arc::clone(&transition.after));
        }
        Some(outcome)
    }

    /// Finish the gesture. Always returns to idle.
    pub fn drag_end(&mut self, active: ItemId, over: Option<ItemId>) -> DragEnd {
        self.pending_over = None;
        let Some(session) = self.session.take() else {
            return DragEnd::Ignored;
        };
        let lifted = session.selection.item();
        if lifted != active {
            warn!(%active, %lifted, "Drag end for a different item; using the lifted one");
        }

        let Some(over) = over else {
            self.cancel(&session);
            return DragEnd::Cancelled;
        };

        if over == lifted || session.previewed_over == Some(over) {
            self.sync.flush();
            return DragEnd::Unchanged;
        }

        let gesture = self.reconciler.classify(lifted, over);
        let end = match self.reconciler.apply(gesture) {
            Outcome::Applied(transition) => {
                info!(?gesture, "Committed drag");
                self.sync.schedule(transition.before, transition.after);
                DragEnd::Committed(gesture)
            }
            Outcome::Unchanged => DragEnd::Unchanged,
            Outcome::Rejected => {
                warn!(%lifted, %over, "Drop target did not resolve; keeping arrangement");
                DragEnd::Unchanged
            }
        };
        self.sync.flush();
        end
    }

    fn cancel(&self, session: &DragSession) {
        let Some(replaced) = self.reconciler.restore(&session.origin) else {
            debug!("Drag cancelled with no local changes");
            self.sync.discard();
            return;
        };
        if self.sync.dispatched() > session.dispatched_at_start {
            info!("Drag cancelled after a write went out; restoring remotely");
            self.sync.schedule(replaced, Arc::clone(&session.origin));
            self.sync.flush();
        } else {
            debug!("Drag cancelled; discarding pending batch");
            self.sync.discard();
        }
    }
}
