//! Observable board state.
//!
//! A single authoritative [`BoardList`] lives behind a `watch` channel.
//! Readers take cheap `Arc` snapshots or subscribe for change notifications;
//! only the reconciler, the sync adapter and the board service write.

use std::sync::Arc;

use kanban_core::BoardList;
use tokio::sync::watch;

/// Shared handle to the current arrangement.
#[derive(Clone)]
pub struct BoardState {
    tx: Arc<watch::Sender<Arc<BoardList>>>,
}

impl BoardState {
    /// Start with `initial` as the current arrangement.
    #[must_use]
    pub fn new(initial: BoardList) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx: Arc::new(tx) }
    }

    /// Current arrangement.
    #[must_use]
    pub fn snapshot(&self) -> Arc<BoardList> {
        Arc::clone(&self.tx.borrow())
    }

    /// Project a value out of the current arrangement without cloning it.
    pub fn select<T>(&self, f: impl FnOnce(&BoardList) -> T) -> T {
        f(&self.tx.borrow())
    }

    /// Receiver notified whenever the arrangement is replaced.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<BoardList>> {
        self.tx.subscribe()
    }

    /// Install `next` unconditionally, returning the previous arrangement.
    pub(crate) fn replace(&self, next: Arc<BoardList>) -> Arc<BoardList> {
        self.tx.send_replace(next)
    }

    /// Install `next` only when it differs structurally from the current
    /// arrangement. Returns `(before, after)` when a replacement happened.
    pub(crate) fn replace_if_changed(
        &self,
        next: BoardList,
    ) -> Option<(Arc<BoardList>, Arc<BoardList>)> {
        let mut installed = None;
        self.tx.send_if_modified(|current| {
            if current.same_arrangement(&next) {
                return false;
            }
            let after = Arc::new(next);
            let before = std::mem::replace(current, Arc::clone(&after));
            installed = Some((before, after));
            true
        });
        installed
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new(BoardList::default())
    }
}
