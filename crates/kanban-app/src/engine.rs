//! Wiring of state, sensors, drag machine, sync adapter and service.

use std::sync::Arc;

use anyhow::{Result, bail};
use kanban_core::id::ItemId;
use tracing::debug;

use crate::config::ProjectConfig;
use crate::drag::{DragEnd, DragMachine};
use crate::reconcile::Outcome;
use crate::sensors::{DragEvent, GestureSensors, RawInput, RegionMap};
use crate::service::BoardService;
use crate::state::BoardState;
use crate::store::BoardStore;
use crate::sync::{SyncHandle, SyncObserver};

/// A loaded board with every engine component attached.
pub struct Engine {
    state: BoardState,
    sync: SyncHandle,
    service: BoardService,
    drag: DragMachine,
    sensors: GestureSensors,
}

impl Engine {
    /// Spawn the sync worker and load boards from `store`.
    ///
    /// # Errors
    /// Returns an error if the initial load fails.
    pub async fn start(
        store: Arc<dyn BoardStore>,
        config: &ProjectConfig,
        observer: Arc<dyn SyncObserver>,
    ) -> Result<Self> {
        let state = BoardState::default();
        let sync = SyncHandle::spawn(Arc::clone(&store), state.clone(), &config.sync, observer);
        let service = BoardService::new(store, state.clone(), sync.clone());
        service.load().await?;
        Ok(Self {
            drag: DragMachine::new(state.clone(), sync.clone()),
            sensors: GestureSensors::new(&config.sensors),
            state,
            sync,
            service,
        })
    }

    /// Observable board arrangement.
    #[must_use]
    pub const fn state(&self) -> &BoardState {
        &self.state
    }

    /// Debounced sync adapter.
    #[must_use]
    pub const fn sync(&self) -> &SyncHandle {
        &self.sync
    }

    /// Lifecycle operations: create, rename, delete.
    #[must_use]
    pub const fn service(&self) -> &BoardService {
        &self.service
    }

    /// Drag state machine, for the active selection and hover.
    #[must_use]
    pub const fn drag(&self) -> &DragMachine {
        &self.drag
    }

    /// Gesture sensors, for the input modality in use.
    #[must_use]
    pub const fn sensors(&self) -> &GestureSensors {
        &self.sensors
    }

    /// Feed raw input through the sensors into the drag machine.
    pub fn input(&mut self, regions: &RegionMap, input: RawInput) -> Option<DragEnd> {
        let mut end = None;
        for event in self.sensors.handle(regions, input) {
            if let Some(result) = self.drag.handle(event) {
                end = Some(result);
            }
        }
        end
    }

    /// Route a single drag event.
    pub fn dispatch(&mut self, event: DragEvent) -> Option<DragEnd> {
        self.drag.handle(event)
    }

    /// Process buffered hover work; call before each draw.
    pub fn on_frame(&mut self) -> Option<Outcome> {
        self.drag.on_frame()
    }

    /// Abort any gesture, e.g. on focus loss.
    pub fn cancel_gesture(&mut self) -> Option<DragEnd> {
        let event = self.sensors.cancel()?;
        self.drag.handle(event)
    }

    /// Run a complete gesture headlessly and wait for the sync to settle.
    ///
    /// # Errors
    /// Returns an error if `active` does not resolve.
    pub async fn drag_to(&mut self, active: ItemId, over: Option<ItemId>) -> Result<DragEnd> {
        if !self.drag.drag_start(active) {
            bail!("cannot drag {active}: not on the board");
        }
        if let Some(over) = over {
            self.drag.drag_over(active, over);
            self.drag.on_frame();
        }
        let end = self.drag.drag_end(active, over);
        debug!(?end, "Headless drag finished");
        self.sync.idle().await;
        Ok(end)
    }
}
