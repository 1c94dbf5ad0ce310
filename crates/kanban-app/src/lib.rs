//! Application layer for the kanban board.
//!
//! This crate holds the drag-and-drop reconciliation engine: observable board
//! state, gesture sensors, the drag state machine, arrangement reconciliation,
//! and the debounced sync adapter, plus lifecycle services and configuration
//! shared by the CLI and TUI.

pub mod async_store;
pub mod config;
pub mod drag;
pub mod engine;
pub mod reconcile;
pub mod sensors;
pub mod service;
pub mod state;
pub mod store;
pub mod sync;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use async_store::JsonBoardStore;
pub use config::{ProjectConfig, SensorConfig, StoreConfig, SyncConfig};
pub use drag::{DragEnd, DragMachine, DragSelection};
pub use engine::Engine;
pub use reconcile::{Gesture, Outcome, Reconciler, Transition};
pub use sensors::{
    Bounds, CollisionStrategy, Direction, DragEvent, GestureSensors, InputModality, KeyInput,
    Point, RawInput, RegionId, RegionMap,
};
pub use service::BoardService;
pub use state::BoardState;
pub use store::{BoardStore, StoreError};
pub use sync::{LogObserver, SyncActivity, SyncFailure, SyncHandle, SyncObserver, SyncOp, SyncPlan};
