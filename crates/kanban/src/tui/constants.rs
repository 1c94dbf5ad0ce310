//! Shared constants for the TUI to keep layout and timing in sync.

/// Interval in milliseconds between UI ticks/redraws.
pub const TUI_TICK_RATE_MS: u64 = 100;
/// Time-to-live in seconds for transient status messages.
pub const UI_MESSAGE_TTL_SECS: u64 = 5;
/// Narrowest a board column is drawn before columns start scrolling.
pub const BOARD_MIN_WIDTH: u16 = 22;
/// Rows taken by one card, borders included.
pub const CARD_HEIGHT: u16 = 3;
/// Width of the floating card that follows the pointer during a drag.
pub const DRAG_OVERLAY_WIDTH: u16 = 24;
/// Title shown for boards and tasks that have none yet.
pub const UNTITLED: &str = "(untitled)";
