//! User configuration for the kanban TUI.

use anyhow::Result;
use std::path::Path;

pub mod keybindings;

pub use keybindings::{Action, KeyBindingsConfig, TuiConfig, ViewType};

/// Load and validate the TUI section of the user configuration, falling back
/// to defaults when no file exists.
pub fn load_tui_config(path: Option<&Path>) -> Result<TuiConfig> {
    let Some(config) = keybindings::load_config(path)? else {
        return Ok(TuiConfig::default());
    };
    keybindings::validate_tui_config(&config.tui)?;
    Ok(config.tui)
}
