//! Keybindings configuration for the TUI.

#![allow(clippy::enum_glob_use)]

use anyhow::{Context, Result, anyhow, bail};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

macro_rules! vec_of_strings {
    ($($s:expr),* $(,)?) => {
        vec![$($s.to_string()),*]
    };
}

/// Top-level user configuration for kanban.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TUI configuration.
    pub tui: TuiConfig,
}

/// TUI-specific configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Keybindings configuration.
    pub keybindings: KeyBindingsConfig,
}

/// Keybindings for every TUI view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindingsConfig {
    /// Keybindings while browsing or dragging on the board.
    pub board: BoardKeyBindings,
    /// Keybindings while editing a title inline.
    pub editor: EditorKeyBindings,
}

/// Keybindings for the board view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardKeyBindings {
    /// Quit the application.
    pub quit: Vec<String>,
    /// Move focus (or the lifted item) up.
    pub up: Vec<String>,
    /// Move focus (or the lifted item) down.
    pub down: Vec<String>,
    /// Move focus (or the lifted item) left.
    pub left: Vec<String>,
    /// Move focus (or the lifted item) right.
    pub right: Vec<String>,
    /// Lift the focused item, or drop the lifted one.
    pub lift: Vec<String>,
    /// Abort the current drag.
    pub cancel: Vec<String>,
    /// Create a board at the end.
    pub new_board: Vec<String>,
    /// Create a task at the end of the focused board.
    pub new_task: Vec<String>,
    /// Edit the title of the focused item.
    pub rename: Vec<String>,
    /// Delete the focused item.
    pub delete: Vec<String>,
}

/// Keybindings for the inline title editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorKeyBindings {
    /// Save the title.
    pub confirm: Vec<String>,
    /// Discard the edit.
    pub cancel: Vec<String>,
}

impl Default for BoardKeyBindings {
    fn default() -> Self {
        Self {
            quit: vec_of_strings!["q", "Q"],
            up: vec_of_strings!["k", "Up"],
            down: vec_of_strings!["j", "Down"],
            left: vec_of_strings!["h", "Left"],
            right: vec_of_strings!["l", "Right"],
            lift: vec_of_strings!["Space", "Enter"],
            cancel: vec_of_strings!["Esc"],
            new_board: vec_of_strings!["B"],
            new_task: vec_of_strings!["n"],
            rename: vec_of_strings!["e", "F2"],
            delete: vec_of_strings!["x", "Delete"],
        }
    }
}

impl Default for EditorKeyBindings {
    fn default() -> Self {
        Self {
            confirm: vec_of_strings!["Enter"],
            cancel: vec_of_strings!["Esc"],
        }
    }
}

/// Returns the default configuration file path.
///
/// On Linux: `~/.config/kanban/config.toml`
/// On macOS: `~/Library/Application Support/kanban/config.toml`
/// On Windows: `%APPDATA%\kanban\config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("kanban").join("config.toml"))
}

/// Load configuration from a TOML file.
///
/// `None` for `path` means the default location. Returns `Ok(None)` when the
/// file does not exist.
pub fn load_config(path: Option<&Path>) -> Result<Option<Config>> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(None),
        },
    };

    if !config_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

    Ok(Some(config))
}

/// Parse a key string into a `KeyEvent`.
///
/// # Examples
/// - "j" -> `KeyCode::Char('j')`
/// - "Space" -> `KeyCode::Char(' ')`
/// - "Ctrl+d" -> `KeyCode::Char('d')` with CONTROL modifier
pub fn parse_key(s: &str) -> Result<KeyEvent> {
    let parts: Vec<&str> = s.split('+').collect();
    let (key_part, modifier_parts) = parts
        .split_last()
        .ok_or_else(|| anyhow!("Empty key string"))?;

    let mut modifiers = KeyModifiers::NONE;
    for &modifier in modifier_parts {
        match modifier {
            "Ctrl" | "Control" => modifiers |= KeyModifiers::CONTROL,
            "Alt" => modifiers |= KeyModifiers::ALT,
            "Shift" => modifiers |= KeyModifiers::SHIFT,
            other => bail!("Unknown modifier: {other}"),
        }
    }

    let code = parse_key_code(key_part)?;
    Ok(KeyEvent::new(code, modifiers))
}

fn parse_key_code(s: &str) -> Result<KeyCode> {
    match s {
        "Enter" => Ok(KeyCode::Enter),
        "Esc" => Ok(KeyCode::Esc),
        "Space" => Ok(KeyCode::Char(' ')),
        "Backspace" => Ok(KeyCode::Backspace),
        "Left" => Ok(KeyCode::Left),
        "Right" => Ok(KeyCode::Right),
        "Up" => Ok(KeyCode::Up),
        "Down" => Ok(KeyCode::Down),
        "Home" => Ok(KeyCode::Home),
        "End" => Ok(KeyCode::End),
        "Tab" => Ok(KeyCode::Tab),
        "Delete" => Ok(KeyCode::Delete),
        "Insert" => Ok(KeyCode::Insert),
        f if f.len() > 1 && f.starts_with('F') => {
            let n: u8 = f[1..].parse().map_err(|_| anyhow!("Unknown key: {f}"))?;
            Ok(KeyCode::F(n))
        }
        s if s.chars().count() == 1 => {
            let ch = s.chars().next().ok_or_else(|| anyhow!("Empty char"))?;
            Ok(KeyCode::Char(ch))
        }
        other => bail!("Unknown key: {other}"),
    }
}

/// Validate the TUI configuration.
///
/// Checks for:
/// - Empty key bindings
/// - Invalid key expressions
/// - Key conflicts within each view
pub fn validate_tui_config(config: &TuiConfig) -> Result<()> {
    let bindings = &config.keybindings;
    for view in [ViewType::Board, ViewType::Editor] {
        let table = bindings.view_bindings(view);
        for (action, keys) in &table {
            if keys.is_empty() {
                bail!("{}.{action} must have at least one key binding", view.name());
            }
            for key in *keys {
                parse_key(key).with_context(|| format!("Invalid key '{key}' in {}.{action}", view.name()))?;
            }
        }
        validate_view_keybindings(view.name(), &table)?;
    }
    Ok(())
}

fn validate_view_keybindings(view_name: &str, bindings: &[(&str, &[String])]) -> Result<()> {
    let mut key_to_actions: HashMap<&str, Vec<&str>> = HashMap::new();
    for (action, keys) in bindings {
        for key in *keys {
            key_to_actions.entry(key.as_str()).or_default().push(*action);
        }
    }

    let mut conflicts: Vec<_> = key_to_actions
        .into_iter()
        .filter(|(_, actions)| actions.len() > 1)
        .collect();
    conflicts.sort_unstable();
    if let Some((key, actions)) = conflicts.first() {
        bail!("Key '{key}' is bound to multiple actions in {view_name}: {actions:?}");
    }
    Ok(())
}

/// View types in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewType {
    /// Board columns, browsing or dragging.
    Board,
    /// Inline title editor.
    Editor,
}

impl ViewType {
    const fn name(self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::Editor => "editor",
        }
    }
}

/// Actions that can be bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Quit the application.
    Quit,
    /// Move up.
    Up,
    /// Move down.
    Down,
    /// Move left.
    Left,
    /// Move right.
    Right,
    /// Lift or drop.
    Lift,
    /// Cancel the drag or the edit.
    Cancel,
    /// Create a board.
    NewBoard,
    /// Create a task.
    NewTask,
    /// Edit a title.
    Rename,
    /// Delete an item.
    Delete,
    /// Save the edited title.
    Confirm,
}

impl KeyBindingsConfig {
    fn view_bindings(&self, view: ViewType) -> Vec<(&'static str, &[String])> {
        match view {
            ViewType::Board => {
                let b = &self.board;
                vec![
                    ("quit", b.quit.as_slice()),
                    ("up", b.up.as_slice()),
                    ("down", b.down.as_slice()),
                    ("left", b.left.as_slice()),
                    ("right", b.right.as_slice()),
                    ("lift", b.lift.as_slice()),
                    ("cancel", b.cancel.as_slice()),
                    ("new_board", b.new_board.as_slice()),
                    ("new_task", b.new_task.as_slice()),
                    ("rename", b.rename.as_slice()),
                    ("delete", b.delete.as_slice()),
                ]
            }
            ViewType::Editor => vec![
                ("confirm", self.editor.confirm.as_slice()),
                ("cancel", self.editor.cancel.as_slice()),
            ],
        }
    }

    /// One-line help for the footer.
    pub fn generate_help_text(&self, view: ViewType, dragging: bool) -> String {
        match view {
            ViewType::Board if dragging => format!(
                "{}:move {}:drop {}:cancel",
                self.format_arrows(),
                format_first_key(&self.board.lift),
                format_first_key(&self.board.cancel),
            ),
            ViewType::Board => format!(
                "{}:focus {}:lift {}:new task {}:new board {}:rename {}:delete {}:quit",
                self.format_arrows(),
                format_first_key(&self.board.lift),
                format_first_key(&self.board.new_task),
                format_first_key(&self.board.new_board),
                format_first_key(&self.board.rename),
                format_first_key(&self.board.delete),
                format_first_key(&self.board.quit),
            ),
            ViewType::Editor => format!(
                "{}:save {}:discard",
                format_first_key(&self.editor.confirm),
                format_first_key(&self.editor.cancel),
            ),
        }
    }

    fn format_arrows(&self) -> String {
        format!(
            "{}{}{}{}",
            format_first_key(&self.board.left),
            format_first_key(&self.board.down),
            format_first_key(&self.board.up),
            format_first_key(&self.board.right),
        )
    }

    /// Whether `key` is bound to `action` in `view`.
    pub fn matches(&self, view: ViewType, action: Action, key: &KeyEvent) -> bool {
        self.get_keys(view, action)
            .iter()
            .filter_map(|key_str| parse_key(key_str).ok())
            .any(|expected| key_event_matches(&expected, key))
    }

    /// First action in `candidates` bound to `key`.
    pub fn action_for(&self, view: ViewType, key: &KeyEvent, candidates: &[Action]) -> Option<Action> {
        candidates.iter().copied().find(|action| self.matches(view, *action, key))
    }

    fn get_keys(&self, view: ViewType, action: Action) -> &[String] {
        use Action::*;
        use ViewType::*;

        match (view, action) {
            (Board, Quit) => &self.board.quit,
            (Board, Up) => &self.board.up,
            (Board, Down) => &self.board.down,
            (Board, Left) => &self.board.left,
            (Board, Right) => &self.board.right,
            (Board, Lift) => &self.board.lift,
            (Board, Cancel) => &self.board.cancel,
            (Board, NewBoard) => &self.board.new_board,
            (Board, NewTask) => &self.board.new_task,
            (Board, Rename) => &self.board.rename,
            (Board, Delete) => &self.board.delete,
            (Editor, Confirm) => &self.editor.confirm,
            (Editor, Cancel) => &self.editor.cancel,
            _ => &[],
        }
    }
}

/// Terminals disagree on whether an uppercase letter carries SHIFT, so the
/// letter itself decides.
fn key_event_matches(expected: &KeyEvent, actual: &KeyEvent) -> bool {
    if expected.code != actual.code {
        return false;
    }
    if matches!(expected.code, KeyCode::Char(_)) {
        let ignore = KeyModifiers::SHIFT;
        return expected.modifiers.difference(ignore) == actual.modifiers.difference(ignore);
    }
    expected.modifiers == actual.modifiers
}

fn format_first_key(keys: &[String]) -> String {
    keys.first()
        .map_or_else(|| "?".to_string(), |k| format_key_display(k))
}

fn format_key_display(key: &str) -> String {
    match key {
        "Enter" => "↵".to_string(),
        "Space" => "␣".to_string(),
        "Backspace" => "BS".to_string(),
        "Delete" => "Del".to_string(),
        "Up" => "↑".to_string(),
        "Down" => "↓".to_string(),
        "Left" => "←".to_string(),
        "Right" => "→".to_string(),
        other if other.starts_with("Ctrl+") || other.starts_with("Alt+") => other.replace('+', "-"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_keybindings_are_valid() {
        let config = TuiConfig::default();
        validate_tui_config(&config).unwrap();
        assert_eq!(config.keybindings.board.lift, vec!["Space", "Enter"]);
        assert_eq!(config.keybindings.editor.cancel, vec!["Esc"]);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [tui.keybindings.board]
            quit = ["Ctrl+c"]
            "#,
        )
        .unwrap();

        assert_eq!(config.tui.keybindings.board.quit, vec!["Ctrl+c"]);
        assert_eq!(config.tui.keybindings.board.up, vec!["k", "Up"]);
        assert_eq!(config.tui.keybindings.editor.confirm, vec!["Enter"]);
    }

    #[test]
    fn test_conflicting_keys_are_rejected() {
        let mut config = TuiConfig::default();
        config.keybindings.board.delete = vec!["n".into()];

        let err = validate_tui_config(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'n'"), "{message}");
        assert!(message.contains("board"), "{message}");
    }

    #[test]
    fn test_same_key_in_different_views_is_allowed() {
        let config = TuiConfig::default();
        assert!(config.keybindings.board.cancel.contains(&"Esc".to_string()));
        assert!(config.keybindings.editor.cancel.contains(&"Esc".to_string()));
        validate_tui_config(&config).unwrap();
    }

    #[test]
    fn test_empty_and_invalid_bindings_are_rejected() {
        let mut config = TuiConfig::default();
        config.keybindings.board.rename.clear();
        let err = validate_tui_config(&config).unwrap_err();
        assert!(err.to_string().contains("board.rename"));

        let mut config = TuiConfig::default();
        config.keybindings.editor.confirm = vec!["Hyper+x".into()];
        assert!(validate_tui_config(&config).is_err());
    }

    #[test]
    fn test_parse_key_forms() {
        assert_eq!(parse_key("j").unwrap().code, KeyCode::Char('j'));
        assert_eq!(parse_key("Space").unwrap().code, KeyCode::Char(' '));
        assert_eq!(parse_key("F2").unwrap().code, KeyCode::F(2));

        let ctrl = parse_key("Ctrl+d").unwrap();
        assert_eq!(ctrl.code, KeyCode::Char('d'));
        assert_eq!(ctrl.modifiers, KeyModifiers::CONTROL);

        assert!(parse_key("Fx").is_err());
        assert!(parse_key("Meta+k").is_err());
        assert!(parse_key("").is_err());
    }

    #[test]
    fn test_matches_ignores_shift_on_letters() {
        let config = KeyBindingsConfig::default();
        let shifted = KeyEvent::new(KeyCode::Char('B'), KeyModifiers::SHIFT);
        assert!(config.matches(ViewType::Board, Action::NewBoard, &shifted));

        let plain = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE);
        assert!(config.matches(ViewType::Board, Action::NewTask, &plain));
        assert!(!config.matches(ViewType::Editor, Action::NewTask, &plain));

        let ctrl_n = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL);
        assert!(!config.matches(ViewType::Board, Action::NewTask, &ctrl_n));
    }

    #[test]
    fn test_action_for_picks_first_match() {
        let config = KeyBindingsConfig::default();
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(
            config.action_for(ViewType::Board, &enter, &[Action::Quit, Action::Lift]),
            Some(Action::Lift)
        );
        assert_eq!(config.action_for(ViewType::Board, &enter, &[Action::Quit]), None);
    }

    #[test]
    fn test_help_text_reflects_custom_keys() {
        let mut config = KeyBindingsConfig::default();
        config.board.quit = vec!["Ctrl+c".into()];
        let help = config.generate_help_text(ViewType::Board, false);
        assert!(help.contains("Ctrl-c:quit"), "{help}");
        assert!(help.starts_with("hjkl:focus"), "{help}");

        let dragging = config.generate_help_text(ViewType::Board, true);
        assert!(dragging.contains("␣:drop"), "{dragging}");
        assert!(dragging.contains("Esc:cancel"), "{dragging}");
    }

    #[test]
    fn test_load_config_missing_and_present() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        assert!(load_config(Some(&path)).unwrap().is_none());

        std::fs::write(&path, "[tui.keybindings.editor]\nconfirm = [\"Ctrl+s\"]\n").unwrap();
        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.tui.keybindings.editor.confirm, vec!["Ctrl+s"]);
    }

    #[test]
    fn test_load_config_reports_parse_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[tui.keybindings.board\n").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
