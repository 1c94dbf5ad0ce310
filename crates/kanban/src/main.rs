//! CLI entry point for the kanban board.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use kanban_app::{LogObserver, ProjectConfig};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;
mod config;
mod tui;

/// Kanban boards with drag-and-drop reordering.
#[derive(Parser, Debug)]
#[command(
    name = "kanban",
    version,
    about = "kanban: boards and cards stored in .kanban/boards.json"
)]
struct Cli {
    /// Working directory holding `.kanban/` (defaults to current).
    #[arg(long)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List boards with their tasks in display order.
    Boards {
        #[arg(long, value_enum, default_value_t = BoardsFormat::Table)]
        format: BoardsFormat,
    },

    /// Create a board after the existing ones.
    BoardNew {
        #[arg(long)]
        title: Option<String>,
    },

    /// Create a task at the end of a board.
    TaskNew {
        /// Board id (bare uuid or `board:<uuid>`).
        #[arg(long)]
        board: String,
        #[arg(long)]
        title: Option<String>,
    },

    /// Change the title of a board or task (`board:<uuid>` / `task:<uuid>`).
    Rename { item: String, title: String },

    /// Delete a board with its tasks, or a single task.
    Delete { item: String },

    /// Drag `active` onto `over` and wait until the store has caught up.
    ///
    /// Omitting `--over` drops outside every target and restores the
    /// arrangement.
    Drag {
        active: String,
        #[arg(long)]
        over: Option<String>,
    },

    /// Launch interactive terminal UI.
    Tui,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
enum BoardsFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let Cli { dir, cmd } = Cli::parse();

    if should_install_tracing(&cmd) {
        install_tracing();
    }

    let workdir = dir.unwrap_or_else(|| PathBuf::from("."));
    let config = ProjectConfig::from_workdir(&workdir)?;
    let runtime = tokio::runtime::Runtime::new()?;

    match cmd {
        Command::Tui => tui::run(&runtime, &workdir, &config),
        other => runtime.block_on(async {
            let mut engine = commands::open_engine(&workdir, &config, Arc::new(LogObserver)).await?;
            commands::run(other, &mut engine).await
        }),
    }
}

/// The TUI owns the screen; worker threads must not write log lines over it.
const fn should_install_tracing(cmd: &Command) -> bool {
    !matches!(cmd, Command::Tui)
}

fn install_tracing() {
    // RUST_LOG is honoured; INFO otherwise.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}
