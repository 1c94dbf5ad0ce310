use std::io::{self, Stdout};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event as CrosstermEvent, KeyEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use kanban_app::{ProjectConfig, SyncObserver};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::runtime::Runtime;
use tracing::subscriber::NoSubscriber;

use crate::commands::open_engine;
use crate::config::load_tui_config;

mod app;
pub mod constants;
mod editor;
mod handlers;
mod view;
mod widgets;

use self::app::{App, StatusFeed};
use self::constants::TUI_TICK_RATE_MS;
use self::handlers::handle_ui_action;
use self::view::Ui;

/// Launch the interactive TUI.
pub fn run(runtime: &Runtime, workdir: &Path, config: &ProjectConfig) -> Result<()> {
    let tui_config = load_tui_config(None)?;
    let feed = Arc::new(StatusFeed::default());
    let observer: Arc<dyn SyncObserver> = feed.clone();
    let engine = runtime.block_on(open_engine(workdir, config, observer))?;
    let mut ui = Ui::new(App::new(engine, feed), tui_config.keybindings);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)
        .context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = tracing::subscriber::with_default(NoSubscriber::default(), || {
        run_event_loop(&mut terminal, runtime, &mut ui)
    });

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )
    .ok();
    terminal.show_cursor().ok();

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    runtime: &Runtime,
    ui: &mut Ui,
) -> Result<()> {
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(TUI_TICK_RATE_MS);

    loop {
        ui.on_frame();
        terminal.draw(|f| ui.draw(f))?;
        if ui.should_quit {
            break;
        }

        let timeout = tick_rate.checked_sub(last_tick.elapsed()).unwrap_or_default();

        if event::poll(timeout)? {
            match event::read()? {
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(action) = ui.handle_key(key)
                        && let Err(err) = handle_ui_action(runtime, ui, action)
                    {
                        ui.error(format!("{err:#}"));
                    }
                }
                CrosstermEvent::Mouse(mouse) => ui.handle_mouse(mouse),
                CrosstermEvent::FocusLost => ui.cancel_gesture(),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            ui.tick();
            last_tick = Instant::now();
        }
    }

    // Write out anything still inside the debounce window before exiting.
    let sync = ui.app.engine.sync().clone();
    sync.flush();
    runtime.block_on(sync.idle());
    Ok(())
}

#[cfg(test)]
mod tests;
