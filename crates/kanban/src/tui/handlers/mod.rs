use anyhow::Result;
use kanban_core::id::ItemId;
use tokio::runtime::Runtime;

use super::view::{Ui, UiAction};

/// Run a store-backed action to completion on `runtime`.
pub(super) fn handle_ui_action(runtime: &Runtime, ui: &mut Ui, action: UiAction) -> Result<()> {
    let service = ui.app.engine.service().clone();
    match action {
        UiAction::NewBoard => {
            let id = runtime.block_on(service.create_board())?;
            ui.begin_edit(ItemId::Board(id), "");
        }
        UiAction::NewTask { board } => {
            let task = runtime.block_on(service.create_task(board))?;
            ui.begin_edit(ItemId::Task(task.id), "");
        }
        UiAction::Rename { item, title } => {
            match item {
                ItemId::Board(id) => runtime.block_on(service.rename_board(id, &title))?,
                ItemId::Task(id) => runtime.block_on(service.rename_task(id, &title))?,
            }
            ui.info("Saved");
        }
        UiAction::Delete { item } => {
            let next = ui.app.focus_after_removal(item);
            match item {
                ItemId::Board(id) => runtime.block_on(service.delete_board(id))?,
                ItemId::Task(id) => runtime.block_on(service.delete_task(id))?,
            }
            ui.app.focus_or_repair(next);
            ui.info("Deleted");
        }
    }
    Ok(())
}
