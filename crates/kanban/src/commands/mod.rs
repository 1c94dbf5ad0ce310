use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use kanban_app::{DragEnd, Engine, Gesture, JsonBoardStore, ProjectConfig, SyncObserver};
use kanban_core::BoardList;
use kanban_core::id::{BoardId, ItemId};
use kanban_store_json::JsonStore;

use crate::{BoardsFormat, Command};

/// Open the project's board store and start an engine over it.
pub async fn open_engine(
    workdir: &Path,
    config: &ProjectConfig,
    observer: Arc<dyn SyncObserver>,
) -> Result<Engine> {
    let path = config.store_path(workdir);
    let store = JsonStore::open(&path)
        .with_context(|| format!("failed to open board store at {}", path.display()))?;
    Engine::start(Arc::new(JsonBoardStore::new(store)), config, observer).await
}

pub async fn run(command: Command, engine: &mut Engine) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(command, engine, &mut out).await
}

async fn execute<W: Write>(command: Command, engine: &mut Engine, out: &mut W) -> Result<()> {
    match command {
        Command::Boards { format } => {
            let list = engine.state().snapshot();
            match format {
                BoardsFormat::Table => render_boards(&list, out)?,
                BoardsFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(list.boards())?)?,
            }
        }
        Command::BoardNew { title } => {
            let service = engine.service();
            let id = service.create_board().await?;
            if let Some(title) = title {
                service.rename_board(id, &title).await?;
            }
            writeln!(out, "created board: {}", ItemId::Board(id))?;
        }
        Command::TaskNew { board, title } => {
            let board = parse_board_id(&board)?;
            let service = engine.service();
            let task = service.create_task(board).await?;
            if let Some(title) = title {
                service.rename_task(task.id, &title).await?;
            }
            writeln!(out, "created task: {}", ItemId::Task(task.id))?;
        }
        Command::Rename { item, title } => {
            let item = parse_item_id(&item)?;
            let service = engine.service();
            match item {
                ItemId::Board(id) => service.rename_board(id, &title).await?,
                ItemId::Task(id) => service.rename_task(id, &title).await?,
            }
            writeln!(out, "renamed: {item}")?;
        }
        Command::Delete { item } => {
            let item = parse_item_id(&item)?;
            let service = engine.service();
            match item {
                ItemId::Board(id) => service.delete_board(id).await?,
                ItemId::Task(id) => service.delete_task(id).await?,
            }
            writeln!(out, "deleted: {item}")?;
        }
        Command::Drag { active, over } => {
            let active = parse_item_id(&active)?;
            let over = over.as_deref().map(parse_item_id).transpose()?;
            let failed_before = engine.sync().activity().failed;
            let end = engine.drag_to(active, over).await?;
            if engine.sync().activity().failed > failed_before {
                bail!("store rejected the drag of {active}; arrangement restored");
            }
            writeln!(out, "{}", describe_end(end))?;
        }
        Command::Tui => bail!("tui is not routed through the command runner"),
    }

    Ok(())
}

fn render_boards<W: Write>(list: &BoardList, out: &mut W) -> io::Result<()> {
    if list.is_empty() {
        return writeln!(out, "No boards found");
    }
    for board in list.boards() {
        writeln!(out, "{} {} [{}]", board.order, display_title(&board.title), ItemId::Board(board.id))?;
        for task in &board.tasks {
            writeln!(out, "  {} {} [{}]", task.order, display_title(&task.title), ItemId::Task(task.id))?;
        }
    }
    Ok(())
}

fn display_title(title: &str) -> &str {
    if title.is_empty() { "(untitled)" } else { title }
}

fn describe_end(end: DragEnd) -> String {
    match end {
        DragEnd::Committed(Gesture::BoardReorder { active, from, to }) => {
            format!("moved board {active} from position {from} to {to}")
        }
        DragEnd::Committed(Gesture::TaskReorder { task, from, to, .. }) => {
            format!("moved task {task} from position {from} to {to}")
        }
        DragEnd::Committed(Gesture::TaskMove {
            task,
            to_board,
            index,
            ..
        }) => format!("moved task {task} to board {to_board} at position {index}"),
        DragEnd::Committed(Gesture::NoMatch) | DragEnd::Unchanged => "arrangement saved".to_owned(),
        DragEnd::Cancelled => "drag cancelled; arrangement restored".to_owned(),
        DragEnd::Ignored => "nothing to drag".to_owned(),
    }
}

fn parse_item_id(raw: &str) -> Result<ItemId> {
    ItemId::from_str(raw).with_context(|| format!("Invalid item id (expected board:<uuid> or task:<uuid>): {raw}"))
}

fn parse_board_id(raw: &str) -> Result<BoardId> {
    let bare = raw.strip_prefix("board:").unwrap_or(raw);
    BoardId::from_str(bare).with_context(|| format!("Invalid board id: {raw}"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use kanban_app::LogObserver;
    use kanban_core::id::TaskId;
    use tempfile::TempDir;

    async fn engine_in(temp: &TempDir) -> (Engine, ProjectConfig) {
        let config = ProjectConfig::parse("[sync]\ndebounce_ms = 10\n").expect("config");
        let engine = open_engine(temp.path(), &config, Arc::new(LogObserver))
            .await
            .expect("engine");
        (engine, config)
    }

    async fn exec(engine: &mut Engine, command: Command) -> String {
        let mut out = Vec::new();
        execute(command, engine, &mut out).await.expect("command succeeds");
        String::from_utf8(out).expect("utf8 output")
    }

    fn reopen(temp: &TempDir, config: &ProjectConfig) -> BoardList {
        let store = JsonStore::open(config.store_path(temp.path())).expect("reopen");
        BoardList::from_unsorted(store.get_boards().expect("boards"))
    }

    #[test]
    fn parse_board_id_accepts_prefixed_and_bare_forms() {
        let id = BoardId::new();
        assert_eq!(parse_board_id(&id.to_string()).unwrap(), id);
        assert_eq!(parse_board_id(&format!("board:{id}")).unwrap(), id);
        assert!(parse_board_id(&format!("task:{id}")).is_err());
    }

    #[test]
    fn parse_item_id_reports_the_bad_input() {
        let err = parse_item_id("column:1").unwrap_err();
        assert!(err.to_string().contains("column:1"));
    }

    #[tokio::test]
    async fn board_new_and_task_new_write_through_to_disk() {
        let temp = TempDir::new().expect("tempdir");
        let (mut engine, config) = engine_in(&temp).await;

        let output = exec(&mut engine, Command::BoardNew { title: Some("Todo".into()) }).await;
        assert!(output.starts_with("created board: board:"));
        let board = engine.state().snapshot().boards()[0].id;

        let output = exec(
            &mut engine,
            Command::TaskNew {
                board: board.to_string(),
                title: Some("Write docs".into()),
            },
        )
        .await;
        assert!(output.starts_with("created task: task:"));

        let stored = reopen(&temp, &config);
        assert_eq!(stored.boards()[0].title, "Todo");
        assert_eq!(stored.boards()[0].tasks[0].title, "Write docs");
    }

    #[tokio::test]
    async fn boards_table_lists_untitled_items() {
        let temp = TempDir::new().expect("tempdir");
        let (mut engine, _) = engine_in(&temp).await;
        assert_eq!(
            exec(&mut engine, Command::Boards { format: BoardsFormat::Table }).await,
            "No boards found\n"
        );

        let board = engine.service().create_board().await.expect("board");
        engine.service().create_task(board).await.expect("task");
        let output = exec(&mut engine, Command::Boards { format: BoardsFormat::Table }).await;
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0 (untitled) [board:"));
        assert!(lines[1].starts_with("  0 (untitled) [task:"));
    }

    #[tokio::test]
    async fn boards_json_is_parseable() {
        let temp = TempDir::new().expect("tempdir");
        let (mut engine, _) = engine_in(&temp).await;
        engine.service().create_board().await.expect("board");

        let output = exec(&mut engine, Command::Boards { format: BoardsFormat::Json }).await;
        let value: serde_json::Value = serde_json::from_str(&output).expect("json");
        assert_eq!(value.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn drag_moves_task_between_boards() {
        let temp = TempDir::new().expect("tempdir");
        let (mut engine, config) = engine_in(&temp).await;
        let service = engine.service().clone();
        let left = service.create_board().await.expect("left");
        let right = service.create_board().await.expect("right");
        let task: TaskId = service.create_task(left).await.expect("task").id;

        let output = exec(
            &mut engine,
            Command::Drag {
                active: ItemId::Task(task).to_string(),
                over: Some(ItemId::Board(right).to_string()),
            },
        )
        .await;
        assert_eq!(output, "arrangement saved\n");

        let stored = reopen(&temp, &config);
        let right_board = stored.board(right).expect("right board");
        assert_eq!(right_board.tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![task]);
        assert!(stored.board(left).expect("left board").tasks.is_empty());
    }

    #[tokio::test]
    async fn drag_without_target_is_cancelled() {
        let temp = TempDir::new().expect("tempdir");
        let (mut engine, _) = engine_in(&temp).await;
        let board = engine.service().create_board().await.expect("board");

        let output = exec(
            &mut engine,
            Command::Drag {
                active: ItemId::Board(board).to_string(),
                over: None,
            },
        )
        .await;
        assert_eq!(output, "drag cancelled; arrangement restored\n");
    }

    #[tokio::test]
    async fn rename_rejects_blank_title() {
        let temp = TempDir::new().expect("tempdir");
        let (mut engine, _) = engine_in(&temp).await;
        let board = engine.service().create_board().await.expect("board");

        let mut out = Vec::new();
        let result = execute(
            Command::Rename {
                item: ItemId::Board(board).to_string(),
                title: "   ".into(),
            },
            &mut engine,
            &mut out,
        )
        .await;
        assert!(result.is_err());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_task() {
        let temp = TempDir::new().expect("tempdir");
        let (mut engine, config) = engine_in(&temp).await;
        let board = engine.service().create_board().await.expect("board");
        let task = engine.service().create_task(board).await.expect("task");

        exec(
            &mut engine,
            Command::Delete {
                item: ItemId::Task(task.id).to_string(),
            },
        )
        .await;
        assert!(reopen(&temp, &config).board(board).expect("board").tasks.is_empty());
    }
}
