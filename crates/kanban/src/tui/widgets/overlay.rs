use kanban_app::{DragSelection, InputModality};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::super::constants::{CARD_HEIGHT, DRAG_OVERLAY_WIDTH};
use super::super::view::Ui;
use super::util::display_title;

impl Ui {
    /// Paint the lifted item under the pointer while a pointer drag is active.
    pub(in crate::tui) fn draw_drag_overlay(&self, f: &mut Frame<'_>) {
        if self.app.engine.sensors().modality() != Some(InputModality::Pointer) {
            return;
        }
        let (Some(selection), Some(at)) = (self.app.engine.drag().selection(), self.pointer) else {
            return;
        };

        let area = f.area();
        let width = DRAG_OVERLAY_WIDTH.min(area.width);
        let height = CARD_HEIGHT.min(area.height);
        let rect = Rect {
            x: at.x.min(area.right().saturating_sub(width)),
            y: at.y.min(area.bottom().saturating_sub(height)),
            width,
            height,
        };

        let (kind, title) = match selection {
            DragSelection::Board(board) => ("board", board.title.as_str()),
            DragSelection::Task(task) => ("task", task.title.as_str()),
        };
        let block = Block::default()
            .title(kind)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .style(Style::default().bg(Color::Black));
        let body = Paragraph::new(display_title(title, usize::from(width.saturating_sub(2))).into_owned()).block(block);

        f.render_widget(Clear, rect);
        f.render_widget(body, rect);
    }
}
