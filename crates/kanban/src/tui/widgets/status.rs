use kanban_app::DragSelection;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::super::view::Ui;
use super::util::display_title;
use crate::config::ViewType;

impl Ui {
    pub(in crate::tui) fn draw_status(&self, f: &mut Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(Self::INSTRUCTIONS_HEIGHT),
                Constraint::Min(Self::STATUS_MESSAGE_MIN_HEIGHT),
            ])
            .split(area);

        let instructions = Paragraph::new(self.instructions())
            .block(Block::default().title("Keys").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        f.render_widget(instructions, rows[0]);

        let message = Paragraph::new(self.status_text())
            .block(Block::default().title("Status").borders(Borders::ALL))
            .style(self.status_style());
        f.render_widget(message, rows[1]);
    }

    pub(in crate::tui) fn instructions(&self) -> String {
        let view = if self.editor.is_some() {
            ViewType::Editor
        } else {
            ViewType::Board
        };
        self.keybindings
            .generate_help_text(view, self.app.engine.drag().is_dragging())
    }

    pub(in crate::tui) fn status_text(&self) -> String {
        if let Some(message) = &self.message {
            return message.text.clone();
        }
        if let Some(selection) = self.app.engine.drag().selection() {
            let title = match selection {
                DragSelection::Board(board) => &board.title,
                DragSelection::Task(task) => &task.title,
            };
            return format!("Moving {}", display_title(title, 40));
        }
        let activity = self.app.engine.sync().activity();
        if activity.is_idle() {
            let list = self.app.boards();
            format!("{} boards, {} tasks", list.len(), list.tasks().count())
        } else {
            "Saving...".to_owned()
        }
    }

    fn status_style(&self) -> Style {
        self.message
            .as_ref()
            .map_or_else(|| Style::default().fg(Color::Gray), super::super::view::Message::style)
    }
}
