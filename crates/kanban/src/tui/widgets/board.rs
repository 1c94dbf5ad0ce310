use kanban_app::{Bounds, DragSelection, RegionId, RegionMap};
use kanban_core::id::ItemId;
use kanban_core::{Board, Task};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_segmentation::UnicodeSegmentation;

use super::super::constants::{BOARD_MIN_WIDTH, CARD_HEIGHT};
use super::super::editor::TitleEditor;
use super::super::view::Ui;
use super::util::{bounds_of, display_title};

/// Highlight inputs shared by every item of one frame.
#[derive(Clone, Copy)]
struct Marks {
    focus: Option<ItemId>,
    active: Option<ItemId>,
    over: Option<ItemId>,
}

impl Marks {
    fn style(self, item: ItemId) -> Style {
        if self.active == Some(item) {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
        } else if self.over == Some(item) {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else if self.focus == Some(item) {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    }
}

impl Ui {
    /// Draw the visible board columns and return the regions they occupy.
    pub(in crate::tui) fn draw_boards(&mut self, f: &mut Frame<'_>, area: Rect) -> RegionMap {
        let list = self.app.boards();
        let mut regions = RegionMap::new();
        if list.is_empty() {
            let hint = format!(
                "No boards yet. Press {} to create one.",
                self.keybindings.board.new_board.first().map_or("?", String::as_str)
            );
            let paragraph = Paragraph::new(hint)
                .alignment(Alignment::Center)
                .block(Block::default().title("Boards").borders(Borders::ALL));
            f.render_widget(paragraph, area);
            return regions;
        }

        let count = u16::try_from(list.len()).unwrap_or(u16::MAX);
        let visible = (area.width / BOARD_MIN_WIDTH).clamp(1, count);
        self.scroll_to_focus(list.len(), usize::from(visible));

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, u32::from(visible)); usize::from(visible)])
            .split(area);

        let drag = self.app.engine.drag();
        let marks = Marks {
            focus: self.app.focus(),
            active: drag.selection().map(DragSelection::item),
            over: drag.hover(),
        };
        for (board, column) in list.boards().iter().skip(self.scroll).zip(columns.iter()) {
            self.draw_board(f, board, *column, marks, &mut regions);
        }
        regions
    }

    fn scroll_to_focus(&mut self, count: usize, visible: usize) {
        let focused = self
            .app
            .focus()
            .and_then(|item| self.app.boards().owning_board(item))
            .and_then(|board| self.app.boards().board_index(board));
        if let Some(index) = focused {
            if index < self.scroll {
                self.scroll = index;
            } else if index >= self.scroll + visible {
                self.scroll = index + 1 - visible;
            }
        }
        self.scroll = self.scroll.min(count.saturating_sub(visible));
    }

    fn draw_board(&self, f: &mut Frame<'_>, board: &Board, area: Rect, marks: Marks, regions: &mut RegionMap) {
        let item = ItemId::Board(board.id);
        let editor = self.editor.as_ref().filter(|e| e.target == item);
        let width = usize::from(area.width.saturating_sub(4));
        let title = editor.map_or_else(
            || {
                Line::from(format!(
                    " {} ({}) ",
                    display_title(&board.title, width.saturating_sub(5)),
                    board.tasks.len()
                ))
            },
            editor_line,
        );
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(marks.style(item));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let board_region = regions.register(None, bounds_of(area), Some(item));
        if editor.is_some() {
            regions.register_no_drag(Some(board_region), Bounds::new(area.x, area.y, area.width, 1));
        }

        let bottom = inner.y.saturating_add(inner.height);
        let mut y = inner.y;
        for (index, task) in board.tasks.iter().enumerate() {
            if y.saturating_add(CARD_HEIGHT) > bottom {
                let hidden = board.tasks.len() - index;
                let more = Paragraph::new(format!("+{hidden} more")).style(Style::default().fg(Color::DarkGray));
                f.render_widget(more, Rect::new(inner.x, bottom.saturating_sub(1), inner.width, 1));
                break;
            }
            let card = Rect::new(inner.x, y, inner.width, CARD_HEIGHT);
            self.draw_card(f, task, card, marks, board_region, regions);
            y += CARD_HEIGHT;
        }
    }

    fn draw_card(
        &self,
        f: &mut Frame<'_>,
        task: &Task,
        area: Rect,
        marks: Marks,
        parent: RegionId,
        regions: &mut RegionMap,
    ) {
        let item = ItemId::Task(task.id);
        let editor = self.editor.as_ref().filter(|e| e.target == item);
        let width = usize::from(area.width.saturating_sub(2));
        let style = marks.style(item);
        let line = editor.map_or_else(
            || Line::from(display_title(&task.title, width).into_owned()),
            editor_line,
        );
        let card = Paragraph::new(line)
            .style(style)
            .block(Block::default().borders(Borders::ALL).border_style(style));
        f.render_widget(card, area);

        let region = regions.register(Some(parent), bounds_of(area), Some(item));
        if editor.is_some() {
            regions.register_no_drag(Some(region), bounds_of(area));
        }
    }
}

/// Edited text with the cursor cell reversed.
fn editor_line(editor: &TitleEditor) -> Line<'static> {
    let mut graphemes = editor.text().graphemes(true);
    let before: String = graphemes.by_ref().take(editor.cursor()).collect();
    let at = graphemes.next().unwrap_or(" ").to_owned();
    let after: String = graphemes.collect();
    Line::from(vec![
        Span::raw(before),
        Span::styled(at, Style::default().add_modifier(Modifier::REVERSED)),
        Span::raw(after),
    ])
}
