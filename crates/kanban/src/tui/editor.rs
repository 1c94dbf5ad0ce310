//! Single-line inline title editor.

use kanban_core::id::ItemId;
use unicode_segmentation::UnicodeSegmentation;

/// Title being edited in place of a board header or card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct TitleEditor {
    pub(super) target: ItemId,
    buffer: String,
    /// Cursor position in graphemes.
    cursor: usize,
}

impl TitleEditor {
    pub(super) fn new(target: ItemId, initial: &str) -> Self {
        Self {
            target,
            buffer: initial.to_owned(),
            cursor: initial.graphemes(true).count(),
        }
    }

    pub(super) fn text(&self) -> &str {
        &self.buffer
    }

    pub(super) const fn cursor(&self) -> usize {
        self.cursor
    }

    pub(super) fn insert(&mut self, ch: char) {
        let at = self.byte_offset(self.cursor);
        self.buffer.insert(at, ch);
        // A combining mark joins the previous grapheme instead of adding one.
        self.cursor = self.buffer[..at + ch.len_utf8()].graphemes(true).count();
    }

    pub(super) fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = self.byte_offset(self.cursor - 1);
        let end = self.byte_offset(self.cursor);
        self.buffer.replace_range(start..end, "");
        self.cursor -= 1;
    }

    pub(super) fn delete(&mut self) {
        if self.cursor >= self.len() {
            return;
        }
        let start = self.byte_offset(self.cursor);
        let end = self.byte_offset(self.cursor + 1);
        self.buffer.replace_range(start..end, "");
    }

    pub(super) const fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub(super) fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    pub(super) const fn home(&mut self) {
        self.cursor = 0;
    }

    pub(super) fn end(&mut self) {
        self.cursor = self.len();
    }

    fn len(&self) -> usize {
        self.buffer.graphemes(true).count()
    }

    fn byte_offset(&self, grapheme: usize) -> usize {
        self.buffer
            .grapheme_indices(true)
            .nth(grapheme)
            .map_or(self.buffer.len(), |(offset, _)| offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_core::id::TaskId;

    fn editor(text: &str) -> TitleEditor {
        TitleEditor::new(ItemId::Task(TaskId::new()), text)
    }

    #[test]
    fn starts_with_cursor_at_end() {
        let e = editor("abc");
        assert_eq!(e.cursor(), 3);
        assert_eq!(e.text(), "abc");
    }

    #[test]
    fn insert_and_backspace_in_the_middle() {
        let mut e = editor("ac");
        e.left();
        e.insert('b');
        assert_eq!(e.text(), "abc");
        assert_eq!(e.cursor(), 2);

        e.backspace();
        assert_eq!(e.text(), "ac");
        assert_eq!(e.cursor(), 1);
    }

    #[test]
    fn delete_removes_grapheme_under_cursor() {
        let mut e = editor("a\u{0301}b");
        e.home();
        e.delete();
        assert_eq!(e.text(), "b");
        e.end();
        e.delete();
        assert_eq!(e.text(), "b");
    }

    #[test]
    fn multibyte_titles_keep_boundaries() {
        let mut e = editor("あい");
        e.backspace();
        assert_eq!(e.text(), "あ");
        e.insert('う');
        assert_eq!(e.text(), "あう");
        assert_eq!(e.cursor(), 2);
    }

    #[test]
    fn combining_mark_attaches_to_previous_grapheme() {
        let mut e = editor("e");
        e.insert('\u{0301}');
        assert_eq!(e.cursor(), 1);
        e.backspace();
        assert_eq!(e.text(), "");
    }

    #[test]
    fn cursor_is_clamped() {
        let mut e = editor("");
        e.left();
        e.backspace();
        e.right();
        assert_eq!(e.cursor(), 0);
    }
}
