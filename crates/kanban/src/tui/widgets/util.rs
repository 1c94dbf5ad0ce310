use std::borrow::Cow;

use kanban_app::Bounds;
use ratatui::layout::Rect;
use unicode_segmentation::UnicodeSegmentation;

use super::super::constants::UNTITLED;

pub(in crate::tui) fn truncate_with_ellipsis(input: &str, max_graphemes: usize) -> Cow<'_, str> {
    const ELLIPSIS: &str = "...";
    const ELLIPSIS_GRAPHEMES: usize = 3;

    if max_graphemes == 0 {
        return Cow::Owned(String::new());
    }

    let grapheme_count = UnicodeSegmentation::graphemes(input, true).count();
    if grapheme_count <= max_graphemes {
        return Cow::Borrowed(input);
    }

    if max_graphemes <= ELLIPSIS_GRAPHEMES {
        let truncated: String = UnicodeSegmentation::graphemes(input, true)
            .take(max_graphemes)
            .collect();
        return Cow::Owned(truncated);
    }

    let keep = max_graphemes - ELLIPSIS_GRAPHEMES;
    let mut truncated: String = UnicodeSegmentation::graphemes(input, true).take(keep).collect();
    truncated.push_str(ELLIPSIS);
    Cow::Owned(truncated)
}

/// Title as displayed, with a placeholder for empty ones.
pub(in crate::tui) fn display_title(title: &str, max_graphemes: usize) -> Cow<'_, str> {
    if title.is_empty() {
        truncate_with_ellipsis(UNTITLED, max_graphemes)
    } else {
        truncate_with_ellipsis(title, max_graphemes)
    }
}

pub(in crate::tui) const fn bounds_of(rect: Rect) -> Bounds {
    Bounds::new(rect.x, rect.y, rect.width, rect.height)
}
