//! Anchor/focus selection.
//!
//! The ordered range is derived on demand, never stored: whichever of anchor and focus is
//! smaller (line first, then column) is the start.

use crate::buffer::TextBuffer;
use crate::position::Position;

/// An ordered `(start, end)` pair with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderedRange {
    /// Smaller endpoint.
    pub start: Position,
    /// Larger endpoint.
    pub end: Position,
}

impl OrderedRange {
    /// Whether the range covers no characters.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Anchor/focus selection over a [`TextBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionModel {
    anchor: Position,
    focus: Position,
    has_selection: bool,
}

impl SelectionModel {
    /// A collapsed selection at the document start.
    pub fn new() -> Self {
        Self::default()
    }

    /// A collapsed selection at `pos`.
    pub fn collapsed(pos: Position) -> Self {
        Self {
            anchor: pos,
            focus: pos,
            has_selection: false,
        }
    }

    /// Fixed endpoint.
    pub fn anchor(&self) -> Position {
        self.anchor
    }

    /// Moving endpoint.
    pub fn focus(&self) -> Position {
        self.focus
    }

    /// `false` iff anchor == focus.
    pub fn has_selection(&self) -> bool {
        self.has_selection
    }

    /// Set both endpoints.
    pub fn set_range(
        &mut self,
        anchor_line: usize,
        anchor_column: usize,
        focus_line: usize,
        focus_column: usize,
    ) {
        self.anchor = Position::new(anchor_line, anchor_column);
        self.focus = Position::new(focus_line, focus_column);
        self.has_selection = self.anchor != self.focus;
    }

    /// Move the focus only; the anchor stays put.
    pub fn extend(&mut self, line: usize, column: usize) {
        self.focus = Position::new(line, column);
        self.has_selection = self.anchor != self.focus;
    }

    /// Collapse both endpoints at `pos`.
    pub fn collapse_to(&mut self, pos: Position) {
        *self = Self::collapsed(pos);
    }

    /// Collapse at the focus.
    pub fn clear(&mut self) {
        self.collapse_to(self.focus);
    }

    /// Anchor and focus ordered lexicographically.
    pub fn ordered_range(&self) -> OrderedRange {
        if self.anchor <= self.focus {
            OrderedRange {
                start: self.anchor,
                end: self.focus,
            }
        } else {
            OrderedRange {
                start: self.focus,
                end: self.anchor,
            }
        }
    }

    /// Ordered range with both ends clamped into `buffer`.
    pub fn clamped_range(&self, buffer: &TextBuffer) -> OrderedRange {
        let OrderedRange { start, end } = self.ordered_range();
        OrderedRange {
            start: buffer.clamp_position(start),
            end: buffer.clamp_position(end),
        }
    }

    /// Whether `pos` lies inside the half-open ordered range.
    pub fn contains(&self, pos: Position) -> bool {
        let range = self.ordered_range();
        self.has_selection && range.start <= pos && pos < range.end
    }

    /// Selected text, or an empty string when nothing is selected.
    pub fn selected_text(&self, buffer: &TextBuffer) -> String {
        if !self.has_selection {
            return String::new();
        }
        let OrderedRange { start, end } = self.clamped_range(buffer);
        buffer.get_text_range(start.line, start.column, end.line, end.column)
    }

    /// Delete the ordered range and collapse at its start, which is returned.
    ///
    /// With no selection the buffer is untouched and the collapsed position is returned.
    pub fn delete_selected_text(&mut self, buffer: &mut TextBuffer) -> Position {
        let OrderedRange { start, end } = self.clamped_range(buffer);
        if self.has_selection {
            buffer.delete_text(start.line, start.column, end.line, end.column);
        }
        self.collapse_to(start);
        start
    }

    /// Replace the selection (or insert at the collapsed position) and return the position just
    /// after the inserted text. The selection collapses there.
    pub fn replace_selected_text(&mut self, buffer: &mut TextBuffer, text: &str) -> Position {
        let start = self.delete_selected_text(buffer);
        let text = crate::buffer::normalize_line_breaks(text);
        let after = if buffer.insert_text(start.line, start.column, &text).is_some() {
            start.advanced_by(&text)
        } else {
            start
        };
        self.collapse_to(after);
        after
    }

    /// Select the whole document.
    pub fn select_all(&mut self, buffer: &TextBuffer) {
        let last = buffer.line_count() - 1;
        self.set_range(0, 0, last, buffer.line_len(last));
    }

    /// Select one full line, including its line break when another line follows.
    pub fn select_line(&mut self, buffer: &TextBuffer, line: usize) {
        let line = line.min(buffer.line_count() - 1);
        if line + 1 < buffer.line_count() {
            self.set_range(line, 0, line + 1, 0);
        } else {
            self.set_range(line, 0, line, buffer.line_len(line));
        }
    }

    /// Clamp both endpoints into `buffer`.
    pub fn clamp_to(&mut self, buffer: &TextBuffer) {
        self.anchor = buffer.clamp_position(self.anchor);
        self.focus = buffer.clamp_position(self.focus);
        self.has_selection = self.anchor != self.focus;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_selection_tracks_endpoints() {
        let mut sel = SelectionModel::new();
        sel.set_range(1, 2, 1, 2);
        assert!(!sel.has_selection());
        sel.extend(1, 3);
        assert!(sel.has_selection());
        assert_eq!(sel.anchor(), Position::new(1, 2));
        sel.extend(1, 2);
        assert!(!sel.has_selection());
    }

    #[test]
    fn test_ordered_range_is_symmetric() {
        let mut forward = SelectionModel::new();
        forward.set_range(0, 5, 2, 1);
        let mut backward = SelectionModel::new();
        backward.set_range(2, 1, 0, 5);
        assert_eq!(forward.ordered_range(), backward.ordered_range());

        // Same line: tie broken on column.
        backward.set_range(3, 9, 3, 4);
        assert_eq!(backward.ordered_range().start, Position::new(3, 4));
    }

    #[test]
    fn test_selected_text() {
        let buffer = TextBuffer::from_text("one\ntwo\nthree");
        let mut sel = SelectionModel::new();
        assert_eq!(sel.selected_text(&buffer), "");
        sel.set_range(2, 2, 0, 1);
        assert_eq!(sel.selected_text(&buffer), "ne\ntwo\nth");
    }

    #[test]
    fn test_delete_collapses_to_start() {
        let mut buffer = TextBuffer::from_text("one\ntwo\nthree");
        let mut sel = SelectionModel::new();
        sel.set_range(2, 2, 0, 1);
        let pos = sel.delete_selected_text(&mut buffer);
        assert_eq!(pos, Position::new(0, 1));
        assert_eq!(buffer.get_text(), "oree");
        assert!(!sel.has_selection());
        assert_eq!(sel.focus(), pos);
    }

    #[test]
    fn test_out_of_range_selection_is_clamped_before_mutating() {
        let mut buffer = TextBuffer::from_text("abc");
        let mut sel = SelectionModel::new();
        sel.set_range(0, 0, 0, 99);
        assert_eq!(sel.selected_text(&buffer), "abc");

        let after = sel.replace_selected_text(&mut buffer, "X");
        assert_eq!(buffer.get_text(), "X");
        assert_eq!(after, Position::new(0, 1));

        let mut buffer = TextBuffer::from_text("one\ntwo");
        sel.set_range(7, 3, 1, 1);
        assert_eq!(sel.selected_text(&buffer), "wo");
        assert_eq!(sel.delete_selected_text(&mut buffer), Position::new(1, 1));
        assert_eq!(buffer.get_text(), "one\nt");
    }

    #[test]
    fn test_replace_accounts_for_line_breaks() {
        let mut buffer = TextBuffer::from_text("hello world");
        let mut sel = SelectionModel::new();
        sel.set_range(0, 6, 0, 11);
        let after = sel.replace_selected_text(&mut buffer, "big\nblue sky");
        assert_eq!(buffer.get_text(), "hello big\nblue sky");
        assert_eq!(after, Position::new(1, 8));
    }

    #[test]
    fn test_select_all_and_line() {
        let buffer = TextBuffer::from_text("a\nbc\ndef");
        let mut sel = SelectionModel::new();
        sel.select_all(&buffer);
        assert_eq!(sel.selected_text(&buffer), "a\nbc\ndef");
        sel.select_line(&buffer, 1);
        assert_eq!(sel.selected_text(&buffer), "bc\n");
        sel.select_line(&buffer, 2);
        assert_eq!(sel.selected_text(&buffer), "def");
    }
}
