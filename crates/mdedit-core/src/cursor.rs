//! Cursor movement.
//!
//! A single caret over a [`TextBuffer`] snapshot. Every transition is total: moves that cannot
//! happen are no-ops and columns are clamped to the target line. No virtual column is remembered
//! across vertical moves.

use crate::buffer::TextBuffer;
use crate::position::Position;
use unicode_segmentation::UnicodeSegmentation;

/// The editing caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorModel {
    position: Position,
}

impl CursorModel {
    /// Create a cursor at the document start.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cursor at `position`, clamped into `buffer`.
    pub fn at(buffer: &TextBuffer, position: Position) -> Self {
        Self {
            position: buffer.clamp_position(position),
        }
    }

    /// Current position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Current line.
    pub fn line(&self) -> usize {
        self.position.line
    }

    /// Current column.
    pub fn column(&self) -> usize {
        self.position.column
    }

    /// Move to `position`, clamped into `buffer`.
    pub fn set_position(&mut self, buffer: &TextBuffer, position: Position) {
        self.position = buffer.clamp_position(position);
    }

    /// Re-clamp after a mutation this cursor did not observe.
    pub fn clamp_to(&mut self, buffer: &TextBuffer) {
        self.position = buffer.clamp_position(self.position);
    }

    /// One column left, wrapping to the end of the previous line.
    pub fn move_left(&mut self, buffer: &TextBuffer) {
        let pos = buffer.clamp_position(self.position);
        self.position = if pos.column > 0 {
            Position::new(pos.line, pos.column - 1)
        } else if pos.line > 0 {
            Position::new(pos.line - 1, buffer.line_len(pos.line - 1))
        } else {
            pos
        };
    }

    /// One column right, wrapping to the start of the next line.
    pub fn move_right(&mut self, buffer: &TextBuffer) {
        let pos = buffer.clamp_position(self.position);
        self.position = if pos.column < buffer.line_len(pos.line) {
            Position::new(pos.line, pos.column + 1)
        } else if pos.line + 1 < buffer.line_count() {
            Position::new(pos.line + 1, 0)
        } else {
            pos
        };
    }

    /// One line up; the column is clamped to the new line's length.
    pub fn move_up(&mut self, buffer: &TextBuffer) {
        let pos = buffer.clamp_position(self.position);
        if pos.line > 0 {
            let line = pos.line - 1;
            self.position = Position::new(line, pos.column.min(buffer.line_len(line)));
        } else {
            self.position = pos;
        }
    }

    /// One line down; the column is clamped to the new line's length.
    pub fn move_down(&mut self, buffer: &TextBuffer) {
        let pos = buffer.clamp_position(self.position);
        if pos.line + 1 < buffer.line_count() {
            let line = pos.line + 1;
            self.position = Position::new(line, pos.column.min(buffer.line_len(line)));
        } else {
            self.position = pos;
        }
    }

    /// Column 0 of the current line.
    pub fn move_to_line_start(&mut self, buffer: &TextBuffer) {
        let pos = buffer.clamp_position(self.position);
        self.position = Position::new(pos.line, 0);
    }

    /// End of the current line.
    pub fn move_to_line_end(&mut self, buffer: &TextBuffer) {
        let pos = buffer.clamp_position(self.position);
        self.position = Position::new(pos.line, buffer.line_len(pos.line));
    }

    /// Start of the document.
    pub fn move_to_document_start(&mut self) {
        self.position = Position::new(0, 0);
    }

    /// End of the document.
    pub fn move_to_document_end(&mut self, buffer: &TextBuffer) {
        let line = buffer.line_count() - 1;
        self.position = Position::new(line, buffer.line_len(line));
    }

    /// Previous word start (Unicode word boundaries), wrapping to the previous line end.
    pub fn move_word_left(&mut self, buffer: &TextBuffer) {
        let pos = buffer.clamp_position(self.position);
        if pos.column == 0 {
            self.move_left(buffer);
            return;
        }
        let text = buffer.get_line(pos.line);
        let mut target = 0;
        let mut column = 0;
        for segment in text.split_word_bounds() {
            if column >= pos.column {
                break;
            }
            if !segment.trim().is_empty() {
                target = column;
            }
            column += segment.chars().count();
        }
        self.position = Position::new(pos.line, target);
    }

    /// Next word end (Unicode word boundaries), wrapping to the next line start.
    pub fn move_word_right(&mut self, buffer: &TextBuffer) {
        let pos = buffer.clamp_position(self.position);
        let line_len = buffer.line_len(pos.line);
        if pos.column >= line_len {
            self.move_right(buffer);
            return;
        }
        let text = buffer.get_line(pos.line);
        let mut column = 0;
        let mut target = line_len;
        for segment in text.split_word_bounds() {
            let end = column + segment.chars().count();
            if end > pos.column && !segment.trim().is_empty() {
                target = end;
                break;
            }
            column = end;
        }
        self.position = Position::new(pos.line, target);
    }
}
