//! Line Buffer
//!
//! The single source of truth for document content, stored in a [`ropey::Rope`] so that line
//! access, insertion and deletion stay O(log N) on large documents.
//!
//! The buffer is never empty: an empty document has exactly one empty line, and `N` line breaks
//! always produce `N + 1` lines. Columns are counted in characters (Unicode scalar values).
//!
//! Every effective mutation bumps [`TextBuffer::version`] and notifies listeners, line range
//! first, then document.

use crate::events::{ChangeListeners, LineRange, SubscriptionId};
use crate::position::Position;
use ropey::Rope;
use std::borrow::Cow;

/// Normalize `\r\n` and lone `\r` line breaks to `\n`.
pub fn normalize_line_breaks(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Ordered line storage with change notifications.
#[derive(Debug)]
pub struct TextBuffer {
    rope: Rope,
    version: u64,
    listeners: ChangeListeners,
}

impl TextBuffer {
    /// Create a buffer holding a single empty line.
    pub fn new() -> Self {
        Self::from_text("")
    }

    /// Build a buffer from text. Line breaks are normalized to `\n`.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(&normalize_line_breaks(text)),
            version: 0,
            listeners: ChangeListeners::new(),
        }
    }

    /// Total line count (always at least 1).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total character count, line breaks included.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Document version, incremented once per effective mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether `line` is a valid line index.
    pub fn contains_line(&self, line: usize) -> bool {
        line < self.line_count()
    }

    /// Length of a line in characters, excluding its line break. `0` when out of range.
    pub fn line_len(&self, line: usize) -> usize {
        if !self.contains_line(line) {
            return 0;
        }
        let slice = self.rope.line(line);
        let len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Text of a line without its line break, or an empty string when out of range.
    pub fn get_line(&self, line: usize) -> String {
        if !self.contains_line(line) {
            return String::new();
        }
        let start = self.rope.line_to_char(line);
        self.rope
            .slice(start..start + self.line_len(line))
            .to_string()
    }

    /// Complete document text.
    pub fn get_text(&self) -> String {
        self.rope.to_string()
    }

    /// Clamp a position into the current document bounds.
    pub fn clamp_position(&self, pos: Position) -> Position {
        let line = pos.line.min(self.line_count() - 1);
        Position::new(line, pos.column.min(self.line_len(line)))
    }

    /// Whether `pos` addresses an existing line and a column within it.
    pub fn is_valid_position(&self, pos: Position) -> bool {
        self.contains_line(pos.line) && pos.column <= self.line_len(pos.line)
    }

    /// Character offset of a position (clamped).
    pub fn position_to_offset(&self, pos: Position) -> usize {
        let pos = self.clamp_position(pos);
        self.rope.line_to_char(pos.line) + pos.column
    }

    /// Position of a character offset (clamped).
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        Position::new(line, offset - self.rope.line_to_char(line))
    }

    /// Insert `text` at (`line`, `column`).
    ///
    /// Returns the inclusive range of changed lines: a single line when `text` has no line
    /// breaks, otherwise `line..=line + k` for `k` breaks. Out-of-range positions and empty text
    /// are no-ops and return `None`.
    pub fn insert_text(&mut self, line: usize, column: usize, text: &str) -> Option<LineRange> {
        let pos = Position::new(line, column);
        if text.is_empty() || !self.is_valid_position(pos) {
            return None;
        }

        let text = normalize_line_breaks(text);
        let offset = self.rope.line_to_char(line) + column;
        self.rope.insert(offset, &text);

        let breaks = text.matches('\n').count();
        let range = LineRange::new(line, line + breaks);
        self.commit(range);
        Some(range)
    }

    /// Delete the text between two positions.
    ///
    /// Same-line deletes slice out `[start_column, end_column)`; cross-line deletes merge the
    /// prefix of `start_line` with the suffix of `end_line`. The reported range is the merged
    /// result line. Out-of-range positions and empty ranges are no-ops.
    pub fn delete_text(
        &mut self,
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
    ) -> Option<LineRange> {
        let a = Position::new(start_line, start_column);
        let b = Position::new(end_line, end_column);
        if !self.is_valid_position(a) || !self.is_valid_position(b) || a == b {
            return None;
        }
        let (start, end) = if a <= b { (a, b) } else { (b, a) };

        let start_char = self.rope.line_to_char(start.line) + start.column;
        let end_char = self.rope.line_to_char(end.line) + end.column;
        self.rope.remove(start_char..end_char);

        let range = LineRange::single(start.line);
        self.commit(range);
        Some(range)
    }

    /// Text between two positions, joined with `\n` across lines. Positions are clamped and
    /// reordered if needed.
    pub fn get_text_range(
        &self,
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
    ) -> String {
        let a = self.position_to_offset(Position::new(start_line, start_column));
        let b = self.position_to_offset(Position::new(end_line, end_column));
        self.rope.slice(a.min(b)..a.max(b)).to_string()
    }

    /// Replace the whole document. Every line is reported as changed.
    pub fn set_text(&mut self, text: &str) -> LineRange {
        self.rope = Rope::from_str(&normalize_line_breaks(text));
        let range = LineRange::new(0, self.line_count() - 1);
        tracing::debug!(
            target: "mdedit_core::buffer",
            lines = self.line_count(),
            chars = self.char_count(),
            "document replaced"
        );
        self.commit(range);
        range
    }

    /// Subscribe to line-range-changed notifications.
    pub fn subscribe_lines<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(LineRange) + Send + 'static,
    {
        self.listeners.subscribe_lines(callback)
    }

    /// Subscribe to document-changed notifications.
    pub fn subscribe_document<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut() + Send + 'static,
    {
        self.listeners.subscribe_document(callback)
    }

    /// Remove a subscription. Returns `false` if the handle is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn commit(&mut self, range: LineRange) {
        self.version = self.version.wrapping_add(1);
        self.listeners.emit(range);
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_new_buffer_has_one_empty_line() {
        let buffer = TextBuffer::new();
        assert_eq!(buffer.line_count(), 1);
        assert_eq!(buffer.get_line(0), "");
        assert_eq!(buffer.char_count(), 0);
    }

    #[test]
    fn test_trailing_newline_yields_extra_line() {
        let buffer = TextBuffer::from_text("a\nb\n");
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.get_line(1), "b");
        assert_eq!(buffer.get_line(2), "");
    }

    #[test]
    fn test_get_line_out_of_range_is_empty() {
        let buffer = TextBuffer::from_text("only");
        assert_eq!(buffer.get_line(7), "");
        assert_eq!(buffer.line_len(7), 0);
    }

    #[test]
    fn test_crlf_is_normalized() {
        let buffer = TextBuffer::from_text("a\r\nb\rc");
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.get_text(), "a\nb\nc");
    }

    #[test]
    fn test_insert_single_line() {
        let mut buffer = TextBuffer::from_text("Hello World");
        let range = buffer.insert_text(0, 6, "Beautiful ");
        assert_eq!(range, Some(LineRange::single(0)));
        assert_eq!(buffer.get_text(), "Hello Beautiful World");
        assert_eq!(buffer.version(), 1);
    }

    #[test]
    fn test_insert_multi_line_reports_range() {
        let mut buffer = TextBuffer::from_text("abc\ntail");
        let range = buffer.insert_text(0, 1, "X\nY\nZ");
        assert_eq!(range, Some(LineRange::new(0, 2)));
        assert_eq!(buffer.get_text(), "aX\nY\nZbc\ntail");
        assert_eq!(buffer.line_count(), 4);
    }

    #[test]
    fn test_insert_out_of_range_is_noop() {
        let mut buffer = TextBuffer::from_text("abc");
        assert_eq!(buffer.insert_text(3, 0, "x"), None);
        assert_eq!(buffer.insert_text(0, 4, "x"), None);
        assert_eq!(buffer.insert_text(0, 0, ""), None);
        assert_eq!(buffer.get_text(), "abc");
        assert_eq!(buffer.version(), 0);
    }

    #[test]
    fn test_delete_same_line() {
        let mut buffer = TextBuffer::from_text("Hello Beautiful World");
        assert_eq!(buffer.delete_text(0, 6, 0, 16), Some(LineRange::single(0)));
        assert_eq!(buffer.get_text(), "Hello World");
    }

    #[test]
    fn test_delete_cross_line_merges() {
        let mut buffer = TextBuffer::from_text("first\nsecond\nthird");
        assert_eq!(buffer.delete_text(0, 2, 2, 3), Some(LineRange::single(0)));
        assert_eq!(buffer.get_text(), "fird");
        assert_eq!(buffer.line_count(), 1);
    }

    #[test]
    fn test_delete_out_of_range_is_noop() {
        let mut buffer = TextBuffer::from_text("abc");
        assert_eq!(buffer.delete_text(0, 0, 1, 0), None);
        assert_eq!(buffer.delete_text(0, 1, 0, 1), None);
        assert_eq!(buffer.get_text(), "abc");
    }

    #[test]
    fn test_get_text_range_across_lines() {
        let buffer = TextBuffer::from_text("ABC\nDEF\nGHI");
        assert_eq!(buffer.get_text_range(0, 1, 2, 1), "BC\nDEF\nG");
        assert_eq!(buffer.get_text_range(2, 1, 0, 1), "BC\nDEF\nG");
        assert_eq!(buffer.get_text_range(1, 0, 1, 99), "DEF");
    }

    #[test]
    fn test_utf8_cjk_columns() {
        let mut buffer = TextBuffer::from_text("你好\n世界");
        assert_eq!(buffer.line_len(0), 2);
        buffer.insert_text(1, 1, "的");
        assert_eq!(buffer.get_line(1), "世的界");
        assert_eq!(buffer.position_to_offset(Position::new(1, 1)), 4);
        assert_eq!(buffer.offset_to_position(4), Position::new(1, 1));
    }

    #[test]
    fn test_notifications_fire_line_then_document() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut buffer = TextBuffer::from_text("a\nb");

        let doc_log = Arc::clone(&log);
        buffer.subscribe_document(move || doc_log.lock().unwrap().push("doc".to_string()));
        let line_log = Arc::clone(&log);
        let lines_id = buffer.subscribe_lines(move |range| {
            line_log
                .lock()
                .unwrap()
                .push(format!("{}-{}", range.start, range.end));
        });

        buffer.insert_text(1, 1, "\nc");
        assert_eq!(*log.lock().unwrap(), vec!["1-2", "doc"]);

        buffer.unsubscribe(lines_id);
        buffer.set_text("x");
        assert_eq!(*log.lock().unwrap(), vec!["1-2", "doc", "doc"]);
    }

    #[test]
    fn test_set_text_reports_whole_document() {
        let mut buffer = TextBuffer::from_text("a");
        assert_eq!(buffer.set_text("1\n2\n3"), LineRange::new(0, 2));
        assert_eq!(buffer.line_count(), 3);
    }
}
