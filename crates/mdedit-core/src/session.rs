//! One open document: buffer, cursor, selection, history and tokenizer kept in step.
//!
//! Every edit flows through the same path: mutate the buffer, invalidate the tokenizer with the
//! reported line range, record the forward operation in history, then place the cursor. Undo
//! and redo replay history through the buffer and tokenizer without recording anything.

use crate::buffer::{TextBuffer, normalize_line_breaks};
use crate::config::EditorConfig;
use crate::coordinates::visible_range;
use crate::cursor::CursorModel;
use crate::events::{LineRange, SubscriptionId};
use crate::history::{EditKind, HistoryManager, HistoryOperation, Replay, ReplayDirection};
use crate::position::Position;
use crate::selection::{OrderedRange, SelectionModel};
use crate::tokenizer::{IncrementalTokenizer, Token, TokenizeBatch, TokenizeResult};
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

/// Cursor motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// One character left.
    Left,
    /// One character right.
    Right,
    /// One line up.
    Up,
    /// One line down.
    Down,
    /// Start of the line.
    LineStart,
    /// End of the line.
    LineEnd,
    /// Previous word start.
    WordLeft,
    /// Next word end.
    WordRight,
    /// Start of the document.
    DocumentStart,
    /// End of the document.
    DocumentEnd,
}

fn insert_span(
    buffer: &mut TextBuffer,
    tokenizer: &mut IncrementalTokenizer,
    at: Position,
    text: &str,
) -> Option<Position> {
    let range = buffer.insert_text(at.line, at.column, text)?;
    tokenizer.invalidate(range);
    Some(at.advanced_by(text))
}

fn delete_span(
    buffer: &mut TextBuffer,
    tokenizer: &mut IncrementalTokenizer,
    start: Position,
    end: Position,
) -> Option<String> {
    let removed = buffer.get_text_range(start.line, start.column, end.line, end.column);
    let range = buffer.delete_text(start.line, start.column, end.line, end.column)?;
    tokenizer.invalidate(range);
    Some(removed)
}

/// Apply one undo or redo step and return where the cursor belongs.
///
/// Undoing an insert and redoing a delete both remove `text` from its start; the other two
/// cases put it back.
fn replay_edit(
    buffer: &mut TextBuffer,
    tokenizer: &mut IncrementalTokenizer,
    replay: &Replay<'_>,
) -> Position {
    let op = replay.operation();
    let direction = replay.direction();
    let removes = matches!(
        (direction, op.kind),
        (ReplayDirection::Undo, EditKind::Insert) | (ReplayDirection::Redo, EditKind::Delete)
    );
    if removes {
        delete_span(buffer, tokenizer, op.start(), op.end());
    } else {
        insert_span(buffer, tokenizer, op.start(), &op.text);
    }
    tracing::trace!(
        target: "mdedit_core::session",
        ?direction,
        line = op.line,
        column = op.column,
        "replayed history entry"
    );
    match direction {
        ReplayDirection::Undo => op.cursor_before,
        ReplayDirection::Redo => op.cursor_after,
    }
}

/// An editing session over one document.
#[derive(Debug)]
pub struct EditorSession {
    config: EditorConfig,
    buffer: TextBuffer,
    cursor: CursorModel,
    selection: SelectionModel,
    history: HistoryManager,
    tokenizer: IncrementalTokenizer,
}

impl EditorSession {
    /// An empty document.
    pub fn new(config: EditorConfig) -> Self {
        Self::from_text("", config)
    }

    /// A document holding `text`.
    pub fn from_text(text: &str, config: EditorConfig) -> Self {
        Self {
            buffer: TextBuffer::from_text(text),
            cursor: CursorModel::new(),
            selection: SelectionModel::new(),
            history: HistoryManager::new(config.history_max_size, config.coalesce_window()),
            tokenizer: IncrementalTokenizer::new(
                config.tokenizer_options(),
                config.cache_capacity,
                config.eviction_policy,
            ),
            config,
        }
    }

    /// Configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// The cursor.
    pub fn cursor(&self) -> &CursorModel {
        &self.cursor
    }

    /// The selection.
    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    /// The history.
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// The tokenizer.
    pub fn tokenizer(&self) -> &IncrementalTokenizer {
        &self.tokenizer
    }

    /// Whole document.
    pub fn text(&self) -> String {
        self.buffer.get_text()
    }

    /// Cursor position.
    pub fn cursor_position(&self) -> Position {
        self.cursor.position()
    }

    /// Document version.
    pub fn version(&self) -> u64 {
        self.buffer.version()
    }

    /// Subscribe to line-range-changed notifications.
    pub fn subscribe_lines<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(LineRange) + Send + 'static,
    {
        self.buffer.subscribe_lines(callback)
    }

    /// Subscribe to document-changed notifications.
    pub fn subscribe_document<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut() + Send + 'static,
    {
        self.buffer.subscribe_document(callback)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.buffer.unsubscribe(id)
    }

    // ---------------------------------------------------------------- edits

    /// Type `text` at the cursor, replacing the selection if there is one.
    pub fn insert_text(&mut self, text: &str) -> bool {
        self.insert_text_at_time(text, Instant::now())
    }

    /// [`insert_text`](Self::insert_text) with an explicit edit time.
    pub fn insert_text_at_time(&mut self, text: &str, at: Instant) -> bool {
        let replaced = self.delete_selection_at_time(at);
        let text = normalize_line_breaks(text);
        let start = self.cursor.position();
        let Some(end) = insert_span(&mut self.buffer, &mut self.tokenizer, start, &text) else {
            return replaced;
        };
        self.history
            .record(HistoryOperation::insert(start, text.into_owned(), start, end, at));
        self.place_cursor(end);
        true
    }

    /// Backspace: delete the selection, or the character before the cursor (joining lines at
    /// column 0).
    pub fn delete_backward(&mut self) -> bool {
        self.delete_backward_at_time(Instant::now())
    }

    /// [`delete_backward`](Self::delete_backward) with an explicit edit time.
    pub fn delete_backward_at_time(&mut self, at: Instant) -> bool {
        if self.delete_selection_at_time(at) {
            return true;
        }
        let cursor = self.cursor.position();
        let start = if cursor.column > 0 {
            Position::new(cursor.line, cursor.column - 1)
        } else if cursor.line > 0 {
            Position::new(cursor.line - 1, self.buffer.line_len(cursor.line - 1))
        } else {
            return false;
        };
        self.delete_recorded(start, cursor, cursor, start, at)
    }

    /// Delete: remove the selection, or the character after the cursor (joining lines at the
    /// line end).
    pub fn delete_forward(&mut self) -> bool {
        self.delete_forward_at_time(Instant::now())
    }

    /// [`delete_forward`](Self::delete_forward) with an explicit edit time.
    pub fn delete_forward_at_time(&mut self, at: Instant) -> bool {
        if self.delete_selection_at_time(at) {
            return true;
        }
        let cursor = self.cursor.position();
        let end = if cursor.column < self.buffer.line_len(cursor.line) {
            Position::new(cursor.line, cursor.column + 1)
        } else if cursor.line + 1 < self.buffer.line_count() {
            Position::new(cursor.line + 1, 0)
        } else {
            return false;
        };
        self.delete_recorded(cursor, end, cursor, cursor, at)
    }

    /// Insert `text` at `pos` regardless of the cursor; the cursor moves after the text.
    ///
    /// Invalid positions are a no-op and return `None`.
    pub fn insert_at(&mut self, pos: Position, text: &str) -> Option<LineRange> {
        let text = normalize_line_breaks(text);
        let before = self.cursor.position();
        let range = self.buffer.insert_text(pos.line, pos.column, &text)?;
        self.tokenizer.invalidate(range);
        let end = pos.advanced_by(&text);
        self.history.record(HistoryOperation::insert(
            pos,
            text.into_owned(),
            before,
            end,
            Instant::now(),
        ));
        self.place_cursor(end);
        Some(range)
    }

    /// Delete between two positions (either order); the cursor moves to the start.
    ///
    /// Returns the removed text, or `None` for invalid or empty ranges.
    pub fn delete_range(&mut self, a: Position, b: Position) -> Option<String> {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        let before = self.cursor.position();
        let removed = delete_span(&mut self.buffer, &mut self.tokenizer, start, end)?;
        self.history.record(HistoryOperation::delete(
            start,
            removed.clone(),
            before,
            start,
            Instant::now(),
        ));
        self.place_cursor(start);
        Some(removed)
    }

    /// Replace the whole document. History and token caches are dropped.
    pub fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.tokenizer.clear_cache();
        self.history.clear();
        self.place_cursor(Position::default());
    }

    fn delete_selection_at_time(&mut self, at: Instant) -> bool {
        if !self.selection.has_selection() {
            return false;
        }
        let OrderedRange { start, end } = self.selection.clamped_range(&self.buffer);
        let before = self.cursor.position();
        self.delete_recorded(start, end, before, start, at)
    }

    fn delete_recorded(
        &mut self,
        start: Position,
        end: Position,
        cursor_before: Position,
        cursor_after: Position,
        at: Instant,
    ) -> bool {
        let Some(removed) = delete_span(&mut self.buffer, &mut self.tokenizer, start, end) else {
            return false;
        };
        self.history.record(HistoryOperation::delete(
            start,
            removed,
            cursor_before,
            cursor_after,
            at,
        ));
        self.place_cursor(cursor_after);
        true
    }

    fn place_cursor(&mut self, pos: Position) {
        self.cursor.set_position(&self.buffer, pos);
        self.selection.collapse_to(self.cursor.position());
    }

    // -------------------------------------------------------------- history

    /// Revert the newest history entry. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(replay) = self.history.undo() else {
            return false;
        };
        let cursor = replay_edit(&mut self.buffer, &mut self.tokenizer, &replay);
        self.place_cursor(cursor);
        true
    }

    /// Re-apply the newest undone entry. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(replay) = self.history.redo() else {
            return false;
        };
        let cursor = replay_edit(&mut self.buffer, &mut self.tokenizer, &replay);
        self.place_cursor(cursor);
        true
    }

    // ------------------------------------------------------------- movement

    /// Move the cursor; with `extend` the selection grows from its anchor instead of
    /// collapsing.
    pub fn move_cursor(&mut self, motion: Motion, extend: bool) {
        let before = self.cursor.position();
        let buffer = &self.buffer;
        let cursor = &mut self.cursor;
        match motion {
            Motion::Left => cursor.move_left(buffer),
            Motion::Right => cursor.move_right(buffer),
            Motion::Up => cursor.move_up(buffer),
            Motion::Down => cursor.move_down(buffer),
            Motion::LineStart => cursor.move_to_line_start(buffer),
            Motion::LineEnd => cursor.move_to_line_end(buffer),
            Motion::WordLeft => cursor.move_word_left(buffer),
            Motion::WordRight => cursor.move_word_right(buffer),
            Motion::DocumentStart => cursor.move_to_document_start(),
            Motion::DocumentEnd => cursor.move_to_document_end(buffer),
        }
        self.follow_cursor(before, extend);
    }

    /// Put the cursor at `pos` (clamped), optionally extending the selection.
    pub fn set_cursor(&mut self, pos: Position, extend: bool) {
        let before = self.cursor.position();
        self.cursor.set_position(&self.buffer, pos);
        self.follow_cursor(before, extend);
    }

    fn follow_cursor(&mut self, before: Position, extend: bool) {
        let after = self.cursor.position();
        if extend {
            if !self.selection.has_selection() {
                self.selection.collapse_to(before);
            }
            self.selection.extend(after.line, after.column);
        } else {
            self.selection.collapse_to(after);
        }
    }

    /// Select the whole document; the cursor moves to its end.
    pub fn select_all(&mut self) {
        self.selection.select_all(&self.buffer);
        self.cursor.set_position(&self.buffer, self.selection.focus());
    }

    /// Select `line` including its line break; the cursor moves to the selection end.
    pub fn select_line(&mut self, line: usize) {
        self.selection.select_line(&self.buffer, line);
        self.cursor.set_position(&self.buffer, self.selection.focus());
    }

    /// Currently selected text.
    pub fn selected_text(&self) -> String {
        self.selection.selected_text(&self.buffer)
    }

    // ------------------------------------------------------------ rendering

    /// Tokens of the lines intersecting a viewport, parsed synchronously.
    pub fn visible_tokens(
        &mut self,
        scroll_top: f32,
        viewport_height: f32,
        line_height: f32,
    ) -> Vec<(usize, Arc<[Token]>)> {
        let visible = visible_range(
            scroll_top,
            viewport_height,
            line_height,
            self.buffer.line_count(),
        );
        visible
            .lines()
            .map(|line| (line, self.tokenizer.tokenize_line(&self.buffer, line)))
            .collect()
    }

    /// Tokens of one line.
    pub fn line_tokens(&mut self, line: usize) -> Arc<[Token]> {
        self.tokenizer.tokenize_line(&self.buffer, line)
    }

    /// End of a render pass: dirty lines have been reparsed.
    pub fn finish_render_pass(&mut self) {
        self.tokenizer.clear_dirty_marks();
    }

    /// Batch of `range` for off-thread tokenization.
    pub fn background_batch(&mut self, range: Range<usize>) -> TokenizeBatch {
        self.tokenizer.background_batch(&self.buffer, range)
    }

    /// Merge a background result; stale results are dropped and `false` returned.
    pub fn apply_background_result(&mut self, result: TokenizeResult) -> bool {
        self.tokenizer
            .apply_background_result(result, self.buffer.version())
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
