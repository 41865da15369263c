//! Undo/redo history.
//!
//! Two bounded stacks of forward edit operations. The manager never touches the buffer: `undo`
//! and `redo` hand the affected operation to the caller inside a [`Replay`] guard, and the caller
//! applies the inverse (or forward) edit itself.
//!
//! While a [`Replay`] is alive it mutably borrows the manager, so nothing can be recorded during
//! a replay. Dropping the guard ends the replay on every exit path.
//!
//! Consecutive single-line edits are coalesced into one entry when they arrive within the
//! coalescing window and continue each other:
//!
//! - inserts merge when the new insert starts exactly where the previous one ended;
//! - deletes merge when the new deleted span ends exactly where the previous one started
//!   (a chain of Backspaces).

use crate::position::Position;
use std::marker::PhantomData;
use std::ops::Deref;
use std::time::{Duration, Instant};

/// Default maximum number of entries per stack.
pub const DEFAULT_MAX_HISTORY: usize = 1000;

/// Default coalescing window.
pub const DEFAULT_COALESCE_WINDOW: Duration = Duration::from_millis(300);

/// Direction of a recorded edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// `text` was inserted at (`line`, `column`).
    Insert,
    /// `text` was deleted starting at (`line`, `column`).
    Delete,
}

/// The forward effect of one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryOperation {
    /// Insert or delete.
    pub kind: EditKind,
    /// Line where the edit starts.
    pub line: usize,
    /// Column where the edit starts.
    pub column: usize,
    /// Inserted or deleted text (may contain `\n`).
    pub text: String,
    /// Cursor before the edit.
    pub cursor_before: Position,
    /// Cursor after the edit.
    pub cursor_after: Position,
    /// When the edit happened (last merge time for coalesced entries).
    pub at: Instant,
}

impl HistoryOperation {
    /// An insert of `text` at `start`.
    pub fn insert(
        start: Position,
        text: impl Into<String>,
        cursor_before: Position,
        cursor_after: Position,
        at: Instant,
    ) -> Self {
        Self {
            kind: EditKind::Insert,
            line: start.line,
            column: start.column,
            text: text.into(),
            cursor_before,
            cursor_after,
            at,
        }
    }

    /// A deletion of `text` that started at `start`.
    pub fn delete(
        start: Position,
        text: impl Into<String>,
        cursor_before: Position,
        cursor_after: Position,
        at: Instant,
    ) -> Self {
        Self {
            kind: EditKind::Delete,
            ..Self::insert(start, text, cursor_before, cursor_after, at)
        }
    }

    /// Start of the affected span.
    pub fn start(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// End of the span covered by `text` once it is present in the buffer.
    pub fn end(&self) -> Position {
        self.start().advanced_by(&self.text)
    }

    /// Whether `text` spans several lines.
    pub fn is_multi_line(&self) -> bool {
        self.text.contains('\n')
    }

    fn continues(&self, next: &HistoryOperation, window: Duration) -> bool {
        if self.kind != next.kind
            || self.is_multi_line()
            || next.is_multi_line()
            || self.line != next.line
            || next.at.saturating_duration_since(self.at) > window
        {
            return false;
        }
        match self.kind {
            EditKind::Insert => next.column == self.column + self.text.chars().count(),
            EditKind::Delete => next.column + next.text.chars().count() == self.column,
        }
    }

    fn absorb(&mut self, next: HistoryOperation) {
        match self.kind {
            EditKind::Insert => self.text.push_str(&next.text),
            EditKind::Delete => {
                let mut text = next.text;
                text.push_str(&self.text);
                self.text = text;
                self.column = next.column;
            }
        }
        self.cursor_after = next.cursor_after;
        self.at = next.at;
    }
}

/// What [`HistoryManager::record`] did with an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new undo entry was pushed.
    Pushed,
    /// The operation was merged into the top undo entry.
    Merged,
    /// Empty operations are not recorded.
    Ignored,
}

/// Which stack a [`Replay`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayDirection {
    /// The caller must apply the inverse of the operation.
    Undo,
    /// The caller must re-apply the operation.
    Redo,
}

/// An in-progress undo or redo.
///
/// Dereferences to the [`HistoryOperation`] being replayed.
#[derive(Debug)]
pub struct Replay<'a> {
    _guard: PhantomData<&'a mut HistoryManager>,
    direction: ReplayDirection,
    operation: HistoryOperation,
}

impl Replay<'_> {
    /// Undo or redo.
    pub fn direction(&self) -> ReplayDirection {
        self.direction
    }

    /// The recorded forward operation.
    pub fn operation(&self) -> &HistoryOperation {
        &self.operation
    }
}

impl Deref for Replay<'_> {
    type Target = HistoryOperation;

    fn deref(&self) -> &Self::Target {
        &self.operation
    }
}

/// Bounded undo/redo stacks with time-windowed coalescing.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo_stack: Vec<HistoryOperation>,
    redo_stack: Vec<HistoryOperation>,
    max_size: usize,
    coalesce_window: Duration,
}

impl HistoryManager {
    /// Create a manager with explicit bounds.
    pub fn new(max_size: usize, coalesce_window: Duration) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size: max_size.max(1),
            coalesce_window,
        }
    }

    /// Maximum entries per stack.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Coalescing window.
    pub fn coalesce_window(&self) -> Duration {
        self.coalesce_window
    }

    /// Can undo
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Can redo
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Top of the undo stack.
    pub fn peek_undo(&self) -> Option<&HistoryOperation> {
        self.undo_stack.last()
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Record a forward edit.
    ///
    /// Merges into the top entry when the coalescing rules allow it, otherwise pushes a new
    /// entry. Either way the redo stack is discarded.
    pub fn record(&mut self, op: HistoryOperation) -> RecordOutcome {
        if op.text.is_empty() {
            return RecordOutcome::Ignored;
        }

        // An undo in between is a hard boundary: never merge across it.
        let after_undo = !self.redo_stack.is_empty();
        self.redo_stack.clear();

        if !after_undo
            && let Some(top) = self.undo_stack.last_mut()
            && top.continues(&op, self.coalesce_window)
        {
            top.absorb(op);
            tracing::trace!(
                target: "mdedit_core::history",
                line = top.line,
                column = top.column,
                len = top.text.len(),
                "coalesced edit"
            );
            return RecordOutcome::Merged;
        }

        if self.undo_stack.len() >= self.max_size {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(op);
        RecordOutcome::Pushed
    }

    /// Move the newest undo entry to the redo stack and hand it out for inversion.
    ///
    /// Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Replay<'_>> {
        let operation = self.undo_stack.pop()?;
        if self.redo_stack.len() >= self.max_size {
            self.redo_stack.remove(0);
        }
        self.redo_stack.push(operation.clone());
        Some(Replay {
            _guard: PhantomData,
            direction: ReplayDirection::Undo,
            operation,
        })
    }

    /// Move the newest redo entry back to the undo stack and hand it out for re-application.
    ///
    /// Returns `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<Replay<'_>> {
        let operation = self.redo_stack.pop()?;
        if self.undo_stack.len() >= self.max_size {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(operation.clone());
        Some(Replay {
            _guard: PhantomData,
            direction: ReplayDirection::Redo,
            operation,
        })
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY, DEFAULT_COALESCE_WINDOW)
    }
}
