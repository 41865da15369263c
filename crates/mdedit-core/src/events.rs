//! Change notifications.
//!
//! Listeners subscribe to one of two notification kinds and receive a [`SubscriptionId`] handle
//! that unsubscribes them deterministically:
//!
//! - **line range changed**: an inclusive [`LineRange`] of lines whose content changed, used for
//!   tokenizer and renderer invalidation;
//! - **document changed**: no payload, for external value bindings.
//!
//! Notifications are dispatched synchronously, line range first, once per mutation.

use std::ops::RangeInclusive;

/// An inclusive range of logical lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRange {
    /// First affected line.
    pub start: usize,
    /// Last affected line (inclusive).
    pub end: usize,
}

impl LineRange {
    /// Create a range covering `start..=end`. The bounds are reordered if reversed.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// A range covering exactly one line.
    pub fn single(line: usize) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    /// Number of lines in the range.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always `false`: a line range covers at least one line.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `line` lies inside the range.
    pub fn contains(&self, line: usize) -> bool {
        (self.start..=self.end).contains(&line)
    }

    /// Iterate over the line indices of the range.
    pub fn lines(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Handle returned by a subscription; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Callback invoked with the inclusive range of changed lines.
pub type LineRangeCallback = Box<dyn FnMut(LineRange) + Send>;

/// Callback invoked after any document change.
pub type DocumentCallback = Box<dyn FnMut() + Send>;

/// Registry of change listeners owned by the buffer.
#[derive(Default)]
pub struct ChangeListeners {
    next_id: u64,
    line_listeners: Vec<(SubscriptionId, LineRangeCallback)>,
    document_listeners: Vec<(SubscriptionId, DocumentCallback)>,
}

impl ChangeListeners {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Register a line-range listener.
    pub fn subscribe_lines<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(LineRange) + Send + 'static,
    {
        let id = self.allocate_id();
        self.line_listeners.push((id, Box::new(callback)));
        id
    }

    /// Register a document-changed listener.
    pub fn subscribe_document<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut() + Send + 'static,
    {
        let id = self.allocate_id();
        self.document_listeners.push((id, Box::new(callback)));
        id
    }

    /// Remove a listener of either kind. Returns `false` for unknown handles.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.line_listeners.len() + self.document_listeners.len();
        self.line_listeners.retain(|(sub, _)| *sub != id);
        self.document_listeners.retain(|(sub, _)| *sub != id);
        before != self.line_listeners.len() + self.document_listeners.len()
    }

    /// Number of registered listeners (both kinds).
    pub fn len(&self) -> usize {
        self.line_listeners.len() + self.document_listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dispatch one mutation: line range listeners first, then document listeners.
    pub fn emit(&mut self, range: LineRange) {
        for (_, callback) in &mut self.line_listeners {
            callback(range);
        }
        for (_, callback) in &mut self.document_listeners {
            callback();
        }
    }
}

impl std::fmt::Debug for ChangeListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeListeners")
            .field("line_listeners", &self.line_listeners.len())
            .field("document_listeners", &self.document_listeners.len())
            .finish()
    }
}
