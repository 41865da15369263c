//! Logical document coordinates.

use std::cmp::Ordering;

/// Position coordinates (line and column numbers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Zero-based logical line index.
    pub line: usize,
    /// Zero-based column in characters within the logical line.
    pub column: usize,
}

impl Position {
    /// Create a new logical position.
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Position reached after inserting `text` at `self`.
    ///
    /// Accounts for embedded `\n`: each break moves to the next line and the column restarts at
    /// the length of the last segment.
    pub fn advanced_by(self, text: &str) -> Self {
        match text.rfind('\n') {
            None => Self::new(self.line, self.column + text.chars().count()),
            Some(last_break) => {
                let breaks = text.matches('\n').count();
                let tail = text[last_break + 1..].chars().count();
                Self::new(self.line + breaks, tail)
            }
        }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<(usize, usize)> for Position {
    fn from((line, column): (usize, usize)) -> Self {
        Self::new(line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_lexicographic() {
        assert!(Position::new(0, 9) < Position::new(1, 0));
        assert!(Position::new(2, 3) < Position::new(2, 4));
        assert_eq!(
            Position::new(1, 1).cmp(&Position::new(1, 1)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_advanced_by_single_line() {
        assert_eq!(Position::new(3, 2).advanced_by("abc"), Position::new(3, 5));
        assert_eq!(Position::new(0, 1).advanced_by("你好"), Position::new(0, 3));
    }

    #[test]
    fn test_advanced_by_multi_line() {
        assert_eq!(Position::new(1, 4).advanced_by("x\ny\nzz"), Position::new(3, 2));
        assert_eq!(Position::new(0, 4).advanced_by("\n"), Position::new(1, 0));
    }
}
