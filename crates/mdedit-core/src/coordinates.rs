//! Mapping between text positions and pixel coordinates.
//!
//! The mapper knows nothing about fonts. Widths come from a [`TextMeasure`] supplied by the
//! presentation layer; it must be monotonic (a longer prefix is never narrower) and return the
//! same width for the same input. [`MonospaceMeasure`] is a cell-based measure using UAX #11
//! widths.

use crate::buffer::TextBuffer;
use crate::position::Position;
use std::ops::Range;
use unicode_width::UnicodeWidthChar;

/// Width of a text run in pixels.
pub trait TextMeasure {
    /// Width of `text`.
    fn width(&self, text: &str) -> f32;
}

impl<F> TextMeasure for F
where
    F: Fn(&str) -> f32,
{
    fn width(&self, text: &str) -> f32 {
        self(text)
    }
}

/// Default tab width in cells.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Cell width of a character (UAX #11): 1 for most characters, 2 for wide ones, 0 for combining
/// marks. Control characters count as 1.
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(1)
}

/// Cell width of `ch` when it starts at `cell_offset`; tabs advance to the next tab stop.
pub fn cell_width_at(ch: char, cell_offset: usize, tab_width: usize) -> usize {
    if ch == '\t' {
        let tab_width = tab_width.max(1);
        tab_width - cell_offset % tab_width
    } else {
        char_width(ch)
    }
}

/// Fixed-pitch measure: cells times `cell_width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasure {
    /// Pixels per cell.
    pub cell_width: f32,
    /// Tab stop interval in cells.
    pub tab_width: usize,
}

impl MonospaceMeasure {
    /// Create a measure.
    pub fn new(cell_width: f32, tab_width: usize) -> Self {
        Self {
            cell_width,
            tab_width: tab_width.max(1),
        }
    }

    /// Number of cells `text` occupies from the start of a line.
    pub fn cells(&self, text: &str) -> usize {
        text.chars().fold(0usize, |x, ch| {
            x.saturating_add(cell_width_at(ch, x, self.tab_width))
        })
    }
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self::new(1.0, DEFAULT_TAB_WIDTH)
    }
}

impl TextMeasure for MonospaceMeasure {
    fn width(&self, text: &str) -> f32 {
        self.cells(text) as f32 * self.cell_width
    }
}

/// A point in document space, relative to the top-left of line 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal offset in pixels.
    pub x: f32,
    /// Vertical offset in pixels.
    pub y: f32,
}

/// Lines `[start, end)` that intersect a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibleRange {
    /// First visible line.
    pub start: usize,
    /// One past the last visible line.
    pub end: usize,
}

impl VisibleRange {
    /// As a `Range`.
    pub fn lines(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether no line is visible.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// `[floor(scroll_top / line_height), ceil((scroll_top + viewport_height) / line_height)]`,
/// clamped to `[0, line_count]`.
pub fn visible_range(
    scroll_top: f32,
    viewport_height: f32,
    line_height: f32,
    line_count: usize,
) -> VisibleRange {
    if line_height.is_nan()
        || line_height <= 0.0
        || !scroll_top.is_finite()
        || !viewport_height.is_finite()
    {
        return VisibleRange::default();
    }
    // Float to int casts saturate: negatives become 0.
    let start = (scroll_top / line_height).floor() as usize;
    let end = ((scroll_top + viewport_height) / line_height).ceil() as usize;
    let end = end.min(line_count);
    VisibleRange {
        start: start.min(end),
        end,
    }
}

/// Converts between (line, column) and (x, y).
#[derive(Debug, Clone)]
pub struct CoordinateMapper<M> {
    measure: M,
    line_height: f32,
}

impl<M: TextMeasure> CoordinateMapper<M> {
    /// Create a mapper with a fixed line height.
    pub fn new(measure: M, line_height: f32) -> Self {
        Self {
            measure,
            line_height,
        }
    }

    /// The measurement capability.
    pub fn measure(&self) -> &M {
        &self.measure
    }

    /// Line height in pixels.
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Change the line height.
    pub fn set_line_height(&mut self, line_height: f32) {
        self.line_height = line_height;
    }

    /// Width of the first `column` characters of `line_text`.
    pub fn column_to_x(&self, line_text: &str, column: usize) -> f32 {
        if column == 0 {
            return 0.0;
        }
        let end = line_text
            .char_indices()
            .nth(column)
            .map_or(line_text.len(), |(offset, _)| offset);
        self.measure.width(&line_text[..end])
    }

    /// Column whose left edge is nearest to `x`. Exact ties snap to the lower column.
    pub fn x_to_column(&self, line_text: &str, x: f32) -> usize {
        let len = line_text.chars().count();
        if len == 0 || x.is_nan() || x <= 0.0 {
            return 0;
        }

        // Largest column whose prefix width is <= x.
        let (mut lo, mut hi) = (0, len);
        while lo < hi {
            let mid = (lo + hi).div_ceil(2);
            if self.column_to_x(line_text, mid) <= x {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        if lo == len {
            return len;
        }

        let left = x - self.column_to_x(line_text, lo);
        let right = self.column_to_x(line_text, lo + 1) - x;
        if right < left { lo + 1 } else { lo }
    }

    /// Visible lines for a viewport, using this mapper's line height.
    pub fn visible_range(
        &self,
        scroll_top: f32,
        viewport_height: f32,
        line_count: usize,
    ) -> VisibleRange {
        visible_range(scroll_top, viewport_height, self.line_height, line_count)
    }

    /// Top-left corner of the character at `pos` (clamped).
    pub fn position_to_point(&self, buffer: &TextBuffer, pos: Position) -> Point {
        let pos = buffer.clamp_position(pos);
        Point {
            x: self.column_to_x(&buffer.get_line(pos.line), pos.column),
            y: pos.line as f32 * self.line_height,
        }
    }

    /// Nearest position to `point`; points outside the document clamp to its edges.
    pub fn point_to_position(&self, buffer: &TextBuffer, point: Point) -> Position {
        let last_line = buffer.line_count().saturating_sub(1);
        let line = if self.line_height > 0.0 && point.y > 0.0 {
            ((point.y / self.line_height).floor() as usize).min(last_line)
        } else {
            0
        };
        let column = self.x_to_column(&buffer.get_line(line), point.x);
        Position::new(line, column)
    }
}
