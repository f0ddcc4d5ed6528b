//! Source location tracking for error reporting and debugging.
//!
//! - `Span` - byte range with a cached 1-based line number
//! - `LineIndex` - line start table used to fill in that line number
//!
//! # Examples
//!
//! ```
//! # use wgsl_ast::span::*;
//! let index = LineIndex::new("let x = 1;\nlet y = 2;");
//! let span = index.span(11, 21);
//! assert_eq!(span.line, 2);
//! ```

use serde::{Deserialize, Serialize};

/// Compact source location reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of start position
    pub start: u32,
    /// Byte offset of end position (exclusive)
    pub end: u32,
    /// Cached line number (1-based) for the start position
    pub line: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start: u32, end: u32, line: u32) -> Self {
        Self { start, end, line }
    }

    /// Check if this span is zero-length.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans (returns span covering both).
    pub fn merge(&self, other: &Span) -> Span {
        let (line, start) = if self.start <= other.start {
            (self.line, self.start)
        } else {
            (other.line, other.start)
        };
        Span {
            start,
            end: self.end.max(other.end),
            line,
        }
    }
}

/// Byte offsets of each line start in a source string.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self { line_starts }
    }

    /// 1-based line containing `offset`.
    pub fn line_of(&self, offset: u32) -> u32 {
        match self.line_starts.binary_search(&offset) {
            Ok(i) => i as u32 + 1,
            Err(i) => i as u32,
        }
    }

    /// Build a span for a byte range, resolving its line.
    pub fn span(&self, start: u32, end: u32) -> Span {
        Span::new(start, end, self.line_of(start))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_of() {
        let index = LineIndex::new("a\nbb\n\nccc");
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(1), 1);
        assert_eq!(index.line_of(2), 2);
        assert_eq!(index.line_of(5), 3);
        assert_eq!(index.line_of(6), 4);
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn test_merge_keeps_earliest_line() {
        let a = Span::new(10, 12, 2);
        let b = Span::new(0, 4, 1);
        let merged = a.merge(&b);
        assert_eq!(merged, Span::new(0, 12, 1));
    }
}
