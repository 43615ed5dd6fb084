//! Source positions and spans
//!
//! A `Position` carries the byte offset together with the 1-based line and
//! column. Columns count Unicode scalar values, not bytes, so multi-byte
//! characters advance the column by one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location inside a source file
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Position {
    /// Byte offset from the start of the file
    pub offset: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, in characters)
    pub column: usize,
}

impl Position {
    /// Position of the first character of a file
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Move past a single character
    pub fn advance(&mut self, ch: char) {
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Return the position reached after consuming `text`
    pub fn advanced(mut self, text: &str) -> Self {
        for ch in text.chars() {
            self.advance(ch);
        }
        self
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open range `[start, end)` in a source file
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `pos`
    pub fn empty_at(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Span covering `text` starting at `start`
    pub fn covering(start: Position, text: &str) -> Self {
        Self {
            start,
            end: start.advanced(text),
        }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span containing both `self` and `other`
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_counts_characters() {
        let pos = Position::start().advanced("héllo");
        assert_eq!(pos.offset, 6);
        assert_eq!(pos.column, 6);
        assert_eq!(pos.line, 1);
    }

    #[test]
    fn test_advance_over_newline() {
        let pos = Position::start().advanced("ab\ncd");
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 3);
        assert_eq!(pos.offset, 5);
    }

    #[test]
    fn test_span_join_and_contains() {
        let a = Span::covering(Position::start(), "abc");
        let b = Span::covering(a.end, "de");
        let joined = a.to(b);
        assert_eq!(joined.len(), 5);
        assert!(joined.contains(&a));
        assert!(joined.contains(&b));
        assert!(!a.contains(&b));
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(0, 3, 7).to_string(), "3:7");
    }
}
