//! Source text with a line index

use crate::span::{Position, Span};

/// The text of one file plus the byte offsets where each line begins
#[derive(Debug, Clone)]
pub struct SourceText {
    text: String,
    line_starts: Vec<usize>,
}

impl SourceText {
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            text: text.to_string(),
            line_starts,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of lines (a trailing newline does not open a new line)
    pub fn line_count(&self) -> usize {
        if self.text.ends_with('\n') {
            self.line_starts.len() - 1
        } else {
            self.line_starts.len()
        }
    }

    /// Get line content (1-based) without the line terminator
    pub fn line(&self, line: usize) -> Option<&str> {
        if line == 0 || line > self.line_count() {
            return None;
        }
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        let raw = self.text.get(start..end)?;
        Some(raw.strip_suffix('\r').unwrap_or(raw))
    }

    /// Position of the first character of a line (1-based)
    pub fn line_start(&self, line: usize) -> Option<Position> {
        if line == 0 {
            return None;
        }
        self.line_starts
            .get(line - 1)
            .map(|&offset| Position::new(offset, line, 1))
    }

    /// Iterate over `(line number, content)` pairs
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        (1..=self.line_count()).filter_map(move |n| self.line(n).map(|l| (n, l)))
    }

    /// Text covered by a span, or an empty string if the span is out of range
    pub fn slice(&self, span: Span) -> &str {
        self.text
            .get(span.start.offset..span.end.offset)
            .unwrap_or("")
    }

    /// Position just past the last character
    pub fn end(&self) -> Position {
        let line = self.line_starts.len();
        let start = self.line_starts[line - 1];
        Position::new(start, line, 1).advanced(&self.text[start..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_strip_terminators() {
        let src = SourceText::new("a  \r\nb\n");
        assert_eq!(src.line_count(), 2);
        assert_eq!(src.line(1), Some("a  "));
        assert_eq!(src.line(2), Some("b"));
        assert_eq!(src.line(3), None);
    }

    #[test]
    fn test_line_start_and_end() {
        let src = SourceText::new("ab\ncdé");
        assert_eq!(src.line_start(2), Some(Position::new(3, 2, 1)));
        let end = src.end();
        assert_eq!(end.line, 2);
        assert_eq!(end.column, 4);
        assert_eq!(end.offset, src.as_str().len());
    }

    #[test]
    fn test_slice() {
        let src = SourceText::new("hello world");
        let span = Span::covering(Position::new(6, 1, 7), "world");
        assert_eq!(src.slice(span), "world");
    }

    #[test]
    fn test_empty_source() {
        let src = SourceText::new("");
        assert_eq!(src.line_count(), 1);
        assert_eq!(src.line(1), Some(""));
        assert_eq!(src.end(), Position::start());
    }
}
