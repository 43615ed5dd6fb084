//! Output formatters for lint results

mod compact;
mod json;
mod text;

pub use compact::CompactFormatter;
pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::diagnostic::Diagnostic;
use crate::engine::LintResult;

/// Output formatter trait
pub trait OutputFormatter: Send + Sync {
    /// Format the entire lint result
    fn format(&self, result: &LintResult) -> String;

    /// Format a single diagnostic
    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String;
}

/// Characters to underline on the diagnostic's first line
pub(crate) fn highlight_width(diag: &Diagnostic) -> usize {
    let span = diag.location.span;
    let width = if span.end.line == span.start.line {
        span.end.column.saturating_sub(span.start.column)
    } else {
        diag.source_line
            .as_deref()
            .map(|line| line.chars().count().saturating_sub(span.start.column - 1))
            .unwrap_or(1)
    };
    width.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Location, Severity};
    use crate::span::{Position, Span};

    #[test]
    fn test_highlight_width() {
        let single = Diagnostic::new(
            "r",
            Severity::Warning,
            "m",
            Location::new("a.css", Span::covering(Position::new(4, 1, 5), "0px")),
        );
        assert_eq!(highlight_width(&single), 3);

        let multi = Diagnostic::new(
            "r",
            Severity::Warning,
            "m",
            Location::new("a.css", Span::covering(Position::new(2, 1, 3), "abc\ndef")),
        )
        .with_source_line("a abc");
        assert_eq!(highlight_width(&multi), 3);

        let empty = Diagnostic::new(
            "r",
            Severity::Warning,
            "m",
            Location::new("a.css", Span::empty_at(Position::start())),
        );
        assert_eq!(highlight_width(&empty), 1);
    }
}
