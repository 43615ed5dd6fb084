//! Plugin system for language-specific parsing

use crate::rule::Unit;
use crate::source::SourceText;
use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Languages the linter understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Html,
    Css,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Html => write!(f, "html"),
            Language::Css => write!(f, "css"),
        }
    }
}

/// A recoverable structural anomaly found while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub message: String,
    pub span: Span,
}

impl ParseIssue {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A parsed document
pub trait Document: Send + Sync {
    /// Language of the file itself
    fn language(&self) -> Language;

    /// Source text with line index
    fn source(&self) -> &SourceText;

    /// Structural anomalies found while parsing
    fn parse_issues(&self) -> &[ParseIssue];

    /// Visit every unit in document order (depth-first, pre-order)
    fn walk(&self, visit: &mut dyn FnMut(&Unit<'_>));

    /// Lines whose content must be kept verbatim (`<pre>`, `<textarea>`, scripts)
    fn verbatim_lines(&self) -> &BTreeSet<usize>;

    /// Continuation lines of multi-line comments
    fn comment_lines(&self) -> &BTreeSet<usize>;

    /// Raw text of every comment, with its span
    fn comments(&self) -> Vec<(&str, Span)>;
}

/// Plugin trait for language-specific parsing
pub trait Plugin: Send + Sync {
    /// Plugin identifier (e.g., "html", "css")
    fn id(&self) -> &str;

    /// Plugin version
    fn version(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// File extensions this plugin handles (without dot, e.g., "html", "htm")
    fn extensions(&self) -> &[&str];

    /// Language of the files this plugin parses
    fn language(&self) -> Language;

    /// Parse file content into a document. Parsing is tolerant and never fails;
    /// anomalies are reported through [`Document::parse_issues`].
    fn parse(&self, content: &str, path: &Path) -> Box<dyn Document>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;

    #[test]
    fn test_language_display() {
        assert_eq!(Language::Html.to_string(), "html");
        assert_eq!(Language::Css.to_string(), "css");
    }

    #[test]
    fn test_parse_issue_new() {
        let issue = ParseIssue::new("unexpected '}'", Span::empty_at(Position::start()));
        assert_eq!(issue.message, "unexpected '}'");
        assert!(issue.span.is_empty());
    }
}
