//! Diagnostic types for linting results

use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reserved rule id for recoverable structural anomalies
pub const PARSE_ERROR: &str = "parse-error";

/// Reserved rule id for a rule predicate that faulted
pub const INTERNAL_RULE_ERROR: &str = "internal-rule-error";

/// Severity level for diagnostics
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Warning - style deviation
    #[default]
    Warning,
    /// Error - definite problem
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warning" | "warn" => Ok(Severity::Warning),
            "error" | "err" => Ok(Severity::Error),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Source code location
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: PathBuf,
    /// Highlighted region
    pub span: Span,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, span: Span) -> Self {
        Self {
            file: file.into(),
            span,
        }
    }

    /// Line number (1-based)
    pub fn line(&self) -> usize {
        self.span.start.line
    }

    /// Column number (1-based)
    pub fn column(&self) -> usize {
        self.span.start.column
    }
}

/// A suggested fix for the diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    /// Description of the fix
    pub description: String,
    /// Text that would replace the highlighted span
    pub replacement: String,
}

impl Fix {
    pub fn new(description: &str, replacement: &str) -> Self {
        Self {
            description: description.to_string(),
            replacement: replacement.to_string(),
        }
    }
}

/// A lint diagnostic (warning or error)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule ID that triggered this diagnostic
    pub rule_id: String,
    /// Severity level
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Source location
    pub location: Location,
    /// The source line (for display)
    pub source_line: Option<String>,
    /// Help text (usually rule description)
    pub help: Option<String>,
    /// Suggested fix
    pub fix: Option<Fix>,
    /// Additional notes
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(rule_id: &str, severity: Severity, message: &str, location: Location) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.to_string(),
            location,
            source_line: None,
            help: None,
            fix: None,
            notes: Vec::new(),
        }
    }

    /// Diagnostic for a recoverable structural anomaly
    pub fn parse_error(file: &Path, span: Span, message: &str) -> Self {
        Self::new(
            PARSE_ERROR,
            Severity::Error,
            message,
            Location::new(file, span),
        )
    }

    /// Add source line for display
    pub fn with_source_line(mut self, line: &str) -> Self {
        self.source_line = Some(line.to_string());
        self
    }

    /// Add help text
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Add a suggested fix
    pub fn with_fix(mut self, description: &str, replacement: &str) -> Self {
        self.fix = Some(Fix::new(description, replacement));
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: &str) -> Self {
        self.notes.push(note.to_string());
        self
    }

    /// Attach a fix to a diagnostic already handed out by an emitter
    pub fn suggest(&mut self, description: &str, replacement: &str) -> &mut Self {
        self.fix = Some(Fix::new(description, replacement));
        self
    }

    /// Check if this diagnostic has a fix
    pub fn has_fix(&self) -> bool {
        self.fix.is_some()
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Line number (1-based)
    pub fn line(&self) -> usize {
        self.location.line()
    }

    /// Column number (1-based)
    pub fn column(&self) -> usize {
        self.location.column()
    }
}
