//! Ordering, de-duplication and counting of diagnostics

use crate::diagnostic::{Diagnostic, Severity};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Sort diagnostics into report order and drop exact duplicates.
///
/// Order is by file, line, column, rule id, then span end and message, so the
/// output is the same however the files were scheduled. Two diagnostics are
/// duplicates when they share file, rule and span.
pub fn report(mut diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    diagnostics.sort_by(|a, b| {
        a.location
            .file
            .cmp(&b.location.file)
            .then_with(|| a.line().cmp(&b.line()))
            .then_with(|| a.column().cmp(&b.column()))
            .then_with(|| a.rule_id.cmp(&b.rule_id))
            .then_with(|| a.location.span.end.offset.cmp(&b.location.span.end.offset))
            .then_with(|| a.message.cmp(&b.message))
    });
    diagnostics.dedup_by(|later, earlier| {
        later.rule_id == earlier.rule_id && later.location == earlier.location
    });
    diagnostics
}

/// Counts over a set of checked files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Files that were parsed and checked
    pub files_processed: usize,
    pub files_with_errors: usize,
    pub files_with_warnings: usize,
    pub error_count: usize,
    pub warning_count: usize,
    /// Files that could not be checked at all
    pub failure_count: usize,
}

impl Summary {
    pub fn new(files_processed: usize, diagnostics: &[Diagnostic], failure_count: usize) -> Self {
        let mut errored: HashSet<&Path> = HashSet::new();
        let mut warned: HashSet<&Path> = HashSet::new();
        let mut summary = Self {
            files_processed,
            failure_count,
            ..Default::default()
        };

        for diag in diagnostics {
            let file = diag.location.file.as_path();
            match diag.severity {
                Severity::Error => {
                    summary.error_count += 1;
                    errored.insert(file);
                }
                Severity::Warning => {
                    summary.warning_count += 1;
                    warned.insert(file);
                }
            }
        }

        summary.files_with_errors = errored.len();
        summary.files_with_warnings = warned.len();
        summary
    }

    pub fn total(&self) -> usize {
        self.error_count + self.warning_count
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0 && self.failure_count == 0
    }

    /// 0 when clean, 1 for warnings only, 2 for errors or unreadable files
    pub fn exit_code(&self) -> i32 {
        if self.error_count > 0 || self.failure_count > 0 {
            2
        } else if self.warning_count > 0 {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Location;
    use crate::span::{Position, Span};
    use pretty_assertions::assert_eq;

    fn diag(file: &str, line: usize, column: usize, rule: &str, severity: Severity) -> Diagnostic {
        let start = Position::new((line - 1) * 10 + column - 1, line, column);
        Diagnostic::new(
            rule,
            severity,
            "msg",
            Location::new(file, Span::covering(start, "x")),
        )
    }

    fn keys(diags: &[Diagnostic]) -> Vec<(String, usize, usize, String)> {
        diags
            .iter()
            .map(|d| {
                (
                    d.location.file.display().to_string(),
                    d.line(),
                    d.column(),
                    d.rule_id.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn test_report_order() {
        let sorted = report(vec![
            diag("b.css", 1, 1, "lowercase", Severity::Warning),
            diag("a.css", 2, 1, "zero-unit", Severity::Warning),
            diag("a.css", 1, 5, "lowercase", Severity::Warning),
            diag("a.css", 1, 5, "important", Severity::Warning),
        ]);
        assert_eq!(
            keys(&sorted),
            vec![
                ("a.css".to_string(), 1, 5, "important".to_string()),
                ("a.css".to_string(), 1, 5, "lowercase".to_string()),
                ("a.css".to_string(), 2, 1, "zero-unit".to_string()),
                ("b.css".to_string(), 1, 1, "lowercase".to_string()),
            ]
        );
    }

    #[test]
    fn test_report_dedups_same_rule_and_span() {
        let sorted = report(vec![
            diag("a.css", 1, 1, "lowercase", Severity::Warning),
            diag("a.css", 1, 1, "lowercase", Severity::Warning),
            diag("a.css", 1, 1, "zero-unit", Severity::Warning),
        ]);
        assert_eq!(sorted.len(), 2);
    }

    #[test]
    fn test_summary_counts() {
        let diags = vec![
            diag("a.css", 1, 1, "parse-error", Severity::Error),
            diag("a.css", 2, 1, "lowercase", Severity::Warning),
            diag("b.css", 1, 1, "lowercase", Severity::Warning),
        ];
        let summary = Summary::new(3, &diags, 0);
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.warning_count, 2);
        assert_eq!(summary.files_with_errors, 1);
        assert_eq!(summary.files_with_warnings, 2);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.exit_code(), 2);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Summary::new(1, &[], 0).exit_code(), 0);
        assert!(Summary::new(1, &[], 0).is_clean());

        let warned = vec![diag("a.css", 1, 1, "lowercase", Severity::Warning)];
        assert_eq!(Summary::new(1, &warned, 0).exit_code(), 1);

        assert_eq!(Summary::new(1, &warned, 1).exit_code(), 2);
        assert!(!Summary::new(0, &[], 1).is_clean());
    }
}
