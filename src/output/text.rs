//! Human-readable text output formatter

use super::{highlight_width, OutputFormatter};
use crate::diagnostic::{Diagnostic, Severity};
use crate::engine::LintResult;
use colored::*;

/// Text formatter with optional color support
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,

    /// Show source context
    pub show_source: bool,

    /// Show help text
    pub show_help: bool,

    /// Show fix suggestions
    pub show_fixes: bool,

    /// Show statistics
    pub show_stats: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            show_source: true,
            show_help: true,
            show_fixes: true,
            show_stats: true,
        }
    }
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn severity_str(&self, severity: Severity) -> ColoredString {
        let s = severity.to_string();
        if !self.colored {
            return s.normal();
        }
        match severity {
            Severity::Error => s.red().bold(),
            Severity::Warning => s.yellow().bold(),
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.colored {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn count(&self, n: usize, noun: &str, color: Color) -> String {
        let s = format!("{} {}{}", n, noun, if n == 1 { "" } else { "s" });
        self.paint(&s, color)
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &LintResult) -> String {
        let mut output = String::new();

        // Diagnostics are already sorted by file
        let mut current = None;
        for diag in &result.diagnostics {
            let file = &diag.location.file;
            if current != Some(file) {
                if current.is_some() {
                    output.push('\n');
                }
                let name = file.display().to_string();
                if self.colored {
                    output.push_str(&format!("{}\n", name.underline()));
                } else {
                    output.push_str(&format!("{}\n", name));
                }
                current = Some(file);
            }
            output.push_str(&self.format_diagnostic(diag));
        }
        if current.is_some() {
            output.push('\n');
        }

        for failure in &result.failures {
            output.push_str(&format!(
                "{}: {}\n",
                self.paint("failure", Color::Red),
                failure.error
            ));
        }

        if self.show_stats {
            let summary = &result.summary;
            output.push_str(&format!(
                "\n{} {} processed",
                summary.files_processed,
                if summary.files_processed == 1 {
                    "file"
                } else {
                    "files"
                }
            ));

            let mut counts = Vec::new();
            if summary.error_count > 0 {
                counts.push(self.count(summary.error_count, "error", Color::Red));
            }
            if summary.warning_count > 0 {
                counts.push(self.count(summary.warning_count, "warning", Color::Yellow));
            }
            if summary.failure_count > 0 {
                counts.push(self.count(summary.failure_count, "failure", Color::Red));
            }
            if !counts.is_empty() {
                output.push_str(&format!(": {}", counts.join(", ")));
            }
            output.push('\n');

            output.push_str(&format!(
                "Finished in {:.2}s\n",
                result.duration.as_secs_f64()
            ));
        }

        output
    }

    fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        let mut output = String::new();
        let bar = self.paint("|", Color::Blue);

        output.push_str(&format!(
            "{}:{}:{}: {}[{}]: {}\n",
            diag.location.file.display(),
            diag.line(),
            diag.column(),
            self.severity_str(diag.severity),
            self.paint(&diag.rule_id, Color::Cyan),
            diag.message
        ));

        if self.show_source {
            if let Some(source) = &diag.source_line {
                let line_num = format!("{:>4}", diag.line());
                output.push_str(&format!("   {}\n", bar));
                output.push_str(&format!(
                    "{} {} {}\n",
                    self.paint(&line_num, Color::Blue),
                    bar,
                    source
                ));

                let padding = " ".repeat(diag.column().saturating_sub(1));
                let underline = "^".repeat(highlight_width(diag));
                output.push_str(&format!(
                    "   {} {}{}\n",
                    bar,
                    padding,
                    self.paint(&underline, Color::Red)
                ));
            }
        }

        if self.show_help {
            if let Some(help) = &diag.help {
                output.push_str(&format!("   {} help: {}\n", self.paint("=", Color::Blue), help));
            }
        }

        if self.show_fixes {
            if let Some(fix) = &diag.fix {
                let replacement = if fix.replacement.is_empty() {
                    "(remove)".to_string()
                } else {
                    fix.replacement.clone()
                };
                output.push_str(&format!(
                    "   {} fix: {} -> {}\n",
                    self.paint("=", Color::Green),
                    fix.description,
                    self.paint(&replacement, Color::Green)
                ));
            }
        }

        for note in &diag.notes {
            output.push_str(&format!("   {} note: {}\n", self.paint("=", Color::Blue), note));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Location;
    use crate::reporter::Summary;
    use crate::span::{Position, Span};

    fn diag(file: &str, line: usize) -> Diagnostic {
        Diagnostic::new(
            "zero-unit",
            Severity::Warning,
            "Omit the unit of '0px'",
            Location::new(file, Span::covering(Position::new(0, line, 8), "0px")),
        )
    }

    #[test]
    fn test_format_diagnostic() {
        let formatter = TextFormatter::new().without_color();
        let diag = diag("style.css", 2)
            .with_source_line("  top: 0px;")
            .with_help("A zero length needs no unit")
            .with_fix("Remove the unit", "0");

        let output = formatter.format_diagnostic(&diag);
        assert!(output.contains("style.css:2:8: warning[zero-unit]: Omit the unit of '0px'"));
        assert!(output.contains("   2 |   top: 0px;"));
        assert!(output.contains("   |        ^^^"));
        assert!(output.contains("= help: A zero length needs no unit"));
        assert!(output.contains("= fix: Remove the unit -> 0"));
    }

    #[test]
    fn test_format_result_groups_files() {
        let formatter = TextFormatter::new().without_color();
        let diagnostics = vec![diag("a.css", 1), diag("a.css", 2), diag("b.css", 1)];
        let result = LintResult {
            summary: Summary::new(2, &diagnostics, 0),
            diagnostics,
            ..Default::default()
        };

        let output = formatter.format(&result);
        assert_eq!(output.lines().filter(|l| *l == "a.css").count(), 1);
        assert_eq!(output.lines().filter(|l| *l == "b.css").count(), 1);
        assert!(output.contains("2 files processed: 3 warnings"));
    }

    #[test]
    fn test_format_clean_result() {
        let formatter = TextFormatter::new().without_color();
        let result = LintResult {
            summary: Summary::new(1, &[], 0),
            ..Default::default()
        };
        let output = formatter.format(&result);
        assert!(output.contains("1 file processed\n"));
        assert!(output.contains("Finished in"));
    }
}
