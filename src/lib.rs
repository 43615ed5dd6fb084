//! Frost - HTML and CSS Style-Guide Linter
//!
//! Checks `.html` and `.css` files against a fixed catalog of formatting and
//! markup conventions: lowercase names, two-space indentation, quoting,
//! protocol-relative URLs, compact CSS values and declaration layout.
//!
//! # Architecture
//!
//! ```text
//! CLI/API -> Engine -> Plugin -> Document -> walk -> Rule -> Diagnostic -> reporter
//! ```
//!
//! Plugins parse tolerantly: malformed input never aborts a check, it yields
//! `parse-error` diagnostics next to the style findings. The contents of
//! `<style>` elements are checked with the CSS rules, at their positions in
//! the host file.
//!
//! # Example
//!
//! ```
//! use frost::{check_file, ResolvedConfig};
//! use std::path::Path;
//!
//! let found = check_file(Path::new("index.html"), "<A HREF=\"#\">Home</A>", &ResolvedConfig::only(&["lowercase"])).unwrap();
//! assert_eq!(found.len(), 2);
//! ```

pub mod catalog;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod output;
pub mod plugin;
pub mod reporter;
pub mod rule;
pub mod rules;
pub mod source;
pub mod span;
pub mod suppress;
pub mod token;

// Re-export main types
pub use catalog::{Catalog, CatalogError};
pub use config::{ConfigError, EngineConfig, ResolvedConfig};
pub use diagnostic::{Diagnostic, Fix, Location, Severity, INTERNAL_RULE_ERROR, PARSE_ERROR};
pub use engine::{CheckError, Engine, FileFailure, LintResult, RuleTiming, SourceInput};
pub use output::{CompactFormatter, JsonFormatter, OutputFormatter, TextFormatter};
pub use plugin::{Document, Language, ParseIssue, Plugin};
pub use reporter::Summary;
pub use rule::{Rule, Target, Unit};
pub use span::{Position, Span};

// Built-in plugins
pub mod plugins {
    pub mod css;
    pub mod html;
}

use std::path::Path;

/// Check one file with the built-in rules and plugins
pub fn check_file(
    path: &Path,
    text: &str,
    config: &ResolvedConfig,
) -> Result<Vec<Diagnostic>, CheckError> {
    Engine::new(config.clone()).check_file(path, text)
}
