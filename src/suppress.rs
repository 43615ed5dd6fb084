//! Inline suppression comments
//!
//! ```text
//! <!-- frost-disable lowercase -->              this comment's lines
//! /* frost-disable-next-line zero-unit */       the line after the comment
//! /* frost-disable-file important: legacy */    the whole file
//! ```
//!
//! Several ids may be listed with commas, `all` matches every rule, and a
//! reason may follow a `:` or ` -- `. Reserved diagnostics (parse errors and
//! rule failures) are never suppressed.

use crate::diagnostic::{INTERNAL_RULE_ERROR, PARSE_ERROR};
use crate::plugin::Document;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)^(?:<!--|/\*)\s*frost-(disable-next-line|disable-file|disable)\s+([\w-]+(?:\s*,\s*[\w-]+)*)(?:\s*:\s*(.+?)|\s+--\s+(.+?))?\s*(?:-->|\*/)$",
    )
    .expect("suppression pattern is valid")
});

/// Matches every rule id
const ALL: &str = "all";

/// Suppressions collected from one document's comments
#[derive(Debug, Default, Clone)]
pub struct Suppressions {
    /// rule_id -> suppressed lines
    lines: HashMap<String, BTreeSet<usize>>,

    /// Rules suppressed for the whole file
    file_rules: BTreeSet<String>,

    /// (rule_id, line) -> reason; line 0 for file-wide entries
    reasons: HashMap<(String, usize), String>,
}

impl Suppressions {
    pub fn from_document(document: &dyn Document) -> Self {
        let mut suppressions = Self::default();
        for (text, span) in document.comments() {
            let Some(caps) = DIRECTIVE.captures(text) else {
                continue;
            };
            let reason = caps
                .get(3)
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().trim().to_string());
            let ids = caps[2].split(',').map(str::trim);

            match &caps[1] {
                "disable-file" => {
                    for id in ids {
                        suppressions.add_file(id, reason.clone());
                    }
                }
                "disable-next-line" => {
                    for id in ids {
                        suppressions.add_line(id, span.end.line + 1, reason.clone());
                    }
                }
                _ => {
                    for id in ids {
                        for line in span.start.line..=span.end.line {
                            suppressions.add_line(id, line, reason.clone());
                        }
                    }
                }
            }
        }
        suppressions
    }

    fn add_line(&mut self, rule_id: &str, line: usize, reason: Option<String>) {
        self.lines
            .entry(rule_id.to_string())
            .or_default()
            .insert(line);
        if let Some(reason) = reason {
            self.reasons.insert((rule_id.to_string(), line), reason);
        }
    }

    fn add_file(&mut self, rule_id: &str, reason: Option<String>) {
        self.file_rules.insert(rule_id.to_string());
        if let Some(reason) = reason {
            self.reasons.insert((rule_id.to_string(), 0), reason);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.file_rules.is_empty()
    }

    /// Whether a diagnostic of `rule_id` on `line` is silenced
    pub fn is_suppressed(&self, rule_id: &str, line: usize) -> bool {
        if rule_id == PARSE_ERROR || rule_id == INTERNAL_RULE_ERROR {
            return false;
        }
        [rule_id, ALL].iter().any(|id| {
            self.file_rules.contains(*id)
                || self.lines.get(*id).is_some_and(|lines| lines.contains(&line))
        })
    }

    /// Reason given for the suppression that silences `rule_id` on `line`
    pub fn reason(&self, rule_id: &str, line: usize) -> Option<&str> {
        [rule_id, ALL]
            .iter()
            .flat_map(|id| [(id.to_string(), line), (id.to_string(), 0)])
            .find_map(|key| self.reasons.get(&key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::css::CssDocument;
    use crate::plugins::html::HtmlDocument;

    fn css(text: &str) -> Suppressions {
        Suppressions::from_document(&CssDocument::parse(text))
    }

    fn html(text: &str) -> Suppressions {
        Suppressions::from_document(&HtmlDocument::parse(text))
    }

    #[test]
    fn test_disable_same_line() {
        let s = html("<p>\n<B>x</B> <!-- frost-disable lowercase -->\n<I>y</I>\n");
        assert!(s.is_suppressed("lowercase", 2));
        assert!(!s.is_suppressed("lowercase", 3));
        assert!(!s.is_suppressed("indentation", 2));
    }

    #[test]
    fn test_disable_next_line() {
        let s = css("a {\n  /* frost-disable-next-line zero-unit, important */\n  top: 0px !important;\n}\n");
        assert!(!s.is_suppressed("zero-unit", 2));
        assert!(s.is_suppressed("zero-unit", 3));
        assert!(s.is_suppressed("important", 3));
        assert!(!s.is_suppressed("zero-unit", 4));
    }

    #[test]
    fn test_disable_file_and_all() {
        let s = css("/* frost-disable-file all */\na { top: 0px; }\n");
        assert!(s.is_suppressed("zero-unit", 2));
        assert!(s.is_suppressed("lowercase", 40));
    }

    #[test]
    fn test_reserved_ids_never_suppressed() {
        let s = css("/* frost-disable-file all */\n");
        assert!(!s.is_suppressed(PARSE_ERROR, 1));
        assert!(!s.is_suppressed(INTERNAL_RULE_ERROR, 1));
    }

    #[test]
    fn test_reasons() {
        let s = css("/* frost-disable-file important: vendor overrides */\n/* frost-disable-next-line zero-unit -- keeps the unit for tooling */\na { top: 0px; }\n");
        assert_eq!(s.reason("important", 9), Some("vendor overrides"));
        assert_eq!(s.reason("zero-unit", 3), Some("keeps the unit for tooling"));
        assert_eq!(s.reason("zero-unit", 4), None);
    }

    #[test]
    fn test_ordinary_comments_ignored() {
        let s = css("/* disable zero-unit */\n/* frost-disable */\na { top: 0px; }\n");
        assert!(s.is_empty());
    }
}
