//! Rule definition and evaluation
//!
//! A rule is a pure predicate over one structural unit of a parsed document.
//! The engine hands every unit to the rules that target its kind; rules
//! report findings through an [`Emitter`] and never see each other's output.

use crate::diagnostic::{Diagnostic, Location, Severity};
use crate::plugin::{Document, Language};
use crate::plugins::css::node::{AtRule, CssComment, CssItem, Declaration, DeclarationBlock, StyleRule};
use crate::plugins::html::node::{CommentNode, DoctypeNode, Element, TextNode};
use crate::source::SourceText;
use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kinds of units a rule can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    /// The whole file, visited once
    Source,
    HtmlElement,
    HtmlText,
    HtmlComment,
    HtmlDoctype,
    /// A list of sibling CSS items (stylesheet or nested at-rule body)
    CssRuleList,
    CssStyleRule,
    CssAtRule,
    CssBlock,
    CssDeclaration,
    CssComment,
}

impl Target {
    /// Language a non-source unit belongs to
    pub fn language(self) -> Option<Language> {
        match self {
            Target::Source => None,
            Target::HtmlElement | Target::HtmlText | Target::HtmlComment | Target::HtmlDoctype => {
                Some(Language::Html)
            }
            _ => Some(Language::Css),
        }
    }
}

/// One structural unit handed to rules during the walk
#[derive(Debug, Clone, Copy)]
pub enum Unit<'a> {
    Source,
    HtmlElement {
        element: &'a Element,
        /// Open elements from the outermost down to the parent
        ancestors: &'a [&'a Element],
    },
    HtmlText(&'a TextNode),
    HtmlComment(&'a CommentNode),
    HtmlDoctype(&'a DoctypeNode),
    CssRuleList {
        items: &'a [CssItem],
        parent: Option<&'a AtRule>,
    },
    CssStyleRule(&'a StyleRule),
    CssAtRule(&'a AtRule),
    CssBlock(&'a DeclarationBlock),
    CssDeclaration(&'a Declaration),
    CssComment(&'a CssComment),
}

impl Unit<'_> {
    pub fn target(&self) -> Target {
        match self {
            Unit::Source => Target::Source,
            Unit::HtmlElement { .. } => Target::HtmlElement,
            Unit::HtmlText(_) => Target::HtmlText,
            Unit::HtmlComment(_) => Target::HtmlComment,
            Unit::HtmlDoctype(_) => Target::HtmlDoctype,
            Unit::CssRuleList { .. } => Target::CssRuleList,
            Unit::CssStyleRule(_) => Target::CssStyleRule,
            Unit::CssAtRule(_) => Target::CssAtRule,
            Unit::CssBlock(_) => Target::CssBlock,
            Unit::CssDeclaration(_) => Target::CssDeclaration,
            Unit::CssComment(_) => Target::CssComment,
        }
    }

    /// Span of the unit, `None` for the whole-file unit
    pub fn span(&self) -> Option<Span> {
        match self {
            Unit::Source => None,
            Unit::HtmlElement { element, .. } => Some(element.span),
            Unit::HtmlText(text) => Some(text.span),
            Unit::HtmlComment(comment) => Some(comment.span),
            Unit::HtmlDoctype(doctype) => Some(doctype.span),
            Unit::CssRuleList { items, .. } => {
                let first = items.first()?.span();
                let last = items.last()?.span();
                Some(first.to(last))
            }
            Unit::CssStyleRule(rule) => Some(rule.span),
            Unit::CssAtRule(rule) => Some(rule.span),
            Unit::CssBlock(block) => Some(block.span),
            Unit::CssDeclaration(decl) => Some(decl.span),
            Unit::CssComment(comment) => Some(comment.span),
        }
    }
}

/// Read-only view of the file being checked
pub struct RuleContext<'a> {
    file: &'a Path,
    document: &'a dyn Document,
}

impl<'a> RuleContext<'a> {
    pub fn new(file: &'a Path, document: &'a dyn Document) -> Self {
        Self { file, document }
    }

    pub fn file(&self) -> &'a Path {
        self.file
    }

    pub fn source(&self) -> &'a SourceText {
        self.document.source()
    }

    pub fn document(&self) -> &'a dyn Document {
        self.document
    }

    pub fn language(&self) -> Language {
        self.document.language()
    }

    /// Text covered by a span
    pub fn text(&self, span: Span) -> &'a str {
        self.source().slice(span)
    }
}

/// Predicate signature shared by all rules
pub type CheckFn = fn(&RuleContext<'_>, &Unit<'_>, &mut Emitter<'_>);

/// Collects the findings of one rule for one unit
pub struct Emitter<'a> {
    rule: &'a Rule,
    file: &'a Path,
    severity: Severity,
    found: Vec<Diagnostic>,
}

impl<'a> Emitter<'a> {
    pub fn new(rule: &'a Rule, file: &'a Path, severity: Severity) -> Self {
        Self {
            rule,
            file,
            severity,
            found: Vec::new(),
        }
    }

    /// Report a finding with an explicit message
    pub fn report(&mut self, span: Span, message: &str) -> &mut Diagnostic {
        let diag = Diagnostic::new(
            &self.rule.id,
            self.severity,
            message,
            Location::new(self.file, span),
        );
        let idx = self.found.len();
        self.found.push(diag);
        &mut self.found[idx]
    }

    /// Report a finding using the rule's message template
    pub fn report_with(&mut self, span: Span, args: &[(&str, &str)]) -> &mut Diagnostic {
        let message = format_message(&self.rule.message, args);
        self.report(span, &message)
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.found
    }
}

/// Fill `{placeholder}` slots of a message template
pub fn format_message(template: &str, args: &[(&str, &str)]) -> String {
    let mut message = template.to_string();
    for (key, value) in args {
        message = message.replace(&format!("{{{}}}", key), value);
    }
    message
}

/// A lint rule definition
#[derive(Debug, Clone)]
pub struct Rule {
    /// Unique rule identifier (e.g., "zero-unit")
    pub id: String,

    /// Detailed description
    pub description: Option<String>,

    /// Default severity level
    pub severity: Severity,

    /// Languages whose files this rule applies to
    pub languages: Vec<Language>,

    /// Unit kinds the predicate is invoked for
    pub targets: Vec<Target>,

    /// Message template (can contain `{placeholders}`)
    pub message: String,

    /// Whether this rule is enabled by default
    pub enabled: bool,

    check: CheckFn,
}

impl Rule {
    /// Create a new rule with minimal required fields
    pub fn new(id: &str, message: &str, check: CheckFn) -> Self {
        Self {
            id: id.to_string(),
            description: None,
            severity: Severity::Warning,
            languages: vec![Language::Html, Language::Css],
            targets: Vec::new(),
            message: message.to_string(),
            enabled: true,
            check,
        }
    }

    /// Set the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Restrict the rule to one language
    pub fn with_language(mut self, language: Language) -> Self {
        self.languages = vec![language];
        self
    }

    /// Set the unit kinds this rule inspects
    pub fn with_targets(mut self, targets: &[Target]) -> Self {
        self.targets = targets.to_vec();
        self
    }

    /// Set the description
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Make the rule opt-in
    pub fn disabled_by_default(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether the rule runs for a unit of `target` in a file of `language`
    pub fn applies_to(&self, target: Target, language: Language) -> bool {
        if !self.targets.contains(&target) {
            return false;
        }
        let unit_language = target.language().unwrap_or(language);
        self.languages.contains(&unit_language)
    }

    /// Run the predicate
    pub fn check(&self, cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
        (self.check)(cx, unit, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;
    use std::path::PathBuf;

    fn noop(_: &RuleContext<'_>, _: &Unit<'_>, _: &mut Emitter<'_>) {}

    #[test]
    fn test_rule_creation() {
        let rule = Rule::new("test-rule", "Something is off", noop);

        assert_eq!(rule.id, "test-rule");
        assert_eq!(rule.message, "Something is off");
        assert_eq!(rule.severity, Severity::Warning);
        assert_eq!(rule.languages, vec![Language::Html, Language::Css]);
        assert!(rule.enabled);
    }

    #[test]
    fn test_rule_builder() {
        let rule = Rule::new("test", "message", noop)
            .with_severity(Severity::Error)
            .with_language(Language::Css)
            .with_targets(&[Target::CssDeclaration])
            .with_description("details")
            .disabled_by_default();

        assert_eq!(rule.severity, Severity::Error);
        assert_eq!(rule.languages, vec![Language::Css]);
        assert_eq!(rule.targets, vec![Target::CssDeclaration]);
        assert_eq!(rule.description.as_deref(), Some("details"));
        assert!(!rule.enabled);
    }

    #[test]
    fn test_applies_to_uses_unit_language() {
        let css_rule = Rule::new("css", "msg", noop)
            .with_language(Language::Css)
            .with_targets(&[Target::CssDeclaration, Target::Source]);

        // Embedded stylesheets inside HTML files still reach CSS rules
        assert!(css_rule.applies_to(Target::CssDeclaration, Language::Html));
        assert!(css_rule.applies_to(Target::Source, Language::Css));
        assert!(!css_rule.applies_to(Target::Source, Language::Html));
        assert!(!css_rule.applies_to(Target::HtmlElement, Language::Html));
    }

    #[test]
    fn test_format_message() {
        let msg = format_message("'{name}' should be '{fixed}'", &[("name", "DIV"), ("fixed", "div")]);
        assert_eq!(msg, "'DIV' should be 'div'");
    }

    #[test]
    fn test_emitter_uses_effective_severity() {
        let rule = Rule::new("r", "Found {what}", noop);
        let file = PathBuf::from("a.css");
        let mut out = Emitter::new(&rule, &file, Severity::Error);
        let span = Span::covering(Position::start(), "abc");
        out.report_with(span, &[("what", "abc")])
            .suggest("Remove it", "");

        let found = out.into_diagnostics();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Error);
        assert_eq!(found[0].message, "Found abc");
        assert!(found[0].has_fix());
    }
}
