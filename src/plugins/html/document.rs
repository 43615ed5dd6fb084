//! HTML document implementation

use super::lexer::{self, HtmlToken, HtmlTokenKind};
use super::node::{Element, HtmlNode};
use super::parser;
use crate::plugin::{Document, Language, ParseIssue};
use crate::plugins::css::{walk_stylesheet, ParsedCss};
use crate::rule::Unit;
use crate::source::SourceText;
use crate::span::Span;
use std::collections::BTreeSet;

/// Elements whose content lines are exempt from whitespace rules
const VERBATIM_ELEMENTS: &[&str] = &["pre", "textarea", "script"];

/// A parsed HTML document, including the stylesheets of its `<style>` elements
pub struct HtmlDocument {
    source: SourceText,
    tokens: Vec<HtmlToken>,
    root: Element,
    stylesheets: Vec<ParsedCss>,
    issues: Vec<ParseIssue>,
    verbatim_lines: BTreeSet<usize>,
    comment_lines: BTreeSet<usize>,
}

impl HtmlDocument {
    pub fn parse(content: &str) -> Self {
        let source = SourceText::new(content);
        let tokens = lexer::tokenize(content);
        let parsed = parser::parse(&tokens, source.end());
        let mut issues = parsed.issues;

        let mut stylesheets = Vec::new();
        let mut verbatim_lines = BTreeSet::new();
        collect(&parsed.root, &mut stylesheets, &mut verbatim_lines);
        for sheet in &stylesheets {
            issues.extend(sheet.issues.iter().cloned());
        }

        let mut comment_lines = BTreeSet::new();
        for token in tokens.iter().filter(|t| t.kind == HtmlTokenKind::Comment) {
            comment_lines.extend(token.span.start.line + 1..=token.span.end.line);
        }
        for sheet in &stylesheets {
            sheet.comment_lines(&mut comment_lines);
        }

        Self {
            source,
            tokens,
            root: parsed.root,
            stylesheets,
            issues,
            verbatim_lines,
            comment_lines,
        }
    }

    /// The synthetic `#document` element
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Stylesheets embedded through `<style>` elements
    pub fn stylesheets(&self) -> &[ParsedCss] {
        &self.stylesheets
    }
}

/// Gather embedded stylesheets and verbatim line ranges
fn collect(element: &Element, sheets: &mut Vec<ParsedCss>, verbatim: &mut BTreeSet<usize>) {
    for el in element.elements() {
        if VERBATIM_ELEMENTS.contains(&el.name.as_str()) {
            let last = el.end_tag.map_or(el.span.end.line, |tag| tag.start.line);
            verbatim.extend(el.start_tag.end.line + 1..=last);
        }

        if is_stylesheet(el) {
            for child in &el.children {
                if let HtmlNode::Text(text) = child {
                    sheets.push(ParsedCss::parse(&text.text, text.span.start));
                }
            }
        }

        collect(el, sheets, verbatim);
    }
}

/// A `<style>` element holding CSS
fn is_stylesheet(element: &Element) -> bool {
    element.name == "style"
        && element
            .attr_value("type")
            .is_none_or(|t| t.trim().eq_ignore_ascii_case("text/css"))
}

/// Visits nodes in document order. Each embedded stylesheet is walked right
/// after the `<style>` text it was parsed from; `sheets` yields them in the
/// order `collect` found them.
fn walk_nodes<'a>(
    nodes: &'a [HtmlNode],
    ancestors: &mut Vec<&'a Element>,
    sheets: &mut std::slice::Iter<'_, ParsedCss>,
    visit: &mut dyn FnMut(&Unit<'_>),
) {
    for node in nodes {
        match node {
            HtmlNode::Element(element) => {
                visit(&Unit::HtmlElement {
                    element,
                    ancestors: ancestors.as_slice(),
                });
                ancestors.push(element);
                walk_nodes(&element.children, ancestors, sheets, visit);
                ancestors.pop();
            }
            HtmlNode::Text(text) => {
                visit(&Unit::HtmlText(text));
                if ancestors.last().is_some_and(|parent| is_stylesheet(parent)) {
                    if let Some(sheet) = sheets.next() {
                        walk_stylesheet(&sheet.stylesheet, visit);
                    }
                }
            }
            HtmlNode::Comment(comment) => visit(&Unit::HtmlComment(comment)),
            HtmlNode::Doctype(doctype) => visit(&Unit::HtmlDoctype(doctype)),
        }
    }
}

impl Document for HtmlDocument {
    fn language(&self) -> Language {
        Language::Html
    }

    fn source(&self) -> &SourceText {
        &self.source
    }

    fn parse_issues(&self) -> &[ParseIssue] {
        &self.issues
    }

    fn walk(&self, visit: &mut dyn FnMut(&Unit<'_>)) {
        let mut ancestors = Vec::new();
        let mut sheets = self.stylesheets.iter();
        walk_nodes(&self.root.children, &mut ancestors, &mut sheets, visit);
    }

    fn verbatim_lines(&self) -> &BTreeSet<usize> {
        &self.verbatim_lines
    }

    fn comment_lines(&self) -> &BTreeSet<usize> {
        &self.comment_lines
    }

    fn comments(&self) -> Vec<(&str, Span)> {
        let html = self
            .tokens
            .iter()
            .filter(|t| t.kind == HtmlTokenKind::Comment)
            .map(|t| (t.text.as_str(), t.span));
        let css = self
            .stylesheets
            .iter()
            .flat_map(|sheet| sheet.comments().map(|t| (t.text.as_str(), t.span)));
        html.chain(css).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Target;

    #[test]
    fn test_embedded_stylesheet_positions() {
        let doc = HtmlDocument::parse("<style>\n  a { color: red; }\n</style>");
        assert_eq!(doc.stylesheets().len(), 1);
        let mut decl_span = None;
        doc.walk(&mut |unit| {
            if let Unit::CssDeclaration(decl) = unit {
                decl_span = Some(decl.property_span);
            }
        });
        let span = decl_span.unwrap();
        assert_eq!(span.start.line, 2);
        assert_eq!(span.start.column, 7);
    }

    #[test]
    fn test_root_holds_top_level_nodes() {
        let doc = HtmlDocument::parse("<!doctype html>\n<html><body></body></html>\n");
        let root = doc.root();
        assert_eq!(root.name, "#document");
        assert_eq!(root.elements().map(|e| e.name.as_str()).collect::<Vec<_>>(), vec!["html"]);
        assert_eq!(root.span.end.line, 3);
    }

    #[test]
    fn test_non_css_style_type_ignored() {
        let doc = HtmlDocument::parse("<style type=\"text/less\">a { b: c }</style>");
        assert!(doc.stylesheets().is_empty());
    }

    #[test]
    fn test_ancestors() {
        let doc = HtmlDocument::parse("<ul><li><a>x</a></li></ul>");
        let mut depth_of_a = None;
        doc.walk(&mut |unit| {
            if let Unit::HtmlElement { element, ancestors } = unit {
                if element.name == "a" {
                    depth_of_a = Some(ancestors.iter().map(|e| e.name.clone()).collect::<Vec<_>>());
                }
            }
        });
        assert_eq!(depth_of_a, Some(vec!["ul".to_string(), "li".to_string()]));
    }

    #[test]
    fn test_verbatim_lines() {
        let doc = HtmlDocument::parse("<div>\n<pre>\n   keep\n\tthis\n</pre>\n</div>");
        let lines: Vec<_> = doc.verbatim_lines().iter().copied().collect();
        assert_eq!(lines, vec![3, 4, 5]);
    }

    #[test]
    fn test_walk_targets() {
        let doc = HtmlDocument::parse("<!doctype html><!-- c --><p>t</p>");
        let mut seen = Vec::new();
        doc.walk(&mut |unit| seen.push(unit.target()));
        assert_eq!(
            seen,
            vec![
                Target::HtmlDoctype,
                Target::HtmlComment,
                Target::HtmlElement,
                Target::HtmlText
            ]
        );
    }

    #[test]
    fn test_stylesheet_walked_at_its_element() {
        let doc = HtmlDocument::parse("<p>x</p><style>a { b: c }</style><div></div>");
        let mut seen = Vec::new();
        doc.walk(&mut |unit| seen.push(unit.target()));
        assert_eq!(
            seen,
            vec![
                Target::HtmlElement,
                Target::HtmlText,
                Target::HtmlElement,
                Target::HtmlText,
                Target::CssRuleList,
                Target::CssStyleRule,
                Target::CssBlock,
                Target::CssDeclaration,
                Target::HtmlElement,
            ]
        );
    }

    #[test]
    fn test_deep_markup_walks() {
        let levels = 100_000;
        let text = format!("{}{}", "<div>".repeat(levels), "</div>".repeat(levels));
        let doc = HtmlDocument::parse(&text);
        let mut elements = 0;
        doc.walk(&mut |unit| {
            if matches!(unit, Unit::HtmlElement { .. }) {
                elements += 1;
            }
        });
        assert_eq!(elements, levels);
        assert_eq!(doc.parse_issues().len(), 1);
    }

    #[test]
    fn test_comments_include_embedded_css() {
        let doc = HtmlDocument::parse("<!-- a --><style>/* b */</style>");
        let texts: Vec<_> = doc.comments().into_iter().map(|(t, _)| t).collect();
        assert_eq!(texts, vec!["<!-- a -->", "/* b */"]);
    }
}
