//! CSS document implementation

use super::lexer::{self, CssToken, CssTokenKind};
use super::node::{AtBlock, AtRule, CssComment, CssItem, Declaration, DeclarationBlock, Stylesheet};
use super::parser;
use crate::plugin::{Document, Language, ParseIssue};
use crate::rule::Unit;
use crate::source::SourceText;
use crate::span::{Position, Span};
use std::collections::BTreeSet;

/// A stylesheet parsed from text, standalone or embedded
#[derive(Debug, Clone)]
pub struct ParsedCss {
    pub tokens: Vec<CssToken>,
    pub stylesheet: Stylesheet,
    pub issues: Vec<ParseIssue>,
}

impl ParsedCss {
    /// Tokenize and parse `text`, whose first character sits at `origin`
    pub fn parse(text: &str, origin: Position) -> Self {
        let tokens = lexer::tokenize_at(text, origin);
        let (stylesheet, issues) = parser::parse(&tokens);
        Self {
            tokens,
            stylesheet,
            issues,
        }
    }

    /// Comments with their spans
    pub fn comments(&self) -> impl Iterator<Item = &CssToken> {
        self.tokens.iter().filter(|t| t.kind == CssTokenKind::Comment)
    }

    /// Continuation lines of multi-line comments
    pub fn comment_lines(&self, lines: &mut BTreeSet<usize>) {
        for comment in self.comments() {
            lines.extend(comment.span.start.line + 1..=comment.span.end.line);
        }
    }
}

/// Visit every unit of a stylesheet in document order
pub fn walk_stylesheet(sheet: &Stylesheet, visit: &mut dyn FnMut(&Unit<'_>)) {
    walk_items(&sheet.items, None, visit);
}

fn walk_items(items: &[CssItem], parent: Option<&AtRule>, visit: &mut dyn FnMut(&Unit<'_>)) {
    visit(&Unit::CssRuleList { items, parent });
    for item in items {
        walk_item(item, visit);
    }
}

fn walk_item(item: &CssItem, visit: &mut dyn FnMut(&Unit<'_>)) {
    match item {
        CssItem::Comment(comment) => visit(&Unit::CssComment(comment)),
        CssItem::StyleRule(rule) => {
            visit(&Unit::CssStyleRule(rule));
            walk_block(&rule.block, visit);
        }
        CssItem::Declarations(block) => walk_block(block, visit),
        CssItem::AtRule(rule) => {
            visit(&Unit::CssAtRule(rule));
            match &rule.block {
                AtBlock::None => {}
                AtBlock::Declarations(block) => walk_block(block, visit),
                AtBlock::Rules { items, .. } => walk_items(items, Some(rule), visit),
            }
        }
    }
}

/// One entry of a block, in source order
enum Entry<'a> {
    Declaration(&'a Declaration),
    Comment(&'a CssComment),
    Nested(&'a CssItem),
}

impl Entry<'_> {
    fn offset(&self) -> usize {
        match self {
            Entry::Declaration(decl) => decl.span.start.offset,
            Entry::Comment(comment) => comment.span.start.offset,
            Entry::Nested(item) => item.span().start.offset,
        }
    }
}

fn walk_block(block: &DeclarationBlock, visit: &mut dyn FnMut(&Unit<'_>)) {
    visit(&Unit::CssBlock(block));

    let mut entries: Vec<Entry<'_>> = block
        .declarations
        .iter()
        .map(Entry::Declaration)
        .chain(block.comments.iter().map(Entry::Comment))
        .chain(block.nested.iter().map(Entry::Nested))
        .collect();
    entries.sort_by_key(|entry| entry.offset());

    for entry in entries {
        match entry {
            Entry::Declaration(decl) => visit(&Unit::CssDeclaration(decl)),
            Entry::Comment(comment) => visit(&Unit::CssComment(comment)),
            Entry::Nested(item) => walk_item(item, visit),
        }
    }
}

/// A parsed `.css` file
pub struct CssDocument {
    source: SourceText,
    parsed: ParsedCss,
    comment_lines: BTreeSet<usize>,
    verbatim_lines: BTreeSet<usize>,
}

impl CssDocument {
    pub fn parse(content: &str) -> Self {
        let source = SourceText::new(content);
        let parsed = ParsedCss::parse(content, Position::start());
        let mut comment_lines = BTreeSet::new();
        parsed.comment_lines(&mut comment_lines);
        Self {
            source,
            parsed,
            comment_lines,
            verbatim_lines: BTreeSet::new(),
        }
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.parsed.stylesheet
    }
}

impl Document for CssDocument {
    fn language(&self) -> Language {
        Language::Css
    }

    fn source(&self) -> &SourceText {
        &self.source
    }

    fn parse_issues(&self) -> &[ParseIssue] {
        &self.parsed.issues
    }

    fn walk(&self, visit: &mut dyn FnMut(&Unit<'_>)) {
        walk_stylesheet(&self.parsed.stylesheet, visit);
    }

    fn verbatim_lines(&self) -> &BTreeSet<usize> {
        &self.verbatim_lines
    }

    fn comment_lines(&self) -> &BTreeSet<usize> {
        &self.comment_lines
    }

    fn comments(&self) -> Vec<(&str, Span)> {
        self.parsed
            .comments()
            .map(|t| (t.text.as_str(), t.span))
            .collect()
    }
}
