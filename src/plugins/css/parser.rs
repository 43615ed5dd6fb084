//! Tolerant CSS parser
//!
//! Recursive descent over the token stream. Malformed constructs are
//! reported as [`ParseIssue`]s and skipped up to the next `;` or `}`.
//! Blocks nested past [`MAX_NESTING`] levels are skipped whole, which keeps
//! the recursion bounded on any input.

use super::lexer::{CssToken, CssTokenKind};
use super::node::{
    is_trivia, tokens_span, trim_trivia, AtBlock, AtRule, CssComment, CssItem, Declaration,
    DeclarationBlock, Selector, StyleRule, Stylesheet, DECLARATION_AT_RULES,
};
use crate::plugin::ParseIssue;
use crate::span::{Position, Span};

/// Deepest block nesting that is parsed
pub const MAX_NESTING: usize = 256;

/// Parse a token stream into a stylesheet
pub fn parse(tokens: &[CssToken]) -> (Stylesheet, Vec<ParseIssue>) {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        issues: Vec::new(),
    };
    parser.lexical_issues();
    let items = parser.items(false, false);
    (Stylesheet { items }, parser.issues)
}

struct Parser<'t> {
    tokens: &'t [CssToken],
    pos: usize,
    /// Blocks currently open
    depth: usize,
    issues: Vec<ParseIssue>,
}

impl<'t> Parser<'t> {
    fn issue(&mut self, message: impl Into<String>, span: Span) {
        self.issues.push(ParseIssue::new(message, span));
    }

    fn peek(&self) -> Option<&'t CssToken> {
        self.tokens.get(self.pos)
    }

    fn kind_at(&self, idx: usize) -> Option<CssTokenKind> {
        self.tokens.get(idx).map(|t| t.kind)
    }

    fn lexical_issues(&mut self) {
        for token in self.tokens {
            let message = match token.kind {
                CssTokenKind::BadString => "unterminated string",
                CssTokenKind::Comment if token.text.len() < 4 || !token.text.ends_with("*/") => {
                    "unterminated comment"
                }
                CssTokenKind::Url if !token.text.ends_with(')') => "unterminated url()",
                _ => continue,
            };
            self.issue(message, token.span);
        }
    }

    fn comment(&mut self, token: &CssToken) -> CssComment {
        self.pos += 1;
        CssComment {
            text: token.text.clone(),
            span: token.span,
        }
    }

    /// Index of the first `{`, `;` or `}` outside parentheses and brackets,
    /// or the end of input
    fn scan_prelude(&self, from: usize) -> usize {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(from) {
            match token.kind {
                CssTokenKind::ParenOpen | CssTokenKind::Function | CssTokenKind::BracketOpen => {
                    depth += 1
                }
                CssTokenKind::ParenClose | CssTokenKind::BracketClose => {
                    depth = depth.saturating_sub(1)
                }
                CssTokenKind::BraceOpen | CssTokenKind::Semicolon | CssTokenKind::BraceClose
                    if depth == 0 =>
                {
                    return i
                }
                _ => {}
            }
        }
        self.tokens.len()
    }

    /// Ident followed (after whitespace/comments) by a colon
    fn looks_like_declaration(&self, at: usize) -> bool {
        if self.kind_at(at) != Some(CssTokenKind::Ident) {
            return false;
        }
        self.tokens[at + 1..]
            .iter()
            .find(|t| !is_trivia(t))
            .is_some_and(|t| t.kind == CssTokenKind::Colon)
    }

    /// A `{` before any `;` or `}` starts a nested rule, unless the entry is
    /// a custom property
    fn starts_nested_rule(&self, at: usize) -> bool {
        let custom = self
            .tokens
            .get(at)
            .is_some_and(|t| t.kind == CssTokenKind::Ident && t.text.starts_with("--"));
        !custom && self.kind_at(self.scan_prelude(at)) == Some(CssTokenKind::BraceOpen)
    }

    /// End of a block, or of the input when the block is unclosed
    fn block_end(&self, open: Span, close: Option<Span>) -> Position {
        close
            .map(|c| c.end)
            .or_else(|| self.tokens.last().map(|t| t.span.end))
            .unwrap_or(open.end)
    }

    /// Skip the block opening at the current `{`, returning its `}`
    fn skip_block(&mut self) -> Option<Span> {
        let open = self.tokens[self.pos].span;
        self.issue(
            format!("blocks nested more than {} levels deep are skipped", MAX_NESTING),
            open,
        );
        self.pos += 1;
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            self.pos += 1;
            match token.kind {
                CssTokenKind::BraceOpen => depth += 1,
                CssTokenKind::BraceClose if depth == 0 => return Some(token.span),
                CssTokenKind::BraceClose => depth -= 1,
                _ => {}
            }
        }
        self.issue("unclosed block", open);
        None
    }

    fn items(&mut self, nested: bool, keyframes: bool) -> Vec<CssItem> {
        let mut items: Vec<CssItem> = Vec::new();
        while let Some(token) = self.peek() {
            match token.kind {
                CssTokenKind::Whitespace
                | CssTokenKind::Cdo
                | CssTokenKind::Cdc
                | CssTokenKind::ByteOrderMark
                | CssTokenKind::Semicolon => self.pos += 1,
                CssTokenKind::Comment => {
                    let comment = self.comment(token);
                    items.push(CssItem::Comment(comment));
                }
                CssTokenKind::BraceClose => {
                    if nested {
                        break;
                    }
                    self.issue("unexpected '}'", token.span);
                    self.pos += 1;
                }
                CssTokenKind::AtKeyword => {
                    let rule = self.at_rule();
                    items.push(CssItem::AtRule(rule));
                }
                _ => self.qualified_or_declaration(&mut items, keyframes),
            }
        }
        items
    }

    fn qualified_or_declaration(&mut self, items: &mut Vec<CssItem>, keyframes: bool) {
        let start = self.pos;
        let end = self.scan_prelude(start);

        if self.kind_at(end) == Some(CssTokenKind::BraceOpen) {
            let rule = self.style_rule(start, end, keyframes);
            items.push(CssItem::StyleRule(rule));
            return;
        }

        if self.looks_like_declaration(start) {
            let decl = self.declaration();
            match items.last_mut() {
                Some(CssItem::Declarations(block)) => {
                    block.span = block.span.to(decl.span);
                    block.declarations.push(decl);
                }
                _ => items.push(CssItem::Declarations(DeclarationBlock {
                    open: None,
                    close: None,
                    span: decl.span,
                    declarations: vec![decl],
                    comments: Vec::new(),
                    nested: Vec::new(),
                })),
            }
            return;
        }

        let stray = trim_trivia(&self.tokens[start..end]);
        if let Some(span) = tokens_span(stray) {
            self.issue("unexpected tokens outside of a rule", span);
        }
        self.pos = end;
        if self.kind_at(end) == Some(CssTokenKind::Semicolon) {
            self.pos += 1;
        }
    }

    fn style_rule(&mut self, start: usize, brace: usize, keyframe: bool) -> StyleRule {
        let prelude = trim_trivia(&self.tokens[start..brace]);
        let prelude_span = tokens_span(prelude);
        let selectors = self.selectors(prelude);
        self.pos = brace;
        let block = self.declaration_block();
        let span = match prelude_span {
            Some(prelude) => prelude.to(block.span),
            None => block.span,
        };
        StyleRule {
            selectors,
            prelude: prelude_span,
            block,
            keyframe,
            span,
        }
    }

    /// Split a prelude at top-level commas
    fn selectors(&mut self, prelude: &[CssToken]) -> Vec<Selector> {
        let mut selectors = Vec::new();
        let mut depth = 0usize;
        let mut part_start = 0;
        for i in 0..=prelude.len() {
            let at_split = match prelude.get(i).map(|t| t.kind) {
                None => true,
                Some(CssTokenKind::Comma) => depth == 0,
                Some(CssTokenKind::ParenOpen | CssTokenKind::Function | CssTokenKind::BracketOpen) => {
                    depth += 1;
                    false
                }
                Some(CssTokenKind::ParenClose | CssTokenKind::BracketClose) => {
                    depth = depth.saturating_sub(1);
                    false
                }
                Some(_) => false,
            };
            if !at_split {
                continue;
            }

            let part = trim_trivia(&prelude[part_start..i]);
            match tokens_span(part) {
                Some(span) => selectors.push(Selector {
                    text: part.iter().map(|t| t.text.as_str()).collect(),
                    span,
                    tokens: part.to_vec(),
                }),
                None if !prelude.is_empty() => {
                    let at = prelude
                        .get(i)
                        .or(prelude.last())
                        .map(|t| t.span)
                        .unwrap_or_default();
                    self.issue("empty selector", at);
                }
                None => {}
            }
            part_start = i + 1;
        }
        selectors
    }

    /// Parse `{ ... }` starting at the current `{`
    fn declaration_block(&mut self) -> DeclarationBlock {
        let open = self.tokens[self.pos].span;
        if self.depth >= MAX_NESTING {
            let close = self.skip_block();
            return DeclarationBlock {
                open: Some(open),
                close,
                declarations: Vec::new(),
                comments: Vec::new(),
                nested: Vec::new(),
                span: Span::new(open.start, self.block_end(open, close)),
            };
        }

        self.depth += 1;
        self.pos += 1;
        let mut declarations = Vec::new();
        let mut comments = Vec::new();
        let mut nested = Vec::new();
        let mut close = None;

        while let Some(token) = self.peek() {
            match token.kind {
                CssTokenKind::Whitespace | CssTokenKind::Semicolon => self.pos += 1,
                CssTokenKind::Comment => {
                    let comment = self.comment(token);
                    comments.push(comment);
                }
                CssTokenKind::BraceClose => {
                    close = Some(token.span);
                    self.pos += 1;
                    break;
                }
                CssTokenKind::AtKeyword => {
                    let rule = self.at_rule();
                    nested.push(CssItem::AtRule(rule));
                }
                _ if self.starts_nested_rule(self.pos) => {
                    let start = self.pos;
                    let brace = self.scan_prelude(start);
                    let rule = self.style_rule(start, brace, false);
                    nested.push(CssItem::StyleRule(rule));
                }
                _ if self.looks_like_declaration(self.pos) => declarations.push(self.declaration()),
                _ => self.recover_in_block(),
            }
        }
        self.depth -= 1;

        if close.is_none() {
            self.issue("unclosed block", open);
        }

        DeclarationBlock {
            open: Some(open),
            close,
            declarations,
            comments,
            nested,
            span: Span::new(open.start, self.block_end(open, close)),
        }
    }

    /// Skip a malformed entry inside a declaration block
    fn recover_in_block(&mut self) {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token.kind {
                CssTokenKind::BraceOpen => depth += 1,
                CssTokenKind::BraceClose if depth == 0 => break,
                CssTokenKind::BraceClose => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        break;
                    }
                }
                CssTokenKind::Semicolon if depth == 0 => {
                    self.pos += 1;
                    break;
                }
                _ => {}
            }
            self.pos += 1;
        }
        let skipped = trim_trivia(&self.tokens[start..self.pos]);
        let message = match skipped.first() {
            Some(first) => format!("unexpected '{}' in declaration block", first.text),
            None => "unexpected token in declaration block".to_string(),
        };
        if let Some(span) = tokens_span(skipped) {
            self.issue(message, span);
        }
    }

    /// Parse `property: value [!important] [;]` starting at the property
    fn declaration(&mut self) -> Declaration {
        let property = &self.tokens[self.pos];
        self.pos += 1;
        while self.peek().is_some_and(is_trivia) {
            self.pos += 1;
        }
        let colon = self.tokens[self.pos].span;
        self.pos += 1;

        let value_start = self.pos;
        let mut depth = 0usize;
        let mut end = self.tokens.len();
        for (i, token) in self.tokens.iter().enumerate().skip(value_start) {
            match token.kind {
                CssTokenKind::ParenOpen
                | CssTokenKind::Function
                | CssTokenKind::BracketOpen
                | CssTokenKind::BraceOpen => depth += 1,
                CssTokenKind::ParenClose | CssTokenKind::BracketClose => {
                    depth = depth.saturating_sub(1)
                }
                CssTokenKind::BraceClose if depth == 0 => {
                    end = i;
                    break;
                }
                CssTokenKind::BraceClose => depth -= 1,
                CssTokenKind::Semicolon if depth == 0 => {
                    end = i;
                    break;
                }
                _ => {}
            }
        }

        let mut value = trim_trivia(&self.tokens[value_start..end]);
        let mut important = None;
        if let [rest @ .., bang, tail] = value {
            if bang.kind == CssTokenKind::Delim
                && bang.text == "!"
                && tail.kind == CssTokenKind::Ident
                && tail.text.eq_ignore_ascii_case("important")
            {
                important = Some(Span::new(bang.span.start, tail.span.end));
                value = trim_trivia(rest);
            }
        }
        if important.is_none() {
            if let [rest @ .., bang, space, tail] = value {
                if bang.text == "!"
                    && is_trivia(space)
                    && tail.kind == CssTokenKind::Ident
                    && tail.text.eq_ignore_ascii_case("important")
                {
                    important = Some(Span::new(bang.span.start, tail.span.end));
                    value = trim_trivia(rest);
                }
            }
        }

        let value_span = tokens_span(value);
        let semicolon = match self.kind_at(end) {
            Some(CssTokenKind::Semicolon) => {
                self.pos = end + 1;
                Some(self.tokens[end].span)
            }
            _ => {
                self.pos = end;
                None
            }
        };

        let span_end = important
            .or(value_span)
            .map(|s| s.end)
            .unwrap_or(colon.end);

        Declaration {
            property: property.text.clone(),
            property_span: property.span,
            colon,
            value: value.iter().map(|t| t.text.as_str()).collect(),
            value_span,
            value_tokens: value.to_vec(),
            important,
            semicolon,
            span: Span::new(property.span.start, span_end),
        }
    }

    fn at_rule(&mut self) -> AtRule {
        let keyword = &self.tokens[self.pos];
        let name = keyword.text[1..].to_ascii_lowercase();
        self.pos += 1;
        let end = self.scan_prelude(self.pos);
        let prelude = trim_trivia(&self.tokens[self.pos..end]);
        let prelude_span = tokens_span(prelude);
        let mut span = Span::new(
            keyword.span.start,
            prelude_span.map(|s| s.end).unwrap_or(keyword.span.end),
        );
        self.pos = end;

        let block = match self.kind_at(end) {
            Some(CssTokenKind::Semicolon) => {
                span.end = self.tokens[end].span.end;
                self.pos += 1;
                AtBlock::None
            }
            Some(CssTokenKind::BraceOpen) if DECLARATION_AT_RULES.contains(&name.as_str()) => {
                let block = self.declaration_block();
                span.end = block.span.end;
                AtBlock::Declarations(block)
            }
            Some(CssTokenKind::BraceOpen) if self.depth >= MAX_NESTING => {
                let open = self.tokens[end].span;
                let close = self.skip_block();
                span.end = self.block_end(open, close);
                AtBlock::Rules {
                    open,
                    close,
                    items: Vec::new(),
                }
            }
            Some(CssTokenKind::BraceOpen) => {
                let open = self.tokens[end].span;
                self.pos += 1;
                self.depth += 1;
                let items = self.items(true, name.ends_with("keyframes"));
                self.depth -= 1;
                let close = match self.peek() {
                    Some(token) if token.kind == CssTokenKind::BraceClose => {
                        self.pos += 1;
                        Some(token.span)
                    }
                    _ => {
                        self.issue("unclosed block", open);
                        None
                    }
                };
                span.end = close
                    .map(|c| c.end)
                    .or_else(|| items.last().map(|i| i.span().end))
                    .unwrap_or(open.end);
                AtBlock::Rules { open, close, items }
            }
            _ => {
                self.issue(format!("@{} is not terminated", name), span);
                AtBlock::None
            }
        };

        AtRule {
            name,
            name_span: keyword.span,
            prelude: prelude.iter().map(|t| t.text.as_str()).collect(),
            prelude_span,
            prelude_tokens: prelude.to_vec(),
            block,
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::css::lexer::tokenize;

    fn parse_str(text: &str) -> (Stylesheet, Vec<ParseIssue>) {
        parse(&tokenize(text))
    }

    fn only_rule(sheet: &Stylesheet) -> &StyleRule {
        match sheet.items.as_slice() {
            [CssItem::StyleRule(rule)] => rule,
            other => panic!("expected one style rule, got {:?}", other),
        }
    }

    #[test]
    fn test_style_rule() {
        let (sheet, issues) = parse_str("h1, h2 > a:hover { color: red; margin: 0 auto }");
        assert!(issues.is_empty());
        let rule = only_rule(&sheet);
        let selectors: Vec<_> = rule.selectors.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(selectors, vec!["h1", "h2 > a:hover"]);
        let decls = &rule.block.declarations;
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property, "color");
        assert_eq!(decls[0].value, "red");
        assert!(decls[0].semicolon.is_some());
        assert_eq!(decls[1].value, "0 auto");
        assert!(decls[1].semicolon.is_none());
    }

    #[test]
    fn test_bare_declarations() {
        let (sheet, issues) = parse_str("color: #E5E5E5;\nmargin: 0;");
        assert!(issues.is_empty());
        match sheet.items.as_slice() {
            [CssItem::Declarations(block)] => {
                assert!(block.open.is_none());
                assert_eq!(block.declarations.len(), 2);
            }
            other => panic!("unexpected items {:?}", other),
        }
    }

    #[test]
    fn test_empty_prelude() {
        let (sheet, issues) = parse_str("{ height: 100px\n }");
        assert!(issues.is_empty());
        let rule = only_rule(&sheet);
        assert!(rule.selectors.is_empty());
        assert!(rule.prelude.is_none());
        let decl = &rule.block.declarations[0];
        assert_eq!(decl.value, "100px");
        assert!(decl.semicolon.is_none());
        assert_eq!(decl.span.end.column, 16);
    }

    #[test]
    fn test_important() {
        let (sheet, _) = parse_str("a { color: red !important; top: 0 ! important }");
        let decls = &only_rule(&sheet).block.declarations;
        assert_eq!(decls[0].value, "red");
        assert!(decls[0].important.is_some());
        assert_eq!(decls[1].value, "0");
        assert!(decls[1].important.is_some());
    }

    #[test]
    fn test_at_rules() {
        let (sheet, issues) = parse_str(
            "@charset \"utf-8\";\n@import url(a.css);\n@media screen { a { b: c; } }\n@font-face { font-family: x; }\n@keyframes spin { from { top: 0; } to { top: 1px; } }",
        );
        assert!(issues.is_empty(), "{:?}", issues);
        let names: Vec<_> = sheet
            .items
            .iter()
            .filter_map(|i| match i {
                CssItem::AtRule(r) => Some(r.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["charset", "import", "media", "font-face", "keyframes"]);

        match &sheet.items[2] {
            CssItem::AtRule(AtRule {
                block: AtBlock::Rules { items, close, .. },
                prelude,
                ..
            }) => {
                assert_eq!(prelude, "screen");
                assert_eq!(items.len(), 1);
                assert!(close.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
        match &sheet.items[3] {
            CssItem::AtRule(AtRule {
                block: AtBlock::Declarations(block),
                ..
            }) => assert_eq!(block.declarations[0].property, "font-family"),
            other => panic!("unexpected {:?}", other),
        }
        match &sheet.items[4] {
            CssItem::AtRule(AtRule {
                block: AtBlock::Rules { items, .. },
                ..
            }) => {
                assert!(items.iter().all(|i| matches!(i, CssItem::StyleRule(r) if r.keyframe)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_stray_close_brace() {
        let (sheet, issues) = parse_str("} a { b: c; }");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "unexpected '}'");
        assert_eq!(sheet.items.len(), 1);
    }

    #[test]
    fn test_unclosed_block() {
        let (sheet, issues) = parse_str("a { color: red;");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "unclosed block");
        assert_eq!(only_rule(&sheet).block.declarations.len(), 1);
    }

    #[test]
    fn test_recovery_in_block() {
        let (sheet, issues) = parse_str("a { 12px; color: red; }");
        assert_eq!(issues.len(), 1);
        let decls = &only_rule(&sheet).block.declarations;
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].property, "color");
    }

    #[test]
    fn test_unterminated_string_reported() {
        let (_, issues) = parse_str("a { content: 'open\n }");
        assert!(issues.iter().any(|i| i.message == "unterminated string"));
    }

    #[test]
    fn test_garbage_outside_rules() {
        let (sheet, issues) = parse_str("12px; a { b: c }");
        assert_eq!(issues.len(), 1);
        assert_eq!(sheet.items.len(), 1);
    }

    #[test]
    fn test_comments_kept() {
        let (sheet, _) = parse_str("/* top */ a { /* inner */ b: c; }");
        assert!(matches!(sheet.items[0], CssItem::Comment(_)));
        match &sheet.items[1] {
            CssItem::StyleRule(rule) => assert_eq!(rule.block.comments.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_nested_style_rules() {
        let (sheet, issues) =
            parse_str("a {\n  color: red;\n\n  &:hover {\n    color: blue;\n  }\n  .icon b { top: 0; }\n}\n");
        assert!(issues.is_empty(), "{:?}", issues);
        let rule = only_rule(&sheet);
        assert_eq!(rule.block.declarations.len(), 1);
        let selectors: Vec<_> = rule
            .block
            .nested
            .iter()
            .map(|item| match item {
                CssItem::StyleRule(nested) => nested.selectors[0].text.as_str(),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(selectors, vec!["&:hover", ".icon b"]);
    }

    #[test]
    fn test_nested_at_rule_and_custom_property() {
        let (sheet, issues) =
            parse_str("a { --shadow: { x: y }; @media print { color: black; } }");
        assert!(issues.is_empty(), "{:?}", issues);
        let block = &only_rule(&sheet).block;
        assert_eq!(block.declarations[0].property, "--shadow");
        assert!(matches!(
            block.nested.as_slice(),
            [CssItem::AtRule(AtRule { name, .. })] if name == "media"
        ));
    }

    #[test]
    fn test_deep_nesting_is_skipped() {
        let depth = 100_000;
        let text = format!("{}{}", "@media print {".repeat(depth), "}".repeat(depth));
        let (sheet, issues) = parse_str(&text);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("nested more than 256 levels"));
        assert_eq!(sheet.items.len(), 1);

        let text = format!("{}{}", "a {".repeat(depth), "}".repeat(depth));
        let (_, issues) = parse_str(&text);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_nesting_below_limit_is_kept() {
        let depth = MAX_NESTING;
        let text = format!("{}{}", "@media print {".repeat(depth), "}".repeat(depth));
        let (sheet, issues) = parse_str(&text);
        assert!(issues.is_empty());
        let mut levels = 0;
        let mut items = &sheet.items;
        while let [CssItem::AtRule(AtRule {
            block: AtBlock::Rules { items: inner, .. },
            ..
        })] = items.as_slice()
        {
            levels += 1;
            items = inner;
        }
        assert_eq!(levels, depth);
    }

    #[test]
    fn test_attribute_selector_comma_not_split() {
        let (sheet, _) = parse_str("a[title=\"x,y\"], :is(b, c) { d: e }");
        assert_eq!(only_rule(&sheet).selectors.len(), 2);
    }
}
