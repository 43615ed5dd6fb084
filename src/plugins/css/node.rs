//! CSS stylesheet model

use super::lexer::{CssToken, CssTokenKind};
use crate::span::Span;

/// At-rules whose block holds declarations rather than rules
pub const DECLARATION_AT_RULES: &[&str] = &[
    "font-face",
    "page",
    "viewport",
    "counter-style",
    "property",
    "font-palette-values",
];

/// At-rules that end with `;` instead of a block
pub const STATEMENT_AT_RULES: &[&str] = &["charset", "import", "namespace"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stylesheet {
    pub items: Vec<CssItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssItem {
    StyleRule(StyleRule),
    AtRule(AtRule),
    /// Declarations outside any braces, e.g. a fragment `color: red;`
    Declarations(DeclarationBlock),
    Comment(CssComment),
}

impl CssItem {
    pub fn span(&self) -> Span {
        match self {
            CssItem::StyleRule(rule) => rule.span,
            CssItem::AtRule(rule) => rule.span,
            CssItem::Declarations(block) => block.span,
            CssItem::Comment(comment) => comment.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssComment {
    /// Raw text including `/*` and `*/`
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub text: String,
    pub span: Span,
    pub tokens: Vec<CssToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub selectors: Vec<Selector>,
    /// Everything before `{`, trimmed; `None` when the prelude is empty
    pub prelude: Option<Span>,
    pub block: DeclarationBlock,
    /// Keyframe selector (`from`, `50%`) inside `@keyframes`
    pub keyframe: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtBlock {
    /// Statement at-rule ending in `;` (or unterminated)
    None,
    Declarations(DeclarationBlock),
    Rules {
        open: Span,
        close: Option<Span>,
        items: Vec<CssItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    /// Lowercased name without `@`
    pub name: String,
    /// Span of the `@keyword` token
    pub name_span: Span,
    /// Prelude text, trimmed
    pub prelude: String,
    pub prelude_span: Option<Span>,
    pub prelude_tokens: Vec<CssToken>,
    pub block: AtBlock,
    pub span: Span,
}

impl AtRule {
    pub fn is_keyframes(&self) -> bool {
        self.name.ends_with("keyframes")
    }

    pub fn is_statement(&self) -> bool {
        matches!(self.block, AtBlock::None)
    }

    /// Span of the `{` opening the block, if any
    pub fn block_open(&self) -> Option<Span> {
        match &self.block {
            AtBlock::None => None,
            AtBlock::Declarations(block) => block.open,
            AtBlock::Rules { open, .. } => Some(*open),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationBlock {
    /// `None` for a bare declaration list
    pub open: Option<Span>,
    pub close: Option<Span>,
    pub declarations: Vec<Declaration>,
    pub comments: Vec<CssComment>,
    /// Nested style rules and conditional at-rules
    pub nested: Vec<CssItem>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Property name as written
    pub property: String,
    pub property_span: Span,
    pub colon: Span,
    /// Value text without `!important`, trimmed
    pub value: String,
    pub value_span: Option<Span>,
    pub value_tokens: Vec<CssToken>,
    pub important: Option<Span>,
    pub semicolon: Option<Span>,
    /// From the property through the value (or `!important`), excluding `;`
    pub span: Span,
}

impl Declaration {
    pub fn is_custom_property(&self) -> bool {
        self.property.starts_with("--")
    }

    /// Lowercased property name
    pub fn name(&self) -> String {
        self.property.to_ascii_lowercase()
    }
}

/// Whether a token carries no meaning for the structure
pub fn is_trivia(token: &CssToken) -> bool {
    matches!(token.kind, CssTokenKind::Whitespace | CssTokenKind::Comment)
}

/// Strip leading and trailing whitespace and comments
pub fn trim_trivia(tokens: &[CssToken]) -> &[CssToken] {
    let start = tokens
        .iter()
        .position(|t| !is_trivia(t))
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|t| !is_trivia(t))
        .map_or(start, |i| i + 1);
    &tokens[start..end]
}

/// Span covering a non-empty token slice
pub fn tokens_span(tokens: &[CssToken]) -> Option<Span> {
    let first = tokens.first()?;
    let last = tokens.last()?;
    Some(Span::new(first.span.start, last.span.end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::css::lexer::tokenize;

    #[test]
    fn test_trim_trivia() {
        let tokens = tokenize("  /* c */ a b  ");
        let trimmed = trim_trivia(&tokens);
        assert_eq!(trimmed.len(), 3);
        assert_eq!(trimmed[0].text, "a");
        assert_eq!(trimmed[2].text, "b");
    }

    #[test]
    fn test_trim_all_trivia() {
        let tokens = tokenize("  /* c */ ");
        assert!(trim_trivia(&tokens).is_empty());
        assert!(tokens_span(trim_trivia(&tokens)).is_none());
    }
}
