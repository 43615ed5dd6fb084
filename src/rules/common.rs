//! Rules over raw text and rules shared by HTML and CSS

use super::css::{string_value, url_arguments};
use crate::plugins::css::lexer::{CssToken, CssTokenKind};
use crate::rule::{Emitter, RuleContext, Unit};
use crate::span::{Position, Span};

const BOM: char = '\u{FEFF}';

/// Elements whose names and attributes are case-sensitive
const FOREIGN_ROOTS: &[&str] = &["svg", "math"];

pub fn utf8_no_bom(cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    if !matches!(unit, Unit::Source) {
        return;
    }
    if cx.source().as_str().starts_with(BOM) {
        let span = Span::covering(Position::start(), "\u{FEFF}");
        out.report_with(span, &[])
            .suggest("Remove the byte order mark", "");
    }
}

pub fn indentation(cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    if !matches!(unit, Unit::Source) {
        return;
    }
    let document = cx.document();
    let source = cx.source();

    for (number, line) in source.lines() {
        if document.verbatim_lines().contains(&number) || document.comment_lines().contains(&number)
        {
            continue;
        }
        let content = line.trim_start_matches([' ', '\t']);
        let indent = &line[..line.len() - content.len()];
        // Whitespace-only lines belong to trailing-whitespace
        if indent.is_empty() || content.is_empty() {
            continue;
        }
        let Some(start) = source.line_start(number) else {
            continue;
        };
        let span = Span::covering(start, indent);

        if indent.contains('\t') {
            out.report(span, "Indent with spaces, not tabs")
                .suggest("Replace each tab with two spaces", &indent.replace('\t', "  "));
        } else if indent.len() % 2 != 0 {
            let count = indent.len().to_string();
            out.report_with(span, &[("count", count.as_str())])
                .suggest("Indent by an even number of spaces", &" ".repeat(indent.len() - 1));
        }
    }
}

pub fn trailing_whitespace(cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    if !matches!(unit, Unit::Source) {
        return;
    }
    let source = cx.source();
    for (number, line) in source.lines() {
        if cx.document().verbatim_lines().contains(&number) {
            continue;
        }
        let kept = line.trim_end_matches([' ', '\t']);
        if kept.len() == line.len() {
            continue;
        }
        let Some(start) = source.line_start(number) else {
            continue;
        };
        let span = Span::covering(start.advanced(kept), &line[kept.len()..]);
        out.report_with(span, &[])
            .suggest("Remove trailing whitespace", "");
    }
}

pub fn lowercase(cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    match unit {
        Unit::HtmlElement { element, ancestors } => {
            let foreign = FOREIGN_ROOTS.contains(&element.name.as_str())
                || ancestors
                    .iter()
                    .any(|a| FOREIGN_ROOTS.contains(&a.name.as_str()));
            if foreign {
                return;
            }
            flag_uppercase(out, &element.raw_name, element.name_span);
            for attr in &element.attributes {
                flag_uppercase(out, &attr.raw_name, attr.name_span);
            }
        }
        Unit::CssStyleRule(rule) => {
            for selector in &rule.selectors {
                lowercase_selector(out, &selector.tokens);
            }
        }
        Unit::CssAtRule(rule) => {
            flag_uppercase(out, cx.text(rule.name_span), rule.name_span);
            lowercase_value(out, &rule.prelude_tokens);
        }
        Unit::CssDeclaration(decl) => {
            if decl.is_custom_property() {
                return;
            }
            flag_uppercase(out, &decl.property, decl.property_span);
            if decl.name() != "unicode-range" {
                lowercase_value(out, &decl.value_tokens);
            }
            if let Some(important) = decl.important {
                flag_uppercase(out, cx.text(important), important);
            }
        }
        _ => {}
    }
}

fn flag_uppercase(out: &mut Emitter<'_>, text: &str, span: Span) {
    if text.chars().any(char::is_uppercase) {
        out.report_with(span, &[("text", text)])
            .suggest("Convert to lowercase", &text.to_lowercase());
    }
}

/// Names in a selector, skipping attribute values
fn lowercase_selector(out: &mut Emitter<'_>, tokens: &[CssToken]) {
    let mut in_brackets = false;
    let mut after_operator = false;
    for token in tokens {
        match token.kind {
            CssTokenKind::BracketOpen => {
                in_brackets = true;
                after_operator = false;
            }
            CssTokenKind::BracketClose => in_brackets = false,
            CssTokenKind::Delim if in_brackets && token.text == "=" => after_operator = true,
            CssTokenKind::Ident | CssTokenKind::Hash | CssTokenKind::Function
                if !(in_brackets && after_operator) =>
            {
                flag_uppercase(out, &token.text, token.span)
            }
            _ => {}
        }
    }
}

/// Keywords, colors, units and function names of a value
fn lowercase_value(out: &mut Emitter<'_>, tokens: &[CssToken]) {
    for token in tokens {
        if matches!(
            token.kind,
            CssTokenKind::Ident
                | CssTokenKind::Hash
                | CssTokenKind::Function
                | CssTokenKind::Dimension
        ) {
            flag_uppercase(out, &token.text, token.span);
        }
    }
}

pub fn protocol_relative_url(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    match unit {
        Unit::HtmlElement { element, .. } => {
            for attr in &element.attributes {
                let is_resource =
                    attr.name == "src" || (attr.name == "href" && element.name == "link");
                if !is_resource {
                    continue;
                }
                if let (Some(value), Some(span)) = (attr.value.as_deref(), attr.inner_value_span()) {
                    check_scheme(out, value, span);
                }
            }
        }
        Unit::CssDeclaration(decl) => {
            for (url, span) in url_arguments(&decl.value_tokens) {
                check_scheme(out, url, span);
            }
        }
        Unit::CssAtRule(rule) if rule.name == "import" => {
            for (url, span) in url_arguments(&rule.prelude_tokens) {
                check_scheme(out, url, span);
            }
            let first = rule.prelude_tokens.iter().find(|t| t.kind != CssTokenKind::Whitespace);
            if let Some(token) = first.filter(|t| t.kind == CssTokenKind::String) {
                let (url, span) = string_value(token);
                check_scheme(out, url, span);
            }
        }
        _ => {}
    }
}

fn check_scheme(out: &mut Emitter<'_>, url: &str, span: Span) {
    let lower = url.to_ascii_lowercase();
    let scheme_len = if lower.starts_with("https://") {
        "https:".len()
    } else if lower.starts_with("http://") {
        "http:".len()
    } else {
        return;
    };
    out.report_with(span, &[("url", url)])
        .suggest("Drop the scheme", &url[scheme_len..]);
}

pub fn todo_format(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let (text, span) = match unit {
        Unit::HtmlComment(comment) => (comment.text.as_str(), comment.span),
        Unit::CssComment(comment) => (comment.text.as_str(), comment.span),
        _ => return,
    };

    for (idx, keyword) in text.match_indices("TODO") {
        let before = text[..idx].chars().next_back();
        let after = &text[idx + keyword.len()..];
        if before.is_some_and(|c| c.is_alphanumeric() || c == '_')
            || after.starts_with(|c: char| c.is_alphanumeric() || c == '_')
        {
            continue;
        }
        let has_contact = after
            .strip_prefix('(')
            .and_then(|rest| rest.find(')'))
            .is_some_and(|close| close > 0);
        if has_contact {
            continue;
        }
        let start = span.start.advanced(&text[..idx]);
        out.report_with(Span::covering(start, keyword), &[]);
    }
}
