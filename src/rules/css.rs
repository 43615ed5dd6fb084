//! CSS rules

use crate::plugins::css::lexer::{CssToken, CssTokenKind};
use crate::plugins::css::node::{is_trivia, CssItem};
use crate::rule::{Emitter, RuleContext, Unit};
use crate::span::Span;

/// Units of `<length>`; other zero dimensions (`0s`, `0deg`) keep their unit
const LENGTH_UNITS: &[&str] = &[
    "cap", "ch", "cm", "cqb", "cqh", "cqi", "cqmax", "cqmin", "cqw", "dvh", "dvw", "em", "ex",
    "ic", "in", "lh", "lvh", "lvw", "mm", "pc", "pt", "px", "q", "rem", "rlh", "svh", "svw", "vb",
    "vh", "vi", "vmax", "vmin", "vw",
];

/// Contents of a string token without its quotes, with the span of the contents
pub fn string_value(token: &CssToken) -> (&str, Span) {
    let text = token.text.as_str();
    let Some(quote) = text.chars().next() else {
        return (text, token.span);
    };
    let body = &text[quote.len_utf8()..];
    let inner = match body.strip_suffix(quote) {
        Some(inner) if !body.is_empty() => inner,
        _ => body,
    };
    let start = token.span.start.advanced(&text[..quote.len_utf8()]);
    (inner, Span::covering(start, inner))
}

/// Arguments of every `url()` in a value, quoted or not
pub fn url_arguments(tokens: &[CssToken]) -> Vec<(&str, Span)> {
    let mut found = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            CssTokenKind::Url => {
                let Some(body) = token.text.get("url(".len()..) else {
                    continue;
                };
                let body = body.strip_suffix(')').unwrap_or(body);
                let url = body.trim();
                if url.is_empty() {
                    continue;
                }
                let lead = body.len() - body.trim_start().len();
                let start = token
                    .span
                    .start
                    .advanced(&token.text[.."url(".len() + lead]);
                found.push((url, Span::covering(start, url)));
            }
            CssTokenKind::Function if is_url_function(token) => {
                if let Some(arg) = next_significant(&tokens[i + 1..]) {
                    if arg.kind == CssTokenKind::String {
                        found.push(string_value(arg));
                    }
                }
            }
            _ => {}
        }
    }
    found
}

fn is_url_function(token: &CssToken) -> bool {
    token.kind == CssTokenKind::Function && token.text.eq_ignore_ascii_case("url(")
}

fn next_significant(tokens: &[CssToken]) -> Option<&CssToken> {
    tokens.iter().find(|t| !is_trivia(t))
}

fn previous_significant(tokens: &[CssToken]) -> Option<&CssToken> {
    tokens.iter().rev().find(|t| !is_trivia(t))
}

/// Split a dimension into its number and unit
fn split_dimension(text: &str) -> (&str, &str) {
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut i = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    i = digits_from(i);
    if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        i = digits_from(i + 1);
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let exponent = if matches!(bytes.get(i + 1), Some(b'+' | b'-')) {
            i + 2
        } else {
            i + 1
        };
        if bytes.get(exponent).is_some_and(u8::is_ascii_digit) {
            i = digits_from(exponent);
        }
    }
    text.split_at(i)
}

pub fn single_quotes(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    match unit {
        Unit::CssDeclaration(decl) => flag_double_quoted(out, &decl.value_tokens),
        Unit::CssStyleRule(rule) => {
            for selector in &rule.selectors {
                flag_double_quoted(out, &selector.tokens);
            }
        }
        Unit::CssAtRule(rule) if rule.name != "charset" => {
            flag_double_quoted(out, &rule.prelude_tokens)
        }
        _ => {}
    }
}

fn flag_double_quoted(out: &mut Emitter<'_>, tokens: &[CssToken]) {
    for (i, token) in tokens.iter().enumerate() {
        if token.kind != CssTokenKind::String || !token.text.starts_with('"') {
            continue;
        }
        // url() arguments are url-unquoted's concern
        if previous_significant(&tokens[..i]).is_some_and(is_url_function) {
            continue;
        }
        let (inner, _) = string_value(token);
        let diag = out.report_with(token.span, &[("quoted", token.text.as_str())]);
        if !inner.contains('\'') {
            diag.suggest("Use single quotes", &format!("'{}'", inner));
        }
    }
}

pub fn url_unquoted(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let tokens = match unit {
        Unit::CssDeclaration(decl) => &decl.value_tokens,
        Unit::CssAtRule(rule) => &rule.prelude_tokens,
        _ => return,
    };
    for (i, token) in tokens.iter().enumerate() {
        if !is_url_function(token) {
            continue;
        }
        let Some(arg) = next_significant(&tokens[i + 1..]) else {
            continue;
        };
        if arg.kind != CssTokenKind::String {
            continue;
        }
        let (inner, _) = string_value(arg);
        let diag = out.report_with(arg.span, &[("quoted", arg.text.as_str())]);
        let needs_quotes = inner
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '(' | ')'));
        if !needs_quotes {
            diag.suggest("Remove the quotes", inner);
        }
    }
}

pub fn charset_double_quotes(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::CssAtRule(rule) = unit else {
        return;
    };
    if rule.name != "charset" {
        return;
    }
    let string = rule
        .prelude_tokens
        .iter()
        .find(|t| t.kind == CssTokenKind::String);
    if let Some(token) = string.filter(|t| t.text.starts_with('\'')) {
        let (inner, _) = string_value(token);
        out.report_with(token.span, &[])
            .suggest("Use double quotes", &format!("\"{}\"", inner));
    }
}

pub fn id_class_hyphen(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::CssStyleRule(rule) = unit else {
        return;
    };
    if rule.keyframe {
        return;
    }
    for selector in &rule.selectors {
        let tokens = &selector.tokens;
        let mut in_brackets = false;
        for (i, token) in tokens.iter().enumerate() {
            match token.kind {
                CssTokenKind::BracketOpen => in_brackets = true,
                CssTokenKind::BracketClose => in_brackets = false,
                CssTokenKind::Hash if !in_brackets => {
                    flag_underscore(out, &token.text, token.span);
                }
                CssTokenKind::Delim if !in_brackets && token.text == "." => {
                    if let Some(name) = tokens.get(i + 1).filter(|n| {
                        n.kind == CssTokenKind::Ident && n.span.start == token.span.end
                    }) {
                        let text = format!(".{}", name.text);
                        flag_underscore(out, &text, token.span.to(name.span));
                    }
                }
                _ => {}
            }
        }
    }
}

fn flag_underscore(out: &mut Emitter<'_>, name: &str, span: Span) {
    if name.contains('_') {
        out.report_with(span, &[("name", name)])
            .suggest("Use hyphens", &name.replace('_', "-"));
    }
}

pub fn three_digit_hex(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::CssDeclaration(decl) = unit else {
        return;
    };
    for token in &decl.value_tokens {
        if token.kind != CssTokenKind::Hash {
            continue;
        }
        if let Some(short) = shorten_hex(&token.text[1..]) {
            let short = format!("#{}", short);
            out.report_with(token.span, &[("color", token.text.as_str()), ("short", short.as_str())])
                .suggest("Use the short form", &short);
        }
    }
}

/// `eebbcc` -> `ebc`, when every channel repeats its digit
fn shorten_hex(hex: &str) -> Option<String> {
    let digits = hex.as_bytes();
    if digits.len() != 6 || !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let reducible = digits
        .chunks(2)
        .all(|pair| pair[0].eq_ignore_ascii_case(&pair[1]));
    reducible.then(|| digits.iter().step_by(2).map(|&d| d as char).collect())
}

pub fn leading_zero(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let tokens = match unit {
        Unit::CssDeclaration(decl) => &decl.value_tokens,
        Unit::CssAtRule(rule) => &rule.prelude_tokens,
        _ => return,
    };
    for token in tokens {
        if !matches!(
            token.kind,
            CssTokenKind::Number | CssTokenKind::Percentage | CssTokenKind::Dimension
        ) {
            continue;
        }
        let text = token.text.as_str();
        let sign_len = usize::from(text.starts_with(['+', '-']));
        let (sign, magnitude) = text.split_at(sign_len);
        let has_leading_zero = magnitude.starts_with("0.")
            && magnitude.as_bytes().get(2).is_some_and(u8::is_ascii_digit);
        if has_leading_zero {
            out.report_with(token.span, &[("number", text)])
                .suggest("Remove the leading zero", &format!("{}{}", sign, &magnitude[1..]));
        }
    }
}

pub fn zero_unit(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::CssDeclaration(decl) = unit else {
        return;
    };
    // flex-basis inside the flex shorthand needs its unit in some engines
    if decl.is_custom_property() || decl.name().ends_with("flex") {
        return;
    }
    let mut depth = 0usize;
    for token in &decl.value_tokens {
        match token.kind {
            CssTokenKind::Function | CssTokenKind::ParenOpen => depth += 1,
            CssTokenKind::ParenClose => depth = depth.saturating_sub(1),
            CssTokenKind::Dimension if depth == 0 => {
                let (number, unit) = split_dimension(&token.text);
                let is_zero = number.parse::<f64>().is_ok_and(|n| n == 0.0);
                if is_zero && LENGTH_UNITS.contains(&unit.to_ascii_lowercase().as_str()) {
                    out.report_with(token.span, &[("value", token.text.as_str())])
                        .suggest("Remove the unit", "0");
                }
            }
            _ => {}
        }
    }
}

pub fn declaration_semicolon(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::CssBlock(block) = unit else {
        return;
    };
    // Only the last declaration can lack one; any other is merged into its successor
    if let Some(last) = block.declarations.last() {
        if last.semicolon.is_none() {
            out.report_with(Span::empty_at(last.span.end), &[("property", last.property.as_str())])
                .suggest("Add a semicolon", ";");
        }
    }
}

pub fn property_colon_space(cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::CssDeclaration(decl) = unit else {
        return;
    };
    let args = [("property", decl.property.as_str())];

    if decl.colon.start.offset > decl.property_span.end.offset {
        out.report_with(Span::new(decl.property_span.end, decl.colon.start), &args)
            .suggest("Remove the space before ':'", "");
    }

    let Some(value) = decl.value_span else {
        return;
    };
    let gap = Span::new(decl.colon.end, value.start);
    let spacing = cx.text(gap);
    if spacing.is_empty() {
        out.report_with(decl.colon, &args)
            .suggest("Add a space after ':'", ": ");
    } else if spacing != " " && !spacing.contains('\n') {
        out.report_with(gap, &args)
            .suggest("Use a single space", " ");
    }
}

pub fn brace_spacing(cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let (head_end, open) = match unit {
        Unit::CssStyleRule(rule) => (rule.prelude.map(|p| p.end), rule.block.open),
        Unit::CssAtRule(rule) => (
            Some(rule.prelude_span.map_or(rule.name_span.end, |p| p.end)),
            rule.block_open(),
        ),
        _ => return,
    };
    let (Some(head_end), Some(open)) = (head_end, open) else {
        return;
    };

    let gap = Span::new(head_end, open.start);
    let spacing = cx.text(gap);
    if spacing == " " {
        return;
    }
    let diag = if spacing.is_empty() {
        out.report_with(open, &[])
    } else if spacing.contains('\n') {
        out.report(gap, "Put the opening brace on the same line as the selector")
    } else {
        out.report_with(gap, &[])
    };
    diag.suggest("Use a single space", " ");
}

/// Comparison key: unprefixed name, then prefixed variants before the standard one
fn sort_key(property: &str) -> (String, bool, String) {
    let lower = property.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix('-') {
        if let Some(dash) = rest.find('-').filter(|&d| d > 0) {
            let prefix = lower[..dash + 2].to_string();
            let base = rest[dash + 1..].to_string();
            return (base, false, prefix);
        }
    }
    (lower, true, String::new())
}

pub fn alphabetical_declarations(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::CssBlock(block) = unit else {
        return;
    };
    for pair in block.declarations.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        if previous.is_custom_property() || current.is_custom_property() {
            continue;
        }
        if sort_key(&previous.property) > sort_key(&current.property) {
            out.report_with(
                current.property_span,
                &[
                    ("property", current.property.as_str()),
                    ("previous", previous.property.as_str()),
                ],
            );
        }
    }
}

pub fn type_selector_qualifier(cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::CssStyleRule(rule) = unit else {
        return;
    };
    if rule.keyframe {
        return;
    }
    for selector in &rule.selectors {
        let tokens = &selector.tokens;
        let mut in_brackets = false;
        for (i, token) in tokens.iter().enumerate() {
            match token.kind {
                CssTokenKind::BracketOpen => in_brackets = true,
                CssTokenKind::BracketClose => in_brackets = false,
                CssTokenKind::Ident if !in_brackets => {
                    let is_type = i == 0 || starts_compound(&tokens[i - 1]);
                    if !is_type {
                        continue;
                    }
                    if let Some(qualifier) = qualifier_after(tokens, i) {
                        let text = cx.text(qualifier);
                        out.report_with(
                            token.span.to(qualifier),
                            &[("name", token.text.as_str()), ("qualifier", text)],
                        )
                        .suggest("Drop the type selector", text);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Whether a token can precede the first simple selector of a compound
fn starts_compound(token: &CssToken) -> bool {
    match token.kind {
        CssTokenKind::Whitespace
        | CssTokenKind::Comment
        | CssTokenKind::Comma
        | CssTokenKind::Function
        | CssTokenKind::ParenOpen => true,
        CssTokenKind::Delim => matches!(token.text.as_str(), ">" | "+" | "~"),
        _ => false,
    }
}

/// Span of an `#id` or `.class` glued to the token at `at`
fn qualifier_after(tokens: &[CssToken], at: usize) -> Option<Span> {
    let name = &tokens[at];
    let next = tokens.get(at + 1).filter(|t| t.span.start == name.span.end)?;
    match next.kind {
        CssTokenKind::Hash => Some(next.span),
        CssTokenKind::Delim if next.text == "." => {
            let class = tokens
                .get(at + 2)
                .filter(|t| t.kind == CssTokenKind::Ident && t.span.start == next.span.end)?;
            Some(next.span.to(class.span))
        }
        _ => None,
    }
}

pub fn important(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::CssDeclaration(decl) = unit else {
        return;
    };
    if let Some(span) = decl.important {
        out.report_with(span, &[("property", decl.property.as_str())]);
    }
}

pub fn id_selector(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::CssStyleRule(rule) = unit else {
        return;
    };
    for selector in &rule.selectors {
        let mut in_brackets = false;
        for token in &selector.tokens {
            match token.kind {
                CssTokenKind::BracketOpen => in_brackets = true,
                CssTokenKind::BracketClose => in_brackets = false,
                CssTokenKind::Hash if !in_brackets => {
                    out.report_with(token.span, &[("name", token.text.as_str())]);
                }
                _ => {}
            }
        }
    }
}

pub fn declaration_newline(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::CssBlock(block) = unit else {
        return;
    };
    if block.span.start.line == block.span.end.line {
        return;
    }
    for pair in block.declarations.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        if current.span.start.line == previous.span.end.line {
            out.report_with(current.property_span, &[("property", current.property.as_str())]);
        }
    }
}

pub fn selector_newline(cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::CssStyleRule(rule) = unit else {
        return;
    };
    if rule.keyframe {
        return;
    }
    for pair in rule.selectors.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let gap = Span::new(previous.span.end, current.span.start);
        let between = cx.text(gap);
        if between.contains('\n') {
            continue;
        }
        let comma = between
            .find(',')
            .map(|idx| Span::covering(gap.start.advanced(&between[..idx]), ","))
            .unwrap_or(gap);
        out.report_with(comma, &[("selector", current.text.as_str())])
            .suggest("Break the line after the comma", ",\n");
    }
}

pub fn rule_blank_line(_cx: &RuleContext<'_>, unit: &Unit<'_>, out: &mut Emitter<'_>) {
    let Unit::CssRuleList { items, parent } = unit else {
        return;
    };
    if parent.is_some_and(|p| p.is_keyframes()) {
        return;
    }

    let mut previous: Option<&CssItem> = None;
    // Start of a comment that introduces the next rule
    let mut lead = None;
    for item in items.iter() {
        match item {
            CssItem::Comment(comment) => {
                let after_previous =
                    previous.is_some_and(|p| comment.span.start.line > p.span().end.line);
                if after_previous && lead.is_none() {
                    lead = Some(comment.span.start);
                }
            }
            CssItem::StyleRule(_) | CssItem::AtRule(_) => {
                if let Some(prev) = previous {
                    let start = lead.unwrap_or(item.span().start);
                    let statements = is_statement(prev) && is_statement(item);
                    if !statements && start.line <= prev.span().end.line + 1 {
                        out.report_with(head_span(item), &[])
                            .suggest("Insert a blank line", "\n");
                    }
                }
                previous = Some(item);
                lead = None;
            }
            CssItem::Declarations(_) => {
                previous = None;
                lead = None;
            }
        }
    }
}

fn is_statement(item: &CssItem) -> bool {
    matches!(item, CssItem::AtRule(rule) if rule.is_statement())
}

/// Selector or at-keyword that opens an item
fn head_span(item: &CssItem) -> Span {
    match item {
        CssItem::StyleRule(rule) => rule.prelude.or(rule.block.open).unwrap_or(rule.span),
        CssItem::AtRule(rule) => rule.name_span,
        other => Span::empty_at(other.span().start),
    }
}
