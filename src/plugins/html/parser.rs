//! Tolerant HTML tree construction
//!
//! A stack of open elements plus a table of implied end tags. Anything the
//! builder cannot place is reported as a [`ParseIssue`] and skipped; the
//! builder never gives up on a document. Elements opened past
//! [`MAX_DEPTH`] levels are kept as empty siblings so the tree stays shallow.

use super::lexer::{HtmlToken, HtmlTokenKind};
use super::node::{
    Attribute, CommentNode, DoctypeNode, Element, HtmlNode, QuoteStyle, TextNode,
    OPTIONAL_END_TAG, VOID_ELEMENTS,
};
use crate::plugin::ParseIssue;
use crate::span::{Position, Span};

/// Deepest element nesting kept in the tree
pub const MAX_DEPTH: usize = 512;

/// Start tags that implicitly close an open `<p>`
pub const P_CLOSERS: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "dd", "details", "dialog", "dir",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hgroup", "hr", "li", "listing", "main", "menu", "nav", "ol",
    "p", "plaintext", "pre", "search", "section", "summary", "table", "ul", "xmp",
];

const TABLE_SECTIONS: &[&str] = &["tbody", "thead", "tfoot"];

/// Whether a start tag `incoming` implicitly ends the open element `open`
fn closed_by(open: &str, incoming: &str) -> bool {
    match open {
        "li" => incoming == "li",
        "dt" | "dd" => matches!(incoming, "dt" | "dd"),
        "p" => P_CLOSERS.contains(&incoming),
        "option" => matches!(incoming, "option" | "optgroup"),
        "optgroup" => incoming == "optgroup",
        "tr" => incoming == "tr" || TABLE_SECTIONS.contains(&incoming),
        "td" | "th" => matches!(incoming, "td" | "th" | "tr") || TABLE_SECTIONS.contains(&incoming),
        "thead" | "tbody" => matches!(incoming, "tbody" | "tfoot"),
        "colgroup" => incoming != "col",
        "head" => incoming == "body",
        "rb" | "rt" | "rtc" | "rp" => matches!(incoming, "rb" | "rt" | "rtc" | "rp"),
        _ => false,
    }
}

/// Result of building the tree
pub struct ParsedHtml {
    /// Synthetic `#document` element holding the top-level nodes
    pub root: Element,
    pub issues: Vec<ParseIssue>,
}

/// Build the element tree from a token stream. `end` is the position just
/// past the last character of the file.
pub fn parse(tokens: &[HtmlToken], end: Position) -> ParsedHtml {
    let mut builder = TreeBuilder::new();
    builder.run(tokens);
    builder.finish(end)
}

struct TreeBuilder {
    stack: Vec<Element>,
    /// Names of elements opened past `MAX_DEPTH`, innermost last
    flattened: Vec<String>,
    issues: Vec<ParseIssue>,
}

fn document_root() -> Element {
    let start = Span::empty_at(Position::start());
    Element {
        name: "#document".to_string(),
        raw_name: "#document".to_string(),
        name_span: start,
        attributes: Vec::new(),
        children: Vec::new(),
        self_closing: false,
        start_tag: start,
        start_tag_end: None,
        end_tag: None,
        span: start,
    }
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![document_root()],
            flattened: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn issue(&mut self, message: String, span: Span) {
        self.issues.push(ParseIssue::new(message, span));
    }

    fn append(&mut self, node: HtmlNode) {
        if let Some(top) = self.stack.last_mut() {
            top.children.push(node);
        }
    }

    fn run(&mut self, tokens: &[HtmlToken]) {
        let mut i = 0;
        while let Some(token) = tokens.get(i) {
            match token.kind {
                HtmlTokenKind::ByteOrderMark => {}
                HtmlTokenKind::Doctype => self.append(HtmlNode::Doctype(DoctypeNode {
                    text: token.text.clone(),
                    span: token.span,
                })),
                HtmlTokenKind::Comment => {
                    if token.text.len() < 7 || !token.text.ends_with("-->") {
                        self.issue("unterminated comment".to_string(), token.span);
                    }
                    self.append(HtmlNode::Comment(CommentNode {
                        text: token.text.clone(),
                        span: token.span,
                    }));
                }
                HtmlTokenKind::CData | HtmlTokenKind::RawText => {
                    if token.kind == HtmlTokenKind::CData && !token.text.ends_with("]]>") {
                        self.issue("unterminated CDATA section".to_string(), token.span);
                    }
                    self.append(HtmlNode::Text(TextNode {
                        text: token.text.clone(),
                        span: token.span,
                        raw: true,
                    }));
                }
                HtmlTokenKind::Text | HtmlTokenKind::Whitespace => {
                    self.append(HtmlNode::Text(TextNode {
                        text: token.text.clone(),
                        span: token.span,
                        raw: false,
                    }))
                }
                HtmlTokenKind::TagOpen => {
                    i = self.start_tag(tokens, i);
                    continue;
                }
                HtmlTokenKind::TagClose => self.end_tag(token),
                HtmlTokenKind::Attribute
                | HtmlTokenKind::TagEnd
                | HtmlTokenKind::SelfClosingTagEnd
                | HtmlTokenKind::Unknown => {
                    self.issue(format!("unexpected markup '{}'", token.text), token.span);
                }
            }
            i += 1;
        }
    }

    /// Consume a start tag beginning at `tokens[i]`, returning the index of
    /// the first token after it
    fn start_tag(&mut self, tokens: &[HtmlToken], i: usize) -> usize {
        let open = &tokens[i];
        let raw_name = open.text[1..].to_string();
        let name = raw_name.to_ascii_lowercase();
        let mut name_start = open.span.start;
        name_start.advance('<');
        let name_span = Span::new(name_start, open.span.end);

        let mut attributes = Vec::new();
        let mut tag_end = None;
        let mut last = open.span.end;
        let mut j = i + 1;
        while let Some(token) = tokens.get(j) {
            match token.kind {
                HtmlTokenKind::Whitespace => {}
                HtmlTokenKind::Attribute => {
                    let attribute = self.attribute(token);
                    attributes.push(attribute);
                }
                HtmlTokenKind::Unknown => self.issue(
                    format!("unexpected '{}' in <{}> tag", token.text, name),
                    token.span,
                ),
                HtmlTokenKind::TagEnd | HtmlTokenKind::SelfClosingTagEnd => {
                    tag_end = Some(token);
                    last = token.span.end;
                    j += 1;
                    break;
                }
                _ => break,
            }
            last = token.span.end;
            j += 1;
        }

        let start_tag = Span::new(open.span.start, last);
        let self_closing = tag_end.is_some_and(|t| t.kind == HtmlTokenKind::SelfClosingTagEnd);
        if tag_end.is_none() {
            self.issue(format!("unterminated <{}> tag", name), start_tag);
        }

        self.close_implied_by(&name);

        let element = Element {
            name,
            raw_name,
            name_span,
            attributes,
            children: Vec::new(),
            self_closing,
            start_tag,
            start_tag_end: tag_end.map(|t| t.span),
            end_tag: None,
            span: start_tag,
        };

        if element.is_void() || self_closing || tag_end.is_none() {
            self.append(HtmlNode::Element(element));
        } else if self.stack.len() > MAX_DEPTH {
            if self.flattened.is_empty() {
                self.issue(
                    format!("elements nested more than {} levels deep are flattened", MAX_DEPTH),
                    element.start_tag,
                );
            }
            self.flattened.push(element.name.clone());
            self.append(HtmlNode::Element(element));
        } else {
            self.stack.push(element);
        }
        j
    }

    fn attribute(&mut self, token: &HtmlToken) -> Attribute {
        let text = token.text.as_str();
        let start = token.span.start;
        let name_len = text
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(text.len());
        let raw_name = &text[..name_len];

        let (value, value_span, quote) = match text[name_len..].trim_start().strip_prefix('=') {
            None => (None, None, QuoteStyle::Absent),
            Some(after_eq) => {
                let raw_value = after_eq.trim_start();
                let value_start = start.advanced(&text[..text.len() - raw_value.len()]);
                let value_span = Span::covering(value_start, raw_value);
                match raw_value.chars().next() {
                    Some(q @ ('"' | '\'')) => {
                        let body = &raw_value[1..];
                        let inner = match body.strip_suffix(q) {
                            Some(inner) => inner,
                            None => {
                                self.issue(
                                    format!("unterminated value for attribute '{}'", raw_name),
                                    value_span,
                                );
                                body
                            }
                        };
                        let quote = if q == '"' {
                            QuoteStyle::Double
                        } else {
                            QuoteStyle::Single
                        };
                        (Some(inner.to_string()), Some(value_span), quote)
                    }
                    _ => (
                        Some(raw_value.to_string()),
                        Some(value_span),
                        QuoteStyle::Unquoted,
                    ),
                }
            }
        };

        Attribute {
            name: raw_name.to_ascii_lowercase(),
            raw_name: raw_name.to_string(),
            name_span: Span::covering(start, raw_name),
            value,
            value_span,
            quote,
            span: token.span,
        }
    }

    fn close_implied_by(&mut self, incoming: &str) {
        while let Some(open) = self.flattened.last() {
            if !closed_by(open, incoming) {
                return;
            }
            self.flattened.pop();
        }
        while self.stack.len() > 1 {
            let open = &self.stack[self.stack.len() - 1].name;
            if !closed_by(open, incoming) {
                break;
            }
            self.close_top(None);
        }
    }

    /// Pop the innermost open element into its parent
    fn close_top(&mut self, end_tag: Option<Span>) {
        if self.stack.len() < 2 {
            return;
        }
        let Some(mut element) = self.stack.pop() else {
            return;
        };
        element.span.end = match end_tag {
            Some(tag) => tag.end,
            None => element
                .children
                .last()
                .map(|child| child.span().end)
                .unwrap_or(element.start_tag.end),
        };
        element.end_tag = end_tag;
        self.append(HtmlNode::Element(element));
    }

    fn end_tag(&mut self, token: &HtmlToken) {
        let inner = token.text.trim_start_matches("</").trim_end_matches('>');
        let name = inner
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();

        if !token.text.ends_with('>') {
            self.issue(format!("unterminated </{}> tag", name), token.span);
        }

        if VOID_ELEMENTS.contains(&name.as_str()) {
            self.issue(
                format!("void element <{}> must not have an end tag", name),
                token.span,
            );
            return;
        }

        if let Some(idx) = self.flattened.iter().rposition(|open| *open == name) {
            self.flattened.truncate(idx);
            return;
        }

        let Some(idx) = self
            .stack
            .iter()
            .rposition(|el| el.name == name)
            .filter(|&idx| idx > 0)
        else {
            self.issue(format!("unexpected closing tag </{}>", name), token.span);
            return;
        };
        self.flattened.clear();

        while self.stack.len() - 1 > idx {
            let top = &self.stack[self.stack.len() - 1];
            if !OPTIONAL_END_TAG.contains(&top.name.as_str()) {
                let message = format!("element <{}> is not closed", top.name);
                let span = top.start_tag;
                self.issue(message, span);
            }
            self.close_top(None);
        }
        self.close_top(Some(token.span));
    }

    fn finish(mut self, end: Position) -> ParsedHtml {
        while self.stack.len() > 1 {
            let top = &self.stack[self.stack.len() - 1];
            if !OPTIONAL_END_TAG.contains(&top.name.as_str()) {
                let message = format!("unclosed element <{}>", top.name);
                let span = top.start_tag;
                self.issue(message, span);
            }
            self.close_top(None);
        }

        let mut root = self.stack.pop().unwrap_or_else(document_root);
        root.span.end = end;
        ParsedHtml {
            root,
            issues: self.issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::html::lexer::tokenize;
    use crate::source::SourceText;

    fn build(text: &str) -> ParsedHtml {
        parse(&tokenize(text), SourceText::new(text).end())
    }

    fn names(el: &Element) -> Vec<String> {
        el.elements().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_nested_elements() {
        let parsed = build("<div><p>Hi</p><span>there</span></div>");
        assert!(parsed.issues.is_empty());
        let div = parsed.root.find("div").unwrap();
        assert_eq!(names(div), vec!["p", "span"]);
        assert!(div.end_tag.is_some());
    }

    #[test]
    fn test_implied_list_items() {
        let parsed = build("<ul>\n  <li>One\n  <li>Two\n</ul>");
        assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);
        let ul = parsed.root.find("ul").unwrap();
        assert_eq!(names(ul), vec!["li", "li"]);
        assert!(ul.elements().all(|li| li.end_tag.is_none()));
    }

    #[test]
    fn test_implied_table_cells() {
        let parsed = build("<table><tr><td>a<td>b<tr><td>c</table>");
        assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);
        let table = parsed.root.find("table").unwrap();
        assert_eq!(names(table), vec!["tr", "tr"]);
        let first_row = table.elements().next().unwrap();
        assert_eq!(names(first_row), vec!["td", "td"]);
    }

    #[test]
    fn test_paragraph_closed_by_block() {
        let parsed = build("<p>text<div>block</div>");
        assert!(parsed.issues.is_empty());
        assert_eq!(names(&parsed.root), vec!["p", "div"]);
    }

    #[test]
    fn test_head_closed_by_body() {
        let parsed = build("<html><head><title>x</title><body><p>y</html>");
        assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);
        let html = parsed.root.find("html").unwrap();
        assert_eq!(names(html), vec!["head", "body"]);
    }

    #[test]
    fn test_void_elements_not_pushed() {
        let parsed = build("<p>a<br>b<img src=x.png></p>");
        assert!(parsed.issues.is_empty());
        let p = parsed.root.find("p").unwrap();
        assert_eq!(names(p), vec!["br", "img"]);
    }

    #[test]
    fn test_self_closing_non_void_is_closed() {
        let parsed = build("<svg><path d=\"M0\"/></svg>");
        assert!(parsed.issues.is_empty());
        let svg = parsed.root.find("svg").unwrap();
        assert!(svg.find("path").unwrap().self_closing);
    }

    #[test]
    fn test_unexpected_closing_tag() {
        let parsed = build("<div></span></div>");
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].message, "unexpected closing tag </span>");
    }

    #[test]
    fn test_unclosed_element_reported() {
        let parsed = build("<section><div>text</section>");
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].message, "element <div> is not closed");
        let section = parsed.root.find("section").unwrap();
        assert!(section.find("div").is_some());
    }

    #[test]
    fn test_unclosed_at_eof() {
        let parsed = build("<main><p>text");
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].message, "unclosed element <main>");
    }

    #[test]
    fn test_end_tag_case_insensitive() {
        let parsed = build("<A HREF=\"#\">Home</A>");
        assert!(parsed.issues.is_empty());
        let a = parsed.root.find("a").unwrap();
        assert_eq!(a.raw_name, "A");
        assert_eq!(a.attributes[0].name, "href");
        assert_eq!(a.attributes[0].raw_name, "HREF");
    }

    #[test]
    fn test_attribute_values() {
        let parsed = build("<input type='text' value=\"a b\" size=3 disabled>");
        let input = parsed.root.find("input").unwrap();
        let quotes: Vec<_> = input.attributes.iter().map(|a| a.quote).collect();
        assert_eq!(
            quotes,
            vec![
                QuoteStyle::Single,
                QuoteStyle::Double,
                QuoteStyle::Unquoted,
                QuoteStyle::Absent
            ]
        );
        assert_eq!(input.attr_value("value"), Some("a b"));
        assert_eq!(input.attr_value("size"), Some("3"));
        assert!(input.has_attr("disabled"));
        assert_eq!(input.attr_value("disabled"), None);
    }

    #[test]
    fn test_unterminated_tag_and_comment() {
        let parsed = build("<div class=\"a\"\n<!-- open");
        let messages: Vec<_> = parsed.issues.iter().map(|i| i.message.as_str()).collect();
        assert!(messages.contains(&"unterminated <div> tag"));
        assert!(messages.contains(&"unterminated comment"));
    }

    #[test]
    fn test_children_within_parent_spans() {
        fn check(el: &Element) {
            for child in &el.children {
                assert!(el.span.contains(&child.span()), "child of <{}> escapes it", el.name);
                if let HtmlNode::Element(child) = child {
                    check(child);
                }
            }
        }
        let parsed = build("<ul><li>a<li>b</ul><p>c<div>d</div>");
        check(&parsed.root);
    }

    #[test]
    fn test_paragraph_closed_by_list_item() {
        let parsed = build("<ul><li><p>a<li>b</ul>");
        assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);
        let ul = parsed.root.find("ul").unwrap();
        assert_eq!(names(ul), vec!["li", "li"]);

        let parsed = build("<dl><dt><p>a<dd>b</dl>");
        let dl = parsed.root.find("dl").unwrap();
        assert_eq!(names(dl), vec!["dt", "dd"]);

        let parsed = build("<p>a<dialog>b</dialog>");
        assert_eq!(names(&parsed.root), vec!["p", "dialog"]);
    }

    fn depth(root: &Element) -> usize {
        let mut depth = 0;
        let mut current = root;
        while let Some(child) = current.elements().next() {
            depth += 1;
            current = child;
        }
        depth
    }

    #[test]
    fn test_deep_nesting_is_flattened() {
        let levels = 100_000;
        let text = format!("{}{}", "<div>".repeat(levels), "</div>".repeat(levels));
        let parsed = build(&text);
        assert_eq!(parsed.issues.len(), 1);
        assert!(parsed.issues[0].message.contains("more than 512 levels"));
        assert_eq!(depth(&parsed.root), MAX_DEPTH + 1);

        let innermost = (0..MAX_DEPTH - 1).fold(parsed.root.find("div").unwrap(), |el, _| {
            el.elements().next().unwrap()
        });
        assert_eq!(innermost.elements().count(), levels - MAX_DEPTH);
        assert!(innermost.end_tag.is_some());
    }

    #[test]
    fn test_nesting_at_limit_is_kept() {
        let text = format!("{}{}", "<div>".repeat(MAX_DEPTH), "</div>".repeat(MAX_DEPTH));
        let parsed = build(&text);
        assert!(parsed.issues.is_empty());
        assert_eq!(depth(&parsed.root), MAX_DEPTH);
    }

    #[test]
    fn test_void_end_tag() {
        let parsed = build("<p>a<br></br></p>");
        assert_eq!(parsed.issues.len(), 1);
        assert!(parsed.issues[0].message.contains("<br>"));
    }
}
