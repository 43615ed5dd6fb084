//! HTML tokenizer
//!
//! Total over any input: every character lands in exactly one token, so
//! concatenating the token texts reproduces the source.

use crate::token::{Cursor, Token};

/// Elements whose content is not markup
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements whose content is not markup but may hold character references
pub const ESCAPABLE_RAW_TEXT_ELEMENTS: &[&str] = &["textarea", "title"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HtmlTokenKind {
    ByteOrderMark,
    /// `<!doctype ...>`
    Doctype,
    /// `<` followed by the tag name
    TagOpen,
    /// `name`, `name=value`, `name="value"`
    Attribute,
    /// `>` closing a start tag
    TagEnd,
    /// `/>` closing a start tag
    SelfClosingTagEnd,
    /// A whole end tag, `</name>`
    TagClose,
    Text,
    /// Content of a raw-text element
    RawText,
    Comment,
    CData,
    /// Whitespace inside a tag
    Whitespace,
    Unknown,
}

pub type HtmlToken = Token<HtmlTokenKind>;

/// Tokenize an HTML document
pub fn tokenize(text: &str) -> Vec<HtmlToken> {
    Lexer::new(text).run()
}

struct Lexer<'a> {
    cursor: Cursor<'a>,
    tokens: Vec<HtmlToken>,
    /// Element whose end tag closes the current raw text, and the token kind of that text
    raw_text_end: Option<(String, HtmlTokenKind)>,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            cursor: Cursor::new(text),
            tokens: Vec::new(),
            raw_text_end: None,
        }
    }

    fn run(mut self) -> Vec<HtmlToken> {
        if self.cursor.peek() == Some('\u{FEFF}') {
            let start = self.cursor.position();
            self.cursor.bump();
            self.push(HtmlTokenKind::ByteOrderMark, start);
        }

        while !self.cursor.is_eof() {
            if let Some((name, kind)) = self.raw_text_end.take() {
                self.lex_raw_text(&name, kind);
                continue;
            }

            let next = self.cursor.peek_nth(1);
            if self.cursor.starts_with("<!--") {
                self.lex_delimited("<!--", "-->", HtmlTokenKind::Comment);
            } else if self.cursor.starts_with_ignore_case("<!doctype") {
                self.lex_until_gt(HtmlTokenKind::Doctype);
            } else if self.cursor.starts_with("<![CDATA[") {
                self.lex_delimited("<![CDATA[", "]]>", HtmlTokenKind::CData);
            } else if self.cursor.starts_with("</")
                && self
                    .cursor
                    .peek_nth(2)
                    .is_some_and(|c| c.is_ascii_alphabetic())
            {
                self.lex_end_tag();
            } else if self.cursor.peek() == Some('<')
                && next.is_some_and(|c| c.is_ascii_alphabetic())
            {
                self.lex_start_tag();
            } else if self.cursor.peek() == Some('<') && matches!(next, Some('!' | '?' | '/')) {
                // Bogus comment (`<?xml ...?>`, `<!foo>`, `</ >`)
                self.lex_until_gt(HtmlTokenKind::Unknown);
            } else {
                self.lex_text();
            }
        }

        self.tokens
    }

    fn push(&mut self, kind: HtmlTokenKind, start: crate::span::Position) {
        let token = self.cursor.token(kind, start);
        self.tokens.push(token);
    }

    fn at_markup(&self) -> bool {
        self.cursor.peek() == Some('<')
            && self
                .cursor
                .peek_nth(1)
                .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
    }

    fn lex_text(&mut self) {
        let start = self.cursor.position();
        // Always make progress, even over a lone '<'
        self.cursor.bump();
        while !self.cursor.is_eof() && !self.at_markup() {
            self.cursor.bump();
        }
        self.push(HtmlTokenKind::Text, start);
    }

    fn lex_until_gt(&mut self, kind: HtmlTokenKind) {
        let start = self.cursor.position();
        while let Some(c) = self.cursor.bump() {
            if c == '>' {
                break;
            }
        }
        self.push(kind, start);
    }

    fn lex_delimited(&mut self, open: &str, close: &str, kind: HtmlTokenKind) {
        let start = self.cursor.position();
        self.cursor.eat(open);
        while !self.cursor.is_eof() {
            if self.cursor.eat(close) {
                break;
            }
            self.cursor.bump();
        }
        self.push(kind, start);
    }

    fn lex_start_tag(&mut self) {
        let start = self.cursor.position();
        self.cursor.bump();
        self.cursor
            .bump_while(|c| !c.is_whitespace() && !matches!(c, '/' | '>' | '<'));
        let name = self.cursor.slice_from(start)[1..].to_ascii_lowercase();
        self.push(HtmlTokenKind::TagOpen, start);

        loop {
            let start = self.cursor.position();
            match self.cursor.peek() {
                None | Some('<') => break,
                Some(c) if c.is_whitespace() => {
                    self.cursor.bump_while(char::is_whitespace);
                    self.push(HtmlTokenKind::Whitespace, start);
                }
                Some('>') => {
                    self.cursor.bump();
                    self.push(HtmlTokenKind::TagEnd, start);
                    if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                        self.raw_text_end = Some((name, HtmlTokenKind::RawText));
                    } else if ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                        self.raw_text_end = Some((name, HtmlTokenKind::Text));
                    }
                    break;
                }
                Some('/') if self.cursor.peek_nth(1) == Some('>') => {
                    self.cursor.eat("/>");
                    self.push(HtmlTokenKind::SelfClosingTagEnd, start);
                    break;
                }
                Some(q @ ('"' | '\'')) => {
                    self.cursor.bump();
                    self.bump_quoted(q);
                    self.push(HtmlTokenKind::Unknown, start);
                }
                Some('/' | '=') => {
                    self.cursor.bump();
                    self.push(HtmlTokenKind::Unknown, start);
                }
                Some(_) => self.lex_attribute(),
            }
        }
    }

    fn bump_quoted(&mut self, quote: char) {
        while let Some(c) = self.cursor.bump() {
            if c == quote {
                break;
            }
        }
    }

    fn lex_attribute(&mut self) {
        let start = self.cursor.position();
        self.cursor.bump_while(|c| {
            !c.is_whitespace() && !matches!(c, '/' | '>' | '=' | '<' | '"' | '\'')
        });

        if self.cursor.rest().trim_start().starts_with('=') {
            self.cursor.bump_while(char::is_whitespace);
            self.cursor.bump();
            self.cursor.bump_while(char::is_whitespace);
            match self.cursor.peek() {
                Some(q @ ('"' | '\'')) => {
                    self.cursor.bump();
                    self.bump_quoted(q);
                }
                Some(c) if c != '>' => {
                    self.cursor.bump_while(|c| !c.is_whitespace() && c != '>');
                }
                _ => {}
            }
        }

        self.push(HtmlTokenKind::Attribute, start);
    }

    fn lex_end_tag(&mut self) {
        let start = self.cursor.position();
        self.cursor.eat("</");
        self.cursor.bump_while(|c| c != '>' && c != '<');
        self.cursor.eat(">");
        self.push(HtmlTokenKind::TagClose, start);
    }

    fn lex_raw_text(&mut self, name: &str, kind: HtmlTokenKind) {
        let start = self.cursor.position();
        let closing = format!("</{}", name);
        while !self.cursor.is_eof() {
            if self.cursor.starts_with_ignore_case(&closing) {
                let after = self.cursor.peek_nth(closing.chars().count());
                if after.is_none_or(|c| c.is_whitespace() || c == '/' || c == '>') {
                    break;
                }
            }
            self.cursor.bump();
        }
        if self.cursor.position() != start {
            self.push(kind, start);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::reconstruct;
    use HtmlTokenKind::*;

    fn kinds(text: &str) -> Vec<HtmlTokenKind> {
        tokenize(text).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_element() {
        assert_eq!(
            kinds(r##"<a href="#">Home</a>"##),
            vec![TagOpen, Whitespace, Attribute, TagEnd, Text, TagClose]
        );
    }

    #[test]
    fn test_doctype_and_comment() {
        assert_eq!(
            kinds("<!DOCTYPE html>\n<!-- hi -->"),
            vec![Doctype, Text, Comment]
        );
    }

    #[test]
    fn test_self_closing() {
        assert_eq!(kinds("<br/>"), vec![TagOpen, SelfClosingTagEnd]);
        assert_eq!(kinds("<br />"), vec![TagOpen, Whitespace, SelfClosingTagEnd]);
    }

    #[test]
    fn test_raw_text_mode() {
        let tokens = tokenize("<script>if (a < b) { x = '</div>'; }</script>");
        let raw: Vec<_> = tokens.iter().filter(|t| t.kind == RawText).collect();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].text, "if (a < b) { x = '</div>'; }");
        assert_eq!(tokens.last().unwrap().kind, TagClose);
    }

    #[test]
    fn test_raw_text_end_tag_case_insensitive() {
        let tokens = tokenize("<style>a{}</STYLE>");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TagOpen, TagEnd, RawText, TagClose]
        );
    }

    #[test]
    fn test_escapable_raw_text() {
        let tokens = tokenize("<title>Fish &amp; <Chips></title>");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TagOpen, TagEnd, Text, TagClose]
        );
        assert_eq!(tokens[2].text, "Fish &amp; <Chips>");

        let tokens = tokenize("<textarea><p>x</p></textarea>");
        assert_eq!(tokens[2].kind, Text);
        assert_eq!(tokens[2].text, "<p>x</p>");
    }

    #[test]
    fn test_attribute_forms() {
        let tokens = tokenize("<input disabled value = 'x' size=10>");
        let attrs: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == Attribute)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(attrs, vec!["disabled", "value = 'x'", "size=10"]);
    }

    #[test]
    fn test_unknown_in_tag() {
        assert_eq!(
            kinds(r#"<a "x">"#),
            vec![TagOpen, Whitespace, Unknown, TagEnd]
        );
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        assert_eq!(kinds("a < b"), vec![Text]);
    }

    #[test]
    fn test_bom() {
        let tokens = tokenize("\u{FEFF}<p>");
        assert_eq!(tokens[0].kind, ByteOrderMark);
        assert_eq!(tokens[1].span.start.column, 2);
    }

    #[test]
    fn test_unterminated_constructs_round_trip() {
        for input in [
            "<!-- never closed",
            "<a href=\"x",
            "<div",
            "</div",
            "<![CDATA[ x",
            "<?xml version=\"1.0\"?>",
            "<p>héllo</p>\r\n",
            "<>",
            "<a / b=c>",
        ] {
            assert_eq!(reconstruct(&tokenize(input)), input, "input: {input:?}");
        }
    }

    #[test]
    fn test_spans_are_contiguous() {
        let tokens = tokenize("<div class=\"a\">\n  <p>text</p>\n</div>");
        for pair in tokens.windows(2) {
            assert_eq!(pair[0].span.end, pair[1].span.start);
        }
    }
}
