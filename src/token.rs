//! Token type shared by the HTML and CSS lexers, plus the character cursor
//! both lexers are built on.

use crate::span::{Position, Span};

/// A lexed token: its kind, the exact source text and where it sits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<K> {
    pub kind: K,
    pub text: String,
    pub span: Span,
}

/// Concatenate the raw text of a token sequence
pub fn reconstruct<K>(tokens: &[Token<K>]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

/// Character cursor tracking line/column as it moves
///
/// `origin` lets a lexer run over a slice of a larger file (e.g. a `<style>`
/// element) while still producing positions in the host file.
pub struct Cursor<'a> {
    source: &'a str,
    base: usize,
    pos: Position,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_origin(source, Position::start())
    }

    pub fn with_origin(source: &'a str, origin: Position) -> Self {
        Self {
            source,
            base: origin.offset,
            pos: origin,
        }
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    fn local(&self) -> usize {
        self.pos.offset - self.base
    }

    /// Remaining unconsumed input
    pub fn rest(&self) -> &'a str {
        &self.source[self.local()..]
    }

    pub fn is_eof(&self) -> bool {
        self.local() >= self.source.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos.advance(ch);
        Some(ch)
    }

    pub fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos.advance(ch);
        }
    }

    /// Consume `text` if the input starts with it
    pub fn eat(&mut self, text: &str) -> bool {
        if self.starts_with(text) {
            self.pos = self.pos.advanced(text);
            true
        } else {
            false
        }
    }

    pub fn starts_with(&self, text: &str) -> bool {
        self.rest().starts_with(text)
    }

    pub fn starts_with_ignore_case(&self, text: &str) -> bool {
        self.rest()
            .get(..text.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(text))
    }

    /// Text consumed since `start`
    pub fn slice_from(&self, start: Position) -> &'a str {
        &self.source[start.offset - self.base..self.local()]
    }

    /// Build a token from everything consumed since `start`
    pub fn token<K>(&self, kind: K, start: Position) -> Token<K> {
        Token {
            kind,
            text: self.slice_from(start).to_string(),
            span: Span::new(start, self.pos),
        }
    }
}
