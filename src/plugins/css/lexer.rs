//! CSS tokenizer
//!
//! Follows the token shapes of CSS Syntax Level 3 closely enough to tell
//! numbers, dimensions, hashes, strings, `url(...)`, functions and
//! at-keywords apart. Never fails: malformed input becomes `BadString` or
//! `Unknown` tokens.

use crate::span::Position;
use crate::token::{Cursor, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CssTokenKind {
    ByteOrderMark,
    Whitespace,
    Comment,
    Ident,
    /// Function name including the opening parenthesis, e.g. `rgb(`
    Function,
    AtKeyword,
    Hash,
    String,
    /// Unquoted `url(...)`
    Url,
    Number,
    Percentage,
    Dimension,
    Colon,
    Semicolon,
    Comma,
    BraceOpen,
    BraceClose,
    ParenOpen,
    ParenClose,
    BracketOpen,
    BracketClose,
    Delim,
    /// `<!--`
    Cdo,
    /// `-->`
    Cdc,
    /// String interrupted by a newline or the end of input
    BadString,
    Unknown,
}

pub type CssToken = Token<CssTokenKind>;

/// Tokenize a standalone stylesheet
pub fn tokenize(text: &str) -> Vec<CssToken> {
    Lexer::new(Cursor::new(text)).run()
}

/// Tokenize a stylesheet embedded in another file, starting at `origin`
pub fn tokenize_at(text: &str, origin: Position) -> Vec<CssToken> {
    Lexer::new(Cursor::with_origin(text, origin)).run()
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}

fn is_valid_escape(first: Option<char>, second: Option<char>) -> bool {
    first == Some('\\') && second.is_some_and(|c| c != '\n')
}

struct Lexer<'a> {
    cursor: Cursor<'a>,
    tokens: Vec<CssToken>,
}

impl<'a> Lexer<'a> {
    fn new(cursor: Cursor<'a>) -> Self {
        Self {
            cursor,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<CssToken> {
        if self.cursor.peek() == Some('\u{FEFF}') {
            let start = self.cursor.position();
            self.cursor.bump();
            self.push(CssTokenKind::ByteOrderMark, start);
        }

        while let Some(c) = self.cursor.peek() {
            let start = self.cursor.position();
            let kind = self.next_kind(c);
            self.push(kind, start);
        }
        self.tokens
    }

    fn push(&mut self, kind: CssTokenKind, start: Position) {
        let token = self.cursor.token(kind, start);
        self.tokens.push(token);
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.cursor.peek_nth(n)
    }

    /// Consume one token starting with `c` and return its kind
    fn next_kind(&mut self, c: char) -> CssTokenKind {
        use CssTokenKind::*;

        if c.is_whitespace() {
            self.cursor.bump_while(char::is_whitespace);
            return Whitespace;
        }
        if self.cursor.starts_with("/*") {
            self.cursor.eat("/*");
            while !self.cursor.is_eof() && !self.cursor.eat("*/") {
                self.cursor.bump();
            }
            return Comment;
        }
        if self.cursor.eat("<!--") {
            return Cdo;
        }
        if self.cursor.eat("-->") {
            return Cdc;
        }
        if self.starts_number(0) {
            return self.number();
        }
        if self.starts_ident(0) {
            return self.ident_like();
        }

        match c {
            '"' | '\'' => self.string(c),
            '#' if self.peek(1).is_some_and(is_name_char)
                || is_valid_escape(self.peek(1), self.peek(2)) =>
            {
                self.cursor.bump();
                self.name();
                Hash
            }
            '@' if self.starts_ident(1) => {
                self.cursor.bump();
                self.name();
                AtKeyword
            }
            _ => {
                self.cursor.bump();
                match c {
                    ':' => Colon,
                    ';' => Semicolon,
                    ',' => Comma,
                    '{' => BraceOpen,
                    '}' => BraceClose,
                    '(' => ParenOpen,
                    ')' => ParenClose,
                    '[' => BracketOpen,
                    ']' => BracketClose,
                    '\\' => Unknown,
                    c if c.is_control() => Unknown,
                    _ => Delim,
                }
            }
        }
    }

    fn starts_ident(&self, n: usize) -> bool {
        match self.peek(n) {
            Some('-') => match self.peek(n + 1) {
                Some(c) if is_name_start(c) || c == '-' => true,
                first => is_valid_escape(first, self.peek(n + 2)),
            },
            Some('\\') => is_valid_escape(Some('\\'), self.peek(n + 1)),
            Some(c) => is_name_start(c),
            None => false,
        }
    }

    fn starts_number(&self, n: usize) -> bool {
        let digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
        match self.peek(n) {
            Some('+' | '-') => {
                digit(self.peek(n + 1)) || (self.peek(n + 1) == Some('.') && digit(self.peek(n + 2)))
            }
            Some('.') => digit(self.peek(n + 1)),
            c => digit(c),
        }
    }

    fn name(&mut self) {
        loop {
            match self.peek(0) {
                Some('\\') if is_valid_escape(Some('\\'), self.peek(1)) => {
                    self.cursor.bump();
                    self.cursor.bump();
                }
                Some(c) if is_name_char(c) => {
                    self.cursor.bump();
                }
                _ => break,
            }
        }
    }

    fn number(&mut self) -> CssTokenKind {
        let digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
        if matches!(self.peek(0), Some('+' | '-')) {
            self.cursor.bump();
        }
        self.cursor.bump_while(|c| c.is_ascii_digit());
        if self.peek(0) == Some('.') && digit(self.peek(1)) {
            self.cursor.bump();
            self.cursor.bump_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(0), Some('e' | 'E'))
            && (digit(self.peek(1))
                || (matches!(self.peek(1), Some('+' | '-')) && digit(self.peek(2))))
        {
            self.cursor.bump();
            self.cursor.bump();
            self.cursor.bump_while(|c| c.is_ascii_digit());
        }

        if self.cursor.eat("%") {
            CssTokenKind::Percentage
        } else if self.starts_ident(0) {
            self.name();
            CssTokenKind::Dimension
        } else {
            CssTokenKind::Number
        }
    }

    fn ident_like(&mut self) -> CssTokenKind {
        let start = self.cursor.position();
        self.name();
        if self.peek(0) != Some('(') {
            return CssTokenKind::Ident;
        }

        let is_url = self.cursor.slice_from(start).eq_ignore_ascii_case("url");
        self.cursor.bump();
        if !is_url {
            return CssTokenKind::Function;
        }

        let arg = self.cursor.rest().trim_start();
        if arg.starts_with('"') || arg.starts_with('\'') {
            return CssTokenKind::Function;
        }

        while let Some(c) = self.cursor.bump() {
            if c == ')' {
                break;
            }
        }
        CssTokenKind::Url
    }

    fn string(&mut self, quote: char) -> CssTokenKind {
        self.cursor.bump();
        loop {
            match self.peek(0) {
                None | Some('\n') => return CssTokenKind::BadString,
                Some('\\') => {
                    self.cursor.bump();
                    self.cursor.bump();
                }
                Some(c) => {
                    self.cursor.bump();
                    if c == quote {
                        return CssTokenKind::String;
                    }
                }
            }
        }
    }
}
