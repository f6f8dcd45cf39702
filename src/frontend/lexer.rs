use tracing::trace;

use crate::bytecode::op::{ControlRole, TERMINATOR, lookup_control};
use crate::frontend::token::{Span, Token, TokenKind};

/// Pull-based scanner over one automaton program.
///
/// Each call to [`Lexer::next_token`] skips whitespace and `;` comments and
/// classifies the next lexeme. Token text is capped at `max_token_len`
/// characters; the remainder of an overlong lexeme is consumed and dropped.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    max_token_len: usize,
}

impl Lexer {
    pub fn new(source: &str, max_token_len: usize) -> Self {
        Lexer {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            max_token_len: max_token_len.max(1),
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if ch == Some('\n') {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.pos += 1;
        ch
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
        }
    }

    /// Whitespace and comments (`;` to end of line), in any interleaving.
    fn skip_trivia(&mut self) {
        loop {
            while let Some(ch) = self.current() {
                if ch.is_whitespace() {
                    self.advance();
                } else {
                    break;
                }
            }
            if self.current() == Some(';') {
                while let Some(ch) = self.current() {
                    if ch == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn push_bounded(&self, text: &mut String, len: &mut usize, ch: char) {
        if *len < self.max_token_len {
            text.push(ch);
        }
        *len += 1;
    }

    /// One leading character of any class, then a run matching `pred`.
    fn scan_run(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        let mut len = 0;
        if let Some(first) = self.advance() {
            self.push_bounded(&mut text, &mut len, first);
        }
        while let Some(ch) = self.current() {
            if !pred(ch) {
                break;
            }
            self.advance();
            self.push_bounded(&mut text, &mut len, ch);
        }
        if len > self.max_token_len {
            trace!(len, max = self.max_token_len, "token truncated");
        }
        text
    }

    fn scan_alnum(&mut self) -> String {
        self.scan_run(|c| c.is_ascii_alphanumeric())
    }

    fn read_number(&mut self) -> (TokenKind, String) {
        let mut text = self.scan_run(|c| c.is_ascii_digit());
        let mut len = text.chars().count();

        // A fraction needs at least one digit after the point.
        let has_fraction = self.current() == Some('.')
            && self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false);
        if !has_fraction {
            return (TokenKind::Int, text);
        }

        self.advance();
        self.push_bounded(&mut text, &mut len, '.');
        while let Some(ch) = self.current() {
            if !ch.is_ascii_digit() {
                break;
            }
            self.advance();
            self.push_bounded(&mut text, &mut len, ch);
        }
        (TokenKind::Float, text)
    }

    /// Scans and classifies the next token.
    ///
    /// Once the source is exhausted every further call yields `Eof`.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let span = self.span();

        let Some(initial) = self.current() else {
            return Token::eof(span);
        };

        let (kind, text) = match initial {
            '.' => {
                let text = self.scan_alnum();
                let kind = match lookup_control(&text) {
                    Some(entry) if entry.role == ControlRole::Push => TokenKind::ControlPush,
                    Some(_) => TokenKind::ControlPop,
                    None => TokenKind::Invalid,
                };
                (kind, text)
            }
            c if c.is_ascii_alphabetic() => {
                let text = self.scan_alnum();
                let kind = if text == TERMINATOR {
                    TokenKind::Stop
                } else {
                    TokenKind::Ident
                };
                (kind, text)
            }
            ':' => (TokenKind::Directive, self.scan_alnum()),
            c if c.is_ascii_digit() || c == '-' => self.read_number(),
            _ => (TokenKind::Invalid, self.scan_run(|c| !c.is_whitespace())),
        };

        trace!(line = span.line, col = span.col, %kind, text = %text, "token");
        Token::new(kind, text, span)
    }

    /// All tokens up to and including `Eof`.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.is(TokenKind::Eof);
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }
}
