use std::io::{self, Write};

use crate::frontend::token::{Token, TokenKind};

pub struct TokenDumper {
    pub color: bool,
    pub show_debug_repr: bool, // if false, prints only the lexeme text
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self {
            color: true,
            show_debug_repr: true,
        }
    }
}

impl TokenDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const DIM: &'static str = "\x1b[2m";
    const RED: &'static str = "\x1b[31m";
    const YEL: &'static str = "\x1b[33m";
    const CYN: &'static str = "\x1b[36m";
    const MAG: &'static str = "\x1b[35m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.show_debug_repr = false;
        self
    }

    pub fn dump(&self, tokens: &[Token], out: &mut impl Write) -> io::Result<()> {
        for t in tokens {
            self.write_one(t, out)?;
        }
        Ok(())
    }

    fn write_one(&self, t: &Token, out: &mut impl Write) -> io::Result<()> {
        let kind = Self::kind(t.kind);
        let colr = if self.color { Self::color(t.kind) } else { "" };
        let reset = if self.color { Self::RESET } else { "" };

        if self.show_debug_repr {
            writeln!(
                out,
                "[{:02}:{:02}] {}{:<8} {:?}{}",
                t.span.line, t.span.col, colr, kind, t.text, reset
            )
        } else {
            writeln!(
                out,
                "[{:02}:{:02}] {}{:<8} {}{}",
                t.span.line, t.span.col, colr, kind, t.text, reset
            )
        }
    }

    fn kind(kind: TokenKind) -> &'static str {
        match kind {
            TokenKind::Eof => "EOF",
            TokenKind::Int => "INT",
            TokenKind::Float => "FLOAT",
            TokenKind::Directive => "DIRECT",
            TokenKind::Ident => "IDENT",
            TokenKind::ControlPush => "CPUSH",
            TokenKind::ControlPop => "CPOP",
            TokenKind::Stop => "STOP",
            TokenKind::Invalid => "INVALID",
        }
    }

    fn color(kind: TokenKind) -> &'static str {
        match kind {
            TokenKind::Eof => Self::DIM,
            TokenKind::Int | TokenKind::Float => Self::CYN,
            TokenKind::Ident => Self::YEL,
            TokenKind::Directive | TokenKind::ControlPush | TokenKind::ControlPop => Self::MAG,
            TokenKind::Invalid => Self::RED,
            TokenKind::Stop => Self::RESET,
        }
    }
}
