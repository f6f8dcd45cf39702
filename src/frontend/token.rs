/// Source position of the first character of a token (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

/// Token families.
///
/// A kind groups lexemes that behave alike during parsing; `Ident` covers
/// every simple operation mnemonic and every variable/type/channel name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Int,
    Float,
    /// `:var`, `:subscribe`, ...
    Directive,
    Ident,
    /// `.if`, `.while`
    ControlPush,
    /// `.then`, `.else`, `.fi`, `.do`, `.od`
    ControlPop,
    /// The `stop` pseudo-instruction closing a block.
    Stop,
    Invalid,
}

impl TokenKind {
    /// Kinds that may appear as an immediate operand.
    pub const IMMEDIATE: &'static [TokenKind] = &[TokenKind::Ident, TokenKind::Float, TokenKind::Int];

    /// Membership test for a set of expected kinds.
    ///
    /// End-of-input never matches, even if a caller lists it.
    pub fn is_in(self, set: &[TokenKind]) -> bool {
        self != TokenKind::Eof && set.contains(&self)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Eof => "end of input",
            TokenKind::Int => "int",
            TokenKind::Float => "float",
            TokenKind::Directive => "directive",
            TokenKind::Ident => "identifier",
            TokenKind::ControlPush => "control (enter)",
            TokenKind::ControlPop => "control (continue or leave)",
            TokenKind::Stop => "'stop'",
            TokenKind::Invalid => "invalid lexeme",
        };
        write!(f, "{}", name)
    }
}

/// A classified lexeme.
///
/// Numeric literals keep only their text; the value is parsed when the
/// literal is emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn eof(span: Span) -> Self {
        Self::new(TokenKind::Eof, "EOF", span)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            kind => write!(f, "'{}' ({})", self.text, kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_never_in_expected_set() {
        assert!(!TokenKind::Eof.is_in(&[TokenKind::Eof, TokenKind::Int]));
        assert!(TokenKind::Int.is_in(TokenKind::IMMEDIATE));
        assert!(!TokenKind::Directive.is_in(TokenKind::IMMEDIATE));
    }

    #[test]
    fn test_display() {
        let t = Token::new(TokenKind::Ident, "add", Span { line: 1, col: 1 });
        assert_eq!(t.to_string(), "'add' (identifier)");
        assert_eq!(Token::eof(Span::default()).to_string(), "end of input");
        assert_eq!(TokenKind::Stop.to_string(), "'stop'");
    }
}
