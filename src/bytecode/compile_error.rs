use crate::frontend::token::TokenKind;

/// Everything the compiler can complain about.
///
/// Whether a variant counts as an error, a warning or a note is decided
/// where it is recorded (see [`Severity`](crate::bytecode::compile::Severity)).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    // ==========================================================================
    // Lexical
    // ==========================================================================
    #[error("invalid lexeme '{0}'")]
    InvalidLexeme(String),

    // ==========================================================================
    // Syntax
    // ==========================================================================
    /// Lookahead kind did not match the production.
    #[error("expected {expected}, but got {found}")]
    Expected { expected: TokenKind, found: String },

    /// Lookahead was a control keyword, but not the one required.
    #[error("expected '{expected}', but got {found}")]
    ExpectedKeyword {
        expected: &'static str,
        found: String,
    },

    #[error("unrecognized directive '{0}'")]
    UnknownDirective(String),

    #[error("expecting {what} after {after}")]
    IncompleteDeclaration { what: &'static str, after: String },

    #[error("was expecting an operation, got {0}")]
    UnknownOperation(String),

    #[error("'{mnemonic}' expects {expected} immediate operand(s), got {given} before {found}")]
    MissingImmediate {
        mnemonic: &'static str,
        expected: usize,
        given: usize,
        found: String,
    },

    #[error("'{0}' has no enclosing .if or .while")]
    UnmatchedControl(String),

    #[error("unexpected {0} after the final 'stop'")]
    TrailingInput(String),

    #[error("malformed numeric literal '{0}'")]
    BadLiteral(String),

    #[error("reference to undeclared variable '{0}'")]
    UnresolvedVariable(String),

    #[error("too many errors (more than {0}), giving up")]
    TooManyErrors(usize),

    #[error(".if/.while nested more than {0} deep, giving up")]
    NestingTooDeep(usize),

    // ==========================================================================
    // Warnings
    // ==========================================================================
    #[error("unknown type '{ty}' for variable '{name}'")]
    UnknownType { name: String, ty: String },

    #[error("'{name}' re-declared; slot {new} shadows slot {old}")]
    Redeclared { name: String, old: u32, new: u32 },

    #[error("channel '{channel}' re-subscribed; slot {new} replaces slot {old}")]
    Resubscribed { channel: String, old: u32, new: u32 },

    // ==========================================================================
    // Internal compiler errors (shouldn't happen in normal use)
    // ==========================================================================
    #[error("internal error: {0}")]
    Internal(String),
}

impl CompileError {
    pub fn expected(expected: TokenKind, found: impl std::fmt::Display) -> Self {
        CompileError::Expected {
            expected,
            found: found.to_string(),
        }
    }

    pub fn expected_keyword(expected: &'static str, found: impl std::fmt::Display) -> Self {
        CompileError::ExpectedKeyword {
            expected,
            found: found.to_string(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        CompileError::Internal(msg.into())
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_display() {
        let err = CompileError::expected(TokenKind::Stop, "end of input");
        assert_eq!(err.to_string(), "expected 'stop', but got end of input");
    }

    #[test]
    fn test_expected_keyword_display() {
        let err = CompileError::expected_keyword(".fi", "'.od' (control (continue or leave))");
        let msg = err.to_string();
        assert!(msg.contains("'.fi'"));
        assert!(msg.contains(".od"));
    }

    #[test]
    fn test_missing_immediate_display() {
        let err = CompileError::MissingImmediate {
            mnemonic: "newwindow",
            expected: 3,
            given: 1,
            found: "'stop' ('stop')".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("newwindow"));
        assert!(msg.contains("expects 3"));
        assert!(msg.contains("got 1"));
    }

    #[test]
    fn test_internal_error() {
        let err = CompileError::internal("patched twice");
        assert!(err.is_internal());
        assert!(err.to_string().contains("internal"));
        assert!(!CompileError::BadLiteral("-".into()).is_internal());
    }

    #[test]
    fn test_error_implements_std_error() {
        let err = CompileError::UnresolvedVariable("x".into());
        let _: &dyn std::error::Error = &err;
    }
}
