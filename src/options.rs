use serde::Deserialize;

/// Default cap on the length of a single token's text.
pub const DEFAULT_MAX_TOKEN_LEN: usize = 500;

/// Default number of errors tolerated before compilation gives up.
pub const DEFAULT_MAX_ERRORS: usize = 5;

/// Default limit on `.if`/`.while` nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Per-compilation limits.
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```toml
/// max_errors = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerOptions {
    /// Longer lexemes are truncated to this many characters.
    pub max_token_len: usize,
    /// Compilation stops once the error count exceeds this.
    pub max_errors: usize,
    /// Deeper control constructs end the compilation with an error.
    pub max_depth: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
            max_errors: DEFAULT_MAX_ERRORS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CompilerOptions {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = CompilerOptions::default();
        assert_eq!(opts.max_token_len, 500);
        assert_eq!(opts.max_errors, 5);
        assert_eq!(opts.max_depth, 256);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let opts = CompilerOptions::from_toml("max_errors = 10\n").unwrap();
        assert_eq!(opts.max_errors, 10);
        assert_eq!(opts.max_token_len, DEFAULT_MAX_TOKEN_LEN);
        assert_eq!(opts.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(CompilerOptions::from_toml("max_warnings = 1\n").is_err());
    }
}
