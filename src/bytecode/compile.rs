use crate::bytecode::compile_error::CompileError;
use crate::bytecode::ir::CompiledProgram;
use crate::frontend::parser::Parser;
use crate::frontend::token::Span;
use crate::options::CompilerOptions;

/// Outcome of a compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    SyntaxError,
    InternalError,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Ok => write!(f, "ok"),
            Status::SyntaxError => write!(f, "syntax error"),
            Status::InternalError => write!(f, "internal error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Counted in `error_count`.
    Error,
    /// Counted in `warning_count`.
    Warning,
    /// Reported but never counted (lexical notes, the give-up notice).
    Note,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A located compiler message.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub error: CompileError,
}

impl std::fmt::Display for Diagnostic {
    /// Formats as `line:col: severity: message`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.span.line, self.span.col, self.severity, self.error
        )
    }
}

/// Everything one compile call produces. Immutable once returned.
#[derive(Debug, Clone)]
pub struct CompileResult {
    status: Status,
    errors: usize,
    warnings: usize,
    diagnostics: Vec<Diagnostic>,
    program: CompiledProgram,
}

impl CompileResult {
    pub(crate) fn new(
        status: Status,
        errors: usize,
        warnings: usize,
        diagnostics: Vec<Diagnostic>,
        program: CompiledProgram,
    ) -> Self {
        Self {
            status,
            errors,
            warnings,
            diagnostics,
            program,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// All diagnostics, one per line.
    pub fn messages(&self) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The compiled program. Only meaningful when the status is `Ok`.
    pub fn program(&self) -> &CompiledProgram {
        &self.program
    }

    pub fn into_program(self) -> CompiledProgram {
        self.program
    }

    /// Gives the result's resources back; same as dropping it.
    pub fn release(self) {}
}

/// Compiles one automaton program with default options.
pub fn compile(source: &str) -> CompileResult {
    compile_with(source, &CompilerOptions::default())
}

/// Compiles one automaton program.
///
/// All state lives in a session created for this call, so concurrent calls
/// from different threads do not interact.
pub fn compile_with(source: &str, options: &CompilerOptions) -> CompileResult {
    Parser::new(source, options).compile()
}
