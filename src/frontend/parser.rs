use tracing::{debug, warn};

use crate::bytecode::compile::{CompileResult, Diagnostic, Severity, Status};
use crate::bytecode::compile_error::CompileError;
use crate::bytecode::emit::{Emitter, JumpSlot};
use crate::bytecode::ir::{CompiledProgram, Operand, UNRESOLVED_SLOT};
use crate::bytecode::op::{DO, ELSE, FI, IF, OD, OpCode, THEN, lookup_operation};
use crate::bytecode::symbols::{SymbolTable, TopicTable};
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Span, Token, TokenKind};
use crate::lang::value::{DataType, Value};
use crate::options::CompilerOptions;

/// Why parsing stopped before the end of the program.
#[derive(Debug)]
enum Abort {
    TooManyErrors,
    /// Control constructs nested past the session limit.
    TooDeep,
    Internal(CompileError),
}

type Parse<T = ()> = Result<T, Abort>;

/// One compilation session: recursive-descent parser with embedded code
/// generation.
///
/// Grammar:
///
/// ```text
/// program      ::= declarations block
/// declarations ::= (":var" IDENT IDENT | ":subscribe" IDENT IDENT)*
/// block        ::= instruction* "stop"
/// instruction  ::= simple_op | if_block | while_block
/// simple_op    ::= IDENT immediate*
/// if_block     ::= ".if" block ".then" block [".else" block] ".fi"
/// while_block  ::= ".while" block ".do" block ".od"
/// immediate    ::= INT | FLOAT | IDENT
/// ```
///
/// Blocks nested in a control construct may leave out `stop`; the next
/// control keyword closes them.
///
/// The grammar needs no lookahead beyond the current token, which the
/// session always holds in `token`.
pub struct Parser {
    lexer: Lexer,
    /// Current lookahead.
    token: Token,
    emitter: Emitter,
    symbols: SymbolTable,
    topics: TopicTable,
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
    max_errors: usize,
    /// Open `.if`/`.while` constructs.
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(source: &str, options: &CompilerOptions) -> Self {
        let mut parser = Parser {
            lexer: Lexer::new(source, options.max_token_len),
            token: Token::eof(Span::default()),
            emitter: Emitter::new(),
            symbols: SymbolTable::new(),
            topics: TopicTable::new(),
            diagnostics: Vec::new(),
            errors: 0,
            warnings: 0,
            max_errors: options.max_errors,
            depth: 0,
            max_depth: options.max_depth,
        };
        parser.advance();
        parser
    }

    /// Runs the session to completion.
    pub fn compile(mut self) -> CompileResult {
        let outcome = self.parse_program();

        let status = match outcome {
            Ok(()) if self.errors == 0 => Status::Ok,
            Ok(()) | Err(Abort::TooManyErrors) | Err(Abort::TooDeep) => Status::SyntaxError,
            Err(Abort::Internal(err)) => {
                self.internal(err);
                Status::InternalError
            }
        };

        let (status, instructions) = if status == Status::Ok {
            let span = self.token.span;
            match std::mem::take(&mut self.emitter).finish() {
                Ok(code) => (Status::Ok, code),
                Err(err) => {
                    self.record(Severity::Error, span, err);
                    self.errors += 1;
                    (Status::InternalError, Vec::new())
                }
            }
        } else {
            (status, std::mem::take(&mut self.emitter).into_instructions())
        };

        debug!(
            %status,
            errors = self.errors,
            warnings = self.warnings,
            instructions = instructions.len(),
            "compilation finished"
        );

        CompileResult::new(
            status,
            self.errors,
            self.warnings,
            self.diagnostics,
            CompiledProgram {
                instructions,
                symbols: self.symbols,
                topics: self.topics,
            },
        )
    }

    // =========================================================================
    // Token stream
    // =========================================================================

    /// Consumes the lookahead, returning it, and scans the next one.
    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        if next.is(TokenKind::Invalid) {
            let span = next.span;
            let text = next.text.clone();
            self.record(Severity::Note, span, CompileError::InvalidLexeme(text));
        }
        std::mem::replace(&mut self.token, next)
    }

    /// Consumes the lookahead if it has kind `kind`; otherwise reports a
    /// mismatch and leaves it in place.
    fn match_kind(&mut self, kind: TokenKind) -> Parse<bool> {
        if self.token.kind == kind && kind != TokenKind::Eof {
            self.advance();
            return Ok(true);
        }
        let err = CompileError::expected(kind, &self.token);
        self.error(self.token.span, err)?;
        Ok(false)
    }

    /// Like [`match_kind`](Self::match_kind) for one specific control
    /// keyword.
    fn match_keyword(&mut self, keyword: &'static str) -> Parse<bool> {
        if self.token.is(TokenKind::ControlPop) && self.token.text == keyword {
            self.advance();
            return Ok(true);
        }
        let err = CompileError::expected_keyword(keyword, &self.token);
        self.error(self.token.span, err)?;
        Ok(false)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    fn record(&mut self, severity: Severity, span: Span, error: CompileError) {
        match severity {
            Severity::Error => warn!(line = span.line, col = span.col, "{}", error),
            _ => debug!(line = span.line, col = span.col, %severity, "{}", error),
        }
        self.diagnostics.push(Diagnostic {
            severity,
            span,
            error,
        });
    }

    /// Records an error; fails once the count passes the session limit.
    fn error(&mut self, span: Span, error: CompileError) -> Parse {
        self.record(Severity::Error, span, error);
        self.errors += 1;
        if self.errors > self.max_errors {
            self.record(
                Severity::Note,
                span,
                CompileError::TooManyErrors(self.max_errors),
            );
            return Err(Abort::TooManyErrors);
        }
        Ok(())
    }

    fn warning(&mut self, span: Span, warning: CompileError) {
        self.record(Severity::Warning, span, warning);
        self.warnings += 1;
    }

    fn internal(&mut self, error: CompileError) {
        let span = self.token.span;
        self.record(Severity::Error, span, error);
        self.errors += 1;
    }

    fn patch(&mut self, slot: JumpSlot, target: usize) -> Parse {
        self.emitter.patch(slot, target).map_err(Abort::Internal)
    }

    // =========================================================================
    // Productions
    // =========================================================================

    fn parse_program(&mut self) -> Parse {
        self.parse_declarations()?;
        self.parse_block(false)?;
        if !self.token.is(TokenKind::Eof) {
            let err = CompileError::TrailingInput(self.token.to_string());
            self.error(self.token.span, err)?;
        }
        Ok(())
    }

    fn parse_declarations(&mut self) -> Parse {
        while self.token.is(TokenKind::Directive) {
            debug!(directive = %self.token.text, "declaration");
            match self.token.text.as_str() {
                ":var" => self.parse_var_decl()?,
                ":subscribe" => self.parse_subscription()?,
                _ => {
                    let directive = self.advance();
                    self.error(directive.span, CompileError::UnknownDirective(directive.text))?;
                    // resynchronize on the next directive or the block
                    while self.token.is(TokenKind::Ident) {
                        self.advance();
                    }
                }
            }
        }
        Ok(())
    }

    /// Takes an identifier that completes a declaration, or reports it
    /// missing without consuming anything.
    fn declaration_name(&mut self, what: &'static str, after: String) -> Parse<Option<Token>> {
        if self.token.is(TokenKind::Ident) {
            return Ok(Some(self.advance()));
        }
        let span = self.token.span;
        self.error(span, CompileError::IncompleteDeclaration { what, after })?;
        Ok(None)
    }

    /// `:var name type`
    fn parse_var_decl(&mut self) -> Parse {
        let directive = self.advance();
        let Some(name) = self.declaration_name("a variable name", directive.text.clone())? else {
            return Ok(());
        };
        let after = format!("{} {}", directive.text, name.text);
        let Some(ty) = self.declaration_name("a type name", after)? else {
            return Ok(());
        };

        let data_type = DataType::from_name(&ty.text);
        if !data_type.is_known() {
            self.warning(
                ty.span,
                CompileError::UnknownType {
                    name: name.text.clone(),
                    ty: ty.text,
                },
            );
        }
        self.declare(&name, data_type);
        Ok(())
    }

    /// `:subscribe name channel`
    fn parse_subscription(&mut self) -> Parse {
        let directive = self.advance();
        let Some(name) = self.declaration_name("a variable name", directive.text.clone())? else {
            return Ok(());
        };
        let after = format!("{} {}", directive.text, name.text);
        let Some(channel) = self.declaration_name("a channel name", after)? else {
            return Ok(());
        };

        let slot = self.declare(&name, DataType::Tuple);
        if let Some(old) = self.topics.subscribe(&channel.text, slot) {
            self.warning(
                channel.span,
                CompileError::Resubscribed {
                    channel: channel.text.clone(),
                    old,
                    new: slot,
                },
            );
        }
        debug!(channel = %channel.text, slot, "subscribed");
        Ok(())
    }

    fn declare(&mut self, name: &Token, ty: DataType) -> u32 {
        let (slot, shadowed) = self.symbols.declare(&name.text, ty);
        if let Some(old) = shadowed {
            self.warning(
                name.span,
                CompileError::Redeclared {
                    name: name.text.clone(),
                    old,
                    new: slot,
                },
            );
        }
        debug!(name = %name.text, slot, "declared");
        slot
    }

    /// `instruction* stop`
    ///
    /// A `nested` block also ends at a control-pop keyword, and its `stop`
    /// (if written) emits nothing: the enclosing construct's jumps delimit it.
    fn parse_block(&mut self, nested: bool) -> Parse {
        debug!(nested, "block");
        loop {
            match self.token.kind {
                TokenKind::Ident => self.parse_instruction()?,
                TokenKind::ControlPush if self.token.text == IF => self.nested(Self::parse_if)?,
                TokenKind::ControlPush => self.nested(Self::parse_while)?,
                TokenKind::Stop | TokenKind::Eof => break,
                TokenKind::ControlPop if nested => break,
                TokenKind::ControlPop => {
                    let stray = self.advance();
                    self.error(stray.span, CompileError::UnmatchedControl(stray.text))?;
                }
                _ => {
                    let bad = self.advance();
                    self.error(bad.span, CompileError::UnknownOperation(bad.to_string()))?;
                }
            }
        }

        if nested {
            if self.token.is(TokenKind::Stop) {
                self.advance();
            }
        } else {
            // a missing terminator is reported, then assumed present
            self.match_kind(TokenKind::Stop)?;
            self.emitter.emit_op(OpCode::Stop);
        }
        Ok(())
    }

    /// `IDENT immediate*` where the operation fixes the immediate count.
    fn parse_instruction(&mut self) -> Parse {
        let token = self.advance();
        let Some(entry) = lookup_operation(&token.text) else {
            return self.error(token.span, CompileError::UnknownOperation(token.to_string()));
        };
        debug!(mnemonic = entry.mnemonic, immediates = entry.immediates, "operation");

        self.emitter.emit_op(entry.opcode);
        for given in 0..entry.immediates {
            if !self.token.kind.is_in(TokenKind::IMMEDIATE) {
                // leave the token for the next instruction
                let err = CompileError::MissingImmediate {
                    mnemonic: entry.mnemonic,
                    expected: entry.immediates,
                    given,
                    found: self.token.to_string(),
                };
                return self.error(self.token.span, err);
            }
            self.parse_immediate()?;
        }
        Ok(())
    }

    /// A numeric literal or a declared variable.
    fn parse_immediate(&mut self) -> Parse {
        let token = self.advance();
        let operand = match token.kind {
            TokenKind::Int => match token.text.parse::<i64>() {
                Ok(n) => Operand::Literal(Value::Integer(n)),
                Err(_) => {
                    self.error(token.span, CompileError::BadLiteral(token.text))?;
                    Operand::Literal(Value::Integer(0))
                }
            },
            TokenKind::Float => match token.text.parse::<f64>() {
                Ok(x) => Operand::Literal(Value::Real(x)),
                Err(_) => {
                    self.error(token.span, CompileError::BadLiteral(token.text))?;
                    Operand::Literal(Value::Real(0.0))
                }
            },
            TokenKind::Ident => match self.symbols.lookup(&token.text) {
                Some(slot) => {
                    self.emitter.emit_data("variable", Operand::Slot(slot));
                    return Ok(());
                }
                None => {
                    self.error(token.span, CompileError::UnresolvedVariable(token.text))?;
                    self.emitter.emit_data("variable", Operand::Slot(UNRESOLVED_SLOT));
                    return Ok(());
                }
            },
            kind => {
                return Err(Abort::Internal(CompileError::internal(format!(
                    "{} accepted as an immediate operand",
                    kind
                ))));
            }
        };
        self.emitter.emit_data("constant", operand);
        Ok(())
    }

    /// Runs one control construct one level deeper.
    ///
    /// Nesting is bounded so that the recursion cannot exhaust the stack of
    /// the thread running the session.
    fn nested(&mut self, construct: fn(&mut Self) -> Parse) -> Parse {
        if self.depth >= self.max_depth {
            let span = self.token.span;
            self.record(
                Severity::Error,
                span,
                CompileError::NestingTooDeep(self.max_depth),
            );
            self.errors += 1;
            return Err(Abort::TooDeep);
        }
        self.depth += 1;
        let outcome = construct(self);
        self.depth -= 1;
        outcome
    }

    /// ```text
    /// <cond> jumpfalse J(→else) <then> jump J(→end) [<else>]
    /// ```
    fn parse_if(&mut self) -> Parse {
        self.advance();
        self.parse_block(true)?;
        self.match_keyword(THEN)?;

        let to_else = self.emitter.emit_jump(OpCode::JumpIfFalse, "to else");
        self.parse_block(true)?;
        let to_end = self.emitter.emit_jump(OpCode::Jump, "to fi");
        let else_start = self.emitter.here();
        self.patch(to_else, else_start)?;

        if self.token.is(TokenKind::ControlPop) && self.token.text == ELSE {
            self.advance();
            self.parse_block(true)?;
        }
        self.match_keyword(FI)?;

        let end = self.emitter.here();
        self.patch(to_end, end)
    }

    /// ```text
    /// top: <cond> jumpfalse J(→end) <body> jump J(→top)
    /// ```
    fn parse_while(&mut self) -> Parse {
        self.advance();
        let top = self.emitter.here();
        self.parse_block(true)?;
        self.match_keyword(DO)?;

        let to_end = self.emitter.emit_jump(OpCode::JumpIfFalse, "to od");
        self.parse_block(true)?;
        let to_top = self.emitter.emit_jump(OpCode::Jump, "to while");
        self.patch(to_top, top)?;
        self.match_keyword(OD)?;

        let end = self.emitter.here();
        self.patch(to_end, end)
    }

    /// Jump placeholders emitted and resolved so far.
    #[cfg(test)]
    fn jump_counts(&self) -> (usize, usize) {
        (self.emitter.placeholders(), self.emitter.patched())
    }
}
