//! Compiler for the postfix automaton language.
//!
//! Source text is scanned on demand by the [`frontend::lexer`], parsed and
//! turned into a flat instruction array in a single pass by the
//! [`frontend::parser`], and can be inspected with the
//! [`bytecode::disasm`] renderer.
//!
//! ```
//! let result = cacheasm::compile(":var x int\nvarpush x print\nstop\n");
//! assert!(result.is_ok());
//! println!("{}", cacheasm::render(result.program()));
//! ```

pub mod bytecode;
pub mod frontend;
pub mod lang;
pub mod options;

pub use bytecode::compile::{CompileResult, Diagnostic, Severity, Status, compile, compile_with};
pub use bytecode::compile_error::CompileError;
pub use bytecode::disasm::disassemble;
pub use bytecode::ir::{CompiledProgram, Instruction, Operand};
pub use options::CompilerOptions;

/// Disassembly of a whole compiled program.
pub fn render(program: &CompiledProgram) -> String {
    bytecode::disasm::render(&program.instructions, &program.symbols, &program.topics)
}
