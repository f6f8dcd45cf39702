pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod emit;
pub mod ir;
pub mod op;
pub mod symbols;

pub use compile::{CompileResult, Diagnostic, Severity, Status, compile, compile_with};
pub use compile_error::CompileError;
pub use ir::{CompiledProgram, Instruction, Operand};
pub use op::OpCode;
pub use symbols::{Slot, SymbolTable, TopicTable};
