use serde::{Deserialize, Serialize};

use crate::bytecode::op::OpCode;
use crate::bytecode::symbols::{Slot, SymbolTable, TopicTable};
use crate::lang::value::Value;

/// Slot emitted for a variable reference that did not resolve.
///
/// Only appears in programs that failed to compile.
pub const UNRESOLVED_SLOT: Slot = Slot::MAX;

/// Immediate payload of a `Data` instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Literal(Value),
    /// A resolved variable.
    Slot(Slot),
}

/// One entry of the instruction array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Call a machine operation.
    Op { label: String, opcode: OpCode },

    /// Immediate operand of the preceding operation.
    Data { label: String, operand: Operand },

    /// Relative jump target of the preceding control operation.
    /// `offset` is measured from this instruction's own index:
    /// `+1` is the next instruction, negative values jump backwards.
    Jump { label: String, offset: i32 },
}

impl Instruction {
    pub fn op(opcode: OpCode) -> Self {
        Instruction::Op {
            label: opcode.mnemonic().to_string(),
            opcode,
        }
    }

    pub fn data(label: impl Into<String>, operand: Operand) -> Self {
        Instruction::Data {
            label: label.into(),
            operand,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Instruction::Op { label, .. }
            | Instruction::Data { label, .. }
            | Instruction::Jump { label, .. } => label,
        }
    }

    pub fn opcode(&self) -> Option<OpCode> {
        match self {
            Instruction::Op { opcode, .. } => Some(*opcode),
            _ => None,
        }
    }

    pub fn is_jump(&self) -> bool {
        matches!(self, Instruction::Jump { .. })
    }

    /// Absolute target of a jump at `ip`, if it lands inside `0..=len`.
    pub fn jump_target(&self, ip: usize) -> Option<usize> {
        match self {
            Instruction::Jump { offset, .. } => {
                let target = ip as i64 + *offset as i64;
                usize::try_from(target).ok()
            }
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to encode compiled program: {0}")]
    Encode(#[source] postcard::Error),
    #[error("failed to decode compiled program: {0}")]
    Decode(#[source] postcard::Error),
}

/// Everything the interpreter needs to run one automaton.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledProgram {
    pub instructions: Vec<Instruction>,
    pub symbols: SymbolTable,
    pub topics: TopicTable,
}

impl CompiledProgram {
    /// Compact binary form for handing a program to the interpreter.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        postcard::to_allocvec(self).map_err(CodecError::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        postcard::from_bytes(bytes).map_err(CodecError::Decode)
    }
}
