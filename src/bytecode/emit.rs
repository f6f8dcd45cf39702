use tracing::debug;

use crate::bytecode::compile_error::CompileError;
use crate::bytecode::ir::{Instruction, Operand};
use crate::bytecode::op::OpCode;

/// An emitted `Jump` whose offset is not known yet.
///
/// Not `Clone`: [`Emitter::patch`] consumes it, so a placeholder can be
/// resolved at most once.
#[derive(Debug)]
#[must_use = "a jump placeholder must be patched"]
pub struct JumpSlot(usize);

impl JumpSlot {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Append-only instruction buffer with forward/backward jump patching.
#[derive(Debug, Default)]
pub struct Emitter {
    code: Vec<Instruction>,
    placeholders: usize,
    patched: usize,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next instruction will get.
    pub fn here(&self) -> usize {
        self.code.len()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.code
    }

    pub fn emit_op(&mut self, opcode: OpCode) {
        debug!(ip = self.here(), %opcode, "emit op");
        self.code.push(Instruction::op(opcode));
    }

    pub fn emit_data(&mut self, label: &str, operand: Operand) {
        debug!(ip = self.here(), label, ?operand, "emit data");
        self.code.push(Instruction::data(label, operand));
    }

    /// Emits a control operation followed by a placeholder `Jump`.
    pub fn emit_jump(&mut self, opcode: OpCode, label: &str) -> JumpSlot {
        self.emit_op(opcode);
        let at = self.here();
        self.code.push(Instruction::Jump {
            label: label.to_string(),
            offset: 0,
        });
        self.placeholders += 1;
        JumpSlot(at)
    }

    /// Resolves `slot` so that it lands on instruction `target`.
    ///
    /// Writes `target - slot.index()` into the jump's offset field.
    pub fn patch(&mut self, slot: JumpSlot, target: usize) -> Result<(), CompileError> {
        let at = slot.0;
        let offset = i32::try_from(target as i64 - at as i64).map_err(|_| {
            CompileError::internal(format!("jump offset from {} to {} overflows", at, target))
        })?;
        match self.code.get_mut(at) {
            Some(Instruction::Jump { offset: o, .. }) => {
                *o = offset;
                self.patched += 1;
                debug!(at, target, offset, "patched jump");
                Ok(())
            }
            Some(other) => Err(CompileError::internal(format!(
                "patch target {} is '{}', not a jump",
                at,
                other.label()
            ))),
            None => Err(CompileError::internal(format!(
                "patch target {} is past the end of the code",
                at
            ))),
        }
    }

    /// Placeholders emitted so far.
    pub fn placeholders(&self) -> usize {
        self.placeholders
    }

    /// Placeholders resolved so far.
    pub fn patched(&self) -> usize {
        self.patched
    }

    /// Hands over the instruction array, checking no jump was left unresolved.
    pub fn finish(self) -> Result<Vec<Instruction>, CompileError> {
        if self.patched != self.placeholders {
            return Err(CompileError::internal(format!(
                "{} of {} jump placeholders left unpatched",
                self.placeholders - self.patched,
                self.placeholders
            )));
        }
        Ok(self.code)
    }

    /// Hands over the instruction array as-is (used after errors).
    pub fn into_instructions(self) -> Vec<Instruction> {
        self.code
    }
}
