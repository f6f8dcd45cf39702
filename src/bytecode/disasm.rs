use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io;

use crate::bytecode::ir::{Instruction, Operand};
use crate::bytecode::symbols::{Slot, SymbolTable, TopicTable};

/// Writes the disassembly of a program to `sink`.
pub fn disassemble(
    instructions: &[Instruction],
    symbols: &SymbolTable,
    topics: &TopicTable,
    sink: &mut impl io::Write,
) -> io::Result<()> {
    sink.write_all(render(instructions, symbols, topics).as_bytes())
}

/// Renders the variable table, the topic table and every instruction.
///
/// Never fails: a slot that does not name a variable is shown inline as
/// an error and the dump carries on.
pub fn render(instructions: &[Instruction], symbols: &SymbolTable, topics: &TopicTable) -> String {
    let mut out = String::new();

    out.push_str("=== variables ===\n");
    for (slot, var) in symbols.iter() {
        let _ = writeln!(out, "{}: {} [slot {}]", var.name, var.ty, slot);
    }

    out.push_str("=== topics ===\n");
    for (channel, slot) in topics.iter() {
        let _ = writeln!(out, "{} => {} [slot {}]", channel, slot_name(symbols, slot), slot);
    }

    let _ = writeln!(out, "=== behavior instructions ({}) ===", instructions.len());
    let targets = collect_jump_targets(instructions);
    for (ip, instr) in instructions.iter().enumerate() {
        let marker = if targets.contains(&ip) { "►" } else { " " };
        let _ = write!(out, "{:04} {} ", ip, marker);
        format_instruction(&mut out, instr, ip, symbols);
        out.push('\n');
    }
    out.push_str("=== end ===\n");
    out
}

fn collect_jump_targets(instructions: &[Instruction]) -> BTreeSet<usize> {
    instructions
        .iter()
        .enumerate()
        .filter_map(|(ip, instr)| instr.jump_target(ip))
        .collect()
}

fn slot_name(symbols: &SymbolTable, slot: Slot) -> String {
    match symbols.name(slot) {
        Some(name) => name.to_string(),
        None => format!("<error: slot {} out of range>", slot),
    }
}

fn format_instruction(out: &mut String, instr: &Instruction, ip: usize, symbols: &SymbolTable) {
    match instr {
        Instruction::Op { label, opcode } => {
            let _ = write!(out, "{:<21} (op {})", label, opcode.id());
        }
        Instruction::Data {
            operand: Operand::Slot(slot),
            ..
        } => {
            let _ = write!(out, "  [{}] => {}", slot, slot_name(symbols, *slot));
        }
        Instruction::Data {
            label,
            operand: Operand::Literal(value),
        } => {
            let head = format!("data ({})", label);
            let _ = write!(out, "  {:<19} {} {}", head, value.type_name(), value);
        }
        Instruction::Jump { label, offset } => {
            let head = format!("jump ({})", label);
            let direction = if *offset < 0 { "↑" } else { "↓" };
            let target = match instr.jump_target(ip) {
                Some(target) => format!("{:04}", target),
                None => "<error: before start>".to_string(),
            };
            let _ = write!(out, "  {:<19} {:+} {} (→ {})", head, offset, direction, target);
        }
    }
}
