//! End-to-end compilation scenarios through the public API.

use std::thread;

use cacheasm::bytecode::op::OpCode;
use cacheasm::lang::value::{DataType, Value};
use cacheasm::{
    CompileError, CompiledProgram, CompilerOptions, Instruction, Operand, Severity, Status,
    compile, compile_with,
};

fn jumps(program: &CompiledProgram) -> Vec<(usize, i32)> {
    program
        .instructions
        .iter()
        .enumerate()
        .filter_map(|(ip, i)| match i {
            Instruction::Jump { offset, .. } => Some((ip, *offset)),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Reference scenarios
// =============================================================================

#[test]
fn declaration_and_zero_arity_operation() {
    let result = compile(":var x int\n add\nstop\n");
    assert_eq!(result.status(), Status::Ok);
    assert_eq!(result.error_count(), 0);

    let program = result.program();
    assert_eq!(program.symbols.lookup("x"), Some(0));
    assert_eq!(program.symbols.get(0).unwrap().ty, DataType::Int);
    assert_eq!(
        program.instructions,
        vec![Instruction::op(OpCode::Add), Instruction::op(OpCode::Stop)]
    );
}

#[test]
fn if_without_else_resolves_both_jumps() {
    let result = compile(".if add .then add .fi\nstop\n");
    assert_eq!(result.status(), Status::Ok);

    let program = result.program();
    let jumps = jumps(program);
    assert_eq!(jumps.len(), 2);

    // conditional jump skips the then-block and the unconditional jump
    let (at, offset) = jumps[0];
    assert_eq!(program.instructions[at - 1].opcode(), Some(OpCode::JumpIfFalse));
    assert_eq!(at as i32 + offset, 6);

    // unconditional jump lands on the terminator
    let (at, offset) = jumps[1];
    assert_eq!(program.instructions[at - 1].opcode(), Some(OpCode::Jump));
    let target = (at as i32 + offset) as usize;
    assert_eq!(program.instructions[target].opcode(), Some(OpCode::Stop));
}

#[test]
fn missing_terminator() {
    let result = compile("add\n");
    assert_eq!(result.status(), Status::SyntaxError);
    assert_eq!(result.error_count(), 1);
    assert!(
        result
            .messages()
            .contains("expected 'stop', but got end of input"),
        "{}",
        result.messages()
    );
}

#[test]
fn error_threshold_stops_early() {
    let source = ":a\n:b\n:c\n:d\n:e\n:f\n:g\n:h\n:i\n:j\nstop\n";
    let result = compile(source);
    assert_eq!(result.status(), Status::SyntaxError);
    assert_eq!(result.error_count(), 6);

    let last = result.diagnostics().last().unwrap();
    assert_eq!(last.severity, Severity::Note);
    assert_eq!(last.error, CompileError::TooManyErrors(5));
}

#[test]
fn error_threshold_is_configurable() {
    let source = ":a\n:b\n:c\n:d\n:e\n:f\n:g\n:h\n:i\n:j\nstop\n";
    let options = CompilerOptions {
        max_errors: 20,
        ..CompilerOptions::default()
    };
    let result = compile_with(source, &options);
    assert_eq!(result.status(), Status::SyntaxError);
    assert_eq!(result.error_count(), 10);
}

#[test]
fn deep_nesting_is_rejected_not_fatal() {
    let depth = 10_000;
    let source = format!("{}{}stop", ".if add .then ".repeat(depth), ".fi ".repeat(depth));

    let result = thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || compile(&source))
        .unwrap()
        .join()
        .unwrap();

    assert_eq!(result.status(), Status::SyntaxError);
    assert_eq!(result.error_count(), 1);
    assert_eq!(
        result.diagnostics().last().map(|d| &d.error),
        Some(&CompileError::NestingTooDeep(256))
    );
}

#[test]
fn nesting_limit_is_configurable() {
    let source = format!("{}{}stop", ".while lt .do ".repeat(20), ".od ".repeat(20));
    let shallow = CompilerOptions {
        max_depth: 10,
        ..CompilerOptions::default()
    };
    assert_eq!(compile_with(&source, &shallow).status(), Status::SyntaxError);

    let options = CompilerOptions {
        max_depth: 20,
        ..CompilerOptions::default()
    };
    let result = compile_with(&source, &options);
    assert!(result.is_ok(), "{}", result.messages());
    assert_eq!(jumps(result.program()).len(), 40);
}

// =============================================================================
// Larger programs
// =============================================================================

const COUNTER: &str = "\
; count timer events and report every tenth
:var count int
:var limit int
:subscribe evt Timer

varpush count constpush 1 pluseq
.if varpush count varpush limit ge .then
    varpush count print
    varpush count constpush 0 assign
.fi
stop
";

#[test]
fn counter_program() {
    let result = compile(COUNTER);
    assert!(result.is_ok(), "{}", result.messages());
    assert_eq!(result.warning_count(), 0);

    let program = result.program();
    assert_eq!(program.symbols.len(), 3);
    assert_eq!(program.topics.lookup("Timer"), Some(2));
    assert_eq!(program.symbols.get(2).unwrap().ty, DataType::Tuple);

    assert_eq!(program.instructions[0], Instruction::op(OpCode::VarPush));
    assert_eq!(
        program.instructions[1],
        Instruction::data("variable", Operand::Slot(0))
    );
    assert_eq!(
        program.instructions[3],
        Instruction::data("constant", Operand::Literal(Value::Integer(1)))
    );
    assert_eq!(jumps(program).len(), 2);
    assert_eq!(
        program.instructions.last(),
        Some(&Instruction::op(OpCode::Stop))
    );
}

#[test]
fn disassembly_of_counter() {
    let result = compile(COUNTER);
    let text = cacheasm::render(result.program());

    assert!(text.starts_with("=== variables ===\ncount: int [slot 0]\n"));
    assert!(text.contains("=== topics ===\nTimer => evt [slot 2]\n"));
    assert!(text.contains("0000   varpush               (op 2)\n"));
    assert!(text.contains("0001     [0] => count\n"));
    assert!(text.contains("0003     data (constant)     int 1\n"));
    assert!(text.contains("jump (to else)"));
    assert!(text.contains("►"));
    assert!(text.ends_with("=== end ===\n"));
}

#[test]
fn warnings_keep_status_ok() {
    let result = compile(":var x blob\n:var x int\nvarpush x\nstop\n");
    assert_eq!(result.status(), Status::Ok);
    assert_eq!(result.warning_count(), 2);
    assert!(result.messages().contains("warning: unknown type 'blob'"));
    // the newest declaration wins
    assert_eq!(
        result.program().instructions[1],
        Instruction::data("variable", Operand::Slot(1))
    );
}

#[test]
fn recovery_reports_each_problem() {
    let source = "\
:var x int
varpush y
bogus
.od
add
stop
";
    let result = compile(source);
    assert_eq!(result.status(), Status::SyntaxError);
    assert_eq!(result.error_count(), 3);

    let lines: Vec<_> = result.messages().lines().map(str::to_string).collect();
    assert!(lines[0].starts_with("2:9: error: reference to undeclared variable 'y'"));
    assert!(lines[1].starts_with("3:1: error: was expecting an operation"));
    assert!(lines[2].starts_with("4:1: error: '.od' has no enclosing"));
}

#[test]
fn compiled_program_codec() {
    let result = compile(COUNTER);
    let program = result.into_program();
    let bytes = program.to_bytes().unwrap();
    let decoded = CompiledProgram::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, program);
}

#[test]
fn concurrent_sessions_do_not_interfere() {
    let sources = [
        COUNTER.to_string(),
        ".while lt .do add .od stop".to_string(),
        "nosuch stop".to_string(),
        ":var a real\nconstpush 2.5 varpush a assign\nstop".to_string(),
    ];
    let expected: Vec<_> = sources.iter().map(|s| compile(s)).collect();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let source = sources[i % sources.len()].clone();
            thread::spawn(move || (i, compile(&source)))
        })
        .collect();

    for handle in handles {
        let (i, result) = handle.join().unwrap();
        let want = &expected[i % sources.len()];
        assert_eq!(result.status(), want.status());
        assert_eq!(result.error_count(), want.error_count());
        assert_eq!(result.program(), want.program());
        assert_eq!(result.messages(), want.messages());
    }
}
