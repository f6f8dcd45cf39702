use serde::{Deserialize, Serialize};

// =============================================================================
// OPCODE - machine operation identifiers
// =============================================================================

/// Operation identifiers shared with the stack-machine interpreter.
///
/// The numeric id of each variant is its declaration order; the interpreter's
/// dispatch table is indexed the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum OpCode {
    Add,
    ConstPush,
    VarPush,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Negate,
    Eval,
    Extract,
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
    And,
    Or,
    Not,
    Function,
    Procedure,
    Print,
    Assign,
    PlusEq,
    MinusEq,
    NewMap,
    NewWindow,
    Destroy,
    BitOr,
    BitAnd,

    // ==========================================================================
    // Emitted by the compiler only, never looked up by mnemonic
    // ==========================================================================
    /// Ends the behavior block.
    Stop,
    /// Pop a condition; if false, jump by the offset in the following `Jump`.
    JumpIfFalse,
    /// Jump by the offset in the following `Jump`.
    Jump,
}

impl OpCode {
    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Stop => TERMINATOR,
            OpCode::JumpIfFalse => "jumpfalse",
            OpCode::Jump => "jump",
            op => OPERATIONS
                .iter()
                .find(|e| e.opcode == op)
                .map(|e| e.mnemonic)
                .unwrap_or("?"),
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

// =============================================================================
// Simple operation table
// =============================================================================

/// A stack operation that can be written directly in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationEntry {
    pub mnemonic: &'static str,
    pub opcode: OpCode,
    /// Operands read from the instruction stream, e.g. `varpush` takes one.
    pub immediates: usize,
}

const fn op(mnemonic: &'static str, opcode: OpCode, immediates: usize) -> OperationEntry {
    OperationEntry {
        mnemonic,
        opcode,
        immediates,
    }
}

/// Control operations are absent: they need block structure and live in
/// [`CONTROLS`].
pub static OPERATIONS: &[OperationEntry] = &[
    op("add", OpCode::Add, 0),
    op("constpush", OpCode::ConstPush, 1),
    op("varpush", OpCode::VarPush, 1),
    op("subtract", OpCode::Subtract, 0),
    op("multiply", OpCode::Multiply, 0),
    op("divide", OpCode::Divide, 0),
    op("modulo", OpCode::Modulo, 0),
    op("negate", OpCode::Negate, 0),
    op("eval", OpCode::Eval, 0),
    op("extract", OpCode::Extract, 0),
    op("gt", OpCode::Gt, 0),
    op("ge", OpCode::Ge, 0),
    op("lt", OpCode::Lt, 0),
    op("le", OpCode::Le, 0),
    op("eq", OpCode::Eq, 0),
    op("ne", OpCode::Ne, 0),
    op("and", OpCode::And, 0),
    op("or", OpCode::Or, 0),
    op("not", OpCode::Not, 0),
    op("function", OpCode::Function, 2), // name, narg
    op("proc", OpCode::Procedure, 2),    // name, narg
    op("print", OpCode::Print, 0),
    op("assign", OpCode::Assign, 0),
    op("pluseq", OpCode::PlusEq, 0),
    op("minuseq", OpCode::MinusEq, 0),
    op("newmap", OpCode::NewMap, 1),
    op("newwindow", OpCode::NewWindow, 3),
    op("destroy", OpCode::Destroy, 1),
    op("bitOr", OpCode::BitOr, 0),
    op("bitAnd", OpCode::BitAnd, 0),
];

/// Find a simple operation by exact mnemonic.
pub fn lookup_operation(mnemonic: &str) -> Option<OperationEntry> {
    OPERATIONS.iter().find(|e| e.mnemonic == mnemonic).copied()
}

// =============================================================================
// Control keyword table
// =============================================================================

/// Whether a control keyword opens a construct or closes a block within one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRole {
    Push,
    Pop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEntry {
    pub mnemonic: &'static str,
    pub role: ControlRole,
}

pub const IF: &str = ".if";
pub const THEN: &str = ".then";
pub const ELSE: &str = ".else";
pub const FI: &str = ".fi";
pub const WHILE: &str = ".while";
pub const DO: &str = ".do";
pub const OD: &str = ".od";

/// Pseudo-instruction that ends a block.
pub const TERMINATOR: &str = "stop";

pub static CONTROLS: &[ControlEntry] = &[
    ControlEntry { mnemonic: WHILE, role: ControlRole::Push },
    ControlEntry { mnemonic: DO, role: ControlRole::Pop },
    ControlEntry { mnemonic: OD, role: ControlRole::Pop },
    ControlEntry { mnemonic: IF, role: ControlRole::Push },
    ControlEntry { mnemonic: THEN, role: ControlRole::Pop },
    ControlEntry { mnemonic: ELSE, role: ControlRole::Pop },
    ControlEntry { mnemonic: FI, role: ControlRole::Pop },
];

pub fn lookup_control(mnemonic: &str) -> Option<ControlEntry> {
    CONTROLS.iter().find(|e| e.mnemonic == mnemonic).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_operation() {
        let constpush = lookup_operation("constpush").unwrap();
        assert_eq!(constpush.opcode, OpCode::ConstPush);
        assert_eq!(constpush.immediates, 1);

        assert_eq!(lookup_operation("bitAnd").unwrap().opcode, OpCode::BitAnd);
        assert_eq!(lookup_operation("newwindow").unwrap().immediates, 3);
        assert!(lookup_operation("no_such").is_none());
        // exact match only
        assert!(lookup_operation("ADD").is_none());
    }

    #[test]
    fn test_mnemonics_unique() {
        let mut seen = HashSet::new();
        for entry in OPERATIONS {
            assert!(seen.insert(entry.mnemonic), "duplicate {}", entry.mnemonic);
        }
    }

    #[test]
    fn test_table_excludes_control_flow() {
        for entry in OPERATIONS {
            assert!(!matches!(
                entry.opcode,
                OpCode::Stop | OpCode::Jump | OpCode::JumpIfFalse
            ));
            assert!(lookup_control(entry.mnemonic).is_none());
        }
        assert!(lookup_operation(TERMINATOR).is_none());
    }

    #[test]
    fn test_opcode_ids_follow_table_order() {
        for (i, entry) in OPERATIONS.iter().enumerate() {
            assert_eq!(entry.opcode.id() as usize, i);
            assert_eq!(entry.opcode.mnemonic(), entry.mnemonic);
        }
        assert_eq!(OpCode::Stop.id() as usize, OPERATIONS.len());
        assert_eq!(OpCode::Jump.mnemonic(), "jump");
    }

    #[test]
    fn test_lookup_control() {
        assert_eq!(lookup_control(".if").unwrap().role, ControlRole::Push);
        assert_eq!(lookup_control(".while").unwrap().role, ControlRole::Push);
        for pop in [THEN, ELSE, FI, DO, OD] {
            assert_eq!(lookup_control(pop).unwrap().role, ControlRole::Pop);
        }
        assert!(lookup_control(".loop").is_none());
        assert!(lookup_control("if").is_none());
    }
}
