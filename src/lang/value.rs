use serde::{Deserialize, Serialize};

/// Immediate literal carried in the instruction stream.
///
/// The compiler only produces `Integer` and `Real` from source text; the
/// other variants exist because the interpreter's data stack holds them and
/// compiled programs may be built or rewritten by other tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),

    /// 64-bit signed integer.
    Integer(i64),

    /// 64-bit floating-point number.
    Real(f64),

    /// Nanoseconds since the Unix epoch.
    Tstamp(u64),

    String(String),
}

impl Value {
    /// Name of the value's type as written in declarations.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Integer(_) => "int",
            Value::Real(_) => "real",
            Value::Tstamp(_) => "tstamp",
            Value::String(_) => "string",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Real(n) => write!(f, "{:?}", n),
            Value::Tstamp(t) => write!(f, "@{:016x}", t),
            Value::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Declared type of an automaton variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Int,
    Real,
    Tstamp,
    String,
    /// A published event; the type of every subscription variable.
    Tuple,
    Map,
    Identifier,
    Window,
    Iterator,
    Sequence,
    PTable,
    /// A type name this compiler does not know; kept verbatim.
    Other(String),
}

impl DataType {
    pub fn from_name(name: &str) -> DataType {
        match name {
            "bool" => DataType::Bool,
            "int" => DataType::Int,
            "real" => DataType::Real,
            "tstamp" => DataType::Tstamp,
            "string" => DataType::String,
            "tuple" => DataType::Tuple,
            "map" => DataType::Map,
            "identifier" => DataType::Identifier,
            "window" => DataType::Window,
            "iterator" => DataType::Iterator,
            "sequence" => DataType::Sequence,
            "PTable" => DataType::PTable,
            other => DataType::Other(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DataType::Other(_))
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Real => "real",
            DataType::Tstamp => "tstamp",
            DataType::String => "string",
            DataType::Tuple => "tuple",
            DataType::Map => "map",
            DataType::Identifier => "identifier",
            DataType::Window => "window",
            DataType::Iterator => "iterator",
            DataType::Sequence => "sequence",
            DataType::PTable => "PTable",
            DataType::Other(name) => name,
        };
        write!(f, "{}", name)
    }
}
