//! Value types shared by the compiler and the interpreter that runs its
//! output.

pub mod value;
