pub mod lexer;
pub mod parser;
pub mod token;
pub mod token_dumper;
