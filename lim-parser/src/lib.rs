//! Lexer, abstract syntax tree and parser for the lim language.

pub mod ast;
pub mod lexer;
pub mod parser;
