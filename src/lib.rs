//! smodr: a small imperative language whose programs may replace their own
//! source text while running.

pub mod ast;
pub mod interpreter;
pub mod lex;
pub mod parse;

pub use ast::AST;
pub use interpreter::{Error, Interpreter, Value};
pub use lex::tokenize;
pub use parse::parse;
