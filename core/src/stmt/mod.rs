mod stmt_impl;
mod stmt_parser;

#[cfg(test)]
mod stmt_test;

pub use stmt_impl::{Program, Stmt};
pub use stmt_parser::StmtParser;
