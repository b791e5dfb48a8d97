use std::fmt;

use crate::expr::Expr;

/// Statement AST
///
/// program   ::= statement {';' statement}
/// statement ::= const_decl | define | expr
/// const_decl ::= 'const' id '=' expr
/// define    ::= id {',' id} ':=' expr
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Bare expression; its value is reported
    Expr(Expr),
    /// `x := e` or `v, ok := e`
    Define { names: Vec<String>, value: Expr },
    /// `const c = e`
    Const { name: String, value: Expr },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expr(expr) => write!(f, "{}", expr),
            Stmt::Define { names, value } => write!(f, "{} := {}", names.join(", "), value),
            Stmt::Const { name, value } => write!(f, "const {} = {}", name, value),
        }
    }
}
