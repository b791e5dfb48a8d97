use std::fmt::{self, Display};

use crate::token::Span;

/// Grammar (abridged):
/// expr      ::= unary
/// unary     ::= {'-' | '&' | '*'} postfix
/// postfix   ::= primary { '[' expr ']' | '(' [expr {',' expr}] ')' }
/// primary   ::= literal | id | '(' expr ')' | composite
/// composite ::= type '{' [element {',' element} [',']] '}'
/// element   ::= [expr ':'] expr
/// type      ::= id | '[' [int | '...'] ']' type | 'map' '[' type ']' type | '*' type
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(Literal),
    Ident(String),
    /// `T{...}` for array, slice and map types
    Composite { ty: TypeExpr, elems: Vec<Element> },
    Index(IndexNode),
    Call(Box<Expr>, Vec<Expr>),
    /// `&e`
    AddrOf(Box<Expr>),
    /// `*e`
    Deref(Box<Expr>),
    /// `-e`
    Neg(Box<Expr>),
    Paren(Box<Expr>),
    /// Any of the above with its source range. Only parsers built with
    /// token spans produce it.
    Spanned(Box<Expr>, Span),
}

/// `object[index]`, as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexNode {
    pub object: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Option<Span>,
}

impl IndexNode {
    pub fn new(object: Expr, index: Expr) -> Self {
        Self {
            object: Box::new(object),
            index: Box::new(index),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i128),
    Float(f64),
    Imag(f64),
    Char(char),
    Str(String),
}

/// One entry of a composite literal; `key` is the map key or array index.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub key: Option<Expr>,
    pub value: Expr,
}

impl Element {
    pub fn positional(value: Expr) -> Self {
        Self { key: None, value }
    }

    pub fn keyed(key: Expr, value: Expr) -> Self {
        Self { key: Some(key), value }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayLen {
    Fixed(usize),
    /// `[...]T`: length taken from the literal
    Inferred,
}

/// Type as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(String),
    Array(ArrayLen, Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Pointer(Box<TypeExpr>),
}

impl Expr {
    pub fn int(v: i128) -> Expr {
        Expr::Lit(Literal::Int(v))
    }

    pub fn str(s: &str) -> Expr {
        Expr::Lit(Literal::Str(s.to_string()))
    }

    pub fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    pub fn index(object: Expr, index: Expr) -> Expr {
        Expr::Index(IndexNode::new(object, index))
    }

    /// Strip redundant parentheses and source ranges.
    pub fn unparen(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Paren(inner) | Expr::Spanned(inner, _) = expr {
            expr = inner;
        }
        expr
    }

    /// Source range, when the parser recorded one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Expr::Spanned(_, span) => Some(*span),
            Expr::Index(node) => node.span,
            Expr::Paren(inner) => inner.span(),
            _ => None,
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{:?}", v),
            Literal::Imag(v) => write!(f, "{}i", v),
            Literal::Char(c) => write!(f, "{:?}", c),
            Literal::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::Array(ArrayLen::Fixed(n), elem) => write!(f, "[{}]{}", n, elem),
            TypeExpr::Array(ArrayLen::Inferred, elem) => write!(f, "[...]{}", elem),
            TypeExpr::Slice(elem) => write!(f, "[]{}", elem),
            TypeExpr::Map(key, value) => write!(f, "map[{}]{}", key, value),
            TypeExpr::Pointer(elem) => write!(f, "*{}", elem),
        }
    }
}

impl Display for IndexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.object, self.index)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Lit(lit) => write!(f, "{}", lit),
            Expr::Ident(name) => f.write_str(name),
            Expr::Composite { ty, elems } => {
                write!(f, "{}{{", ty)?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(key) = &elem.key {
                        write!(f, "{}: ", key)?;
                    }
                    write!(f, "{}", elem.value)?;
                }
                f.write_str("}")
            }
            Expr::Index(node) => write!(f, "{}", node),
            Expr::Call(callee, args) => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::AddrOf(inner) => write!(f, "&{}", inner),
            Expr::Deref(inner) => write!(f, "*{}", inner),
            Expr::Neg(inner) => write!(f, "-{}", inner),
            Expr::Paren(inner) => write!(f, "({})", inner),
            Expr::Spanned(inner, _) => write!(f, "{}", inner),
        }
    }
}
