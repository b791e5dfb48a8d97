use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::error;

use crate::token::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// The operand does not support the operation, e.g. indexing an int.
    InvalidOperation,
    /// An operand has the wrong type or a constant is not representable.
    TypeError,
    /// Unknown identifier or type name.
    Undefined,
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompileErrorKind::InvalidOperation => "invalid operation",
            CompileErrorKind::TypeError => "type error",
            CompileErrorKind::Undefined => "undefined",
        })
    }
}

/// Fatal compile-time diagnostic; aborts the enclosing expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(span) => write!(f, "{} at {}", self.message, span),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for CompileError {}

pub type CompileResult<T> = Result<T, CompileError>;

/// Receives every compile error before it aborts compilation.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, err: &CompileError);
}

/// Default sink: forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, err: &CompileError) {
        error!(kind = %err.kind, span = ?err.span, "{}", err.message);
    }
}

/// Sink that keeps diagnostics in memory; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    errors: Arc<Mutex<Vec<CompileError>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<CompileError> {
        self.errors.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, err: &CompileError) {
        self.errors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(err.clone());
    }
}
