use std::sync::Arc;

use tracing::debug;

use crate::compile::{CompileError, CompileErrorKind, CompileOptions, CompiledExpr, DiagnosticSink, TracingSink};
use crate::token::Span;
use crate::typ::RType;
use crate::util::fast_map::{FastHashMap, fast_hash_map_new};
use crate::val::HostFn;

/// What an identifier refers to.
#[derive(Debug, Clone)]
pub enum Binding {
    /// Variable stored in an [`Env`](crate::rt::Env) slot
    Var { slot: usize, ty: RType },
    /// Named constant, possibly untyped
    Const(CompiledExpr),
    /// Function supplied by the host program
    Func(HostFn),
}

/// Flat top-level scope; later declarations shadow earlier ones.
#[derive(Debug, Clone)]
pub struct Scope {
    names: FastHashMap<String, Binding>,
    next_slot: usize,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            names: fast_hash_map_new(),
            next_slot: 0,
        }
    }
}

impl Scope {
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.names.get(name)
    }

    /// Number of slots an environment needs for every declared variable.
    pub fn slot_count(&self) -> usize {
        self.next_slot
    }

    fn declare(&mut self, name: &str, binding: Binding) {
        self.names.insert(name.to_string(), binding);
    }
}

/// Compilation context, passed explicitly to every compiling function.
pub struct Comp {
    scope: Scope,
    sink: Arc<dyn DiagnosticSink>,
    options: CompileOptions,
}

impl Default for Comp {
    fn default() -> Self {
        Self::new()
    }
}

impl Comp {
    pub fn new() -> Self {
        Self::with_options(CompileOptions::default())
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self {
            scope: Scope::default(),
            sink: Arc::new(TracingSink),
            options,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: CompileOptions) {
        self.options = options;
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Declare a variable and return its environment slot.
    pub fn declare_var(&mut self, name: &str, ty: RType) -> usize {
        let slot = self.scope.next_slot;
        self.scope.next_slot += 1;
        debug!(name, slot, ty = %ty, "declare variable");
        self.scope.declare(name, Binding::Var { slot, ty });
        slot
    }

    pub fn declare_const(&mut self, name: &str, value: CompiledExpr) {
        debug!(name, ty = %value.ty(), "declare constant");
        self.scope.declare(name, Binding::Const(value));
    }

    pub fn declare_func(&mut self, func: HostFn) {
        let name = func.name().to_string();
        self.scope.declare(&name, Binding::Func(func));
    }

    /// Report a diagnostic to the sink and hand it back for `Err(..)`.
    pub fn errorf(&self, kind: CompileErrorKind, span: Option<Span>, message: impl Into<String>) -> CompileError {
        let err = CompileError::new(kind, message).with_span(span);
        self.sink.report(&err);
        err
    }
}
