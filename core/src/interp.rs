//! Parse, compile and evaluate source text against a persistent scope.

use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::ast::Parser;
use crate::compile::{CompileError, CompileErrorKind, CompileOptions, CompiledExpr, Comp, DiagnosticSink};
use crate::rt::{Env, RuntimeError};
use crate::stmt::{Program, Stmt, StmtParser};
use crate::token::{ParseError, Tokenizer};
use crate::typ::RType;
use crate::val::{HostFn, Lookup, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    Parse(ParseError),
    Compile(CompileError),
    Runtime(RuntimeError),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Parse(err) => write!(f, "parse error: {}", err),
            EvalError::Compile(err) => write!(f, "compile error: {}", err),
            EvalError::Runtime(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EvalError::Parse(err) => Some(err),
            EvalError::Compile(err) => Some(err),
            EvalError::Runtime(err) => Some(err),
        }
    }
}

impl From<ParseError> for EvalError {
    fn from(err: ParseError) -> Self {
        EvalError::Parse(err)
    }
}

impl From<CompileError> for EvalError {
    fn from(err: CompileError) -> Self {
        EvalError::Compile(err)
    }
}

impl From<RuntimeError> for EvalError {
    fn from(err: RuntimeError) -> Self {
        EvalError::Runtime(err)
    }
}

/// Outcome of one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Value { value: Value, ty: RType },
    /// Comma-ok result of a map index expression
    Pair { lookup: Lookup, ty: RType },
    /// Names introduced by `:=` or `const`
    Bound(Vec<String>),
}

impl fmt::Display for Evaluated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluated::Value { value, ty } => write!(f, "{}\t// {}", value, ty),
            Evaluated::Pair { lookup, ty } => write!(f, "{}\t// {}\n{}\t// bool", lookup.value, ty, lookup.found),
            Evaluated::Bound(_) => Ok(()),
        }
    }
}

impl Serialize for Evaluated {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Evaluated::Value { value, ty } => {
                map.serialize_entry("value", value)?;
                map.serialize_entry("type", &ty.to_string())?;
            }
            Evaluated::Pair { lookup, ty } => {
                map.serialize_entry("value", &lookup.value)?;
                map.serialize_entry("found", &lookup.found)?;
                map.serialize_entry("type", &ty.to_string())?;
            }
            Evaluated::Bound(names) => map.serialize_entry("bound", names)?,
        }
        map.end()
    }
}

/// Interpreter facade: owns the compile context and the environment its
/// variables live in.
pub struct Interp {
    comp: Comp,
    env: Env,
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

impl Interp {
    pub fn new() -> Self {
        Self::with_options(CompileOptions::default())
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self {
            comp: Comp::with_options(options),
            env: Env::new(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.comp = self.comp.with_sink(sink);
        self
    }

    pub fn comp(&self) -> &Comp {
        &self.comp
    }

    pub fn set_options(&mut self, options: CompileOptions) {
        self.comp.set_options(options);
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Env {
        &mut self.env
    }

    /// Bind a variable. `value` must have type `ty`.
    pub fn define_var(&mut self, name: &str, ty: RType, value: Value) {
        let slot = self.comp.declare_var(name, ty);
        self.env.set(slot, value);
    }

    pub fn define_func(&mut self, func: HostFn) {
        self.comp.declare_func(func);
    }

    /// Compile a single expression against the current scope.
    pub fn compile(&self, src: &str) -> Result<CompiledExpr, EvalError> {
        let (tokens, spans) = Tokenizer::tokenize_enhanced_with_spans(src)?;
        let expr = Parser::new_with_spans(&tokens, &spans).parse_with_enhanced_errors(src)?;
        Ok(self.comp.expr(&expr)?)
    }

    /// Compile and evaluate a single expression in single-value context.
    pub fn eval(&mut self, src: &str) -> Result<Value, EvalError> {
        let compiled = self.compile(src)?;
        Ok(compiled.eval(&mut self.env)?)
    }

    pub fn parse(&self, src: &str) -> Result<Program, EvalError> {
        let (tokens, spans) = Tokenizer::tokenize_enhanced_with_spans(src)?;
        Ok(StmtParser::new_with_spans(&tokens, &spans).parse_program_with_enhanced_errors(src)?)
    }

    /// Run every statement of `src`, stopping at the first error.
    pub fn eval_line(&mut self, src: &str) -> Result<Vec<Evaluated>, EvalError> {
        let program = self.parse(src)?;
        let mut results = Vec::with_capacity(program.len());
        for stmt in &program.statements {
            results.push(self.exec(stmt)?);
        }
        Ok(results)
    }

    pub fn exec(&mut self, stmt: &Stmt) -> Result<Evaluated, EvalError> {
        debug!(stmt = %stmt, "exec");
        match stmt {
            Stmt::Expr(expr) => {
                let compiled = self.comp.expr(expr)?;
                if compiled.is_comma_ok() {
                    let lookup = compiled.eval_comma_ok(&mut self.env)?;
                    return Ok(Evaluated::Pair {
                        lookup,
                        ty: compiled.ty().clone(),
                    });
                }
                let value = compiled.eval(&mut self.env)?;
                Ok(Evaluated::Value {
                    value,
                    ty: compiled.ty().clone(),
                })
            }
            Stmt::Define { names, value } => self.define(names, value),
            Stmt::Const { name, value } => {
                let compiled = self.comp.expr1(value)?;
                if !compiled.is_const() {
                    return Err(self
                        .comp
                        .errorf(
                            CompileErrorKind::TypeError,
                            None,
                            format!("{} (value of type {}) is not constant", value, compiled.ty()),
                        )
                        .into());
                }
                self.comp.declare_const(name, compiled);
                Ok(Evaluated::Bound(vec![name.clone()]))
            }
        }
    }

    /// The right-hand side is compiled and evaluated before any name is
    /// declared, so it still sees earlier bindings of the same names.
    fn define(&mut self, names: &[String], value: &crate::expr::Expr) -> Result<Evaluated, EvalError> {
        match names {
            [name] => {
                let mut compiled = self.comp.expr1(value)?;
                compiled
                    .const_to_default()
                    .map_err(|err| self.comp.errorf(CompileErrorKind::TypeError, None, err.to_string()))?;
                let result = compiled.eval(&mut self.env)?;
                self.bind(name, compiled.ty().clone(), result);
            }
            [value_name, found_name] => {
                let compiled = self.comp.expr(value)?;
                if !compiled.is_comma_ok() {
                    return Err(self
                        .comp
                        .errorf(
                            CompileErrorKind::TypeError,
                            None,
                            format!("assignment mismatch: 2 variables but {} returns 1 value", value),
                        )
                        .into());
                }
                let lookup = compiled.eval_comma_ok(&mut self.env)?;
                self.bind(value_name, compiled.ty().clone(), lookup.value);
                self.bind(found_name, RType::Bool, Value::Bool(lookup.found));
            }
            _ => {
                return Err(self
                    .comp
                    .errorf(
                        CompileErrorKind::TypeError,
                        None,
                        format!("assignment mismatch: {} variables but 1 value", names.len()),
                    )
                    .into());
            }
        }
        Ok(Evaluated::Bound(names.iter().filter(|n| n.as_str() != "_").cloned().collect()))
    }

    fn bind(&mut self, name: &str, ty: RType, value: Value) {
        if name != "_" {
            self.define_var(name, ty, value);
        }
    }
}
