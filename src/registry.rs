//! Runtime-mutable table of operators and transforms.
//!
//! The lexer, the parser and the evaluator all consult the same [`Registry`],
//! so a symbol added here is immediately tokenizable, parseable and
//! evaluable, and a removed symbol stops being any of those.

use std::{collections::HashMap, fmt, future::Future, pin::Pin, sync::Arc};

use crate::{error::EvalError, operators, transform, value::Value};

/// An eventual result of one evaluation step.
pub type EvalFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, EvalError>> + Send + 'a>>;

/// Binary operator receiving both operands already evaluated.
pub type BinaryFn = Arc<dyn Fn(Value, Value) -> EvalFuture<'static> + Send + Sync>;

/// Binary operator receiving the left operand and the not-yet-started
/// evaluation of the right one. The right side is only evaluated if the
/// operator awaits it.
pub type ShortCircuitFn =
    Arc<dyn for<'a> Fn(Value, EvalFuture<'a>) -> EvalFuture<'a> + Send + Sync>;

/// Prefix operator.
pub type UnaryFn = Arc<dyn Fn(Value) -> EvalFuture<'static> + Send + Sync>;

/// Named transform: `subject|name(args...)`.
pub type TransformFn = Arc<dyn Fn(Value, Vec<Value>) -> EvalFuture<'static> + Send + Sync>;

#[derive(Clone)]
pub enum BinaryEval {
    Eager(BinaryFn),
    ShortCircuit(ShortCircuitFn),
}

/// Registration of a binary operator. Higher precedence binds tighter; all
/// binary operators are left-associative.
#[derive(Clone)]
pub struct BinaryOp {
    pub precedence: i32,
    pub eval: BinaryEval,
}

/// Registration of a unary operator. Unary operators bind tighter than any
/// binary operator.
#[derive(Clone)]
pub struct UnaryOp {
    pub eval: UnaryFn,
}

/// Operators and transforms known to one engine.
///
/// Mutation is not synchronised against in-flight evaluations; the engine
/// shares the registry copy-on-write, so an evaluation keeps the registry it
/// started with.
#[derive(Clone, Default)]
pub struct Registry {
    binary: HashMap<String, BinaryOp>,
    unary: HashMap<String, UnaryOp>,
    transforms: HashMap<String, TransformFn>,
}

/// Wraps a synchronous transform into a [`TransformFn`], for use with
/// [`Registry::add_transforms`].
pub fn sync_transform<F>(f: F) -> TransformFn
where
    F: Fn(Value, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
{
    Arc::new(move |subject, args: Vec<Value>| -> EvalFuture<'static> {
        Box::pin(std::future::ready(f(subject, &args)))
    })
}

impl Registry {
    /// Creates a registry with no operators and no transforms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the default operators (arithmetic,
    /// comparison, logical, `in`, `intersect`) and transforms (`date`,
    /// `stableSample`, `bucketSample` and the collection helpers).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        operators::register_defaults(&mut registry);
        transform::register_defaults(&mut registry);
        registry
    }

    /// Registers (or replaces) a left-associative binary operator.
    pub fn add_binary_op<F>(&mut self, symbol: impl Into<String>, precedence: i32, f: F)
    where
        F: Fn(Value, Value) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        let eval: BinaryFn = Arc::new(move |left, right| -> EvalFuture<'static> {
            Box::pin(std::future::ready(f(left, right)))
        });
        self.insert_binary(symbol.into(), precedence, BinaryEval::Eager(eval));
    }

    /// Registers (or replaces) a binary operator whose result is produced
    /// asynchronously.
    pub fn add_binary_op_async<F, Fut>(&mut self, symbol: impl Into<String>, precedence: i32, f: F)
    where
        F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, EvalError>> + Send + 'static,
    {
        let eval: BinaryFn =
            Arc::new(move |left, right| -> EvalFuture<'static> { Box::pin(f(left, right)) });
        self.insert_binary(symbol.into(), precedence, BinaryEval::Eager(eval));
    }

    /// Registers (or replaces) a binary operator that decides whether its
    /// right operand is evaluated at all.
    pub fn add_short_circuit_op<F>(&mut self, symbol: impl Into<String>, precedence: i32, f: F)
    where
        F: for<'a> Fn(Value, EvalFuture<'a>) -> EvalFuture<'a> + Send + Sync + 'static,
    {
        self.insert_binary(symbol.into(), precedence, BinaryEval::ShortCircuit(Arc::new(f)));
    }

    fn insert_binary(&mut self, symbol: String, precedence: i32, eval: BinaryEval) {
        log::debug!("registering binary operator '{}' with precedence {}", symbol, precedence);
        self.binary.insert(symbol, BinaryOp { precedence, eval });
    }

    /// Registers (or replaces) a prefix operator.
    pub fn add_unary_op<F>(&mut self, symbol: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        let eval: UnaryFn = Arc::new(move |operand| -> EvalFuture<'static> {
            Box::pin(std::future::ready(f(operand)))
        });
        self.insert_unary(symbol.into(), eval);
    }

    /// Registers (or replaces) a prefix operator whose result is produced
    /// asynchronously.
    pub fn add_unary_op_async<F, Fut>(&mut self, symbol: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, EvalError>> + Send + 'static,
    {
        let eval: UnaryFn = Arc::new(move |operand| -> EvalFuture<'static> { Box::pin(f(operand)) });
        self.insert_unary(symbol.into(), eval);
    }

    fn insert_unary(&mut self, symbol: String, eval: UnaryFn) {
        log::debug!("registering unary operator '{}'", symbol);
        self.unary.insert(symbol, UnaryOp { eval });
    }

    /// Registers (or replaces) a transform.
    pub fn add_transform<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Value, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.insert_transform(name.into(), sync_transform(f));
    }

    /// Registers (or replaces) a transform whose result is produced
    /// asynchronously.
    pub fn add_transform_async<F, Fut>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Value, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, EvalError>> + Send + 'static,
    {
        let eval: TransformFn =
            Arc::new(move |subject, args| -> EvalFuture<'static> { Box::pin(f(subject, args)) });
        self.insert_transform(name.into(), eval);
    }

    /// Registers every transform of the mapping, replacing same-named ones.
    pub fn add_transforms<I, S>(&mut self, transforms: I)
    where
        I: IntoIterator<Item = (S, TransformFn)>,
        S: Into<String>,
    {
        for (name, f) in transforms {
            self.insert_transform(name.into(), f);
        }
    }

    fn insert_transform(&mut self, name: String, f: TransformFn) {
        log::debug!("registering transform '{}'", name);
        self.transforms.insert(name, f);
    }

    /// Returns the transform registered under `name`.
    pub fn get_transform(&self, name: &str) -> Option<TransformFn> {
        self.transforms.get(name).cloned()
    }

    /// Removes the binary and/or unary operator registered under `symbol`.
    ///
    /// Returns whether anything was removed.
    pub fn remove_op(&mut self, symbol: &str) -> bool {
        let binary = self.binary.remove(symbol).is_some();
        let unary = self.unary.remove(symbol).is_some();
        if binary || unary {
            log::debug!("removed operator '{}'", symbol);
        }
        binary || unary
    }

    pub fn binary_op(&self, symbol: &str) -> Option<&BinaryOp> {
        self.binary.get(symbol)
    }

    pub fn unary_op(&self, symbol: &str) -> Option<&UnaryOp> {
        self.unary.get(symbol)
    }

    pub fn transform(&self, name: &str) -> Option<&TransformFn> {
        self.transforms.get(name)
    }

    /// Every registered operator symbol (binary and unary, deduplicated).
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self
            .binary
            .keys()
            .chain(self.unary.keys())
            .map(String::as_str)
            .collect();
        symbols.sort_unstable();
        symbols.dedup();
        symbols
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut transforms: Vec<&String> = self.transforms.keys().collect();
        transforms.sort();
        f.debug_struct("Registry")
            .field("operators", &self.symbols())
            .field("transforms", &transforms)
            .finish()
    }
}
