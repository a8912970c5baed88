//! Facade tying the lexer, parser, registry and evaluator together.

use std::{future::Future, sync::Arc};

use crate::{
    ast::{Expr, Token},
    error::{Error, EvalError, SyntaxError},
    evaluator::{EvalContext, Evaluator},
    lexer::Lexer,
    parser::Parser,
    registry::{EvalFuture, Registry, TransformFn},
    value::Value,
};

/// A filter expression engine with its own operator and transform registry.
///
/// Cloning is cheap: clones share the registry until one of them registers
/// or removes something, at which point that clone gets its own copy.
///
/// # Examples
///
/// ```
/// use recipe_filter::{Engine, Value};
/// use serde_json::json;
///
/// let engine = Engine::new();
/// let context = Value::from(json!({"normandy": {"channel": "beta", "userId": "abc"}}));
///
/// let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// let matched = runtime
///     .block_on(engine.evaluate(r#"normandy.channel in ["beta", "nightly"]"#, &context))
///     .unwrap();
/// assert_eq!(matched, Value::Boolean(true));
/// ```
#[derive(Clone, Debug)]
pub struct Engine {
    registry: Arc<Registry>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with the default operators and transforms.
    pub fn new() -> Self {
        Self::with_registry(Registry::with_defaults())
    }

    pub fn with_registry(registry: Registry) -> Self {
        Engine {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn registry_mut(&mut self) -> &mut Registry {
        Arc::make_mut(&mut self.registry)
    }

    pub fn add_binary_op<F>(&mut self, symbol: impl Into<String>, precedence: i32, f: F)
    where
        F: Fn(Value, Value) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.registry_mut().add_binary_op(symbol, precedence, f);
    }

    pub fn add_binary_op_async<F, Fut>(&mut self, symbol: impl Into<String>, precedence: i32, f: F)
    where
        F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, EvalError>> + Send + 'static,
    {
        self.registry_mut().add_binary_op_async(symbol, precedence, f);
    }

    /// Registers a binary operator that receives its right operand
    /// unevaluated, the way `&&` and `||` do.
    pub fn add_short_circuit_op<F>(&mut self, symbol: impl Into<String>, precedence: i32, f: F)
    where
        F: for<'a> Fn(Value, EvalFuture<'a>) -> EvalFuture<'a> + Send + Sync + 'static,
    {
        self.registry_mut().add_short_circuit_op(symbol, precedence, f);
    }

    pub fn add_unary_op<F>(&mut self, symbol: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.registry_mut().add_unary_op(symbol, f);
    }

    pub fn add_unary_op_async<F, Fut>(&mut self, symbol: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, EvalError>> + Send + 'static,
    {
        self.registry_mut().add_unary_op_async(symbol, f);
    }

    pub fn add_transform<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Value, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.registry_mut().add_transform(name, f);
    }

    pub fn add_transform_async<F, Fut>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Value, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, EvalError>> + Send + 'static,
    {
        self.registry_mut().add_transform_async(name, f);
    }

    pub fn add_transforms<I, S>(&mut self, transforms: I)
    where
        I: IntoIterator<Item = (S, TransformFn)>,
        S: Into<String>,
    {
        self.registry_mut().add_transforms(transforms);
    }

    pub fn get_transform(&self, name: &str) -> Option<TransformFn> {
        self.registry.get_transform(name)
    }

    /// Removes a binary or unary operator, built-ins included. Expressions
    /// using the symbol no longer tokenize, and already-parsed trees using it
    /// fail to evaluate.
    pub fn remove_op(&mut self, symbol: &str) -> bool {
        self.registry_mut().remove_op(symbol)
    }

    pub fn tokenize(&self, expression: &str) -> Result<Vec<Token>, SyntaxError> {
        let tokens = Lexer::new(expression, &self.registry).tokenize()?;
        log::trace!("tokens: {:?}", tokens);
        Ok(tokens)
    }

    pub fn parse(&self, expression: &str) -> Result<Expr, SyntaxError> {
        let tokens = self.tokenize(expression)?;
        Parser::new(tokens, &self.registry).parse()
    }

    /// Evaluates an already-parsed expression against the current registry.
    pub async fn eval(&self, expr: &Expr, context: &Value) -> Result<Value, Error> {
        Evaluator::new(&self.registry)
            .eval(expr, EvalContext::new(context))
            .await
            .map_err(Error::from)
    }

    /// Tokenizes, parses and evaluates `expression` against `context`.
    ///
    /// All failures, syntax errors included, surface when the returned future
    /// is awaited.
    pub async fn evaluate(&self, expression: &str, context: &Value) -> Result<Value, Error> {
        log::debug!("evaluating expression: {}", expression);
        let expr = self.parse(expression)?;
        let result = self.eval(&expr, context).await;
        if let Err(e) = &result {
            log::debug!("evaluation of '{}' failed: {}", expression, e);
        }
        result
    }

    /// Callback-style adapter around [`Engine::evaluate`] for hosts that do
    /// not await futures.
    ///
    /// Inside a tokio runtime the evaluation is spawned onto it. Outside one,
    /// it runs on a new thread driving its own current-thread runtime.
    /// Either way `callback` receives the outcome exactly once.
    pub fn evaluate_with_callback<F>(
        &self,
        expression: impl Into<String>,
        context: Value,
        callback: F,
    ) where
        F: FnOnce(Result<Value, Error>) + Send + 'static,
    {
        let engine = self.clone();
        let expression = expression.into();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let result = engine.evaluate(&expression, &context).await;
                    callback(result);
                });
            }
            Err(_) => {
                log::trace!("no runtime in scope, evaluating '{}' on a new thread", expression);
                std::thread::spawn(move || {
                    let result = tokio::runtime::Builder::new_current_thread()
                        .build()
                        .map_err(|e| {
                            let message = format!("failed to start runtime: {}", e);
                            Error::Eval(EvalError::Custom(message))
                        })
                        .and_then(|runtime| {
                            runtime.block_on(engine.evaluate(&expression, &context))
                        });
                    callback(result);
                });
            }
        }
    }
}
