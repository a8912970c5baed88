use std::collections::HashMap;

use crate::{
    ast::Expr,
    error::EvalError,
    registry::{BinaryEval, EvalFuture, Registry},
    value::Value,
};

/// Evaluation context holding both the root context and the filter element
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// The caller-supplied context that plain identifiers resolve against
    pub root: &'a Value,
    /// The element currently tested by a filter (what `.name` refers to)
    pub relative: Option<&'a Value>,
}

impl<'a> EvalContext<'a> {
    pub fn new(root: &'a Value) -> Self {
        EvalContext {
            root,
            relative: None,
        }
    }

    /// Create a new context with a filter element
    pub fn with_relative<'b>(&self, relative: &'b Value) -> EvalContext<'b>
    where
        'a: 'b,
    {
        EvalContext {
            root: self.root,
            relative: Some(relative),
        }
    }
}

/// Asynchronous tree-walking evaluator.
///
/// Operators and transforms are looked up in the registry at the moment a
/// node is evaluated, not when the tree was parsed.
pub struct Evaluator<'r> {
    registry: &'r Registry,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Evaluator { registry }
    }

    /// Evaluates an expression against a context.
    ///
    /// Every failure is reported through the returned future; nothing is
    /// raised when the future is created.
    ///
    /// # Examples
    ///
    /// ```
    /// use recipe_filter::{Evaluator, EvalContext, Expr, Registry, Value};
    ///
    /// let registry = Registry::with_defaults();
    /// let expr = Expr::Identifier { name: "answer".into(), relative: false };
    /// let ctx = Value::from(serde_json::json!({"answer": 42}));
    ///
    /// let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    /// let result = runtime.block_on(Evaluator::new(&registry).eval(&expr, EvalContext::new(&ctx)));
    /// assert_eq!(result, Ok(Value::Integer(42)));
    /// ```
    pub fn eval<'a>(&'a self, expr: &'a Expr, ctx: EvalContext<'a>) -> EvalFuture<'a> {
        Box::pin(async move {
            match expr {
                Expr::Literal(value) => Ok(value.clone()),
                Expr::Identifier { name, relative } => {
                    let scope = if *relative { ctx.relative } else { Some(ctx.root) };
                    Ok(scope.map_or(Value::Null, |scope| lookup(scope, name)))
                }
                Expr::Member {
                    subject, property, ..
                } => {
                    let subject = self.eval(subject, ctx).await?;
                    let property = self.eval(property, ctx).await?;
                    Ok(apply_access(&subject, &property))
                }
                Expr::Array(items) => {
                    let mut arr = Vec::with_capacity(items.len());
                    for item in items {
                        arr.push(self.eval(item, ctx).await?);
                    }
                    Ok(Value::Array(arr))
                }
                Expr::Object(pairs) => {
                    let mut map = HashMap::new();
                    for (key, expr) in pairs {
                        let value = self.eval(expr, ctx).await?;
                        map.insert(key.clone(), value);
                    }
                    Ok(Value::Object(map))
                }
                Expr::Unary { op, operand } => {
                    let unary = self
                        .registry
                        .unary_op(op)
                        .ok_or_else(|| EvalError::UnknownOperator(op.clone()))?;
                    let operand = self.eval(operand, ctx).await?;
                    (unary.eval)(operand).await
                }
                Expr::Binary { op, left, right } => {
                    let binary = self
                        .registry
                        .binary_op(op)
                        .ok_or_else(|| EvalError::UnknownOperator(op.clone()))?;
                    let left = self.eval(left, ctx).await?;
                    match &binary.eval {
                        BinaryEval::Eager(f) => {
                            let right = self.eval(right, ctx).await?;
                            f(left, right).await
                        }
                        BinaryEval::ShortCircuit(f) => f(left, self.eval(right, ctx)).await,
                    }
                }
                Expr::Conditional {
                    test,
                    consequent,
                    alternate,
                } => {
                    if self.eval(test, ctx).await?.is_truthy() {
                        self.eval(consequent, ctx).await
                    } else {
                        self.eval(alternate, ctx).await
                    }
                }
                Expr::Filter { subject, predicate } => {
                    let items = match self.eval(subject, ctx).await? {
                        Value::Array(items) => items,
                        Value::Null => Vec::new(),
                        other => vec![other],
                    };
                    let mut kept = Vec::new();
                    for item in items {
                        let keep = self.eval(predicate, ctx.with_relative(&item)).await?;
                        if keep.is_truthy() {
                            kept.push(item);
                        }
                    }
                    Ok(Value::Array(kept))
                }
                Expr::Transform {
                    subject,
                    name,
                    args,
                } => {
                    let subject = self.eval(subject, ctx).await?;
                    let mut values = Vec::with_capacity(args.len());
                    for arg in args {
                        values.push(self.eval(arg, ctx).await?);
                    }
                    let transform = self
                        .registry
                        .transform(name)
                        .ok_or_else(|| EvalError::UnknownTransform(name.clone()))?;
                    transform(subject, values).await
                }
            }
        })
    }
}

fn lookup(scope: &Value, name: &str) -> Value {
    match scope {
        Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Resolves `subject[property]`; anything that does not resolve is null.
fn apply_access(subject: &Value, property: &Value) -> Value {
    match (subject, property) {
        (Value::Object(map), Value::String(k)) => map.get(k).cloned().unwrap_or(Value::Null),
        (Value::Object(map), Value::Integer(_) | Value::Float(_) | Value::Boolean(_)) => map
            .get(&property.as_string())
            .cloned()
            .unwrap_or(Value::Null),
        (Value::Array(arr), Value::Integer(n)) => {
            let index = if *n < 0 {
                // Negative index: count from end (-1 = last, -2 = second to last)
                let abs_idx = n.unsigned_abs() as usize;
                if abs_idx > arr.len() {
                    return Value::Null;
                }
                arr.len() - abs_idx
            } else {
                *n as usize
            };
            arr.get(index).cloned().unwrap_or(Value::Null)
        }
        (Value::String(s), Value::Integer(n)) if *n >= 0 => s
            .chars()
            .nth(*n as usize)
            .map_or(Value::Null, |c| Value::String(c.to_string())),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_access() {
        let arr = Value::from(json!(["a", "b", "c"]));
        assert_eq!(apply_access(&arr, &Value::Integer(1)), Value::from("b"));
        assert_eq!(apply_access(&arr, &Value::Integer(-1)), Value::from("c"));
        assert_eq!(apply_access(&arr, &Value::Integer(5)), Value::Null);
        assert_eq!(apply_access(&arr, &Value::from("length")), Value::Null);

        let obj = Value::from(json!({"1": "one", "a": {"b": true}}));
        assert_eq!(apply_access(&obj, &Value::Integer(1)), Value::from("one"));
        assert_eq!(apply_access(&Value::Null, &Value::from("a")), Value::Null);
    }
}
