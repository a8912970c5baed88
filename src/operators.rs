//! Default operator set.
//!
//! | Symbol                           | Precedence |
//! |----------------------------------|------------|
//! | `\|\|` `&&`                      | 10         |
//! | `==` `!=` `<` `<=` `>` `>=` `in` `intersect` | 20 |
//! | `+` `-`                          | 30         |
//! | `*` `/` `//` `%`                 | 40         |
//! | `^`                              | 50         |
//!
//! `!` is the only default unary operator.

use std::cmp::Ordering;

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    error::EvalError,
    registry::{EvalFuture, Registry},
    value::Value,
};

pub const LOGICAL_PRECEDENCE: i32 = 10;
pub const COMPARISON_PRECEDENCE: i32 = 20;
pub const ADDITIVE_PRECEDENCE: i32 = 30;
pub const MULTIPLICATIVE_PRECEDENCE: i32 = 40;
pub const EXPONENT_PRECEDENCE: i32 = 50;

pub(crate) fn register_defaults(registry: &mut Registry) {
    registry.add_short_circuit_op("&&", LOGICAL_PRECEDENCE, and);
    registry.add_short_circuit_op("||", LOGICAL_PRECEDENCE, or);

    registry.add_binary_op("==", COMPARISON_PRECEDENCE, |l, r| Ok(Value::Boolean(l.loose_eq(&r))));
    registry.add_binary_op("!=", COMPARISON_PRECEDENCE, |l, r| Ok(Value::Boolean(!l.loose_eq(&r))));
    registry.add_binary_op("<", COMPARISON_PRECEDENCE, |l, r| {
        Ok(compare(&l, &r, |o| o == Ordering::Less))
    });
    registry.add_binary_op("<=", COMPARISON_PRECEDENCE, |l, r| {
        Ok(compare(&l, &r, |o| o != Ordering::Greater))
    });
    registry.add_binary_op(">", COMPARISON_PRECEDENCE, |l, r| {
        Ok(compare(&l, &r, |o| o == Ordering::Greater))
    });
    registry.add_binary_op(">=", COMPARISON_PRECEDENCE, |l, r| {
        Ok(compare(&l, &r, |o| o != Ordering::Less))
    });
    registry.add_binary_op("in", COMPARISON_PRECEDENCE, |l, r| Ok(Value::Boolean(contains(&r, &l))));
    registry.add_binary_op("intersect", COMPARISON_PRECEDENCE, intersect);

    registry.add_binary_op("+", ADDITIVE_PRECEDENCE, add);
    registry.add_binary_op("-", ADDITIVE_PRECEDENCE, |l, r| {
        arithmetic("-", &l, &r, i64::checked_sub, |a, b| a.checked_sub(b), |a, b| a - b)
    });
    registry.add_binary_op("*", MULTIPLICATIVE_PRECEDENCE, |l, r| {
        arithmetic("*", &l, &r, i64::checked_mul, |a, b| a.checked_mul(b), |a, b| a * b)
    });
    registry.add_binary_op("/", MULTIPLICATIVE_PRECEDENCE, divide);
    registry.add_binary_op("//", MULTIPLICATIVE_PRECEDENCE, floor_divide);
    registry.add_binary_op("%", MULTIPLICATIVE_PRECEDENCE, modulo);
    registry.add_binary_op("^", EXPONENT_PRECEDENCE, power);

    registry.add_unary_op("!", |operand| Ok(Value::Boolean(!operand.is_truthy())));
}

fn and<'a>(left: Value, right: EvalFuture<'a>) -> EvalFuture<'a> {
    Box::pin(async move {
        if left.is_truthy() {
            right.await
        } else {
            Ok(left)
        }
    })
}

fn or<'a>(left: Value, right: EvalFuture<'a>) -> EvalFuture<'a> {
    Box::pin(async move {
        if left.is_truthy() {
            Ok(left)
        } else {
            right.await
        }
    })
}

/// Ordered comparison; operands without an ordering compare as `false`.
fn compare(left: &Value, right: &Value, accept: impl Fn(Ordering) -> bool) -> Value {
    Value::Boolean(left.partial_compare(right).is_some_and(accept))
}

/// `needle in haystack`: substring test on strings, membership on arrays.
fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::String(h), Value::String(n)) => h.contains(n.as_str()),
        (Value::Array(items), n) => items.iter().any(|item| item.loose_eq(n)),
        _ => false,
    }
}

fn intersect(left: Value, right: Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Array(l), Value::Array(r)) => Ok(Value::Array(
            l.into_iter()
                .filter(|item| r.iter().any(|other| other.loose_eq(item)))
                .collect(),
        )),
        (l, r) => Err(EvalError::TypeError(format!(
            "Cannot intersect {} with {}",
            l.type_name(),
            r.type_name()
        ))),
    }
}

fn add(left: Value, right: Value) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        _ => arithmetic("+", &left, &right, i64::checked_add, |a, b| a.checked_add(b), |a, b| a + b),
    }
}

/// Collapses a decimal result to an integer when it is whole.
fn from_decimal(d: Decimal) -> Option<Value> {
    if d.is_integer()
        && let Some(i) = d.to_i64()
    {
        Some(Value::Integer(i))
    } else {
        d.to_f64().map(Value::Float)
    }
}

/// Mixed integer/float arithmetic goes through `Decimal` so that results like
/// `0.5 + 1` or `1.1 * 10` stay exact.
fn arithmetic(
    symbol: &str,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    dec_op: fn(Decimal, Decimal) -> Option<Decimal>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(int_op(*a, *b)
            .map(Value::Integer)
            .unwrap_or_else(|| Value::Float(float_op(*a as f64, *b as f64)))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(*a, *b))),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => {
                if let Some(ad) = Decimal::from_f64(a)
                    && let Some(bd) = Decimal::from_f64(b)
                    && let Some(result) = dec_op(ad, bd).and_then(from_decimal)
                {
                    return Ok(result);
                }
                Ok(Value::Float(float_op(a, b)))
            }
            _ => Err(EvalError::TypeError(format!(
                "Cannot apply '{}' to {} and {}",
                symbol,
                left.type_name(),
                right.type_name()
            ))),
        },
    }
}

fn is_zero(value: &Value) -> bool {
    value.as_float().is_some_and(|n| n == 0.0)
}

fn divide(left: Value, right: Value) -> Result<Value, EvalError> {
    if is_zero(&right) && left.as_float().is_some() {
        return Err(EvalError::DivisionByZero);
    }
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) if a.checked_rem(*b) == Some(0) => {
            Ok(Value::Integer(a / b))
        }
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Float(*a as f64 / *b as f64)),
        _ => arithmetic("/", &left, &right, |_, _| None, |a, b| a.checked_div(b), |a, b| a / b),
    }
}

fn floor_divide(left: Value, right: Value) -> Result<Value, EvalError> {
    if is_zero(&right) && left.as_float().is_some() {
        return Err(EvalError::DivisionByZero);
    }
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => {
            let quotient = a.checked_div(*b).ok_or(EvalError::DivisionByZero)?;
            if a % b != 0 && ((*a < 0) != (*b < 0)) {
                Ok(Value::Integer(quotient - 1))
            } else {
                Ok(Value::Integer(quotient))
            }
        }
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float((a / b).floor())),
            _ => Err(EvalError::TypeError(format!(
                "Cannot apply '//' to {} and {}",
                left.type_name(),
                right.type_name()
            ))),
        },
    }
}

fn modulo(left: Value, right: Value) -> Result<Value, EvalError> {
    if is_zero(&right) && left.as_float().is_some() {
        return Err(EvalError::DivisionByZero);
    }
    arithmetic("%", &left, &right, i64::checked_rem, |a, b| a.checked_rem(b), |a, b| a % b)
}

fn power(left: Value, right: Value) -> Result<Value, EvalError> {
    if let (Value::Integer(base), Value::Integer(exp)) = (&left, &right)
        && let Ok(exp) = u32::try_from(*exp)
        && let Some(result) = base.checked_pow(exp)
    {
        return Ok(Value::Integer(result));
    }
    match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => Ok(Value::Float(a.powf(b))),
        _ => Err(EvalError::TypeError(format!(
            "Cannot apply '^' to {} and {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}
