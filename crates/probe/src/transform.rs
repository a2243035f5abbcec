//! Map / reduce / sort over a resolved target. Every function returns a
//! new value; the source is never mutated.

use std::cell::RefCell;

use serde_json::{Map, Number, Value};

use crate::error::{ProbeError, Result};
use crate::expr::{Expr, Scope};

/// Apply `expression` to every element of an array target. The expression
/// sees `item` and `index`.
pub fn map_values(target: &Value, expression: &Expr) -> Result<Value> {
    let items = target
        .as_array()
        .ok_or_else(|| ProbeError::type_mismatch("array", crate::value::type_name(target)))?;
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let index_value = Value::Number(Number::from(index));
        let scope = Scope::new().bind("item", item).bind("index", &index_value);
        out.push(expression.eval(&scope)?);
    }
    Ok(Value::Array(out))
}

/// Left fold with an empty-object initial accumulator. The expression sees
/// `acc`, `item`, and `index`, and its result becomes the next accumulator.
/// A scalar target is treated as a single-element reduction.
pub fn reduce_values(target: &Value, expression: &Expr) -> Result<Value> {
    let items: &[Value] = match target {
        Value::Array(items) => items,
        Value::Object(_) => {
            return Err(ProbeError::type_mismatch(
                "array or scalar",
                crate::value::type_name(target),
            ))
        }
        _ => std::slice::from_ref(target),
    };

    let mut acc = Value::Object(Map::new());
    for (index, item) in items.iter().enumerate() {
        let index_value = Value::Number(Number::from(index));
        let scope = Scope::new()
            .bind("acc", &acc)
            .bind("item", item)
            .bind("index", &index_value);
        acc = expression.eval(&scope)?;
    }
    Ok(acc)
}

/// Sort an array target by a three-way comparator expression over `a` and
/// `b`, interpreted by numeric sign. Returns a new array.
pub fn sort_values(target: &Value, comparator: &Expr) -> Result<Value> {
    let items = target
        .as_array()
        .ok_or_else(|| ProbeError::type_mismatch("array", crate::value::type_name(target)))?;

    // sort_by comparators are infallible; capture the first evaluation
    // failure and surface it after the sort.
    let failure: RefCell<Option<ProbeError>> = RefCell::new(None);
    let mut out = items.to_vec();
    out.sort_by(|a, b| {
        if failure.borrow().is_some() {
            return std::cmp::Ordering::Equal;
        }
        let scope = Scope::new().bind("a", a).bind("b", b);
        match comparator.eval(&scope) {
            Ok(result) => {
                let sign = result.as_f64().unwrap_or(0.0);
                sign.partial_cmp(&0.0).unwrap_or(std::cmp::Ordering::Equal)
            }
            Err(err) => {
                *failure.borrow_mut() = Some(err);
                std::cmp::Ordering::Equal
            }
        }
    });

    if let Some(err) = failure.into_inner() {
        return Err(err);
    }
    Ok(Value::Array(out))
}
