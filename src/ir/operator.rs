//! The operator catalog.
//!
//! Arithmetic applies per-kind rules directly and treats NULL as an
//! absorbing identity. Comparisons first bring both operands to a common
//! kind through the upcast lattice.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::error::{QueryError, QueryResult};
use crate::types::coercion::upcast_values;
use crate::types::value::Value;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    And,
    Divide,
    Equals,
    GreaterThan,
    GreaterThanOrEquals,
    LessThan,
    LessThanOrEquals,
    Multiply,
    Negate,
    NotEquals,
    Or,
    Subtract,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Binary,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => " + ",
            Operator::And => " and ",
            Operator::Divide => " / ",
            Operator::Equals => " == ",
            Operator::GreaterThan => " > ",
            Operator::GreaterThanOrEquals => " >= ",
            Operator::LessThan => " < ",
            Operator::LessThanOrEquals => " <= ",
            Operator::Multiply => " * ",
            Operator::Negate => " -",
            Operator::NotEquals => " != ",
            Operator::Or => " or ",
            Operator::Subtract => " - ",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operator::Negate => Arity::Unary,
            _ => Arity::Binary,
        }
    }

    pub fn is_binary(&self) -> bool {
        self.arity() == Arity::Binary
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::Equals
                | Operator::NotEquals
                | Operator::GreaterThan
                | Operator::GreaterThanOrEquals
                | Operator::LessThan
                | Operator::LessThanOrEquals
        )
    }

    fn name(&self) -> &'static str {
        self.symbol().trim()
    }

    pub fn apply_binary(&self, left: &Value, right: &Value) -> QueryResult<Value> {
        match self {
            Operator::Add => add(left, right),
            Operator::Subtract => subtract(left, right),
            Operator::Multiply => multiply(left, right),
            Operator::Divide => divide(left, right),
            Operator::And => logical(*self, left, right),
            Operator::Or => logical(*self, left, right),
            Operator::Equals
            | Operator::NotEquals
            | Operator::GreaterThan
            | Operator::GreaterThanOrEquals
            | Operator::LessThan
            | Operator::LessThanOrEquals => compare(*self, left, right).map(Value::Bool),
            Operator::Negate => Err(QueryError::schema(format!(
                "operator '{}' is unary but was given two operands",
                self.name()
            ))),
        }
    }

    pub fn apply_unary(&self, value: &Value) -> QueryResult<Value> {
        match self {
            Operator::Negate => negate(value),
            _ => Err(QueryError::schema(format!(
                "operator '{}' is binary but was given one operand",
                self.name()
            ))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ----------------------------
// Arithmetic
// ----------------------------

/// Numeric operand widened to a common representation.
enum Num {
    Int(i64, i64),
    Dec(Decimal, Decimal),
    Float(f64, f64),
}

/// Widens two numeric values along `Int < Decimal < Float`.
fn widen(left: &Value, right: &Value) -> Option<Num> {
    match (left, right) {
        (Value::Int64(a), Value::Int64(b)) => Some(Num::Int(*a, *b)),
        (Value::Float64(_), _) | (_, Value::Float64(_)) => {
            Some(Num::Float(left.as_f64()?, right.as_f64()?))
        }
        (Value::Decimal(a), Value::Decimal(b)) => Some(Num::Dec(*a, *b)),
        (Value::Decimal(a), Value::Int64(b)) => Some(Num::Dec(*a, Decimal::from(*b))),
        (Value::Int64(a), Value::Decimal(b)) => Some(Num::Dec(Decimal::from(*a), *b)),
        _ => None,
    }
}

/// A numeric day count as a duration; fractions are kept to the millisecond.
fn day_offset(value: &Value) -> Option<TimeDelta> {
    let days = match value {
        Value::Int64(i) => return TimeDelta::try_days(*i),
        Value::Float64(f) => *f,
        Value::Decimal(d) => d.to_f64()?,
        _ => return None,
    };
    let millis = (days * MILLIS_PER_DAY).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}

/// Shifts a date-like value. A date moves by whole days, rounding down.
fn shift(date: &Value, delta: TimeDelta) -> Option<Value> {
    match date {
        Value::Date(d) => {
            let days = delta.num_milliseconds().div_euclid(MILLIS_PER_DAY as i64);
            d.checked_add_signed(TimeDelta::try_days(days)?)
                .map(Value::Date)
        }
        Value::DateTime(dt) => dt.checked_add_signed(delta).map(Value::DateTime),
        _ => None,
    }
}

fn date_delta(value: &Value) -> Option<TimeDelta> {
    match value {
        Value::Duration(d) => Some(*d),
        other => day_offset(other),
    }
}

fn as_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(d) => Some(d.and_time(chrono::NaiveTime::MIN)),
        Value::DateTime(dt) => Some(*dt),
        _ => None,
    }
}

pub fn add(left: &Value, right: &Value) -> QueryResult<Value> {
    let err = || QueryError::incompatible("+", left, Some(right));

    match (left, right) {
        (Value::Null, _) => Ok(right.clone()),
        (_, Value::Null) => Ok(left.clone()),

        (l, r) if l.is_date_like() => {
            let delta = date_delta(r).ok_or_else(err)?;
            shift(l, delta).ok_or_else(err)
        }
        (l, r) if r.is_date_like() => {
            let delta = date_delta(l).ok_or_else(err)?;
            shift(r, delta).ok_or_else(err)
        }

        (Value::String(l), r) => Ok(Value::String(format!("{l}{r}"))),
        (l, Value::String(r)) => Ok(Value::String(format!("{l}{r}"))),

        (Value::Duration(a), Value::Duration(b)) => {
            a.checked_add(b).map(Value::Duration).ok_or_else(err)
        }

        _ => match widen(left, right).ok_or_else(err)? {
            Num::Int(a, b) => a.checked_add(b).map(Value::Int64).ok_or_else(err),
            Num::Dec(a, b) => a.checked_add(b).map(Value::Decimal).ok_or_else(err),
            Num::Float(a, b) => Ok(Value::Float64(a + b)),
        },
    }
}

pub fn subtract(left: &Value, right: &Value) -> QueryResult<Value> {
    let err = || QueryError::incompatible("-", left, Some(right));

    match (left, right) {
        (Value::Null, Value::Null) => Ok(Value::Null),
        (_, Value::Null) => Ok(left.clone()),
        (Value::Null, r) => negate(r).map_err(|_| err()),

        (l, r) if l.is_date_like() && r.is_date_like() => {
            let (a, b) = (as_datetime(l).ok_or_else(err)?, as_datetime(r).ok_or_else(err)?);
            Ok(Value::Duration(a - b))
        }
        (l, r) if l.is_date_like() => {
            let delta = date_delta(r).ok_or_else(err)?;
            shift(l, -delta).ok_or_else(err)
        }
        (l, r) if r.is_date_like() => {
            let delta = date_delta(l).ok_or_else(err)?;
            shift(r, -delta).ok_or_else(err)
        }

        (Value::Duration(a), Value::Duration(b)) => {
            a.checked_sub(b).map(Value::Duration).ok_or_else(err)
        }

        _ => match widen(left, right).ok_or_else(err)? {
            Num::Int(a, b) => a.checked_sub(b).map(Value::Int64).ok_or_else(err),
            Num::Dec(a, b) => a.checked_sub(b).map(Value::Decimal).ok_or_else(err),
            Num::Float(a, b) => Ok(Value::Float64(a - b)),
        },
    }
}

/// Integers are multiplied as floats; a decimal on the left keeps the
/// product fixed-point.
pub fn multiply(left: &Value, right: &Value) -> QueryResult<Value> {
    let err = || QueryError::incompatible("*", left, Some(right));

    for v in [left, right] {
        if !v.is_null() && !v.is_numeric() {
            return Err(err());
        }
    }
    if left.is_null() || right.is_null() {
        return Ok(Value::Int64(0));
    }

    match (left, right) {
        (Value::Decimal(a), Value::Decimal(b)) => {
            a.checked_mul(*b).map(Value::Decimal).ok_or_else(err)
        }
        (Value::Decimal(a), r) => {
            let b = r.as_f64().and_then(Decimal::from_f64).ok_or_else(err)?;
            a.checked_mul(b).map(Value::Decimal).ok_or_else(err)
        }
        (l, r) => {
            let (a, b) = (l.as_f64().ok_or_else(err)?, r.as_f64().ok_or_else(err)?);
            Ok(Value::Float64(a * b))
        }
    }
}

fn zero_like(value: &Value) -> Option<Value> {
    match value {
        Value::Int64(_) => Some(Value::Int64(0)),
        Value::Float64(_) => Some(Value::Float64(0.0)),
        Value::Decimal(_) => Some(Value::Decimal(Decimal::ZERO)),
        _ => None,
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Int64(i) => *i == 0,
        Value::Float64(f) => *f == 0.0,
        Value::Decimal(d) => d.is_zero(),
        _ => false,
    }
}

/// True division. A missing or zero divisor, or a missing dividend, yields
/// zero in the kind of the operand that is present.
pub fn divide(left: &Value, right: &Value) -> QueryResult<Value> {
    let err = || QueryError::incompatible("/", left, Some(right));

    match (left, right) {
        (Value::Null, Value::Null) => Err(err()),
        (Value::Null, r) => zero_like(r).ok_or_else(err),
        (l, Value::Null) => zero_like(l).ok_or_else(err),
        (l, r) if !l.is_numeric() || !r.is_numeric() => Err(err()),
        (l, r) if is_zero(r) => zero_like(l).ok_or_else(err),
        (Value::Int64(a), Value::Int64(b)) => Ok(Value::Float64(*a as f64 / *b as f64)),
        _ => match widen(left, right).ok_or_else(err)? {
            Num::Int(a, b) => Ok(Value::Float64(a as f64 / b as f64)),
            Num::Dec(a, b) => a.checked_div(b).map(Value::Decimal).ok_or_else(err),
            Num::Float(a, b) => Ok(Value::Float64(a / b)),
        },
    }
}

pub fn negate(value: &Value) -> QueryResult<Value> {
    let err = || QueryError::incompatible("-", value, None);
    match value {
        Value::Null => Ok(Value::Null),
        Value::Int64(i) => i.checked_neg().map(Value::Int64).ok_or_else(err),
        Value::Float64(f) => Ok(Value::Float64(-f)),
        Value::Decimal(d) => Ok(Value::Decimal(-*d)),
        _ => Err(err()),
    }
}

// ----------------------------
// Comparison and logic
// ----------------------------

fn compare(op: Operator, left: &Value, right: &Value) -> QueryResult<bool> {
    let (left, right) = upcast_values(left, right)?;

    let result = match (left.is_null(), right.is_null()) {
        (true, true) => matches!(
            op,
            Operator::Equals | Operator::GreaterThanOrEquals | Operator::LessThanOrEquals
        ),
        (true, false) | (false, true) => op == Operator::NotEquals,
        (false, false) => {
            let ord = left.partial_cmp(&right);
            match op {
                Operator::Equals => ord == Some(Ordering::Equal),
                Operator::NotEquals => ord != Some(Ordering::Equal),
                Operator::GreaterThan => ord == Some(Ordering::Greater),
                Operator::GreaterThanOrEquals => {
                    matches!(ord, Some(Ordering::Greater | Ordering::Equal))
                }
                Operator::LessThan => ord == Some(Ordering::Less),
                Operator::LessThanOrEquals => {
                    matches!(ord, Some(Ordering::Less | Ordering::Equal))
                }
                _ => false,
            }
        }
    };
    Ok(result)
}

/// Reads a logical operand; NULL counts as false.
pub(crate) fn truthy(op: &'static str, value: &Value) -> QueryResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        other => Err(QueryError::incompatible(op, other, None)),
    }
}

fn logical(op: Operator, left: &Value, right: &Value) -> QueryResult<Value> {
    let name = if op == Operator::And { "and" } else { "or" };
    let (a, b) = (truthy(name, left)?, truthy(name, right)?);
    Ok(Value::Bool(if op == Operator::And { a && b } else { a || b }))
}

pub fn equals(left: &Value, right: &Value) -> QueryResult<bool> {
    compare(Operator::Equals, left, right)
}

pub fn not_equals(left: &Value, right: &Value) -> QueryResult<bool> {
    compare(Operator::NotEquals, left, right)
}

pub fn greater_than(left: &Value, right: &Value) -> QueryResult<bool> {
    compare(Operator::GreaterThan, left, right)
}

pub fn greater_than_or_equals(left: &Value, right: &Value) -> QueryResult<bool> {
    compare(Operator::GreaterThanOrEquals, left, right)
}

pub fn less_than(left: &Value, right: &Value) -> QueryResult<bool> {
    compare(Operator::LessThan, left, right)
}

pub fn less_than_or_equals(left: &Value, right: &Value) -> QueryResult<bool> {
    compare(Operator::LessThanOrEquals, left, right)
}
