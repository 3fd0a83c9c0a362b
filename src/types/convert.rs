//! Per-kind value converters.
//!
//! A converter turns any [`Value`] into the value kind of its target
//! [`DataType`]. NULL always converts to NULL. When a value cannot be
//! converted, strict mode raises [`QueryError::Conversion`] and
//! [`ConversionMode::IgnoreErrors`] yields NULL instead.

use std::str::FromStr;

use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::common::dates::{parse_date, parse_datetime};
use crate::db_trace;
use crate::debugger::Component;
use crate::error::{QueryError, QueryResult};
use crate::types::datatype::DataType;
use crate::types::value::Value;

/// Digits kept after the decimal point for currency values.
pub const CURRENCY_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionMode {
    #[default]
    Strict,
    IgnoreErrors,
}

impl ConversionMode {
    pub fn ignore_errors(ignore: bool) -> Self {
        if ignore {
            ConversionMode::IgnoreErrors
        } else {
            ConversionMode::Strict
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Converter {
    target: DataType,
    mode: ConversionMode,
}

impl Converter {
    pub fn new(target: DataType, mode: ConversionMode) -> Self {
        Self { target, mode }
    }

    pub fn target(&self) -> DataType {
        self.target
    }

    pub fn convert(&self, value: &Value) -> QueryResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        let converted = match self.target {
            DataType::Boolean => to_bool(value),
            DataType::Currency => to_currency(value),
            DataType::Date => to_date(value),
            DataType::DateTime => to_datetime(value),
            DataType::Float => to_float(value),
            DataType::Int => to_int(value),
            DataType::String => Some(Value::String(value.to_string())),
        };

        match (converted, self.mode) {
            (Some(v), _) => Ok(v),
            (None, ConversionMode::IgnoreErrors) => {
                db_trace!(
                    Component::Convert,
                    "{:?} is not a valid {}, using NULL",
                    value,
                    self.target
                );
                Ok(Value::Null)
            }
            (None, ConversionMode::Strict) => {
                Err(QueryError::conversion(value, self.target.name()))
            }
        }
    }
}

// Each helper returns `None` when the value cannot be converted. A
// `Some(Value::Null)` is a successful conversion to NULL.

fn to_bool(value: &Value) -> Option<Value> {
    let b = match value {
        Value::Bool(b) => *b,
        Value::Int64(0) => false,
        Value::Int64(1) => true,
        Value::Float64(f) if *f == 0.0 => false,
        Value::Float64(f) if *f == 1.0 => true,
        Value::Decimal(d) if d.is_zero() => false,
        Value::Decimal(d) if *d == Decimal::ONE => true,
        _ => return None,
    };
    Some(Value::Bool(b))
}

fn to_currency(value: &Value) -> Option<Value> {
    let decimal = match value {
        Value::Decimal(d) => Some(*d),
        Value::Int64(i) => Some(Decimal::from(*i)),
        // NaN and infinities have no fixed-point form
        Value::Float64(f) if !f.is_finite() => return Some(Value::Null),
        Value::Float64(f) => Decimal::from_f64(*f),
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        Value::Bool(_)
        | Value::Date(_)
        | Value::DateTime(_)
        | Value::Duration(_)
        | Value::Null => None,
    }?;
    Some(Value::Decimal(decimal.round_dp(CURRENCY_SCALE)))
}

/// Falsy inputs carry no date at all.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) | Value::Int64(0) => true,
        Value::Float64(f) => *f == 0.0,
        Value::Decimal(d) => d.is_zero(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn to_date(value: &Value) -> Option<Value> {
    if is_blank(value) {
        return Some(Value::Null);
    }
    match value {
        Value::Date(d) => Some(Value::Date(*d)),
        Value::DateTime(dt) => Some(Value::Date(dt.date())),
        Value::String(s) => parse_date(s).map(Value::Date),
        // numbers are not dates
        _ => None,
    }
}

fn to_datetime(value: &Value) -> Option<Value> {
    if is_blank(value) {
        return Some(Value::Null);
    }
    match value {
        Value::DateTime(dt) => Some(Value::DateTime(*dt)),
        Value::Date(d) => Some(Value::DateTime(d.and_time(NaiveTime::MIN))),
        Value::String(s) => parse_datetime(s).map(Value::DateTime),
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<Value> {
    let f = match value {
        Value::Float64(f) => *f,
        Value::Int64(i) => *i as f64,
        Value::Decimal(d) => d.to_f64()?,
        Value::Bool(b) => *b as i64 as f64,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Some(Value::Float64(f))
}

fn float_to_int(f: f64) -> Option<i64> {
    let t = f.trunc();
    if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
        Some(t as i64)
    } else {
        None
    }
}

fn to_int(value: &Value) -> Option<Value> {
    let i = match value {
        Value::Int64(i) => *i,
        Value::Bool(b) => *b as i64,
        Value::Float64(f) => float_to_int(*f)?,
        Value::Decimal(d) => d.trunc().to_i64()?,
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => i,
                Err(_) => float_to_int(s.parse::<f64>().ok()?)?,
            }
        }
        _ => return None,
    };
    Some(Value::Int64(i))
}
