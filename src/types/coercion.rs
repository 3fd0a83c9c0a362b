//! The upcast lattice.
//!
//! Each kind lists, in priority order, the kinds it can safely become. Two
//! values meet at the first kind of the left value's list that the right
//! value's list also contains and both sides actually convert into.
//! `String` closes every list so the lattice always has a meeting point.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::error::{QueryError, QueryResult};
use crate::types::convert::ConversionMode;
use crate::types::datatype::DataType;
use crate::types::value::{Kind, Value};

pub fn upcast_list(kind: Kind) -> &'static [Kind] {
    use Kind::*;
    match kind {
        Bool => &[Bool, Int, String, Decimal, Float],
        Date => &[Date, DateTime, String],
        DateTime => &[DateTime, Date, String],
        Float => &[Float, Decimal, Int, String, Bool],
        Int => &[Int, Decimal, Float, Bool, String],
        Decimal => &[Decimal, Float, Int, Bool, String],
        String => &[String, Bool, Date, DateTime, Float, Decimal],
        Duration => &[Duration, String],
    }
}

/// Converts a non-null value into `kind`, `None` when it does not fit.
///
/// Unlike a column converter this never quantises decimals and never maps a
/// present value to NULL.
pub fn cast(value: &Value, kind: Kind) -> Option<Value> {
    if value.kind() == Some(kind) {
        return Some(value.clone());
    }

    let cast = match kind {
        Kind::Duration => None,
        // truncating would make 1 equal 1.5
        Kind::Int if !is_integral(value) => None,
        Kind::Decimal => match value {
            Value::Int64(i) => Some(Value::Decimal(Decimal::from(*i))),
            Value::Float64(f) => Decimal::from_f64(*f).map(Value::Decimal),
            Value::Bool(b) => Some(Value::Decimal(Decimal::from(*b as i64))),
            Value::String(s) => Decimal::from_str(s.trim()).ok().map(Value::Decimal),
            _ => None,
        },
        _ => {
            let target = DataType::for_kind(kind)?;
            target.convert(value, ConversionMode::IgnoreErrors).ok()
        }
    };

    cast.filter(|v| !v.is_null())
}

fn is_integral(value: &Value) -> bool {
    match value {
        Value::Float64(f) => f.fract() == 0.0,
        Value::Decimal(d) => d.fract().is_zero(),
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => true,
    }
}

/// Brings two values to a common kind.
///
/// A NULL on either side is left as it is; comparisons decide what a
/// missing operand means.
pub fn upcast_values(left: &Value, right: &Value) -> QueryResult<(Value, Value)> {
    let (Some(lk), Some(rk)) = (left.kind(), right.kind()) else {
        return Ok((left.clone(), right.clone()));
    };
    if lk == rk {
        return Ok((left.clone(), right.clone()));
    }

    let right_list = upcast_list(rk);
    for kind in upcast_list(lk) {
        if !right_list.contains(kind) {
            continue;
        }
        if let (Some(l), Some(r)) = (cast(left, *kind), cast(right, *kind)) {
            return Ok((l, r));
        }
    }

    Err(QueryError::incompatible("upcast", left, Some(right)))
}

/// Conversions that may drop information for some values of `from`.
fn narrows(from: Kind, to: Kind) -> bool {
    use Kind::*;
    matches!(
        (from, to),
        (Float | Decimal, Int) | (Int | Float | Decimal, Bool) | (DateTime, Date)
    )
}

/// Pairwise meeting point of two kinds.
///
/// Without values to try, a kind is only chosen when neither side narrows
/// into it.
pub fn coalesce_pair(left: Kind, right: Kind) -> Option<Kind> {
    let right_list = upcast_list(right);
    upcast_list(left)
        .iter()
        .copied()
        .filter(|k| right_list.contains(k))
        .find(|k| !narrows(left, *k) && !narrows(right, *k))
}

/// Reduces a list of kinds to the one they all coalesce into.
pub fn coalesce_types(kinds: &[Kind]) -> QueryResult<Kind> {
    let mut distinct: Vec<Kind> = Vec::new();
    for kind in kinds {
        if !distinct.contains(kind) {
            distinct.push(*kind);
        }
    }

    let mut iter = distinct.into_iter();
    let first = iter.next().ok_or_else(|| QueryError::Inference {
        subject: "kind list".into(),
        reason: "no kinds to coalesce".into(),
    })?;

    iter.try_fold(first, |acc, kind| {
        coalesce_pair(acc, kind).ok_or_else(|| QueryError::Inference {
            subject: format!("{acc} and {kind}"),
            reason: "no common kind".into(),
        })
    })
}
