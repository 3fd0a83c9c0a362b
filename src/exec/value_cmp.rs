use std::cmp::Ordering;

use crate::types::coercion::upcast_values;
use crate::types::value::Value;

/// Total order used by sort, grouping and min/max.
///
/// Same-kind values order natively (NaN after every other float). Values of
/// different families order by family (booleans, numbers, temporals,
/// durations, strings); within a family mixed kinds meet through the upcast
/// lattice. NULL sorts before everything.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Float64(x), Value::Float64(y)) => x.total_cmp(y),
        _ if a.kind() == b.kind() => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        _ if kind_rank(a) != kind_rank(b) => kind_rank(a).cmp(&kind_rank(b)),
        _ => match upcast_values(a, b) {
            Ok((l, r)) if l.kind() == r.kind() => compare_values(&l, &r),
            _ => kind_rank(a).cmp(&kind_rank(b)),
        },
    }
}

fn kind_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int64(_) | Value::Float64(_) | Value::Decimal(_) => 2,
        Value::Date(_) | Value::DateTime(_) => 3,
        Value::Duration(_) => 4,
        Value::String(_) => 5,
    }
}

pub fn compare_keys(a: &[Value], b: &[Value]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| compare_values(x, y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn same_kind_orders_natively() {
        assert_eq!(compare_values(&Value::Int64(1), &Value::Int64(2)), Ordering::Less);
        assert_eq!(compare_values(&Value::from("b"), &Value::from("a")), Ordering::Greater);
    }

    #[test]
    fn mixed_numerics_meet() {
        assert_eq!(compare_values(&Value::Int64(2), &Value::Float64(1.5)), Ordering::Greater);
        assert_eq!(
            compare_values(&Value::Decimal(Decimal::new(150, 2)), &Value::Int64(2)),
            Ordering::Less
        );
    }

    #[test]
    fn mixed_families_order_by_family() {
        assert_eq!(compare_values(&Value::Int64(9), &Value::from("10")), Ordering::Less);
        assert_eq!(compare_values(&Value::from("6"), &Value::Int64(9)), Ordering::Greater);
        assert_eq!(compare_values(&Value::Bool(true), &Value::Int64(0)), Ordering::Less);

        let mut values = vec![
            Value::from("6"),
            Value::Int64(9),
            Value::from("10"),
            Value::Float64(2.5),
            Value::Null,
        ];
        values.sort_by(compare_values);
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Float64(2.5),
                Value::Int64(9),
                Value::from("10"),
                Value::from("6"),
            ]
        );
    }

    #[test]
    fn null_sorts_first() {
        assert_eq!(compare_values(&Value::Null, &Value::Int64(-5)), Ordering::Less);
    }

    #[test]
    fn nan_is_ordered() {
        assert_eq!(
            compare_values(&Value::Float64(f64::NAN), &Value::Float64(1.0)),
            Ordering::Greater
        );
    }

    #[test]
    fn keys_compare_lexicographically() {
        let a = [Value::Int64(1), Value::from("b")];
        let b = [Value::Int64(1), Value::from("c")];
        assert_eq!(compare_keys(&a, &b), Ordering::Less);
        assert_eq!(compare_keys(&a, &a), Ordering::Equal);
    }
}
