use std::collections::BTreeSet;
use std::fmt;

use crate::catalog::field::FieldRef;
use crate::db_debug;
use crate::debugger::Component;
use crate::error::{IdentifierKind, QueryError, QueryResult};
use crate::exec::grouping::group_rows;
use crate::exec::operator::{Operator, Row};
use crate::exec::value_cmp::compare_values;
use crate::ir::operator::add;
use crate::types::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationMethod {
    Concat,
    First,
    Last,
    Max,
    Min,
    Sum,
}

impl AggregationMethod {
    pub const ALL: [AggregationMethod; 6] = [
        AggregationMethod::Concat,
        AggregationMethod::First,
        AggregationMethod::Last,
        AggregationMethod::Max,
        AggregationMethod::Min,
        AggregationMethod::Sum,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AggregationMethod::Concat => "concat",
            AggregationMethod::First => "first",
            AggregationMethod::Last => "last",
            AggregationMethod::Max => "max",
            AggregationMethod::Min => "min",
            AggregationMethod::Sum => "sum",
        }
    }

    /// Matches on the first three letters, ignoring case (`"Summary"` is `Sum`).
    pub fn by_name(name: &str) -> QueryResult<AggregationMethod> {
        let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
        AggregationMethod::ALL
            .into_iter()
            .find(|m| m.name()[..3] == prefix)
            .ok_or_else(|| QueryError::unknown(IdentifierKind::AggregationMethod, name))
    }

    /// Folds a non-empty group of values.
    pub fn apply(&self, values: &[Value]) -> QueryResult<Value> {
        match self {
            AggregationMethod::Concat => Ok(concat(values)),
            AggregationMethod::First => Ok(values.first().cloned().unwrap_or(Value::Null)),
            AggregationMethod::Last => Ok(values.last().cloned().unwrap_or(Value::Null)),
            AggregationMethod::Max => Ok(values
                .iter()
                .max_by(|a, b| compare_values(a, b))
                .cloned()
                .unwrap_or(Value::Null)),
            AggregationMethod::Min => Ok(values
                .iter()
                .min_by(|a, b| compare_values(a, b))
                .cloned()
                .unwrap_or(Value::Null)),
            AggregationMethod::Sum => {
                // booleans count as 0/1
                let mut iter = values.iter().map(|v| match v {
                    Value::Bool(b) => Value::Int64(*b as i64),
                    other => other.clone(),
                });
                let Some(first) = iter.next() else {
                    return Ok(Value::Int64(0));
                };
                iter.try_fold(first, |acc, v| add(&acc, &v))
            }
        }
    }
}

impl fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Comma-separated, sorted list of the distinct non-empty values.
pub fn concat(values: &[Value]) -> Value {
    let unique: BTreeSet<String> = values
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| v.to_string())
        .filter(|s| !s.is_empty())
        .collect();
    Value::String(unique.into_iter().collect::<Vec<_>>().join(", "))
}

/// Group-by with one aggregate per (field, method) pair.
///
/// Output rows hold the group-by fields, with the group's actual key values,
/// followed by each aggregate under its field's storage key.
pub struct PivotExec {
    input: Box<dyn Operator>,
    group_by: Vec<FieldRef>,
    aggregations: Vec<(FieldRef, AggregationMethod)>,
    out: Vec<Row>,
    idx: usize,
}

impl PivotExec {
    pub fn new(
        input: Box<dyn Operator>,
        group_by: Vec<FieldRef>,
        aggregations: Vec<(FieldRef, AggregationMethod)>,
    ) -> Self {
        Self {
            input,
            group_by,
            aggregations,
            out: Vec::new(),
            idx: 0,
        }
    }

    fn aggregate(&self, key: Vec<Value>, rows: &[Row]) -> QueryResult<Row> {
        let mut out = Row::with_capacity(self.group_by.len() + self.aggregations.len());
        for (field, value) in self.group_by.iter().zip(key) {
            out.insert(field.key(), value);
        }

        for (field, method) in &self.aggregations {
            let key = field.key();
            let default = field.data_type.default_value();
            let values: Vec<Value> = rows
                .iter()
                .map(|row| match row.get(&key) {
                    Some(Value::Null) | None if *method != AggregationMethod::Concat => {
                        default.clone()
                    }
                    Some(v) => v.clone(),
                    None => Value::Null,
                })
                .collect();
            out.insert(key, method.apply(&values)?);
        }
        Ok(out)
    }
}

impl Operator for PivotExec {
    fn open(&mut self) -> QueryResult<()> {
        self.out.clear();
        self.idx = 0;
        self.input.open()?;

        let mut rows = Vec::new();
        while let Some(row) = self.input.next()? {
            rows.push(row);
        }
        let input_len = rows.len();

        let groups = group_rows(rows, &self.group_by, false);
        for (key, group) in groups {
            let row = self.aggregate(key, &group)?;
            self.out.push(row);
        }

        db_debug!(Component::Pivot, "{} rows into {} groups", input_len, self.out.len());
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if self.idx >= self.out.len() {
            return Ok(None);
        }
        let row = std::mem::take(&mut self.out[self.idx]);
        self.idx += 1;
        Ok(Some(row))
    }

    fn close(&mut self) {
        self.out.clear();
        self.input.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::field::FieldDef;
    use crate::exec::test_util::{column, drain, qrow, scan};

    fn opt(v: Option<i64>) -> Value {
        v.map(Value::Int64).unwrap_or(Value::Null)
    }

    fn sales() -> Vec<Row> {
        [
            (Some(1), Some(4), 100),
            (Some(2), Some(5), 200),
            (None, Some(4), 300),
            (Some(2), Some(6), 300),
            (Some(1), None, 300),
        ]
        .into_iter()
        .map(|(item, cust, amt)| {
            qrow(
                "s",
                &[
                    ("item", opt(item)),
                    ("cust", opt(cust)),
                    ("amt", Value::Decimal(Decimal::new(amt, 0))),
                ],
            )
        })
        .collect()
    }

    #[test]
    fn concat_sorts_and_dedups() {
        let v = concat(&[Value::Int64(3), Value::from("1"), Value::from("2"), Value::Null]);
        assert_eq!(v, Value::from("1, 2, 3"));
        assert_eq!(
            concat(&[Value::Int64(3), Value::Int64(2), Value::Int64(3), Value::Int64(1)]),
            Value::from("1, 2, 3")
        );
        assert_eq!(concat(&[Value::Null]), Value::from(""));
        assert_eq!(concat(&[]), Value::from(""));
    }

    #[test]
    fn concat_per_group() {
        let item = Arc::new(FieldDef::int("Item ID").bind("s", "item"));
        let cust = Arc::new(FieldDef::int("Customer ID").bind("s", "cust"));
        let pivot = PivotExec::new(scan(sales()), vec![item], vec![(cust, AggregationMethod::Concat)]);
        let out = drain(Box::new(pivot));

        assert_eq!(
            column(&out, "s", "item"),
            vec![Value::Null, Value::Int64(1), Value::Int64(2)]
        );
        assert_eq!(
            column(&out, "s", "cust"),
            vec![Value::from("4"), Value::from("4"), Value::from("5, 6")]
        );
    }

    #[test]
    fn sum_min_max_per_group() {
        let item = Arc::new(FieldDef::int("Item ID").bind("s", "item"));
        let amt = Arc::new(FieldDef::currency("Amount").bind("s", "amt"));
        let cust = Arc::new(FieldDef::int("Customer ID").bind("s", "cust"));
        let pivot = PivotExec::new(
            scan(sales()),
            vec![item],
            vec![(amt, AggregationMethod::Sum), (cust, AggregationMethod::Min)],
        );
        let out = drain(Box::new(pivot));

        assert_eq!(
            column(&out, "s", "amt"),
            vec![
                Value::Decimal(Decimal::new(300, 0)),
                Value::Decimal(Decimal::new(400, 0)),
                Value::Decimal(Decimal::new(500, 0)),
            ]
        );
        // the NULL customer counts as 0
        assert_eq!(
            column(&out, "s", "cust"),
            vec![Value::Int64(4), Value::Int64(0), Value::Int64(5)]
        );
    }

    #[test]
    fn sum_counts_true_flags() {
        let g = Arc::new(FieldDef::int("Group").bind("s", "g"));
        let flag = Arc::new(FieldDef::boolean("Flag").bind("s", "flag"));
        let rows = vec![
            qrow("s", &[("g", Value::Int64(1)), ("flag", Value::Bool(true))]),
            qrow("s", &[("g", Value::Int64(1)), ("flag", Value::Bool(true))]),
            qrow("s", &[("g", Value::Int64(1)), ("flag", Value::Null)]),
            qrow("s", &[("g", Value::Int64(2)), ("flag", Value::Bool(false))]),
        ];
        let pivot = PivotExec::new(scan(rows), vec![g], vec![(flag, AggregationMethod::Sum)]);
        let out = drain(Box::new(pivot));
        assert_eq!(column(&out, "s", "flag"), vec![Value::Int64(2), Value::Int64(0)]);
    }

    #[test]
    fn no_group_fields_gives_one_row() {
        let amt = Arc::new(FieldDef::currency("Amount").bind("s", "amt"));
        let pivot = PivotExec::new(scan(sales()), vec![], vec![(amt, AggregationMethod::Max)]);
        let out = drain(Box::new(pivot));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 1);
    }

    #[test]
    fn method_names_match_on_prefix() {
        assert_eq!(AggregationMethod::by_name("min").unwrap(), AggregationMethod::Min);
        assert_eq!(AggregationMethod::by_name("SUMMARY").unwrap(), AggregationMethod::Sum);
        assert_eq!(AggregationMethod::by_name("Concatenate").unwrap(), AggregationMethod::Concat);
        assert!(AggregationMethod::by_name("avg").is_err());
        assert_eq!(AggregationMethod::Max.to_string(), "max");
    }

    #[test]
    fn first_and_last() {
        let vals = [Value::Int64(1), Value::Int64(2)];
        assert_eq!(AggregationMethod::First.apply(&vals).unwrap(), Value::Int64(1));
        assert_eq!(AggregationMethod::Last.apply(&vals).unwrap(), Value::Int64(2));
    }
}
