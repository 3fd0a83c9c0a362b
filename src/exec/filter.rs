use crate::catalog::calculated::Computation;
use crate::error::QueryResult;
use crate::exec::expr_eval::predicate_value;
use crate::exec::operator::{Operator, Row};

pub struct FilterExec {
    input: Box<dyn Operator>,
    predicate: Computation,
}

impl FilterExec {
    pub fn new(input: Box<dyn Operator>, predicate: Computation) -> Self {
        Self { input, predicate }
    }
}

impl Operator for FilterExec {
    fn open(&mut self) -> QueryResult<()> {
        self.input.open()
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        while let Some(row) = self.input.next()? {
            if predicate_value(self.predicate.evaluate(&row)?)? {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn close(&mut self) {
        self.input.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::field::FieldDef;
    use crate::exec::test_util::{column, drain, qrow, scan};
    use crate::ir::expr::ExprBuilder;
    use crate::types::value::Value;

    #[test]
    fn filter_removes_rows() {
        let age = Arc::new(FieldDef::int("Age").bind("t", "age"));
        let data = vec![
            qrow("t", &[("age", Value::Int64(10))]),
            qrow("t", &[("age", Value::Int64(30))]),
            qrow("t", &[("age", Value::Null)]),
        ];

        let filter = FilterExec::new(scan(data), age.greater_than(18).into());
        let rows = drain(Box::new(filter));
        assert_eq!(column(&rows, "t", "age"), vec![Value::Int64(30)]);
    }

    #[test]
    fn callback_predicates_work() {
        let data = vec![qrow("t", &[("x", Value::Int64(1))]), qrow("t", &[("x", Value::Int64(2))])];
        let even = Computation::callback(|row: &Row| {
            let x = row.values().next().and_then(|v| v.as_f64()).unwrap_or(0.0);
            Ok(Value::Bool(x % 2.0 == 0.0))
        });
        let rows = drain(Box::new(FilterExec::new(scan(data), even)));
        assert_eq!(column(&rows, "t", "x"), vec![Value::Int64(2)]);
    }

    #[test]
    fn non_boolean_predicate_fails() {
        let data = vec![qrow("t", &[("x", Value::Int64(1))])];
        let mut filter = FilterExec::new(scan(data), Computation::callback(|_| Ok(Value::Int64(1))));
        filter.open().unwrap();
        assert!(filter.next().is_err());
    }
}
