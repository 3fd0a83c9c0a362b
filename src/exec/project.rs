use crate::catalog::field::ColumnKey;
use crate::error::QueryResult;
use crate::exec::expr_eval::eval_value;
use crate::exec::operator::{Operator, Row};
use crate::ir::expr::Expr;

/// Rebuilds each row from `exprs`, in order, under the paired storage keys.
pub struct ProjectExec {
    input: Box<dyn Operator>,
    exprs: Vec<(Expr, ColumnKey)>,
}

impl ProjectExec {
    pub fn new(input: Box<dyn Operator>, exprs: Vec<(Expr, ColumnKey)>) -> Self {
        Self { input, exprs }
    }
}

impl Operator for ProjectExec {
    fn open(&mut self) -> QueryResult<()> {
        self.input.open()
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        let Some(row) = self.input.next()? else {
            return Ok(None);
        };

        let mut out = Row::with_capacity(self.exprs.len());
        for (expr, key) in &self.exprs {
            out.insert(key.clone(), eval_value(expr, &row)?);
        }
        Ok(Some(out))
    }

    fn close(&mut self) {
        self.input.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::calculated::CalculatedField;
    use crate::catalog::field::FieldDef;
    use crate::exec::test_util::{drain, qrow, scan};
    use crate::ir::expr::ExprBuilder;
    use crate::types::value::Value;

    #[test]
    fn project_selects_columns() {
        let name = Arc::new(FieldDef::string("Name").bind("t", "name"));
        let rows = vec![qrow(
            "t",
            &[("name", Value::from("Alice")), ("age", Value::Int64(30))],
        )];

        let project = ProjectExec::new(scan(rows), vec![(Expr::col(&name), name.key())]);
        let out = drain(Box::new(project));

        assert_eq!(out[0].len(), 1);
        assert_eq!(out[0][&name.key()], Value::from("Alice"));
    }

    #[test]
    fn projection_follows_requested_order() {
        let rows = vec![qrow("t", &[("a", Value::Int64(1)), ("b", Value::Int64(2))])];
        let a = Arc::new(FieldDef::int("A").bind("t", "a"));
        let b = Arc::new(FieldDef::int("B").bind("t", "b"));

        let project = ProjectExec::new(
            scan(rows),
            vec![(Expr::col(&b), b.key()), (Expr::col(&a), a.key())],
        );
        let out = drain(Box::new(project));
        let keys: Vec<_> = out[0].keys().cloned().collect();
        assert_eq!(keys, vec![b.key(), a.key()]);
    }

    #[test]
    fn calculated_columns_are_computed_when_missing() {
        let qty = Arc::new(FieldDef::int("Qty").bind("t", "qty"));
        let calc = Arc::new(CalculatedField::new("Double Qty", qty.times(2), "", None).unwrap());
        let rows = vec![qrow("t", &[("qty", Value::Int64(3))])];

        let project = ProjectExec::new(scan(rows), vec![(Expr::from(&calc), calc.key())]);
        let out = drain(Box::new(project));
        assert_eq!(out[0][&calc.key()], Value::Int64(6));
    }
}
