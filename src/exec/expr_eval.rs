use crate::error::{QueryError, QueryResult};
use crate::exec::operator::Row;
use crate::ir::expr::Expr;
use crate::ir::operator::{Operator, truthy};
use crate::types::value::Value;

pub fn eval_value(expr: &Expr, row: &Row) -> QueryResult<Value> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),

        Expr::Column(field) => Ok(row.get(&field.key()).cloned().unwrap_or(Value::Null)),

        Expr::Calculated(calc) => match row.get(&calc.key()) {
            Some(v) => Ok(v.clone()),
            None => calc.compute(row),
        },

        Expr::Deferred(deferred) => deferred.evaluate(row),

        Expr::Unary { op, expr } => {
            let v = eval_value(expr, row)?;
            op.apply_unary(&v)
        }

        // short-circuit so the right side is only evaluated when it matters
        Expr::Binary {
            left,
            op: op @ (Operator::And | Operator::Or),
            right,
        } => {
            let name = op.symbol().trim();
            let l = truthy(name, &eval_value(left, row)?)?;
            match (op, l) {
                (Operator::And, false) => Ok(Value::Bool(false)),
                (Operator::Or, true) => Ok(Value::Bool(true)),
                _ => Ok(Value::Bool(truthy(name, &eval_value(right, row)?)?)),
            }
        }

        Expr::Binary { left, op, right } => {
            let l = eval_value(left, row)?;
            let r = eval_value(right, row)?;
            op.apply_binary(&l, &r)
        }
    }
}

/// Evaluates a filter condition. NULL counts as false; any other
/// non-boolean result is an error.
pub fn eval_predicate(expr: &Expr, row: &Row) -> QueryResult<bool> {
    predicate_value(eval_value(expr, row)?)
}

pub(crate) fn predicate_value(value: Value) -> QueryResult<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        Value::Null => Ok(false),
        other => Err(QueryError::incompatible("where", &other, None)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::calculated::CalculatedField;
    use crate::catalog::field::{FieldDef, FieldRef};
    use crate::exec::test_util::qrow;
    use crate::ir::expr::ExprBuilder;

    fn field(name: &str) -> FieldRef {
        Arc::new(FieldDef::int(name).bind("t", name))
    }

    #[test]
    fn columns_resolve_from_the_row() {
        let amt = field("amt");
        let row = qrow("t", &[("amt", Value::Int64(200))]);
        assert_eq!(eval_value(&amt.clone().plus(1), &row).unwrap(), Value::Int64(201));
        assert!(eval_predicate(&amt.greater_than(150), &row).unwrap());
    }

    #[test]
    fn missing_columns_read_as_null() {
        let amt = field("amt");
        let row = qrow("t", &[]);
        assert_eq!(eval_value(&Expr::col(&amt), &row).unwrap(), Value::Null);
        assert!(!eval_predicate(&amt.greater_than(1), &row).unwrap());
    }

    #[test]
    fn calculated_fields_compute_when_absent() {
        let amt = field("amt");
        let calc = Arc::new(CalculatedField::new("Double", amt.times(2), "", None).unwrap());
        let row = qrow("t", &[("amt", Value::Int64(4))]);
        // Int * Int multiplies as float, converted back into the inferred Int column
        assert_eq!(eval_value(&Expr::from(&calc), &row).unwrap(), Value::Int64(8));
    }

    #[test]
    fn logic_short_circuits() {
        let bad = Expr::lit(1).and(true);
        let row = qrow("t", &[]);
        assert!(eval_value(&bad, &row).is_err());
        let guarded = Expr::lit(false).and(Expr::lit(1));
        assert_eq!(eval_value(&guarded, &row).unwrap(), Value::Bool(false));
        let either = Expr::lit(true).or(Expr::lit("x"));
        assert_eq!(eval_value(&either, &row).unwrap(), Value::Bool(true));
    }

    #[test]
    fn non_boolean_predicates_are_rejected() {
        let row = qrow("t", &[]);
        assert!(eval_predicate(&Expr::lit(3), &row).is_err());
        assert!(!eval_predicate(&Expr::lit(Value::Null), &row).unwrap());
    }
}
