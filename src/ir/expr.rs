use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;

use crate::catalog::calculated::CalculatedField;
use crate::catalog::field::FieldRef;
use crate::ir::deferred::DeferredRowValue;
use crate::ir::operator::Operator;
use crate::types::value::Value;

/// A lazily evaluated expression tree over literals and columns.
#[derive(Clone, Debug)]
pub enum Expr {
    Literal(Value),

    Column(FieldRef),

    /// A calculated column; read from the row when present, computed otherwise.
    Calculated(Arc<CalculatedField>),

    Deferred(DeferredRowValue),

    Unary {
        op: Operator,
        expr: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        op: Operator,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn col(field: &FieldRef) -> Self {
        Expr::Column(field.clone())
    }

    pub fn bin(left: impl Into<Expr>, op: Operator, right: impl Into<Expr>) -> Self {
        Expr::Binary {
            left: Box::new(left.into()),
            op,
            right: Box::new(right.into()),
        }
    }

    pub fn unary(op: Operator, expr: impl Into<Expr>) -> Self {
        Expr::Unary {
            op,
            expr: Box::new(expr.into()),
        }
    }

    /// Every field reachable from this tree, once each, in creation order.
    pub fn fields_referenced(&self) -> Vec<FieldRef> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields.sort_by_key(|f| f.creation_order());
        fields.dedup_by(|a, b| a.key() == b.key());
        fields
    }

    fn collect_fields(&self, out: &mut Vec<FieldRef>) {
        match self {
            Expr::Literal(_) | Expr::Deferred(_) => {}
            Expr::Column(field) => out.push(field.clone()),
            Expr::Calculated(calc) => out.push(calc.field().clone()),
            Expr::Unary { expr, .. } => expr.collect_fields(out),
            Expr::Binary { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
        }
    }
}

/// Fluent construction of expression nodes.
///
/// Implemented for everything that converts into an [`Expr`], so fields,
/// literals and finished expressions combine the same way.
pub trait ExprBuilder: Into<Expr> + Sized {
    fn plus(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(self, Operator::Add, rhs)
    }

    fn minus(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(self, Operator::Subtract, rhs)
    }

    fn times(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(self, Operator::Multiply, rhs)
    }

    fn divided_by(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(self, Operator::Divide, rhs)
    }

    fn negate(self) -> Expr {
        Expr::unary(Operator::Negate, self)
    }

    fn equals(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(self, Operator::Equals, rhs)
    }

    fn not_equals(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(self, Operator::NotEquals, rhs)
    }

    fn greater_than(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(self, Operator::GreaterThan, rhs)
    }

    fn greater_than_or_equals(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(self, Operator::GreaterThanOrEquals, rhs)
    }

    fn less_than(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(self, Operator::LessThan, rhs)
    }

    fn less_than_or_equals(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(self, Operator::LessThanOrEquals, rhs)
    }

    fn and(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(self, Operator::And, rhs)
    }

    fn or(self, rhs: impl Into<Expr>) -> Expr {
        Expr::bin(self, Operator::Or, rhs)
    }
}

impl<T: Into<Expr>> ExprBuilder for T {}

pub fn add(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    left.into().plus(right)
}

pub fn subtract(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    left.into().minus(right)
}

pub fn multiply(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    left.into().times(right)
}

pub fn divide(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    left.into().divided_by(right)
}

pub fn negate(expr: impl Into<Expr>) -> Expr {
    expr.into().negate()
}

pub fn equals(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    left.into().equals(right)
}

pub fn not_equals(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    left.into().not_equals(right)
}

pub fn greater_than(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    left.into().greater_than(right)
}

pub fn greater_than_or_equals(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    left.into().greater_than_or_equals(right)
}

pub fn less_than(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    left.into().less_than(right)
}

pub fn less_than_or_equals(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    left.into().less_than_or_equals(right)
}

pub fn and(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    left.into().and(right)
}

pub fn or(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    left.into().or(right)
}

impl From<FieldRef> for Expr {
    fn from(field: FieldRef) -> Self {
        Expr::Column(field)
    }
}

impl From<&FieldRef> for Expr {
    fn from(field: &FieldRef) -> Self {
        Expr::Column(field.clone())
    }
}

impl From<Arc<CalculatedField>> for Expr {
    fn from(calc: Arc<CalculatedField>) -> Self {
        Expr::Calculated(calc)
    }
}

impl From<&Arc<CalculatedField>> for Expr {
    fn from(calc: &Arc<CalculatedField>) -> Self {
        Expr::Calculated(calc.clone())
    }
}

impl From<DeferredRowValue> for Expr {
    fn from(deferred: DeferredRowValue) -> Self {
        Expr::Deferred(deferred)
    }
}

macro_rules! literal_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Expr {
                fn from(v: $t) -> Self {
                    Expr::Literal(Value::from(v))
                }
            }
        )*
    };
}

literal_from!(
    Value,
    bool,
    i32,
    i64,
    f64,
    Decimal,
    NaiveDate,
    NaiveDateTime,
    TimeDelta,
    &str,
    String,
);

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Column(field) => write!(f, "{field}"),
            Expr::Calculated(calc) => write!(f, "{}", calc.field()),
            Expr::Deferred(d) => write!(f, "{d}"),
            Expr::Unary { op, expr } => write!(f, "{op}{expr}"),
            Expr::Binary { left, op, right } => write!(f, "{left}{op}{right}"),
        }
    }
}
