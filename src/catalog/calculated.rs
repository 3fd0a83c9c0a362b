use std::fmt;
use std::sync::Arc;

use crate::catalog::field::{ColumnKey, Field, FieldDef, FieldRef};
use crate::error::{QueryError, QueryResult};
use crate::exec::expr_eval::eval_value;
use crate::exec::operator::Row;
use crate::ir::deferred::{DeferredRowValue, RowFn};
use crate::ir::expr::Expr;
use crate::types::convert::ConversionMode;
use crate::types::datatype::DataType;
use crate::types::value::Value;

/// Table name under which calculated columns are stored in a row.
pub const CALCULATION_TABLE: &str = "Calculation";

/// What a calculated column evaluates per row.
#[derive(Clone)]
pub enum Computation {
    Expr(Expr),
    Deferred(DeferredRowValue),
    /// Opaque callback; its result kind must be declared.
    Callback(RowFn),
}

impl Computation {
    pub fn callback<F>(func: F) -> Self
    where
        F: Fn(&Row) -> QueryResult<Value> + Send + Sync + 'static,
    {
        Computation::Callback(Arc::new(func))
    }

    pub fn evaluate(&self, row: &Row) -> QueryResult<Value> {
        match self {
            Computation::Expr(expr) => eval_value(expr, row),
            Computation::Deferred(deferred) => deferred.evaluate(row),
            Computation::Callback(func) => func(row),
        }
    }

    /// Result kind implied by the computation itself.
    fn infer(&self, subject: &str) -> QueryResult<DataType> {
        match self {
            Computation::Expr(expr) => {
                let kinds: Vec<DataType> = expr
                    .fields_referenced()
                    .iter()
                    .map(|f| f.data_type)
                    .collect();
                let first = kinds.first().copied();
                if let Some(only) = first.filter(|k| kinds.iter().all(|x| x == k)) {
                    Ok(only)
                } else if kinds.iter().all(DataType::is_numeric) {
                    Ok(DataType::Float)
                } else {
                    Ok(DataType::String)
                }
            }
            Computation::Deferred(deferred) => Ok(deferred.data_type()),
            Computation::Callback(_) => Err(QueryError::Inference {
                subject: subject.to_string(),
                reason: "a callback has no fields to infer from; declare its data type".into(),
            }),
        }
    }
}

impl From<Expr> for Computation {
    fn from(expr: Expr) -> Self {
        Computation::Expr(expr)
    }
}

impl From<DeferredRowValue> for Computation {
    fn from(deferred: DeferredRowValue) -> Self {
        Computation::Deferred(deferred)
    }
}

impl fmt::Debug for Computation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Computation::Expr(expr) => write!(f, "Expr({expr})"),
            Computation::Deferred(d) => write!(f, "Deferred({d})"),
            Computation::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// A named column derived from other columns of the same row.
#[derive(Debug)]
pub struct CalculatedField {
    field: FieldRef,
    computation: Computation,
}

impl CalculatedField {
    /// Builds the column; `data_type` of `None` infers it from the computation.
    pub fn new(
        display_name: impl Into<String>,
        computation: impl Into<Computation>,
        description: impl Into<String>,
        data_type: Option<DataType>,
    ) -> QueryResult<Self> {
        let display_name = display_name.into();
        let computation = computation.into();
        let data_type = match data_type {
            Some(dt) => dt,
            None => computation.infer(&display_name)?,
        };

        let column = display_name.replace(' ', "_").to_lowercase();
        let def = FieldDef::new(display_name, data_type).description(description);
        let field = Field::new(def, ColumnKey::new(CALCULATION_TABLE, column));

        Ok(Self {
            field: Arc::new(field),
            computation,
        })
    }

    pub fn field(&self) -> &FieldRef {
        &self.field
    }

    pub fn display_name(&self) -> &str {
        &self.field.display_name
    }

    pub fn data_type(&self) -> DataType {
        self.field.data_type
    }

    pub fn key(&self) -> ColumnKey {
        self.field.key()
    }

    pub fn computation(&self) -> &Computation {
        &self.computation
    }

    /// Evaluates and converts into the column kind; bad values become NULL.
    pub fn compute(&self, row: &Row) -> QueryResult<Value> {
        let raw = self.computation.evaluate(row)?;
        self.data_type().convert(&raw, ConversionMode::IgnoreErrors)
    }
}

impl fmt::Display for CalculatedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field)
    }
}
