//! Declared column kinds.
//!
//! These are the types a column can be declared with; the runtime value of a
//! cell is always one of the [`Value`] variants the kind converts into.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::error::{IdentifierKind, QueryError, QueryResult};
use crate::types::convert::{ConversionMode, Converter};
use crate::types::value::{Kind, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    Boolean,
    Currency,
    Date,
    DateTime,
    Float,
    Int,
    String,
}

impl DataType {
    pub const ALL: [DataType; 7] = [
        DataType::Boolean,
        DataType::Currency,
        DataType::Date,
        DataType::DateTime,
        DataType::Float,
        DataType::Int,
        DataType::String,
    ];

    /// Stable external name.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "bool",
            DataType::Currency => "currency",
            DataType::Date => "date",
            DataType::DateTime => "datetime",
            DataType::Float => "float",
            DataType::Int => "int",
            DataType::String => "str",
        }
    }

    pub fn by_name(name: &str) -> QueryResult<DataType> {
        DataType::ALL
            .into_iter()
            .find(|dt| dt.name() == name)
            .ok_or_else(|| QueryError::unknown(IdentifierKind::DataType, name))
    }

    /// The primitive kind values of this column convert into.
    pub fn kind(&self) -> Kind {
        match self {
            DataType::Boolean => Kind::Bool,
            DataType::Currency => Kind::Decimal,
            DataType::Date => Kind::Date,
            DataType::DateTime => Kind::DateTime,
            DataType::Float => Kind::Float,
            DataType::Int => Kind::Int,
            DataType::String => Kind::String,
        }
    }

    /// Column kind that stores a primitive kind, if any does.
    pub fn for_kind(kind: Kind) -> Option<DataType> {
        match kind {
            Kind::Bool => Some(DataType::Boolean),
            Kind::Int => Some(DataType::Int),
            Kind::Float => Some(DataType::Float),
            Kind::Decimal => Some(DataType::Currency),
            Kind::Date => Some(DataType::Date),
            Kind::DateTime => Some(DataType::DateTime),
            Kind::String => Some(DataType::String),
            Kind::Duration => None,
        }
    }

    /// Surrogate used in place of NULL when sorting, grouping and aggregating.
    pub fn default_value(&self) -> Value {
        match self {
            DataType::Boolean => Value::Bool(false),
            DataType::Currency => Value::Decimal(Decimal::ZERO),
            DataType::Date => Value::Date(NaiveDate::MIN),
            DataType::DateTime => Value::DateTime(NaiveDateTime::MIN),
            DataType::Float => Value::Float64(0.0),
            DataType::Int => Value::Int64(0),
            DataType::String => Value::String(String::new()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        match self {
            DataType::Currency | DataType::Float | DataType::Int => true,
            DataType::Boolean | DataType::Date | DataType::DateTime | DataType::String => false,
        }
    }

    pub fn converter(&self, mode: ConversionMode) -> Converter {
        Converter::new(*self, mode)
    }

    /// Shorthand for a one-off conversion.
    pub fn convert(&self, value: &Value, mode: ConversionMode) -> QueryResult<Value> {
        self.converter(mode).convert(value)
    }

    /// Column type name used by a relational store.
    pub fn storage_type(&self) -> &'static str {
        match self {
            DataType::Boolean => "INTEGER",
            DataType::Currency => "NUMERIC",
            DataType::Date => "DATE",
            DataType::DateTime => "TIMESTAMP",
            DataType::Float => "REAL",
            DataType::Int => "INTEGER",
            DataType::String => "TEXT",
        }
    }

    /// Maps a converted value to the representation a relational store keeps.
    pub fn to_storage(&self, value: &Value) -> Value {
        match (self, value) {
            (DataType::Boolean, Value::Bool(b)) => Value::Int64(*b as i64),
            (DataType::Currency, v) => v.as_f64().map(Value::Float64).unwrap_or(Value::Null),
            _ => value.clone(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
