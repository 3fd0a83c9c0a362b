use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::common::dates;
use crate::ir::deferred::DeferredRowValue;
use crate::types::datatype::DataType;
use crate::types::value::Value;

static NEXT_CREATION_ORDER: AtomicU64 = AtomicU64::new(0);

fn next_creation_order() -> u64 {
    NEXT_CREATION_ORDER.fetch_add(1, Ordering::Relaxed)
}

/// Storage key of a column: owning table plus column name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey {
    pub table: String,
    pub column: String,
}

impl ColumnKey {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// An unbound column declaration, turned into a [`Field`] when a table is
/// built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub display_name: String,
    pub data_type: DataType,
    pub description: String,
}

impl FieldDef {
    pub fn new(display_name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            display_name: display_name.into(),
            data_type,
            description: String::new(),
        }
    }

    pub fn int(display_name: impl Into<String>) -> Self {
        Self::new(display_name, DataType::Int)
    }

    pub fn float(display_name: impl Into<String>) -> Self {
        Self::new(display_name, DataType::Float)
    }

    pub fn currency(display_name: impl Into<String>) -> Self {
        Self::new(display_name, DataType::Currency)
    }

    pub fn string(display_name: impl Into<String>) -> Self {
        Self::new(display_name, DataType::String)
    }

    pub fn boolean(display_name: impl Into<String>) -> Self {
        Self::new(display_name, DataType::Boolean)
    }

    /// A `DateTime` column when `and_time`, a `Date` column otherwise.
    pub fn date(display_name: impl Into<String>, and_time: bool) -> Self {
        let data_type = if and_time {
            DataType::DateTime
        } else {
            DataType::Date
        };
        Self::new(display_name, data_type)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub(crate) fn bind(self, table: &str, column: &str) -> Field {
        Field::new(self, ColumnKey::new(table, column))
    }
}

/// Immutable column descriptor bound to a table.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub display_name: String,
    pub data_type: DataType,
    pub description: String,
    pub table_name: String,
    pub name: String,
    creation_order: u64,
}

pub type FieldRef = Arc<Field>;

impl Field {
    pub(crate) fn new(def: FieldDef, key: ColumnKey) -> Self {
        Self {
            display_name: def.display_name,
            data_type: def.data_type,
            description: def.description,
            table_name: key.table,
            name: key.column,
            creation_order: next_creation_order(),
        }
    }

    pub fn key(&self) -> ColumnKey {
        ColumnKey::new(&self.table_name, &self.name)
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.table_name, self.name)
    }

    pub fn creation_order(&self) -> u64 {
        self.creation_order
    }

    fn deferred<F>(&self, data_type: DataType, description: String, f: F) -> DeferredRowValue
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let key = self.key();
        DeferredRowValue::new(data_type, description, move |row| {
            Ok(f(row.get(&key).unwrap_or(&Value::Null)))
        })
    }

    /// Remaps the row value through `values`; unmatched values become `default`.
    pub fn map(&self, values: HashMap<Value, Value>, default: Value) -> DeferredRowValue {
        let description = format!("{}.map(values={})", self.full_name(), values.len());
        self.deferred(self.data_type, description, move |v| {
            values.get(v).cloned().unwrap_or_else(|| default.clone())
        })
    }

    pub fn is_null(&self, or_blank: bool) -> DeferredRowValue {
        let description = format!("{}.is_null(or_blank={})", self.full_name(), or_blank);
        self.deferred(DataType::Boolean, description, move |v| {
            let blank = or_blank && v.as_str() == Some("");
            Value::Bool(v.is_null() || blank)
        })
    }

    pub fn contains(&self, fragment: &str, ignore_case: bool) -> DeferredRowValue {
        let description = format!(
            "{}.contains(fragment={:?}, ignore_case={})",
            self.full_name(),
            fragment,
            ignore_case
        );
        let fragment = fragment.to_string();
        self.deferred(DataType::Boolean, description, move |v| {
            Value::Bool(text_match(v, &fragment, ignore_case, |s, p| s.contains(p)))
        })
    }

    pub fn starts_with(&self, prefix: &str, ignore_case: bool) -> DeferredRowValue {
        let description = format!(
            "{}.starts_with(prefix={:?}, ignore_case={})",
            self.full_name(),
            prefix,
            ignore_case
        );
        let prefix = prefix.to_string();
        self.deferred(DataType::Boolean, description, move |v| {
            Value::Bool(text_match(v, &prefix, ignore_case, |s, p| s.starts_with(p)))
        })
    }

    pub fn ends_with(&self, suffix: &str, ignore_case: bool) -> DeferredRowValue {
        let description = format!(
            "{}.ends_with(suffix={:?}, ignore_case={})",
            self.full_name(),
            suffix,
            ignore_case
        );
        let suffix = suffix.to_string();
        self.deferred(DataType::Boolean, description, move |v| {
            Value::Bool(text_match(v, &suffix, ignore_case, |s, p| s.ends_with(p)))
        })
    }

    pub fn replace(&self, fragment: &str, replacement: &str) -> DeferredRowValue {
        let description = format!(
            "{}.replace(fragment={:?}, replacement={:?})",
            self.full_name(),
            fragment,
            replacement
        );
        let (fragment, replacement) = (fragment.to_string(), replacement.to_string());
        self.deferred(DataType::String, description, move |v| {
            let text = if v.is_null() {
                String::new()
            } else {
                v.to_string()
            };
            Value::String(text.replace(&fragment, &replacement))
        })
    }

    /// Last day of the month `months` away from the row's date.
    pub fn eomonth(&self, months: i32) -> DeferredRowValue {
        let description = format!("{}.eomonth(months={})", self.full_name(), months);
        self.deferred(DataType::Date, description, move |v| {
            on_date(v, |d| dates::eomonth(d, months))
        })
    }

    /// First day of the month `months` away from the row's date.
    pub fn bomonth(&self, months: i32) -> DeferredRowValue {
        let description = format!("{}.bomonth(months={})", self.full_name(), months);
        self.deferred(DataType::Date, description, move |v| {
            on_date(v, |d| dates::bomonth(d, months))
        })
    }
}

fn text_match(value: &Value, pattern: &str, ignore_case: bool, f: fn(&str, &str) -> bool) -> bool {
    if value.is_null() {
        return false;
    }
    let text = value.to_string();
    if ignore_case {
        f(&text.to_lowercase(), &pattern.to_lowercase())
    } else {
        f(&text, pattern)
    }
}

fn on_date(value: &Value, f: impl Fn(chrono::NaiveDate) -> Option<chrono::NaiveDate>) -> Value {
    let date = match value {
        Value::Date(d) => *d,
        Value::DateTime(dt) => dt.date(),
        Value::String(s) => match dates::parse_date(s) {
            Some(d) => d,
            None => return Value::Null,
        },
        _ => return Value::Null,
    };
    f(date).map(Value::Date).unwrap_or(Value::Null)
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.display_name)
    }
}
