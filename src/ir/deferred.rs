use std::fmt;
use std::sync::Arc;

use crate::error::QueryResult;
use crate::exec::operator::Row;
use crate::types::datatype::DataType;
use crate::types::value::Value;

pub type RowFn = Arc<dyn Fn(&Row) -> QueryResult<Value> + Send + Sync>;

/// An unnamed row-level computation with a declared result kind.
///
/// Unlike a calculated field it is never registered and never stored in
/// the row; the description exists for display and debugging only.
#[derive(Clone)]
pub struct DeferredRowValue {
    data_type: DataType,
    description: String,
    func: RowFn,
}

impl DeferredRowValue {
    pub fn new<F>(data_type: DataType, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Row) -> QueryResult<Value> + Send + Sync + 'static,
    {
        Self {
            data_type,
            description: description.into(),
            func: Arc::new(func),
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn evaluate(&self, row: &Row) -> QueryResult<Value> {
        (self.func)(row)
    }
}

impl fmt::Debug for DeferredRowValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredRowValue")
            .field("data_type", &self.data_type)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for DeferredRowValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}
