use std::collections::BTreeMap;
use std::sync::Arc;

use crate::catalog::field::FieldRef;
use crate::debugger::Component;
use crate::error::{QueryError, QueryResult};
use crate::exec::operator::{Operator, Row};
use crate::types::convert::ConversionMode;
use crate::types::value::Value;
use crate::{db_debug, db_trace};

/// Keyword filters handed to a row source on every invocation.
pub type Params = BTreeMap<String, Value>;

/// A row as an adapter produces it.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceRow {
    /// Values in the table's declared column order.
    Positional(Vec<Value>),
    /// Values already keyed by (table, column).
    Keyed(Row),
}

impl From<Vec<Value>> for SourceRow {
    fn from(values: Vec<Value>) -> Self {
        SourceRow::Positional(values)
    }
}

impl From<Row> for SourceRow {
    fn from(row: Row) -> Self {
        SourceRow::Keyed(row)
    }
}

pub type SourceRows = Box<dyn Iterator<Item = anyhow::Result<SourceRow>>>;

/// Produces a fresh, lazy sequence of rows each time it is invoked.
///
/// Sources may honour whichever `params` they understand and ignore the rest.
pub trait RowSource: Send + Sync {
    fn rows(&self, params: &Params) -> anyhow::Result<SourceRows>;
}

impl<F> RowSource for F
where
    F: Fn(&Params) -> anyhow::Result<SourceRows> + Send + Sync,
{
    fn rows(&self, params: &Params) -> anyhow::Result<SourceRows> {
        self(params)
    }
}

/// Fixed in-memory rows, replayed on every invocation.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    rows: Arc<Vec<SourceRow>>,
}

impl MemorySource {
    pub fn new<R: Into<SourceRow>>(rows: impl IntoIterator<Item = R>) -> Self {
        Self {
            rows: Arc::new(rows.into_iter().map(Into::into).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RowSource for MemorySource {
    fn rows(&self, _params: &Params) -> anyhow::Result<SourceRows> {
        let rows = self.rows.clone();
        Ok(Box::new((0..rows.len()).map(move |i| anyhow::Ok(rows[i].clone()))))
    }
}

/// Lays a source row out in schema order, converting each value through its
/// column's kind when `mode` is set.
///
/// Absent columns become NULL; surplus positional values are an error.
pub fn shape_row(
    schema: &[FieldRef],
    source: SourceRow,
    mode: Option<ConversionMode>,
) -> QueryResult<Row> {
    let mut row = Row::with_capacity(schema.len());
    match source {
        SourceRow::Positional(values) => {
            if values.len() > schema.len() {
                return Err(QueryError::schema(format!(
                    "row has {} values but the table declares {} fields",
                    values.len(),
                    schema.len()
                )));
            }
            let mut values = values.into_iter();
            for field in schema {
                row.insert(field.key(), values.next().unwrap_or(Value::Null));
            }
        }
        SourceRow::Keyed(mut keyed) => {
            for field in schema {
                let key = field.key();
                let value = keyed.shift_remove(&key).unwrap_or(Value::Null);
                row.insert(key, value);
            }
        }
    }

    if let Some(mode) = mode {
        for (field, value) in schema.iter().zip(row.values_mut()) {
            *value = field.data_type.convert(value, mode)?;
        }
    }
    Ok(row)
}

/// Leaf operator pulling from a [`RowSource`].
pub struct ScanExec {
    table: String,
    source: Arc<dyn RowSource>,
    params: Params,
    schema: Vec<FieldRef>,
    mode: Option<ConversionMode>,
    cursor: Option<SourceRows>,
    produced: usize,
}

impl ScanExec {
    pub fn new(
        table: String,
        source: Arc<dyn RowSource>,
        params: Params,
        schema: Vec<FieldRef>,
        mode: Option<ConversionMode>,
    ) -> Self {
        Self {
            table,
            source,
            params,
            schema,
            mode,
            cursor: None,
            produced: 0,
        }
    }
}

impl Operator for ScanExec {
    fn open(&mut self) -> QueryResult<()> {
        db_trace!(Component::Scan, "open {} with {:?}", self.table, self.params);
        self.produced = 0;
        self.cursor = Some(self.source.rows(&self.params)?);
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };
        match cursor.next() {
            Some(raw) => {
                let row = shape_row(&self.schema, raw?, self.mode)?;
                self.produced += 1;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        if self.cursor.take().is_some() {
            db_debug!(Component::Scan, "{}: {} rows scanned", self.table, self.produced);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::field::{ColumnKey, FieldDef};
    use crate::exec::test_util::drain;
    use crate::types::datatype::DataType;

    fn schema() -> Vec<FieldRef> {
        vec![
            Arc::new(FieldDef::int("ID").bind("t", "id")),
            Arc::new(FieldDef::currency("Amount").bind("t", "amt")),
        ]
    }

    fn scan(source: impl RowSource + 'static, mode: Option<ConversionMode>) -> Box<dyn Operator> {
        Box::new(ScanExec::new(
            "t".into(),
            Arc::new(source),
            Params::new(),
            schema(),
            mode,
        ))
    }

    #[test]
    fn positional_rows_are_typed() {
        let src = MemorySource::new(vec![vec![Value::from("1"), Value::from("2.5")]]);
        let rows = drain(scan(src, Some(ConversionMode::Strict)));
        assert_eq!(rows[0][&ColumnKey::new("t", "id")], Value::Int64(1));
        assert_eq!(
            rows[0][&ColumnKey::new("t", "amt")],
            DataType::Currency
                .convert(&Value::Float64(2.5), ConversionMode::Strict)
                .unwrap()
        );
    }

    #[test]
    fn short_rows_pad_with_null() {
        let src = MemorySource::new(vec![vec![Value::Int64(1)]]);
        let rows = drain(scan(src, None));
        assert_eq!(rows[0][&ColumnKey::new("t", "amt")], Value::Null);
    }

    #[test]
    fn strict_typing_surfaces_errors() {
        let src = MemorySource::new(vec![vec![Value::from("abc")]]);
        let mut op = scan(src, Some(ConversionMode::Strict));
        op.open().unwrap();
        assert!(matches!(op.next(), Err(QueryError::Conversion { .. })));
    }

    #[test]
    fn closure_sources_see_params() {
        let src = |params: &Params| -> anyhow::Result<SourceRows> {
            let limit = match params.get("limit") {
                Some(Value::Int64(n)) => *n,
                _ => 10,
            };
            Ok(Box::new(
                (0..limit).map(|i| anyhow::Ok(SourceRow::from(vec![Value::Int64(i)]))),
            ))
        };
        let mut params = Params::new();
        params.insert("limit".into(), Value::Int64(2));
        let op = ScanExec::new("t".into(), Arc::new(src), params, schema(), None);
        assert_eq!(drain(Box::new(op)).len(), 2);
    }

    #[test]
    fn source_errors_propagate() {
        let src = |_: &Params| -> anyhow::Result<SourceRows> { anyhow::bail!("file vanished") };
        let mut op = scan(src, None);
        assert!(matches!(op.open(), Err(QueryError::Source(_))));
    }
}
