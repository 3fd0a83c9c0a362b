use crate::catalog::field::ColumnKey;
use crate::error::QueryResult;
use crate::exec::operator::{Operator, Row};
use crate::types::value::Value;

/// Replays fixed rows; reopening starts over.
pub struct MemoryScanExec {
    rows: Vec<Row>,
    idx: usize,
    pub opened: usize,
}

impl MemoryScanExec {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            idx: 0,
            opened: 0,
        }
    }
}

impl Operator for MemoryScanExec {
    fn open(&mut self) -> QueryResult<()> {
        self.idx = 0;
        self.opened += 1;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        let row = self.rows.get(self.idx).cloned();
        self.idx += 1;
        Ok(row)
    }

    fn close(&mut self) {}
}

pub fn qrow(table: &str, cols: &[(&str, Value)]) -> Row {
    let mut r = Row::new();
    for (c, v) in cols {
        r.insert(ColumnKey::new(table, *c), v.clone());
    }
    r
}

pub fn scan(rows: Vec<Row>) -> Box<dyn Operator> {
    Box::new(MemoryScanExec::new(rows))
}

/// Opens `op`, drains it and closes it.
pub fn drain(mut op: Box<dyn Operator>) -> Vec<Row> {
    op.open().unwrap();
    let mut out = Vec::new();
    while let Some(row) = op.next().unwrap() {
        out.push(row);
    }
    op.close();
    out
}

pub fn column(rows: &[Row], table: &str, col: &str) -> Vec<Value> {
    let key = ColumnKey::new(table, col);
    rows.iter()
        .map(|r| r.get(&key).cloned().unwrap_or(Value::Null))
        .collect()
}
