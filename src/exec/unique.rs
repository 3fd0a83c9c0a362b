use std::collections::HashSet;

use crate::error::QueryResult;
use crate::exec::operator::{Operator, Row};
use crate::types::value::Value;

/// Drops rows whose full value tuple has already been produced.
pub struct UniqueExec {
    input: Box<dyn Operator>,
    seen: HashSet<Vec<Value>>,
}

impl UniqueExec {
    pub fn new(input: Box<dyn Operator>) -> Self {
        Self {
            input,
            seen: HashSet::new(),
        }
    }
}

impl Operator for UniqueExec {
    fn open(&mut self) -> QueryResult<()> {
        self.seen.clear();
        self.input.open()
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        while let Some(row) = self.input.next()? {
            if self.seen.insert(row.values().cloned().collect()) {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn close(&mut self) {
        self.seen.clear();
        self.input.close();
    }
}
