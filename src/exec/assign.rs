use std::sync::Arc;

use crate::catalog::calculated::CalculatedField;
use crate::error::QueryResult;
use crate::exec::operator::{Operator, Row};

/// Appends one calculated column to every row.
///
/// Values are converted leniently: a computed value that does not fit the
/// column's kind becomes NULL instead of failing the stream.
pub struct AssignExec {
    input: Box<dyn Operator>,
    calc: Arc<CalculatedField>,
}

impl AssignExec {
    pub fn new(input: Box<dyn Operator>, calc: Arc<CalculatedField>) -> Self {
        Self { input, calc }
    }
}

impl Operator for AssignExec {
    fn open(&mut self) -> QueryResult<()> {
        self.input.open()
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        let Some(mut row) = self.input.next()? else {
            return Ok(None);
        };
        let value = self.calc.compute(&row)?;
        row.insert(self.calc.key(), value);
        Ok(Some(row))
    }

    fn close(&mut self) {
        self.input.close();
    }
}
