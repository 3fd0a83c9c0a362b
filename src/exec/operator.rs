use indexmap::IndexMap;

use crate::catalog::field::ColumnKey;
use crate::db_error;
use crate::debugger::Component;
use crate::error::QueryResult;
use crate::types::value::Value;

/// One row keyed by (table, column); insertion order is display order.
pub type Row = IndexMap<ColumnKey, Value>;

/// Pull-based physical operator.
pub trait Operator {
    /// Prepare the operator (open children, materialise inputs it must see whole).
    fn open(&mut self) -> QueryResult<()>;

    /// Produce the next row
    ///
    /// - Ok(Some(row)) → row produced
    /// - Ok(None)      → end of stream
    /// - Err(e)        → evaluation or source error
    fn next(&mut self) -> QueryResult<Option<Row>>;

    /// Release buffers and close children. Safe to call more than once.
    fn close(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StreamState {
    Pending,
    Open,
    Done,
}

/// Single-pass iterator over an operator tree.
///
/// The tree is opened on the first pull and closed once it is exhausted,
/// fails, or the stream is dropped.
pub struct RowStream {
    root: Box<dyn Operator>,
    state: StreamState,
}

impl RowStream {
    pub fn new(root: Box<dyn Operator>) -> Self {
        Self {
            root,
            state: StreamState::Pending,
        }
    }

    fn finish(&mut self) {
        if self.state == StreamState::Open {
            self.root.close();
        }
        self.state = StreamState::Done;
    }
}

impl Iterator for RowStream {
    type Item = QueryResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == StreamState::Pending {
            self.state = StreamState::Open;
            if let Err(err) = self.root.open() {
                db_error!(Component::Pipeline, "failed to open row stream: {}", err);
                self.finish();
                return Some(Err(err));
            }
        }
        if self.state == StreamState::Done {
            return None;
        }

        match self.root.next() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.finish();
                None
            }
            Err(err) => {
                db_error!(Component::Pipeline, "row stream aborted: {}", err);
                self.finish();
                Some(Err(err))
            }
        }
    }
}

impl Drop for RowStream {
    fn drop(&mut self) {
        self.finish();
    }
}
