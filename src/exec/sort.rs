use std::fmt;

use crate::catalog::field::FieldRef;
use crate::db_debug;
use crate::debugger::Component;
use crate::error::{IdentifierKind, QueryError, QueryResult};
use crate::exec::operator::{Operator, Row};
use crate::exec::value_cmp::compare_values;
use crate::types::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn name(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    /// Accepts `asc`/`desc` or the spelled-out forms, in any case.
    pub fn by_name(name: &str) -> QueryResult<SortDirection> {
        match name.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(QueryError::unknown(IdentifierKind::SortDirection, name)),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value a row sorts and groups under for `field`: NULL is replaced by the
/// field's default so it lands with the zero value of its kind.
pub(crate) fn value_or_default(row: &Row, field: &FieldRef) -> Value {
    match row.get(&field.key()) {
        Some(Value::Null) | None => field.data_type.default_value(),
        Some(v) => v.clone(),
    }
}

pub struct SortExec {
    input: Box<dyn Operator>,
    keys: Vec<(FieldRef, SortDirection)>,
    rows: Vec<Row>,
    idx: usize,
}

impl SortExec {
    pub fn new(input: Box<dyn Operator>, keys: Vec<(FieldRef, SortDirection)>) -> Self {
        Self {
            input,
            keys,
            rows: Vec::new(),
            idx: 0,
        }
    }
}

impl Operator for SortExec {
    fn open(&mut self) -> QueryResult<()> {
        self.rows.clear();
        self.idx = 0;
        self.input.open()?;

        while let Some(row) = self.input.next()? {
            self.rows.push(row);
        }

        // one stable pass per key, least significant first
        for (field, direction) in self.keys.iter().rev() {
            self.rows.sort_by(|a, b| {
                let ord = compare_values(&value_or_default(a, field), &value_or_default(b, field));
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }

        db_debug!(Component::Sort, "sorted {} rows on {} keys", self.rows.len(), self.keys.len());
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if self.idx >= self.rows.len() {
            return Ok(None);
        }
        let row = std::mem::take(&mut self.rows[self.idx]);
        self.idx += 1;
        Ok(Some(row))
    }

    fn close(&mut self) {
        self.rows.clear();
        self.input.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::field::FieldDef;
    use crate::exec::test_util::{column, drain, qrow, scan};

    fn fields() -> (FieldRef, FieldRef) {
        (
            Arc::new(FieldDef::string("Name").bind("t", "name")),
            Arc::new(FieldDef::int("Age").bind("t", "age")),
        )
    }

    fn names(names: &[&str]) -> Vec<Value> {
        names.iter().map(|n| Value::from(*n)).collect()
    }

    fn people() -> Vec<Row> {
        vec![
            qrow("t", &[("name", "Bob".into()), ("age", Value::Int64(30))]),
            qrow("t", &[("name", "Alice".into()), ("age", Value::Int64(30))]),
            qrow("t", &[("name", "Carol".into()), ("age", Value::Int64(25))]),
            qrow("t", &[("name", "Dan".into()), ("age", Value::Null)]),
        ]
    }

    #[test]
    fn sort_ascending_with_null_as_default() {
        let (_, age) = fields();
        let sort = SortExec::new(scan(people()), vec![(age, SortDirection::Ascending)]);
        let out = drain(Box::new(sort));
        assert_eq!(
            column(&out, "t", "name"),
            names(&["Dan", "Carol", "Bob", "Alice"])
        );
    }

    #[test]
    fn descending_keeps_ties_in_input_order() {
        let (_, age) = fields();
        let sort = SortExec::new(scan(people()), vec![(age, SortDirection::Descending)]);
        let out = drain(Box::new(sort));
        assert_eq!(
            column(&out, "t", "name"),
            names(&["Bob", "Alice", "Carol", "Dan"])
        );
    }

    #[test]
    fn multiple_keys_compose() {
        let (name, age) = fields();
        let sort = SortExec::new(
            scan(people()),
            vec![(age, SortDirection::Descending), (name, SortDirection::Ascending)],
        );
        let out = drain(Box::new(sort));
        assert_eq!(
            column(&out, "t", "name"),
            names(&["Alice", "Bob", "Carol", "Dan"])
        );
    }

    #[test]
    fn direction_names() {
        assert_eq!(SortDirection::by_name("DESC").unwrap(), SortDirection::Descending);
        assert_eq!(SortDirection::by_name("ascending").unwrap(), SortDirection::Ascending);
        assert!(SortDirection::by_name("sideways").is_err());
    }
}
