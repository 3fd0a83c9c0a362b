use crate::db_debug;
use crate::debugger::Component;
use crate::error::QueryResult;
use crate::exec::scan::Params;
use crate::exec::table::Table;
use crate::types::datatype::DataType;
use crate::types::value::Value;

/// A column as a relational store would declare it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageColumn {
    pub name: String,
    pub data_type: DataType,
}

impl StorageColumn {
    pub fn sql_type(&self) -> &'static str {
        self.data_type.storage_type()
    }

    /// `"{name} {type}"`, as used in a column list.
    pub fn definition(&self) -> String {
        format!("{} {}", self.name, self.sql_type())
    }
}

fn storage_name(display_name: &str) -> String {
    display_name.to_lowercase().replace(' ', "_")
}

impl Table {
    /// Store-side columns: the deduplicated display names in lower snake case.
    pub fn storage_columns(&self) -> Vec<StorageColumn> {
        self.display_names()
            .iter()
            .zip(self.fields())
            .map(|(name, field)| StorageColumn {
                name: storage_name(name),
                data_type: field.data_type,
            })
            .collect()
    }

    /// Every row as positional values mapped to their storage representation.
    pub fn export_rows(&self, params: &Params) -> QueryResult<Vec<Vec<Value>>> {
        let fields: Vec<_> = self.fields().cloned().collect();
        let rows = self
            .rows(params)
            .map(|row| {
                let row = row?;
                Ok(fields
                    .iter()
                    .map(|f| {
                        let value = row.get(&f.key()).unwrap_or(&Value::Null);
                        f.data_type.to_storage(value)
                    })
                    .collect())
            })
            .collect::<QueryResult<Vec<Vec<Value>>>>()?;
        db_debug!(Component::Export, "{}: exported {} rows", self.name(), rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::catalog::Catalog;
    use crate::catalog::field::FieldDef;
    use crate::exec::scan::MemorySource;

    fn ledger() -> Table {
        Catalog::new()
            .table("Ledger")
            .field("id", FieldDef::int("ID"))
            .field("amount", FieldDef::currency("Amount Paid"))
            .field("settled", FieldDef::boolean("Settled"))
            .source(MemorySource::new(vec![
                vec![Value::Int64(1), Value::from("12.50"), Value::Bool(true)],
                vec![Value::Int64(2), Value::Null, Value::Bool(false)],
            ]))
            .build()
            .unwrap()
    }

    #[test]
    fn storage_columns_are_snake_cased() {
        let defs: Vec<_> = ledger().storage_columns().iter().map(|c| c.definition()).collect();
        assert_eq!(defs, vec!["id INTEGER", "amount_paid NUMERIC", "settled INTEGER"]);
    }

    #[test]
    fn export_maps_values_to_storage() {
        let rows = ledger().export_rows(&Params::new()).unwrap();
        assert_eq!(
            rows[0],
            vec![Value::Int64(1), Value::Float64(12.5), Value::Int64(1)]
        );
        assert_eq!(rows[1], vec![Value::Int64(2), Value::Null, Value::Int64(0)]);
    }

    #[test]
    fn currency_is_converted_on_scan() {
        let rows = ledger().head(1, &Params::new()).unwrap();
        let amount = rows[0].values().nth(1).cloned();
        assert_eq!(amount, Some(Value::Decimal(Decimal::new(1250, 2))));
    }
}
