use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::catalog::calculated::{CalculatedField, Computation};
use crate::debugger::Component;
use crate::error::{IdentifierKind, QueryError, QueryResult};
use crate::exec::table::TableBuilder;
use crate::types::datatype::DataType;
use crate::{db_debug, db_warn};

/// Caller-owned registry of calculated fields, keyed by display name.
///
/// Clones share the same registry. Every table built from a catalog carries
/// a handle to it so string selections resolve against the same names.
#[derive(Clone, Default)]
pub struct Catalog {
    calculated: Arc<RwLock<HashMap<String, Arc<CalculatedField>>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts declaring a source table.
    pub fn table(&self, name: impl Into<String>) -> TableBuilder {
        TableBuilder::new(self.clone(), name.into())
    }

    // ---------- calculated field API ----------

    pub fn register(&self, calc: CalculatedField) -> Arc<CalculatedField> {
        let calc = Arc::new(calc);
        let name = calc.display_name().to_string();
        let previous = self.calculated.write().insert(name.clone(), calc.clone());
        if previous.is_some() {
            db_warn!(Component::Catalog, "calculated field {:?} redefined", name);
        } else {
            db_debug!(Component::Catalog, "registered calculated field {:?}", name);
        }
        calc
    }

    /// Builds a calculated field and registers it in one step.
    pub fn calculate(
        &self,
        display_name: impl Into<String>,
        computation: impl Into<Computation>,
        description: impl Into<String>,
        data_type: Option<DataType>,
    ) -> QueryResult<Arc<CalculatedField>> {
        let calc = CalculatedField::new(display_name, computation, description, data_type)?;
        Ok(self.register(calc))
    }

    pub fn calculated_field(&self, display_name: &str) -> QueryResult<Arc<CalculatedField>> {
        self.calculated
            .read()
            .get(display_name)
            .cloned()
            .ok_or_else(|| QueryError::unknown(IdentifierKind::CalculatedField, display_name))
    }

    pub fn unregister(&self, display_name: &str) -> Option<Arc<CalculatedField>> {
        self.calculated.write().remove(display_name)
    }

    pub fn calculated_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.calculated.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.calculated.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculated.read().is_empty()
    }
}
