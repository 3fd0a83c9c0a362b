use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::catalog::calculated::{CalculatedField, Computation};
use crate::catalog::catalog::Catalog;
use crate::catalog::field::{ColumnKey, FieldDef, FieldRef};
use crate::debugger::Component;
use crate::error::{IdentifierKind, QueryError, QueryResult};
use crate::exec::aggregate::{AggregationMethod, PivotExec};
use crate::exec::assign::AssignExec;
use crate::exec::filter::FilterExec;
use crate::exec::join::{JoinExec, JoinInput, JoinRelationship, JoinType, join_key_types};
use crate::exec::limit::LimitExec;
use crate::exec::operator::{Operator, Row, RowStream};
use crate::exec::project::ProjectExec;
use crate::exec::scan::{Params, RowSource, ScanExec, SourceRow, shape_row};
use crate::exec::sort::{SortDirection, SortExec};
use crate::exec::unique::UniqueExec;
use crate::ir::expr::Expr;
use crate::types::convert::ConversionMode;
use crate::types::datatype::DataType;
use crate::types::value::Value;
use crate::{db_debug, db_warn};

/// Rebuilds a fresh operator tree for one pull of a table.
pub type Plan = Arc<dyn Fn(&Params) -> Box<dyn Operator> + Send + Sync>;

/// A materialised row keyed by (deduplicated) display name.
pub type DisplayRow = IndexMap<String, Value>;

/// Strips everything from the last `_id` of `base` and appends a fresh id.
pub fn new_table_name(base: &str) -> String {
    let stem = match base.rfind("_id") {
        Some(pos) => &base[..pos],
        None => base,
    };
    format!("{stem}_id{:032x}", rand::random::<u128>())
}

/// Declares a source table: its columns, in order, and where its rows come from.
pub struct TableBuilder {
    catalog: Catalog,
    name: String,
    fields: Vec<(String, FieldDef)>,
    source: Option<Arc<dyn RowSource>>,
    mode: Option<ConversionMode>,
}

impl TableBuilder {
    pub(crate) fn new(catalog: Catalog, name: String) -> Self {
        Self {
            catalog,
            name,
            fields: Vec::new(),
            source: None,
            mode: Some(ConversionMode::Strict),
        }
    }

    pub fn field(mut self, column: impl Into<String>, def: FieldDef) -> Self {
        self.fields.push((column.into(), def));
        self
    }

    pub fn source(mut self, source: impl RowSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// How scanned values are converted to their column kinds.
    pub fn conversion(mut self, mode: ConversionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Rows enter the pipeline exactly as the source yields them.
    pub fn untyped(mut self) -> Self {
        self.mode = None;
        self
    }

    pub fn build(self) -> QueryResult<Table> {
        let Some(source) = self.source else {
            return Err(QueryError::schema(format!(
                "table {:?} has no row source",
                self.name
            )));
        };

        let mut schema = IndexMap::with_capacity(self.fields.len());
        for (column, def) in self.fields {
            let field: FieldRef = Arc::new(def.bind(&self.name, &column));
            if schema.insert(field.key(), field).is_some() {
                return Err(QueryError::schema(format!(
                    "column {column:?} is declared twice on table {:?}",
                    self.name
                )));
            }
        }

        let fields: Vec<FieldRef> = schema.values().cloned().collect();
        let name = self.name.clone();
        let mode = self.mode;
        let plan: Plan = Arc::new(move |params: &Params| -> Box<dyn Operator> {
            Box::new(ScanExec::new(
                name.clone(),
                source.clone(),
                params.clone(),
                fields.clone(),
                mode,
            ))
        });

        db_debug!(Component::Pipeline, "declared table {} with {} fields", self.name, schema.len());
        Ok(Table {
            name: self.name,
            schema,
            catalog: self.catalog,
            plan,
        })
    }
}

/// What a `select` may name.
#[derive(Clone, Debug)]
pub enum Selection {
    Field(FieldRef),
    Calculated(Arc<CalculatedField>),
    /// Display name of a calculated field in the table's catalog.
    Name(String),
}

impl From<FieldRef> for Selection {
    fn from(field: FieldRef) -> Self {
        Selection::Field(field)
    }
}

impl From<&FieldRef> for Selection {
    fn from(field: &FieldRef) -> Self {
        Selection::Field(field.clone())
    }
}

impl From<Arc<CalculatedField>> for Selection {
    fn from(calc: Arc<CalculatedField>) -> Self {
        Selection::Calculated(calc)
    }
}

impl From<&Arc<CalculatedField>> for Selection {
    fn from(calc: &Arc<CalculatedField>) -> Self {
        Selection::Calculated(calc.clone())
    }
}

impl From<&str> for Selection {
    fn from(name: &str) -> Self {
        Selection::Name(name.to_string())
    }
}

impl From<String> for Selection {
    fn from(name: String) -> Self {
        Selection::Name(name)
    }
}

/// One line of [`Table::describe`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescription {
    pub field: String,
    pub data_type: String,
    pub table: String,
    pub description: String,
}

/// A schema plus a lazy row plan.
///
/// Every transformation returns a new table under a fresh name; nothing is
/// read until [`Table::rows`] (or one of the materialising helpers) pulls.
/// Each pull re-invokes the source.
#[derive(Clone)]
pub struct Table {
    name: String,
    schema: IndexMap<ColumnKey, FieldRef>,
    catalog: Catalog,
    plan: Plan,
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &IndexMap<ColumnKey, FieldRef> {
        &self.schema
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldRef> {
        self.schema.values()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Field for `column`, preferring one owned by this table's own name.
    pub fn field(&self, column: &str) -> QueryResult<FieldRef> {
        self.schema
            .get(&ColumnKey::new(&self.name, column))
            .or_else(|| self.schema.values().find(|f| f.name == column))
            .cloned()
            .ok_or_else(|| QueryError::unknown(IdentifierKind::Field, column))
    }

    /// Calculated fields are the only thing addressable by display name.
    pub fn field_by_display_name(&self, display_name: &str) -> QueryResult<Arc<CalculatedField>> {
        self.catalog.calculated_field(display_name)
    }

    fn derive(&self, schema: IndexMap<ColumnKey, FieldRef>, plan: Plan) -> Table {
        Table {
            name: new_table_name(&self.name),
            schema,
            catalog: self.catalog.clone(),
            plan,
        }
    }

    fn require(&self, field: &FieldRef) -> QueryResult<()> {
        if self.schema.contains_key(&field.key()) {
            Ok(())
        } else {
            Err(QueryError::schema(format!(
                "{} is not a field of this table",
                field.full_name()
            )))
        }
    }

    /// Reads an assigned calculated column, or computes it per row otherwise.
    fn calculated_column(&self, calc: Arc<CalculatedField>) -> (FieldRef, Expr) {
        let field = calc.field().clone();
        if self.schema.contains_key(&calc.key()) {
            (field.clone(), Expr::Column(field))
        } else {
            (field, Expr::Calculated(calc))
        }
    }

    // ---------- pipeline ----------

    pub fn select<S: Into<Selection>>(
        &self,
        columns: impl IntoIterator<Item = S>,
    ) -> QueryResult<Table> {
        let mut schema = IndexMap::new();
        let mut exprs = Vec::new();

        for selection in columns {
            let (field, expr) = match selection.into() {
                Selection::Field(field) => {
                    self.require(&field)?;
                    (field.clone(), Expr::Column(field))
                }
                Selection::Calculated(calc) => self.calculated_column(calc),
                Selection::Name(name) => {
                    self.calculated_column(self.catalog.calculated_field(&name)?)
                }
            };
            exprs.push((expr, field.key()));
            schema.insert(field.key(), field);
        }

        let parent = self.plan.clone();
        Ok(self.derive(
            schema,
            Arc::new(move |params: &Params| -> Box<dyn Operator> {
                Box::new(ProjectExec::new(parent(params), exprs.clone()))
            }),
        ))
    }

    /// Keeps rows for which `predicate` is true; NULL counts as false.
    pub fn filter(&self, predicate: impl Into<Computation>) -> Table {
        let predicate = predicate.into();
        let parent = self.plan.clone();
        self.derive(
            self.schema.clone(),
            Arc::new(move |params: &Params| -> Box<dyn Operator> {
                Box::new(FilterExec::new(parent(params), predicate.clone()))
            }),
        )
    }

    /// Registers a calculated field in the catalog and appends it to every row.
    ///
    /// With no `data_type` the kind is inferred from the computation.
    pub fn assign(
        &self,
        display_name: impl Into<String>,
        computation: impl Into<Computation>,
        description: impl Into<String>,
        data_type: Option<DataType>,
    ) -> QueryResult<Table> {
        let calc = self
            .catalog
            .calculate(display_name, computation, description, data_type)?;
        Ok(self.assign_field(calc))
    }

    /// Appends an already built calculated field.
    pub fn assign_field(&self, calc: Arc<CalculatedField>) -> Table {
        let mut schema = self.schema.clone();
        schema.insert(calc.key(), calc.field().clone());

        let parent = self.plan.clone();
        self.derive(
            schema,
            Arc::new(move |params: &Params| -> Box<dyn Operator> {
                Box::new(AssignExec::new(parent(params), calc.clone()))
            }),
        )
    }

    pub fn join(
        &self,
        right: &Table,
        left_on: &[FieldRef],
        right_on: &[FieldRef],
        how: JoinType,
        relationship: JoinRelationship,
    ) -> QueryResult<Table> {
        let key_types = join_key_types(left_on, right_on)?;
        for field in left_on {
            self.require(field)?;
        }
        for field in right_on {
            right.require(field)?;
        }

        let (first, second) = match how {
            JoinType::Right => (right, self),
            _ => (self, right),
        };
        let mut schema = first.schema.clone();
        for (key, field) in &second.schema {
            schema.entry(key.clone()).or_insert_with(|| field.clone());
        }

        let left_plan = self.plan.clone();
        let right_plan = right.plan.clone();
        let left_keys = left_on.to_vec();
        let right_keys = right_on.to_vec();
        let left_columns: Vec<ColumnKey> = self.schema.keys().cloned().collect();
        let right_columns: Vec<ColumnKey> = right.schema.keys().cloned().collect();

        let plan: Plan = Arc::new(move |params: &Params| -> Box<dyn Operator> {
            Box::new(JoinExec::new(
                JoinInput::new(left_plan(params), left_keys.clone(), left_columns.clone()),
                JoinInput::new(right_plan(params), right_keys.clone(), right_columns.clone()),
                how,
                relationship,
                key_types.clone(),
            ))
        });

        let mut table = first.derive(schema, plan);
        table.catalog = self.catalog.clone();
        Ok(table)
    }

    /// Groups on `group_by` and aggregates each (field, method) pair.
    pub fn pivot(
        &self,
        group_by: &[FieldRef],
        aggregations: &[(FieldRef, AggregationMethod)],
    ) -> QueryResult<Table> {
        let mut schema = IndexMap::new();
        for field in group_by.iter().chain(aggregations.iter().map(|(f, _)| f)) {
            self.require(field)?;
            schema.insert(field.key(), field.clone());
        }

        let parent = self.plan.clone();
        let group_by = group_by.to_vec();
        let aggregations = aggregations.to_vec();
        Ok(self.derive(
            schema,
            Arc::new(move |params: &Params| -> Box<dyn Operator> {
                Box::new(PivotExec::new(
                    parent(params),
                    group_by.clone(),
                    aggregations.clone(),
                ))
            }),
        ))
    }

    /// Stable sort; the first pair is the most significant key.
    pub fn sort(&self, order_by: &[(FieldRef, SortDirection)]) -> QueryResult<Table> {
        for (field, _) in order_by {
            self.require(field)?;
        }
        let parent = self.plan.clone();
        let keys = order_by.to_vec();
        Ok(self.derive(
            self.schema.clone(),
            Arc::new(move |params: &Params| -> Box<dyn Operator> {
                Box::new(SortExec::new(parent(params), keys.clone()))
            }),
        ))
    }

    pub fn unique(&self) -> Table {
        let parent = self.plan.clone();
        self.derive(
            self.schema.clone(),
            Arc::new(move |params: &Params| -> Box<dyn Operator> {
                Box::new(UniqueExec::new(parent(params)))
            }),
        )
    }

    pub fn limit(&self, n: usize) -> Table {
        let parent = self.plan.clone();
        self.derive(
            self.schema.clone(),
            Arc::new(move |params: &Params| -> Box<dyn Operator> {
                Box::new(LimitExec::new(parent(params), n))
            }),
        )
    }

    // ---------- consumers ----------

    /// Lazy stream over the table's rows; every call re-invokes the source.
    pub fn rows(&self, params: &Params) -> RowStream {
        db_debug!(Component::Pipeline, "pull {}", self.name);
        RowStream::new((self.plan)(params))
    }

    /// First `n` rows, pulling no further than needed.
    pub fn head(&self, n: usize, params: &Params) -> QueryResult<Vec<Row>> {
        self.rows(params).take(n).collect()
    }

    /// Every row, keyed by display name.
    pub fn all(&self, params: &Params) -> QueryResult<Vec<DisplayRow>> {
        let names = self.display_names();
        self.rows(params)
            .map(|row| {
                let row = row?;
                Ok(names
                    .iter()
                    .zip(self.schema.keys())
                    .map(|(name, key)| (name.clone(), row.get(key).cloned().unwrap_or(Value::Null)))
                    .collect())
            })
            .collect()
    }

    /// Display names with duplicates renamed to `"{table}: {name}"`.
    pub fn display_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.schema.len());
        for field in self.schema.values() {
            let name = if names.contains(&field.display_name) {
                let renamed = format!("{}: {}", field.table_name, field.display_name);
                db_warn!(
                    Component::Pipeline,
                    "the field {:?} is present in both tables; the one on {} is shown as {:?}",
                    field.display_name,
                    field.table_name,
                    renamed
                );
                renamed
            } else {
                field.display_name.clone()
            };
            names.push(name);
        }
        names
    }

    /// One entry per field, ordered by storage key.
    pub fn describe(&self) -> Vec<FieldDescription> {
        let mut fields: Vec<&FieldRef> = self.schema.values().collect();
        fields.sort_by_key(|f| f.key());
        fields
            .into_iter()
            .map(|f| FieldDescription {
                field: f.display_name.clone(),
                data_type: f.data_type.name().to_string(),
                table: f.table_name.clone(),
                description: f.description.clone(),
            })
            .collect()
    }

    /// Lays positional values out as a row, converting each through its
    /// column's kind.
    pub fn typed_row(&self, values: Vec<Value>, mode: ConversionMode) -> QueryResult<Row> {
        let fields: Vec<FieldRef> = self.schema.values().cloned().collect();
        shape_row(&fields, SourceRow::Positional(values), Some(mode))
    }

    /// Like [`Table::typed_row`] without conversion.
    pub fn row(&self, values: Vec<Value>) -> QueryResult<Row> {
        let fields: Vec<FieldRef> = self.schema.values().cloned().collect();
        shape_row(&fields, SourceRow::Positional(values), None)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("fields", &self.schema.keys().collect::<Vec<_>>())
            .finish()
    }
}
