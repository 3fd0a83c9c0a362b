pub mod config;
pub mod error;

pub mod debugger;

pub mod catalog;
pub mod common;
pub mod exec;
pub mod ir;
pub mod types;

pub use catalog::{CalculatedField, Catalog, ColumnKey, Computation, FieldDef, FieldRef};
pub use config::Config;
pub use error::{QueryError, QueryResult};
pub use exec::aggregate::AggregationMethod;
pub use exec::join::{JoinRelationship, JoinType};
pub use exec::operator::{Row, RowStream};
pub use exec::scan::{MemorySource, Params, RowSource, SourceRow, SourceRows};
pub use exec::sort::SortDirection;
pub use exec::table::{Selection, Table, TableBuilder};
pub use ir::expr::{Expr, ExprBuilder};
pub use types::{ConversionMode, DataType, Value};
