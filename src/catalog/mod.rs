//! Column descriptors, calculated columns and the registry that names them.

pub mod calculated;
pub mod catalog;
pub mod field;

pub use calculated::{CALCULATION_TABLE, CalculatedField, Computation};
pub use catalog::Catalog;
pub use field::{ColumnKey, Field, FieldDef, FieldRef};
