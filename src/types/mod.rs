//! Value model: runtime values, declared column kinds, converters and the
//! upcast lattice that lets values of different kinds meet.

pub mod coercion;
pub mod convert;
pub mod datatype;
pub mod value;

pub use coercion::{coalesce_types, upcast_values};
pub use convert::{ConversionMode, Converter};
pub use datatype::DataType;
pub use value::{Kind, Value};
