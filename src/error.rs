use std::fmt;

use crate::types::value::Value;

pub type QueryResult<T> = Result<T, QueryError>;

/// The class of name that failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    CalculatedField,
    Field,
    DataType,
    AggregationMethod,
    SortDirection,
    JoinRelationship,
    JoinType,
    DebugLevel,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IdentifierKind::CalculatedField => "calculated field",
            IdentifierKind::Field => "field",
            IdentifierKind::DataType => "data type",
            IdentifierKind::AggregationMethod => "aggregation method",
            IdentifierKind::SortDirection => "sort direction",
            IdentifierKind::JoinRelationship => "join relationship",
            IdentifierKind::JoinType => "join type",
            IdentifierKind::DebugLevel => "debug level",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum QueryError {
    // ----------------------------
    // Value conversion
    // ----------------------------
    Conversion {
        value: Value,
        target: &'static str,
    },

    // ----------------------------
    // Operator evaluation
    // ----------------------------
    IncompatibleOperands {
        op: &'static str,
        left: Value,
        right: Option<Value>,
    },

    // ----------------------------
    // Name resolution
    // ----------------------------
    UnknownIdentifier {
        kind: IdentifierKind,
        name: String,
    },

    // ----------------------------
    // Table / pipeline configuration
    // ----------------------------
    SchemaMismatch {
        reason: String,
    },

    Inference {
        subject: String,
        reason: String,
    },

    // ----------------------------
    // External row source passthrough
    // ----------------------------
    Source(anyhow::Error),
}

impl QueryError {
    pub fn conversion(value: &Value, target: &'static str) -> Self {
        QueryError::Conversion {
            value: value.clone(),
            target,
        }
    }

    pub fn incompatible(op: &'static str, left: &Value, right: Option<&Value>) -> Self {
        QueryError::IncompatibleOperands {
            op,
            left: left.clone(),
            right: right.cloned(),
        }
    }

    pub fn unknown(kind: IdentifierKind, name: impl Into<String>) -> Self {
        QueryError::UnknownIdentifier {
            kind,
            name: name.into(),
        }
    }

    pub fn schema(reason: impl Into<String>) -> Self {
        QueryError::SchemaMismatch {
            reason: reason.into(),
        }
    }
}

impl From<anyhow::Error> for QueryError {
    fn from(err: anyhow::Error) -> Self {
        QueryError::Source(err)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Conversion { value, target } => {
                write!(f, "the value {:?} could not be converted to {}", value, target)
            }
            QueryError::IncompatibleOperands {
                op,
                left,
                right: Some(right),
            } => write!(f, "cannot apply '{}' to {:?} and {:?}", op, left, right),
            QueryError::IncompatibleOperands {
                op,
                left,
                right: None,
            } => write!(f, "cannot apply '{}' to {:?}", op, left),
            QueryError::UnknownIdentifier { kind, name } => {
                write!(f, "there is no {} named {:?}", kind, name)
            }
            QueryError::SchemaMismatch { reason } => write!(f, "schema mismatch: {}", reason),
            QueryError::Inference { subject, reason } => {
                write!(f, "cannot infer the data type of {:?}: {}", subject, reason)
            }
            QueryError::Source(err) => write!(f, "row source error: {}", err),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Source(err) => Some(&**err),
            _ => None,
        }
    }
}
