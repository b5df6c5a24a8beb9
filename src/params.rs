//! Node parameters and their per-item resolution.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::literal::split_columns;

/// Operations the node can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ExecuteQuery,
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ExecuteQuery => "executeQuery",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// Parameter holding the key column for this operation, if any
    pub fn key_parameter(&self) -> Option<&'static str> {
        match self {
            Operation::Update => Some("updateKey"),
            Operation::Delete => Some("deleteKey"),
            _ => None,
        }
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "executeQuery" => Ok(Operation::ExecuteQuery),
            "insert" => Ok(Operation::Insert),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            other => Err(Error::UnsupportedOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-side lookup of node parameters, which may differ per input item
pub trait ParameterSource: Send + Sync {
    fn parameter(&self, name: &str, index: usize) -> Option<String>;
}

impl<F> ParameterSource for F
where
    F: Fn(&str, usize) -> Option<String> + Send + Sync,
{
    fn parameter(&self, name: &str, index: usize) -> Option<String> {
        self(name, index)
    }
}

/// Parameters with the same value for every item
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StaticParameters {
    pub values: HashMap<String, String>,
}

impl StaticParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: &str, value: impl Into<String>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }
}

impl ParameterSource for StaticParameters {
    fn parameter(&self, name: &str, _index: usize) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Key column used when the node leaves `updateKey`/`deleteKey` unset
pub const DEFAULT_KEY: &str = "id";

/// Parameters of one input item, resolved against that item's own index
#[derive(Debug, Clone, PartialEq)]
pub struct ItemContext {
    pub index: usize,
    pub table: String,
    /// Column list exactly as configured, used for grouping
    pub column_string: String,
    pub columns: Vec<String>,
    pub key: Option<String>,
}

impl ItemContext {
    pub fn resolve(source: &dyn ParameterSource, operation: Operation, index: usize) -> Result<Self> {
        let table = source
            .parameter("table", index)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Config(format!("missing table name for item {}", index)))?;
        let column_string = source.parameter("columns", index).unwrap_or_default();
        let columns = split_columns(&column_string);
        let key = operation.key_parameter().map(|name| {
            source
                .parameter(name, index)
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| DEFAULT_KEY.to_string())
        });
        Ok(Self {
            index,
            table,
            column_string,
            columns,
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_names_round_trip() {
        for op in [
            Operation::ExecuteQuery,
            Operation::Insert,
            Operation::Update,
            Operation::Delete,
        ] {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn unknown_operation_is_unsupported() {
        let err = "upsert".parse::<Operation>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(ref op) if op == "upsert"));
        assert_eq!(err.to_string(), "The operation \"upsert\" is not supported!");
    }

    #[test]
    fn context_resolves_per_index() {
        let source = |name: &str, index: usize| match name {
            "table" => Some(format!("t{}", index)),
            "columns" => Some(" a, b ".to_string()),
            _ => None,
        };
        let ctx = ItemContext::resolve(&source, Operation::Update, 3).unwrap();
        assert_eq!(ctx.table, "t3");
        assert_eq!(ctx.columns, vec!["a", "b"]);
        assert_eq!(ctx.key.as_deref(), Some(DEFAULT_KEY));
    }

    #[test]
    fn missing_table_is_an_error() {
        let source = StaticParameters::new();
        assert!(ItemContext::resolve(&source, Operation::Insert, 0).is_err());
    }

    #[test]
    fn insert_has_no_key() {
        let source = StaticParameters::new().with_value("table", "t");
        let ctx = ItemContext::resolve(&source, Operation::Insert, 0).unwrap();
        assert!(ctx.key.is_none());
        assert!(ctx.columns.is_empty());
    }
}
