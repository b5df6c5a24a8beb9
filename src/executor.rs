//! Seams to the database: connection lifecycle and statement execution.

use async_trait::async_trait;

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::statement::Statement;
use crate::value::Record;

/// Rows affected as reported by a driver. Some drivers report one count per
/// statement contained in a single submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowsAffected {
    Count(u64),
    PerStatement(Vec<u64>),
}

impl RowsAffected {
    pub fn total(&self) -> u64 {
        match self {
            RowsAffected::Count(n) => *n,
            RowsAffected::PerStatement(counts) => counts.iter().sum(),
        }
    }
}

impl Default for RowsAffected {
    fn default() -> Self {
        RowsAffected::Count(0)
    }
}

/// What a single statement submission returned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionOutcome {
    pub recordsets: Vec<Vec<Record>>,
    pub rows_affected: RowsAffected,
}

impl ExecutionOutcome {
    pub fn rows(rows: Vec<Record>) -> Self {
        Self {
            recordsets: vec![rows],
            rows_affected: RowsAffected::Count(0),
        }
    }

    pub fn affected(count: u64) -> Self {
        Self {
            recordsets: Vec::new(),
            rows_affected: RowsAffected::Count(count),
        }
    }

    /// All result rows: the flattened recordsets when there are several, else the first
    pub fn into_rows(self) -> Vec<Record> {
        let mut sets = self.recordsets;
        if sets.len() > 1 {
            sets.into_iter().flatten().collect()
        } else {
            sets.pop().unwrap_or_default()
        }
    }
}

/// An open database connection or pool
#[async_trait]
pub trait Connection: Send + Sync {
    async fn execute(&self, statement: &Statement) -> Result<ExecutionOutcome>;

    async fn close(&self) -> Result<()>;
}

/// Opens connections from configuration
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>>;
}
