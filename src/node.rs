//! The SQL node: runs one operation over a set of workflow items.
//!
//! One connection is opened per invocation and closed exactly once before
//! returning, whether the operation succeeds, fails, or falls back to
//! passing the input through.

use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value as JsonValue;

use crate::batch::{
    group_for_delete, group_for_insert, group_for_update, TableBatch, UPDATE_KEY_FIELD,
};
use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::executor::{Connection, Connector, ExecutionOutcome};
use crate::params::{ItemContext, Operation, ParameterSource};
use crate::statement::{
    build_delete, build_insert, build_update, rows_per_insert, SqlMode, Statement,
};
use crate::value::Record;

/// Operation used when the `operation` parameter is absent
pub const DEFAULT_OPERATION: Operation = Operation::Insert;

/// A statement bound for one table, with the input items it was built from
#[derive(Debug, Clone)]
struct Job {
    table: String,
    indices: Vec<usize>,
    statement: Statement,
}

/// Outcome of one dispatched statement
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub table: String,
    pub indices: Vec<usize>,
    pub outcome: ExecutionOutcome,
}

/// What an invocation hands back to the host
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutput {
    /// Input items passed through unchanged
    Items(Vec<Record>),
    /// Rows returned by a raw query
    Rows(Vec<Record>),
    /// Total rows deleted
    RowsAffected(u64),
}

/// One output item as the host expects it, paired with the input item it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionItem {
    pub json: JsonValue,
    pub paired_item: usize,
}

impl NodeOutput {
    pub fn into_execution_data(self) -> Vec<ExecutionItem> {
        let json: Vec<JsonValue> = match self {
            NodeOutput::Items(records) | NodeOutput::Rows(records) => {
                records.iter().map(Record::to_json).collect()
            }
            NodeOutput::RowsAffected(n) => vec![JsonValue::from(n)],
        };
        json.into_iter()
            .map(|json| ExecutionItem {
                json,
                paired_item: 0,
            })
            .collect()
    }
}

pub struct SqlNode {
    connector: Arc<dyn Connector>,
    config: ConnectionConfig,
    mode: SqlMode,
    continue_on_fail: bool,
}

impl SqlNode {
    pub fn new(connector: Arc<dyn Connector>, config: ConnectionConfig) -> Self {
        Self {
            connector,
            config,
            mode: SqlMode::default(),
            continue_on_fail: false,
        }
    }

    pub fn with_sql_mode(mut self, mode: SqlMode) -> Self {
        self.mode = mode;
        self
    }

    /// Return the input items instead of failing when a statement fails
    pub fn with_continue_on_fail(mut self, continue_on_fail: bool) -> Self {
        self.continue_on_fail = continue_on_fail;
        self
    }

    pub async fn execute(
        &self,
        items: &[Record],
        params: &dyn ParameterSource,
    ) -> Result<NodeOutput> {
        let conn = self.connector.connect(&self.config).await?;

        let outcome = match params.parameter("operation", 0) {
            Some(name) => match name.parse::<Operation>() {
                Ok(op) => self.run(conn.as_ref(), op, items, params).await,
                Err(e) => Err(e),
            },
            None => self.run(conn.as_ref(), DEFAULT_OPERATION, items, params).await,
        };

        let closed = conn.close().await;
        match outcome {
            Ok(output) => closed.map(|_| output),
            Err(e) => {
                if let Err(close_err) = closed {
                    tracing::warn!(error = %close_err, "failed to close connection");
                }
                match e {
                    Error::UnsupportedOperation(_) | Error::Connection(_) => Err(e),
                    e if self.continue_on_fail => {
                        tracing::warn!(error = %e, "operation failed, passing input through");
                        Ok(NodeOutput::Items(items.to_vec()))
                    }
                    e => Err(e),
                }
            }
        }
    }

    async fn run(
        &self,
        conn: &dyn Connection,
        operation: Operation,
        items: &[Record],
        params: &dyn ParameterSource,
    ) -> Result<NodeOutput> {
        tracing::info!(%operation, items = items.len(), "executing sql operation");
        match operation {
            Operation::ExecuteQuery => {
                let query = params
                    .parameter("query", 0)
                    .filter(|q| !q.trim().is_empty())
                    .ok_or_else(|| Error::Config("missing query".to_string()))?;
                let outcome = conn.execute(&Statement::new(query)).await?;
                Ok(NodeOutput::Rows(outcome.into_rows()))
            }
            Operation::Insert => {
                let contexts = resolve_contexts(params, operation, items.len())?;
                let jobs = self.insert_jobs(&group_for_insert(items, &contexts));
                dispatch(conn, jobs).await?;
                Ok(NodeOutput::Items(items.to_vec()))
            }
            Operation::Update => {
                let contexts = resolve_contexts(params, operation, items.len())?;
                let jobs = self.update_jobs(&group_for_update(items, &contexts))?;
                dispatch(conn, jobs).await?;
                Ok(NodeOutput::Items(items.to_vec()))
            }
            Operation::Delete => {
                let contexts = resolve_contexts(params, operation, items.len())?;
                let jobs = self.delete_jobs(&group_for_delete(items, &contexts));
                let results = dispatch(conn, jobs).await?;
                Ok(NodeOutput::RowsAffected(total_rows_affected(&results)))
            }
        }
    }

    fn insert_jobs(&self, batches: &[TableBatch]) -> Vec<Job> {
        batches
            .iter()
            .flat_map(|batch| {
                let rows = rows_per_insert(batch.columns.len(), self.mode);
                batch.chunks().flat_map(move |chunk| {
                    chunk
                        .records
                        .chunks(rows)
                        .zip(chunk.indices.chunks(rows))
                        .map(move |(records, indices)| Job {
                            table: batch.table.clone(),
                            indices: indices.to_vec(),
                            statement: build_insert(&batch.table, &batch.columns, records, self.mode),
                        })
                })
            })
            .collect()
    }

    fn update_jobs(&self, batches: &[TableBatch]) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();
        for batch in batches {
            for chunk in batch.chunks() {
                for (record, &index) in chunk.records.iter().zip(chunk.indices) {
                    let key = record
                        .get(UPDATE_KEY_FIELD)
                        .and_then(|k| k.as_str())
                        .or(batch.key.as_deref())
                        .ok_or_else(|| Error::Config(format!("missing update key for item {}", index)))?;
                    let statement = build_update(&batch.table, &batch.columns, key, record, self.mode)?;
                    jobs.push(Job {
                        table: batch.table.clone(),
                        indices: vec![index],
                        statement,
                    });
                }
            }
        }
        Ok(jobs)
    }

    fn delete_jobs(&self, batches: &[TableBatch]) -> Vec<Job> {
        batches
            .iter()
            .flat_map(|batch| {
                let key = batch.key.as_deref().unwrap_or_default();
                batch.chunks().map(move |chunk| Job {
                    table: batch.table.clone(),
                    indices: chunk.indices.to_vec(),
                    statement: build_delete(&batch.table, key, chunk.records, self.mode),
                })
            })
            .collect()
    }
}

fn resolve_contexts(
    params: &dyn ParameterSource,
    operation: Operation,
    count: usize,
) -> Result<Vec<ItemContext>> {
    (0..count)
        .map(|index| ItemContext::resolve(params, operation, index))
        .collect()
}

/// Submit every job concurrently; the first failure fails the whole set
async fn dispatch(conn: &dyn Connection, jobs: Vec<Job>) -> Result<Vec<ExecutionResult>> {
    let pending = jobs.into_iter().map(|job| async move {
        tracing::debug!(table = %job.table, sql = %job.statement.sql, "dispatching statement");
        let outcome = conn.execute(&job.statement).await?;
        Ok::<_, Error>(ExecutionResult {
            table: job.table,
            indices: job.indices,
            outcome,
        })
    });
    try_join_all(pending).await
}

pub fn total_rows_affected(results: &[ExecutionResult]) -> u64 {
    results.iter().map(|r| r.outcome.rows_affected.total()).sum()
}
