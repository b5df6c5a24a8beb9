//! Bundled SQLite backend for the connection seams, built on rusqlite.

use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::params_from_iter;

use crate::client::{self, ClientInitializer};
use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::executor::{Connection, Connector, ExecutionOutcome};
use crate::statement::Statement;
use crate::value::{Record, Value};

const MEMORY: &str = ":memory:";

/// Opens SQLite databases; `database` in the configuration is the file path.
///
/// `requestTimeout` becomes the busy timeout. `connectTimeout` is not used, since
/// opening a database file does not wait on a server.
#[derive(Debug)]
pub struct SqliteConnector {
    initializer: &'static ClientInitializer,
}

impl SqliteConnector {
    pub fn new() -> Self {
        Self {
            initializer: client::global(),
        }
    }
}

impl Default for SqliteConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
        self.initializer.ensure(&config.client_library, |_| {
            tracing::debug!(version = rusqlite::version(), "using bundled sqlite");
            Ok(())
        })?;

        let conn = if config.database.is_empty() || config.database == MEMORY {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&config.database)
        }
        .map_err(|e| Error::Connection(e.to_string()))?;
        conn.busy_timeout(config.request_timeout())
            .map_err(|e| Error::Connection(e.to_string()))?;

        tracing::debug!(database = %config.database, "sqlite connection opened");
        Ok(Box::new(SqliteConnection::from_connection(conn)))
    }
}

/// A single rusqlite connection. Concurrent statements are serialized.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: Mutex<Option<rusqlite::Connection>>,
}

impl SqliteConnection {
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
        }
    }

    fn run(&self, statement: &Statement) -> Result<ExecutionOutcome> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| Error::Connection("connection lock poisoned".to_string()))?;
        let conn = guard
            .as_ref()
            .ok_or_else(|| Error::Connection("connection is closed".to_string()))?;

        let mut stmt = conn.prepare(&statement.sql)?;
        let params = params_from_iter(statement.params.iter().map(to_sql_value));
        if stmt.column_count() > 0 {
            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let rows = stmt
                .query_map(params, |row| {
                    let mut record = Record::new();
                    for (i, name) in names.iter().enumerate() {
                        record.insert(name, from_sql_value(row.get_ref(i)?));
                    }
                    Ok(record)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ExecutionOutcome::rows(rows))
        } else {
            let affected = stmt.execute(params)?;
            Ok(ExecutionOutcome::affected(affected as u64))
        }
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn execute(&self, statement: &Statement) -> Result<ExecutionOutcome> {
        self.run(statement)
    }

    async fn close(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| Error::Connection("connection lock poisoned".to_string()))?
            .take()
            .ok_or_else(|| Error::Connection("connection already closed".to_string()))?;
        conn.close().map_err(|(_, e)| Error::Sqlite(e))
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Boolean(b) => SqlValue::Integer(*b as i64),
        Value::Date(d) => SqlValue::Text(d.format("%Y-%m-%d %H:%M:%S").to_string()),
    }
}

fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> SqliteConnection {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, active INTEGER);",
        )
        .unwrap();
        SqliteConnection::from_connection(conn)
    }

    #[tokio::test]
    async fn statements_without_columns_report_rows_affected() {
        let conn = users();
        let insert = Statement::new("INSERT INTO users(id,name,active) VALUES (?,?,?),(?,?,?);")
            .with_params(vec![
                1.into(),
                "a".into(),
                true.into(),
                2.into(),
                "b".into(),
                false.into(),
            ]);
        let outcome = conn.execute(&insert).await.unwrap();
        assert_eq!(outcome.rows_affected.total(), 2);

        let rows = conn
            .execute(&Statement::new("SELECT id, name, active FROM users ORDER BY id"))
            .await
            .unwrap()
            .into_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some(&Value::Text("a".into())));
        assert_eq!(rows[0].get("active"), Some(&Value::Integer(1)));
    }

    #[tokio::test]
    async fn close_twice_fails() {
        let conn = users();
        conn.close().await.unwrap();
        assert!(conn.close().await.is_err());
        assert!(conn.execute(&Statement::new("SELECT 1")).await.is_err());
    }

    #[tokio::test]
    async fn sql_errors_surface() {
        let conn = users();
        let err = conn
            .execute(&Statement::new("SELECT * FROM missing"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
