//! SQL statement construction for insert, update and delete batches.

use crate::batch::CHUNK_SIZE;
use crate::error::{Error, Result};
use crate::literal::{
    extract_delete_values, extract_update_condition, extract_update_set, extract_values,
};
use crate::value::{Record, Value};

/// How values are placed into generated SQL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SqlMode {
    /// `?` placeholders with values carried alongside the statement
    #[default]
    Parameterized,
    /// Values formatted inline as literals, byte-for-byte what legacy workflows produced
    Legacy,
}

/// SQL text plus positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }
}

/// Most parameters one statement may bind (SQLite's compiled-in default)
pub const MAX_BIND_PARAMS: usize = 32766;

/// Rows one INSERT of `column_count` columns may carry.
///
/// Legacy statements always take a whole chunk; parameterized ones are capped so
/// that `rows * column_count` stays within [`MAX_BIND_PARAMS`].
pub fn rows_per_insert(column_count: usize, mode: SqlMode) -> usize {
    match mode {
        SqlMode::Legacy => CHUNK_SIZE,
        SqlMode::Parameterized => (MAX_BIND_PARAMS / column_count.max(1)).clamp(1, CHUNK_SIZE),
    }
}

fn field(record: &Record, name: &str) -> Value {
    record.get(name).cloned().unwrap_or(Value::Null)
}

fn placeholders(n: usize) -> String {
    format!("({})", vec!["?"; n].join(","))
}

/// One multi-row INSERT for a chunk of records
pub fn build_insert(table: &str, columns: &[String], records: &[Record], mode: SqlMode) -> Statement {
    let column_list = columns.join(",");
    match mode {
        SqlMode::Legacy => {
            let values: Vec<String> = records.iter().map(|r| extract_values(r, columns)).collect();
            Statement::new(format!(
                "INSERT INTO {}({}) VALUES {};",
                table,
                column_list,
                values.join(",")
            ))
        }
        SqlMode::Parameterized => {
            let row = placeholders(columns.len());
            let rows = vec![row.as_str(); records.len()].join(",");
            let params = records
                .iter()
                .flat_map(|r| columns.iter().map(move |c| field(r, c)))
                .collect();
            Statement::new(format!("INSERT INTO {}({}) VALUES {};", table, column_list, rows))
                .with_params(params)
        }
    }
}

/// One UPDATE for a single record, targeting rows by `key`
pub fn build_update(
    table: &str,
    columns: &[String],
    key: &str,
    record: &Record,
    mode: SqlMode,
) -> Result<Statement> {
    let set_columns: Vec<&String> = columns.iter().filter(|c| c.as_str() != key).collect();
    if set_columns.is_empty() {
        return Err(Error::Config(format!(
            "no columns to update in table {} besides key {}",
            table, key
        )));
    }
    let statement = match mode {
        SqlMode::Legacy => Statement::new(format!(
            "UPDATE {} SET {} WHERE {};",
            table,
            extract_update_set(record, columns, key),
            extract_update_condition(record, key)
        )),
        SqlMode::Parameterized => {
            let set: Vec<String> = set_columns.iter().map(|c| format!("{} = ?", c)).collect();
            let mut params: Vec<Value> = set_columns.iter().map(|c| field(record, c)).collect();
            params.push(field(record, key));
            Statement::new(format!("UPDATE {} SET {} WHERE {} = ?;", table, set.join(","), key))
                .with_params(params)
        }
    };
    Ok(statement)
}

/// One DELETE covering a chunk of records through an `IN` list
pub fn build_delete(table: &str, key: &str, records: &[Record], mode: SqlMode) -> Statement {
    match mode {
        SqlMode::Legacy => Statement::new(format!(
            "DELETE FROM {} WHERE \"{}\" IN {};",
            table,
            key,
            extract_delete_values(records, key)
        )),
        SqlMode::Parameterized => Statement::new(format!(
            "DELETE FROM {} WHERE \"{}\" IN {};",
            table,
            key,
            placeholders(records.len())
        ))
        .with_params(records.iter().map(|r| field(r, key)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn two_rows() -> Vec<Record> {
        vec![
            Record::new().with("id", 1).with("name", "a"),
            Record::new().with("id", 2).with("name", "b"),
        ]
    }

    #[test]
    fn legacy_insert_matches_reference_text() {
        let s = build_insert("t", &cols(&["id", "name"]), &two_rows(), SqlMode::Legacy);
        assert_eq!(s.sql, "INSERT INTO t(id,name) VALUES (1,'a'),(2,'b');");
        assert!(s.params.is_empty());
    }

    #[test]
    fn parameterized_insert_carries_values_in_order() {
        let s = build_insert("t", &cols(&["id", "name"]), &two_rows(), SqlMode::Parameterized);
        assert_eq!(s.sql, "INSERT INTO t(id,name) VALUES (?,?),(?,?);");
        assert_eq!(
            s.params,
            vec![Value::Integer(1), "a".into(), Value::Integer(2), "b".into()]
        );
    }

    #[test]
    fn parameterized_rows_respect_bind_limit() {
        assert_eq!(rows_per_insert(2, SqlMode::Parameterized), CHUNK_SIZE);
        assert_eq!(rows_per_insert(32, SqlMode::Parameterized), CHUNK_SIZE);
        assert_eq!(rows_per_insert(33, SqlMode::Parameterized), 992);
        assert_eq!(rows_per_insert(40_000, SqlMode::Parameterized), 1);
        assert_eq!(rows_per_insert(33, SqlMode::Legacy), CHUNK_SIZE);
        assert_eq!(rows_per_insert(0, SqlMode::Parameterized), CHUNK_SIZE);
    }

    #[test]
    fn update_excludes_key_from_set() {
        let r = Record::new().with("id", 5).with("name", "x");
        let s = build_update("t", &cols(&["name", "id"]), "id", &r, SqlMode::Legacy).unwrap();
        assert_eq!(s.sql, "UPDATE t SET name = 'x' WHERE id = 5;");

        let p = build_update("t", &cols(&["name", "id"]), "id", &r, SqlMode::Parameterized).unwrap();
        assert_eq!(p.sql, "UPDATE t SET name = ? WHERE id = ?;");
        assert_eq!(p.params, vec![Value::from("x"), Value::Integer(5)]);
    }

    #[test]
    fn update_with_only_key_is_rejected() {
        let r = Record::new().with("id", 5);
        assert!(build_update("t", &cols(&["id"]), "id", &r, SqlMode::Legacy).is_err());
    }

    #[test]
    fn delete_uses_single_in_list() {
        let s = build_delete("t", "id", &two_rows(), SqlMode::Legacy);
        assert_eq!(s.sql, "DELETE FROM t WHERE \"id\" IN (1,2);");

        let p = build_delete("t", "id", &two_rows(), SqlMode::Parameterized);
        assert_eq!(p.sql, "DELETE FROM t WHERE \"id\" IN (?,?);");
        assert_eq!(p.params.len(), 2);
    }

    #[test]
    fn null_values_render_as_null() {
        let rows = vec![Record::new().with("id", 1).with("name", Value::Null)];
        let s = build_insert("t", &cols(&["id", "name"]), &rows, SqlMode::Legacy);
        assert_eq!(s.sql, "INSERT INTO t(id,name) VALUES (1,NULL);");
    }
}
