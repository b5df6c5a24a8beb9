//! Inline SQL literal formatting.
//!
//! Text values are wrapped in single quotes without escaping embedded quotes.
//! This reproduces the output older workflows were written against and is open
//! to injection; [`crate::statement::SqlMode::Parameterized`] avoids it.

use crate::value::{Record, Value};

pub fn format_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Text(s) => format!("'{}'", s),
        Value::Date(d) => format!("'{}'", d.format("%Y-%m-%d %H:%M:%S")),
    }
}

fn field_literal(record: &Record, name: &str) -> String {
    record.get(name).map(format_literal).unwrap_or_else(|| "NULL".to_string())
}

/// Split a comma-separated column list, trimming each name
pub fn split_columns(columns: &str) -> Vec<String> {
    columns
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}

pub fn format_columns(columns: &str) -> String {
    split_columns(columns).join(",")
}

/// `(v1,v2,...)` for one row of an INSERT VALUES clause
pub fn extract_values<S: AsRef<str>>(record: &Record, columns: &[S]) -> String {
    let values: Vec<String> = columns
        .iter()
        .map(|c| field_literal(record, c.as_ref()))
        .collect();
    format!("({})", values.join(","))
}

/// `a = 1,b = 'x'` over every column except the key
pub fn extract_update_set<S: AsRef<str>>(record: &Record, columns: &[S], key: &str) -> String {
    let mut pairs = Vec::with_capacity(columns.len());
    for column in columns {
        let column: &str = column.as_ref();
        if column != key {
            pairs.push(format!("{} = {}", column, field_literal(record, column)));
        }
    }
    pairs.join(",")
}

pub fn extract_update_condition(record: &Record, key: &str) -> String {
    format!("{} = {}", key, field_literal(record, key))
}

/// `(v1,v2,...)` of the key value of every record, for a `WHERE key IN` list
pub fn extract_delete_values(records: &[Record], key: &str) -> String {
    let values: Vec<String> = records.iter().map(|r| field_literal(r, key)).collect();
    format!("({})", values.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn literals_by_type() {
        assert_eq!(format_literal(&Value::Null), "NULL");
        assert_eq!(format_literal(&Value::Integer(-4)), "-4");
        assert_eq!(format_literal(&Value::Real(1.5)), "1.5");
        assert_eq!(format_literal(&Value::Boolean(true)), "true");
        assert_eq!(format_literal(&Value::Text("a".into())), "'a'");
        let d = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(13, 5, 0)
            .unwrap();
        assert_eq!(format_literal(&Value::Date(d)), "'2024-02-29 13:05:00'");
    }

    #[test]
    fn embedded_quote_is_not_escaped() {
        assert_eq!(format_literal(&Value::Text("O'Brien".into())), "'O'Brien'");
    }

    #[test]
    fn columns_are_trimmed_and_rejoined() {
        assert_eq!(format_columns(" id , name,desc "), "id,name,desc");
        assert!(split_columns("").is_empty());
    }

    #[test]
    fn missing_field_is_null() {
        let r = Record::new().with("id", 1);
        assert_eq!(extract_values(&r, &["id", "name"]), "(1,NULL)");
    }

    #[test]
    fn update_set_skips_key() {
        let r = Record::new().with("id", 7).with("name", "n").with("age", 3);
        assert_eq!(extract_update_set(&r, &["name", "age", "id"], "id"), "name = 'n',age = 3");
        assert_eq!(extract_update_condition(&r, "id"), "id = 7");
    }

    #[test]
    fn delete_values_list() {
        let rs = vec![
            Record::new().with("id", 1),
            Record::new().with("id", "b"),
            Record::new(),
        ];
        assert_eq!(extract_delete_values(&rs, "id"), "(1,'b',NULL)");
    }
}
