//! Grouping of input items into per-table batches, and chunking of those batches.

use std::collections::HashMap;
use std::hash::Hash;

use crate::params::{ItemContext, DEFAULT_KEY};
use crate::value::Record;

/// Maximum number of records covered by one generated statement
pub const CHUNK_SIZE: usize = 1000;

/// Reserved field carrying an update record's own key column name
pub const UPDATE_KEY_FIELD: &str = "__update_key";

/// Records bound for one table, sharing one column list and key
#[derive(Debug, Clone, PartialEq)]
pub struct TableBatch {
    pub table: String,
    pub columns: Vec<String>,
    pub key: Option<String>,
    /// Projected records, in input order
    pub records: Vec<Record>,
    /// Input index of each record
    pub indices: Vec<usize>,
}

impl TableBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Chunks of records together with their input indices
    pub fn chunks(&self) -> impl Iterator<Item = StatementChunk<'_>> {
        chunks(&self.records)
            .zip(chunks(&self.indices))
            .map(|(records, indices)| StatementChunk { records, indices })
    }
}

/// A bounded slice of a batch, rendered into one statement
#[derive(Debug, Clone, Copy)]
pub struct StatementChunk<'a> {
    pub records: &'a [Record],
    pub indices: &'a [usize],
}

/// Split into consecutive slices of at most [`CHUNK_SIZE`]
pub fn chunks<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(CHUNK_SIZE)
}

/// Group item indices by `key_fn`, keeping groups and members in first-seen order
fn group_by<K, F>(contexts: &[ItemContext], key_fn: F) -> Vec<(K, Vec<usize>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&ItemContext) -> K,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<usize>)> = Vec::new();
    for (pos, ctx) in contexts.iter().enumerate() {
        let key = key_fn(ctx);
        match positions.get(&key) {
            Some(&g) => groups[g].1.push(pos),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, vec![pos]));
            }
        }
    }
    groups
}

fn columns_or_first_record(configured: &[String], items: &[Record], first: usize) -> Vec<String> {
    if configured.is_empty() {
        items[first].keys().map(String::from).collect()
    } else {
        configured.to_vec()
    }
}

/// One batch per (table, column list).
///
/// `contexts[i]` must describe `items[contexts[i].index]`.
pub fn group_for_insert(items: &[Record], contexts: &[ItemContext]) -> Vec<TableBatch> {
    group_by(contexts, |c| (c.table.clone(), c.column_string.clone()))
        .into_iter()
        .map(|((table, _), members)| {
            let first = &contexts[members[0]];
            let columns = columns_or_first_record(&first.columns, items, first.index);
            let indices: Vec<usize> = members.iter().map(|&m| contexts[m].index).collect();
            let records = indices.iter().map(|&i| items[i].project(&columns)).collect();
            TableBatch {
                table,
                columns,
                key: None,
                records,
                indices,
            }
        })
        .collect()
}

/// One batch per (table, column list, update key). The key is always among the columns
/// and each projected record carries its key name under [`UPDATE_KEY_FIELD`].
pub fn group_for_update(items: &[Record], contexts: &[ItemContext]) -> Vec<TableBatch> {
    group_by(contexts, |c| {
        (c.table.clone(), c.column_string.clone(), c.key.clone())
    })
    .into_iter()
    .map(|((table, _, key), members)| {
        let key = key.unwrap_or_else(|| DEFAULT_KEY.to_string());
        let first = &contexts[members[0]];
        let mut columns = columns_or_first_record(&first.columns, items, first.index);
        if !columns.contains(&key) {
            columns.push(key.clone());
        }
        let indices: Vec<usize> = members.iter().map(|&m| contexts[m].index).collect();
        let records = indices
            .iter()
            .map(|&i| {
                let mut record = items[i].project(&columns);
                record.insert(UPDATE_KEY_FIELD, key.as_str());
                record
            })
            .collect();
        TableBatch {
            table,
            columns,
            key: Some(key),
            records,
            indices,
        }
    })
    .collect()
}

/// One batch per (table, delete key); records keep only the key field
pub fn group_for_delete(items: &[Record], contexts: &[ItemContext]) -> Vec<TableBatch> {
    group_by(contexts, |c| (c.table.clone(), c.key.clone()))
        .into_iter()
        .map(|((table, key), members)| {
            let key = key.unwrap_or_else(|| DEFAULT_KEY.to_string());
            let columns = vec![key.clone()];
            let indices: Vec<usize> = members.iter().map(|&m| contexts[m].index).collect();
            let records = indices.iter().map(|&i| items[i].project(&columns)).collect();
            TableBatch {
                table,
                columns,
                key: Some(key),
                records,
                indices,
            }
        })
        .collect()
}
