use common::model::csv::ImportFile;
use common::model::table::Table;
use std::collections::HashMap;

/// Result of checking an upload's header against a table schema.
#[derive(Debug, PartialEq, Eq)]
pub enum Validation {
    /// The header is a permutation of the table's columns. Holds, for each
    /// column in schema order, the position of that column in the file.
    Match(Vec<usize>),
    Mismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

/// Checks that the file's header names exactly the table's columns.
///
/// Names are compared case-sensitively and every column must appear exactly
/// once; column order in the file is free. An empty file never matches.
pub fn validate(table: &Table, file: &ImportFile) -> Validation {
    let mismatch = || Validation::Mismatch {
        expected: table.column_names(),
        actual: file.headers.clone(),
    };

    if file.is_empty() || file.headers.len() != table.columns.len() {
        return mismatch();
    }

    let positions: HashMap<&str, usize> = file
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();
    if positions.len() != file.headers.len() {
        return mismatch();
    }

    let mut column_map = Vec::with_capacity(table.columns.len());
    for column in &table.columns {
        match positions.get(column.name.as_str()) {
            Some(&pos) => column_map.push(pos),
            None => return mismatch(),
        }
    }
    Validation::Match(column_map)
}
