use crate::error::Result;
use common::model::report::{ImportOutcome, ImportReport};
use rusqlite::{params, Connection};

/// Appends one audit record for an import request, accepted or rejected, and
/// returns its id.
///
/// `md5` is the hex digest of the uploaded bytes, so a later reader can tell
/// whether the same file was imported twice.
pub fn record_import(conn: &Connection, report: &ImportReport, md5: &str) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    let outcome = match report.outcome {
        ImportOutcome::Accepted => "accepted",
        ImportOutcome::SchemaMismatch { .. } => "schema_mismatch",
    };
    conn.execute(
        "INSERT INTO import_audit (id, table_name, filename, md5, outcome, done_rows, failed_rows)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            report.table,
            report.filename,
            md5,
            outcome,
            report.done_count() as i64,
            report.failed_count() as i64
        ],
    )?;
    Ok(id)
}
