use super::upload::{self, Upload};
use super::verify::{self, Validation};
use crate::config::AppConfig;
use crate::error::Result;
use crate::services::blocking;
use crate::storage::{audit, catalog, rows, Store};
use crate::table_locks::state::TableLocks;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::model::csv::{ImportFile, ImportRecord};
use common::model::report::{ImportReport, RowOutcome, RowReport};
use common::model::row::Value;
use common::model::table::Table;
use log::{debug, error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Turns one CSV record into typed column values.
///
/// `column_map` comes from a matching [`Validation`]: for each column in schema
/// order, the position of its field in the record. Returns the raw fields for
/// the report alongside the parse result.
fn evaluate_record(
    table: &Table,
    column_map: &[usize],
    record: &ImportRecord,
) -> (Vec<String>, std::result::Result<Vec<Value>, String>) {
    let fields = match record {
        ImportRecord::Fields(fields) => fields,
        ImportRecord::Unreadable(reason) => return (Vec::new(), Err(reason.clone())),
    };

    if fields.len() != table.columns.len() {
        let reason = format!(
            "expected {} fields, found {}",
            table.columns.len(),
            fields.len()
        );
        return (fields.clone(), Err(reason));
    }

    let values = table
        .columns
        .iter()
        .zip(column_map)
        .map(|(column, &pos)| column.parse_value(&fields[pos]))
        .collect();
    (fields.clone(), values)
}

/// Inserts the row, or updates it when a row with the same identifier exists.
///
/// Tables without a single-column primary key have no identifier in the file,
/// so a row identical to a stored one is left alone instead of duplicated.
fn upsert(conn: &Connection, table: &Table, values: &[Value]) -> Result<()> {
    if table.primary_key.is_none() {
        if !rows::row_matches(conn, table, values)? {
            rows::insert_row(conn, table, values)?;
        }
        return Ok(());
    }

    let id = table
        .primary_key_index()
        .map(|idx| &values[idx])
        .filter(|id| !id.is_null());
    match id {
        Some(id) if rows::row_exists(conn, table, id)? => {
            rows::update_row(conn, table, id, values)?;
        }
        _ => {
            rows::insert_row(conn, table, values)?;
        }
    }
    Ok(())
}

/// Writes one row inside its own savepoint.
///
/// The outer `Result` carries storage failures that must abort the batch; the
/// inner one carries a constraint violation that only fails this row.
fn write_row(
    tx: &mut Transaction<'_>,
    table: &Table,
    values: &[Value],
) -> Result<std::result::Result<(), String>> {
    let sp = tx.savepoint()?;
    match upsert(&sp, table, values) {
        Ok(()) => {
            sp.commit()?;
            Ok(Ok(()))
        }
        Err(err) => match rows::constraint_violation(&err) {
            // Dropping the savepoint rolls back this row only.
            Some(reason) => Ok(Err(reason)),
            None => Err(err),
        },
    }
}

/// Validates `file` against `table` and commits every row that can be written.
///
/// A header mismatch returns a rejection report without touching storage. Row
/// failures are recorded and processing continues with the next row. Any other
/// storage error rolls back the whole import and is returned as an error.
pub fn apply(conn: &mut Connection, table: &Table, file: &ImportFile) -> Result<ImportReport> {
    process_rows(conn, table, file, true)
}

/// Runs every row of `file` through the write path inside one transaction.
///
/// The transaction is committed only when `commit` is set; otherwise it is
/// rolled back after the last row, leaving the table as it was.
pub(super) fn process_rows(
    conn: &mut Connection,
    table: &Table,
    file: &ImportFile,
    commit: bool,
) -> Result<ImportReport> {
    let column_map = match verify::validate(table, file) {
        Validation::Match(column_map) => column_map,
        Validation::Mismatch { expected, actual } => {
            return Ok(ImportReport::schema_mismatch(
                &table.name,
                &file.filename,
                expected,
                actual,
            ));
        }
    };

    let mut tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut reports = Vec::with_capacity(file.records.len());

    for (i, record) in file.records.iter().enumerate() {
        let (fields, parsed) = evaluate_record(table, &column_map, record);
        let outcome = match parsed {
            Ok(values) => match write_row(&mut tx, table, &values)? {
                Ok(()) => RowOutcome::Done,
                Err(reason) => RowOutcome::Failed(reason),
            },
            Err(reason) => RowOutcome::Failed(reason),
        };
        if let RowOutcome::Failed(reason) = &outcome {
            debug!("{}: row {} failed: {}", file.filename, i + 1, reason);
        }
        reports.push(RowReport {
            row_index: i + 1,
            values: fields,
            outcome,
        });
    }

    if commit {
        tx.commit()?;
    } else {
        tx.rollback()?;
    }
    Ok(ImportReport::accepted(&table.name, &file.filename, reports, commit))
}

/// HTTP handler for `POST /api/tables/{table}/import`.
///
/// - `200 OK` with the `ImportReport` when the header matched, whatever the
///   individual row outcomes.
/// - `422 Unprocessable Entity` with the rejection report on a column mismatch.
/// - The error status of [`crate::error::AdminError`] otherwise.
pub(crate) async fn process(
    table: web::Path<String>,
    payload: Multipart,
    store: web::Data<Store>,
    locks: web::Data<TableLocks>,
    config: web::Data<AppConfig>,
) -> impl Responder {
    let table = table.into_inner();
    match import_upload(&table, payload, &store, &locks, &config).await {
        Ok(report) if report.is_accepted() => HttpResponse::Ok().json(report),
        Ok(report) => HttpResponse::UnprocessableEntity().json(report),
        Err(e) => {
            error!("import into {} failed: {}", table, e);
            e.to_response()
        }
    }
}

async fn import_upload(
    table_name: &str,
    payload: Multipart,
    store: &Store,
    locks: &TableLocks,
    config: &AppConfig,
) -> Result<ImportReport> {
    let upload = upload::read_upload(payload, config.max_upload_bytes).await?;

    // Only known tables get a lock entry.
    let table = {
        let store = store.clone();
        let name = table_name.to_string();
        blocking(move || {
            let conn = store.connect()?;
            catalog::get_table(&conn, &name)
        })
        .await?
    };

    if locks.is_locked(&table.name).await {
        info!("import into {} is waiting for a running import", table.name);
    }
    let _guard = locks.acquire(&table.name).await;

    let store = store.clone();
    let report = blocking(move || import_blocking(&store, &table, &upload)).await?;

    if report.is_accepted() {
        info!(
            "imported {} into {}: {} done, {} failed",
            report.filename,
            report.table,
            report.done_count(),
            report.failed_count()
        );
    } else {
        warn!("rejected {} for {}: {}", report.filename, report.table, report.message);
    }
    Ok(report)
}

fn import_blocking(store: &Store, table: &Table, upload: &Upload) -> Result<ImportReport> {
    let mut conn = store.connect()?;
    let file = upload::parse_import_file(&upload.filename, &upload.bytes)?;
    let report = apply(&mut conn, table, &file)?;

    if let Err(e) = audit::record_import(&conn, &report, &upload.md5) {
        warn!("could not audit import of {}: {}", upload.filename, e);
    }
    Ok(report)
}
