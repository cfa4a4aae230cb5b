use super::import::process_rows;
use super::upload;
use crate::config::AppConfig;
use crate::error::Result;
use crate::services::blocking;
use crate::storage::{catalog, Store};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::model::csv::ImportFile;
use common::model::report::ImportReport;
use common::model::table::Table;
use log::{info, warn};
use rusqlite::Connection;

/// Evaluates `file` against `table` exactly like an import, without keeping
/// any change.
///
/// Rows go through the same write path as [`super::import::apply`] so
/// constraint violations show up in the report; the transaction is then rolled
/// back. Previews do not take the per-table import lock, but SQLite still
/// makes them wait for a write that is in progress.
pub fn preview(conn: &mut Connection, table: &Table, file: &ImportFile) -> Result<ImportReport> {
    process_rows(conn, table, file, false)
}

/// HTTP handler for `POST /api/tables/{table}/preview`.
///
/// Same statuses as the import: `200 OK` when the header matched, `422` with
/// the rejection report otherwise.
pub(crate) async fn process(
    table: web::Path<String>,
    payload: Multipart,
    store: web::Data<Store>,
    config: web::Data<AppConfig>,
) -> impl Responder {
    let table = table.into_inner();
    match preview_upload(&table, payload, &store, &config).await {
        Ok(report) if report.is_accepted() => HttpResponse::Ok().json(report),
        Ok(report) => HttpResponse::UnprocessableEntity().json(report),
        Err(e) => {
            warn!("preview for {} failed: {}", table, e);
            e.to_response()
        }
    }
}

async fn preview_upload(
    table_name: &str,
    payload: Multipart,
    store: &Store,
    config: &AppConfig,
) -> Result<ImportReport> {
    let upload = upload::read_upload(payload, config.max_upload_bytes).await?;

    let store = store.clone();
    let name = table_name.to_string();
    let report = blocking(move || {
        let mut conn = store.connect()?;
        let table = catalog::get_table(&conn, &name)?;
        let file = upload::parse_import_file(&upload.filename, &upload.bytes)?;
        preview(&mut conn, &table, &file)
    })
    .await?;

    info!(
        "previewed {} for {}: {}",
        report.filename, report.table, report.message
    );
    Ok(report)
}
