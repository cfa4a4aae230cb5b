use crate::error::{AdminError, Result};
use crate::services::blocking;
use crate::storage::{catalog, rows, Store};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Responder};
use common::model::table::Table;
use csv::Writer;
use log::info;
use mime_guess::from_path;
use rusqlite::{Connection, TransactionBehavior};

/// A serialized table ready to be downloaded.
#[derive(Debug)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub row_count: usize,
}

/// Serializes every row of `table` to CSV.
///
/// The header lists the columns in schema order and rows follow in identifier
/// order. All rows are read inside one transaction, so a concurrent import
/// never shows up half-applied in the file.
pub fn export(conn: &mut Connection, table: &Table) -> Result<ExportFile> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
    let rows = rows::get_rows(&tx, table)?;
    tx.commit()?;

    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(table.column_names())?;
    for row in &rows {
        writer.write_record(row.to_fields())?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AdminError::Io(std::io::Error::other(e.to_string())))?;

    Ok(ExportFile {
        filename: format!("{}.csv", table.name),
        bytes,
        row_count: rows.len(),
    })
}

/// HTTP handler for `GET /api/tables/{table}/export`.
///
/// Responds with the CSV as an attachment named `<table>.csv`.
pub(crate) async fn process(table: web::Path<String>, store: web::Data<Store>) -> impl Responder {
    match export_table(store.get_ref().clone(), table.into_inner()).await {
        Ok(file) => {
            let mime = from_path(&file.filename).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime.as_ref())
                .insert_header(ContentDisposition {
                    disposition: DispositionType::Attachment,
                    parameters: vec![DispositionParam::Filename(file.filename)],
                })
                .body(file.bytes)
        }
        Err(e) => e.to_response(),
    }
}

async fn export_table(store: Store, table_name: String) -> Result<ExportFile> {
    let file = blocking(move || {
        let mut conn = store.connect()?;
        let table = catalog::get_table(&conn, &table_name)?;
        export(&mut conn, &table)
    })
    .await?;
    info!("exported {} ({} rows)", file.filename, file.row_count);
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::super::import::apply;
    use super::super::upload::parse_import_file;
    use super::*;
    use crate::storage::test_support::temp_store;
    use common::model::report::RowOutcome;
    use common::model::row::Value;

    #[test]
    fn writes_header_and_rows_in_identifier_order() {
        let (_dir, store) = temp_store();
        let mut conn = store.connect().unwrap();
        let modes = catalog::get_table(&conn, "modes").unwrap();

        let file = export(&mut conn, &modes).unwrap();
        assert_eq!(file.filename, "modes.csv");
        assert_eq!(file.row_count, 5);
        let text = String::from_utf8(file.bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,name,description");
        assert_eq!(lines[1], "1,1. Full Cycle,");
        assert_eq!(lines[5], "5,5. SRS,");
    }

    #[test]
    fn fields_with_commas_and_quotes_are_quoted() {
        let (_dir, store) = temp_store();
        let mut conn = store.connect().unwrap();
        conn.execute(
            "UPDATE modes SET description = ?1 WHERE id = 1",
            ["Review, then \"test\""],
        )
        .unwrap();
        let modes = catalog::get_table(&conn, "modes").unwrap();

        let text = String::from_utf8(export(&mut conn, &modes).unwrap().bytes).unwrap();
        assert!(text.contains("1,1. Full Cycle,\"Review, then \"\"test\"\"\""));
    }

    #[test]
    fn every_table_round_trips() {
        let (_dir, store) = temp_store();
        let mut conn = store.connect().unwrap();
        conn.execute_batch(
            "INSERT INTO users (id, name, email, password) VALUES (1, 'Adhil', 'adhil@bisquared.com', 'Abcd1234');
             INSERT INTO hafizs (id, name, daily_capacity, user_id) VALUES (1, 'Siraj', 1.5, 1);
             INSERT INTO revisions (id, hafiz_id, page, revision_date, rating, mode_id)
                 VALUES (1, 1, 56, '2024-05-01', -1, 1);
             UPDATE modes SET description = 'multi
line' WHERE id = 2;
             CREATE TABLE juz_notes (juz INTEGER, note TEXT);
             INSERT INTO juz_notes VALUES (1, 'start'), (2, NULL), (2, NULL);",
        )
        .unwrap();

        for table in catalog::list_tables(&conn).unwrap() {
            let before = rows::get_rows(&conn, &table).unwrap();
            let exported = export(&mut conn, &table).unwrap();
            let file = parse_import_file(&exported.filename, &exported.bytes).unwrap();

            let report = apply(&mut conn, &table, &file).unwrap();
            assert!(report.is_accepted(), "{} was rejected", table.name);
            assert!(
                report.rows.iter().all(|r| r.outcome == RowOutcome::Done),
                "{} had failed rows",
                table.name
            );
            assert_eq!(rows::get_rows(&conn, &table).unwrap(), before);
        }

        let hafizs = catalog::get_table(&conn, "hafizs").unwrap();
        assert_eq!(
            rows::get_rows(&conn, &hafizs).unwrap()[0].values[2],
            Value::Real(1.5)
        );
    }
}
