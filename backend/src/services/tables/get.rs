//! # Table Retrieval Service
//!
//! Backs `GET /api/tables/{table}`: the schema of one table plus all of its
//! rows in identifier order, the data the admin UI renders as its row grid.
//! Unknown names, and the internal audit table, answer `404 Not Found`.

use crate::error::Result;
use crate::services::blocking;
use crate::storage::{catalog, rows, Store};
use actix_web::{web, HttpResponse, Responder};
use common::model::table::TableContents;

pub async fn process(table: web::Path<String>, store: web::Data<Store>) -> impl Responder {
    match get_table(store.get_ref().clone(), table.into_inner()).await {
        Ok(contents) => HttpResponse::Ok().json(contents),
        Err(e) => e.to_response(),
    }
}

pub async fn get_table(store: Store, name: String) -> Result<TableContents> {
    blocking(move || {
        let conn = store.connect()?;
        let table = catalog::get_table(&conn, &name)?;
        let rows = rows::get_rows(&conn, &table)?;
        Ok(TableContents { table, rows })
    })
    .await
}
