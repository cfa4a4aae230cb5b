use crate::error::Result;
use crate::services::blocking;
use crate::storage::{catalog, Store};
use actix_web::{web, HttpResponse, Responder};
use common::model::table::Table;

/// Actix web handler for `GET /api/tables`.
///
/// Returns every user table with its columns, sorted by name.
pub async fn process(store: web::Data<Store>) -> impl Responder {
    match list_tables(store.get_ref().clone()).await {
        Ok(tables) => HttpResponse::Ok().json(tables),
        Err(e) => e.to_response(),
    }
}

pub async fn list_tables(store: Store) -> Result<Vec<Table>> {
    blocking(move || {
        let conn = store.connect()?;
        catalog::list_tables(&conn)
    })
    .await
}
