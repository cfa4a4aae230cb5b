use crate::error::{AdminError, Result};
use crate::services::blocking;
use crate::storage::{catalog, rows, Store};
use actix_web::{web, HttpResponse, Responder};
use common::model::row::{Row, Value};
use common::model::table::Table;
use common::requests::RowPayload;
use log::info;

/// Parses a JSON row payload with the same per-column rules as CSV fields.
///
/// Unknown columns are rejected; missing columns are treated as empty fields.
fn values_from_payload(table: &Table, payload: &RowPayload) -> Result<Vec<Value>> {
    if let Some(unknown) = payload
        .fields
        .keys()
        .find(|name| table.column_index(name).is_none())
    {
        return Err(AdminError::InvalidRow(format!(
            "unknown column '{}' for table {}",
            unknown, table.name
        )));
    }

    table
        .columns
        .iter()
        .map(|column| {
            let raw = payload.fields.get(&column.name).map(String::as_str).unwrap_or("");
            column.parse_value(raw).map_err(AdminError::InvalidRow)
        })
        .collect()
}

/// Maps a constraint violation to a client error; other storage errors pass.
fn reject_constraint(err: AdminError) -> AdminError {
    match rows::constraint_violation(&err) {
        Some(reason) => AdminError::InvalidRow(reason),
        None => err,
    }
}

fn not_found(table: &Table, id: &str) -> AdminError {
    AdminError::RowNotFound {
        table: table.name.clone(),
        id: id.to_string(),
    }
}

/// `POST /api/tables/{table}/rows`: `201 Created` with the stored row.
pub async fn create(
    table: web::Path<String>,
    payload: web::Json<RowPayload>,
    store: web::Data<Store>,
) -> impl Responder {
    match create_row(store.get_ref().clone(), table.into_inner(), payload.into_inner()).await {
        Ok(row) => HttpResponse::Created().json(row),
        Err(e) => e.to_response(),
    }
}

/// `PUT /api/tables/{table}/rows/{id}`: `200 OK` with the stored row.
pub async fn update(
    path: web::Path<(String, String)>,
    payload: web::Json<RowPayload>,
    store: web::Data<Store>,
) -> impl Responder {
    let (table, id) = path.into_inner();
    match update_row(store.get_ref().clone(), table, id, payload.into_inner()).await {
        Ok(row) => HttpResponse::Ok().json(row),
        Err(e) => e.to_response(),
    }
}

/// `DELETE /api/tables/{table}/rows/{id}`: `204 No Content`.
///
/// Deletion is immediate; asking the user for confirmation is the UI's job.
pub async fn remove(path: web::Path<(String, String)>, store: web::Data<Store>) -> impl Responder {
    let (table, id) = path.into_inner();
    match delete_row(store.get_ref().clone(), table, id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => e.to_response(),
    }
}

pub async fn create_row(store: Store, table_name: String, payload: RowPayload) -> Result<Row> {
    blocking(move || {
        let conn = store.connect()?;
        let table = catalog::get_table(&conn, &table_name)?;
        let values = values_from_payload(&table, &payload)?;
        let id = rows::insert_row(&conn, &table, &values).map_err(reject_constraint)?;
        info!("created row {} in {}", id, table.name);
        rows::find_row(&conn, &table, &id)?.ok_or_else(|| not_found(&table, &id.to_string()))
    })
    .await
}

pub async fn update_row(
    store: Store,
    table_name: String,
    raw_id: String,
    payload: RowPayload,
) -> Result<Row> {
    blocking(move || {
        let conn = store.connect()?;
        let table = catalog::get_table(&conn, &table_name)?;
        let id = rows::parse_row_id(&table, &raw_id)?;
        let mut values = values_from_payload(&table, &payload)?;
        // The path decides which row is written.
        if let Some(pk) = table.primary_key_index() {
            values[pk] = id.clone();
        }
        if !rows::update_row(&conn, &table, &id, &values).map_err(reject_constraint)? {
            return Err(not_found(&table, &raw_id));
        }
        info!("updated row {} in {}", raw_id, table.name);
        rows::find_row(&conn, &table, &id)?.ok_or_else(|| not_found(&table, &raw_id))
    })
    .await
}

/// Deletes one row. There is no confirmation step at this level.
pub async fn delete_row(store: Store, table_name: String, raw_id: String) -> Result<()> {
    blocking(move || {
        let conn = store.connect()?;
        let table = catalog::get_table(&conn, &table_name)?;
        let id = rows::parse_row_id(&table, &raw_id)?;
        if !rows::delete_row(&conn, &table, &id)? {
            return Err(not_found(&table, &raw_id));
        }
        info!("deleted row {} from {}", raw_id, table.name);
        Ok(())
    })
    .await
}
