//! # Table Service Module
//!
//! Table listing, table detail and generic row mutations. These are the
//! capabilities the admin UI consumes next to the CSV routes.
//!
//! ## Sub-modules:
//! - `list`: every user table with its schema.
//! - `get`: one table with all of its rows.
//! - `rows`: create, update and delete a single row.

mod get;
mod list;
mod rows;

use actix_web::web::{delete, get, post, put, ServiceConfig};

/// Registers the table routes on the table scope.
///
/// *   **`GET ""`**: lists all tables.
/// *   **`GET /{table}`**: returns the table schema and its rows in identifier order.
/// *   **`POST /{table}/rows`**: creates a row from a JSON object of column values.
/// *   **`PUT /{table}/rows/{id}`**: overwrites the row with identifier `id`.
/// *   **`DELETE /{table}/rows/{id}`**: deletes the row with identifier `id`.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.route("", get().to(list::process))
        .route("/{table}", get().to(get::process))
        .route("/{table}/rows", post().to(rows::create))
        .route("/{table}/rows/{id}", put().to(rows::update))
        .route("/{table}/rows/{id}", delete().to(rows::remove));
}
