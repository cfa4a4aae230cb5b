//! CSV export, import and preview for the admin tables.
//!
//! The provided routes, all relative to the `/api/tables` scope, are:
//! - `GET /{table}/export`: serializes every row of the table to `<table>.csv`,
//!   header first, rows in identifier order. The file re-imports cleanly into
//!   the same table.
//!
//! - `POST /{table}/import`: handles a multipart/form-data upload with a `file`
//!   field. The header is checked against the table schema (`verify`); a
//!   mismatch rejects the whole file without touching storage. Otherwise every
//!   row is inserted or updated by its identifier (`import`), failures are
//!   reported per row and do not stop the batch. Imports into one table are
//!   serialized through `TableLocks`.
//!
//! - `POST /{table}/preview`: same upload and the same checks as the import,
//!   but nothing is written. Returns the report the import would produce.

use actix_web::web::{get, post, ServiceConfig};

mod export;
mod import;
mod preview;
mod upload;
mod verify;

/// Registers the CSV routes on the table scope.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg
        // Route to download a table as CSV.
        .route("/{table}/export", get().to(export::process))
        // Route to validate and commit an uploaded CSV file.
        .route("/{table}/import", post().to(import::process))
        // Route to validate an uploaded CSV file without committing it.
        .route("/{table}/preview", post().to(preview::process));
}
