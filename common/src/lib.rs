//! Data model shared between the table admin server and its clients.
//!
//! Everything here is plain serde data: table schemas, rows and the reports
//! produced by CSV imports and previews. Storage and HTTP concerns live in the
//! `backend` crate.

pub mod model;
pub mod requests;
