//! SQLite persistence for the admin tables.
//!
//! The store opens a fresh connection per unit of work, the same way every
//! service in this server talks to its database file. Connections run in WAL
//! mode so an export can read a consistent snapshot while an import commits.
//!
//! - `catalog`: schema bootstrap and table introspection.
//! - `rows`: row reads and mutations.
//! - `audit`: the internal log of every import request.

pub mod audit;
pub mod catalog;
pub mod rows;

use crate::error::{AdminError, Result};
use log::debug;
use regex::Regex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Handle to the SQLite database file backing every table.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Opens the database at `path`, creating and seeding the known tables when
    /// they do not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        let conn = store.connect()?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("opened {} in {} mode", store.path.display(), mode);
        catalog::bootstrap(&conn)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a new connection. Callers own it for the duration of one request.
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }
}

fn identifier_re() -> Result<&'static Regex> {
    static RE: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$"))
        .as_ref()
        .map_err(|e| AdminError::InvalidIdentifier(format!("regex error: {}", e)))
}

/// Double-quotes a table or column name for interpolation into SQL.
///
/// Names that are not plain identifiers are refused outright, so nothing from
/// an upload header or a URL path reaches a statement unchecked.
pub fn quote_identifier(name: &str) -> Result<String> {
    if identifier_re()?.is_match(name) {
        Ok(format!("\"{}\"", name))
    } else {
        Err(AdminError::InvalidIdentifier(name.to_string()))
    }
}
