use crate::error::{AdminError, Result};
use crate::storage::quote_identifier;
use common::model::table::{Column, ColumnType, Table};
use log::info;
use rusqlite::{params, Connection};

/// Internal bookkeeping table, never listed or exported.
pub const AUDIT_TABLE: &str = "import_audit";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS modes (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT
);
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY,
    page_number INTEGER NOT NULL,
    description TEXT
);
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT,
    password TEXT
);
CREATE TABLE IF NOT EXISTS hafizs (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    daily_capacity REAL,
    user_id INTEGER
);
CREATE TABLE IF NOT EXISTS hafizs_users (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    hafiz_id INTEGER NOT NULL,
    relationship TEXT
);
CREATE TABLE IF NOT EXISTS plans (
    id INTEGER PRIMARY KEY,
    hafiz_id INTEGER,
    start_page INTEGER,
    completed INTEGER
);
CREATE TABLE IF NOT EXISTS revisions (
    id INTEGER PRIMARY KEY,
    hafiz_id INTEGER,
    page INTEGER NOT NULL,
    revision_date TEXT,
    rating INTEGER,
    mode_id INTEGER,
    plan_id INTEGER
);
CREATE TABLE IF NOT EXISTS import_audit (
    id TEXT PRIMARY KEY,
    table_name TEXT NOT NULL,
    filename TEXT NOT NULL,
    md5 TEXT NOT NULL,
    outcome TEXT NOT NULL,
    done_rows INTEGER NOT NULL,
    failed_rows INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

const MODES: [&str; 5] = [
    "1. Full Cycle",
    "2. New Memorization",
    "3. Recent Review",
    "4. Watch List",
    "5. SRS",
];

const LAST_PAGE: i64 = 604;

/// Creates the known tables and seeds `modes` and `pages` when they are empty.
pub fn bootstrap(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let tx = conn.unchecked_transaction()?;
    if is_empty(&tx, "modes")? {
        for (i, name) in MODES.iter().enumerate() {
            tx.execute(
                "INSERT INTO modes (id, name) VALUES (?1, ?2)",
                params![i as i64 + 1, name],
            )?;
        }
        info!("seeded {} modes", MODES.len());
    }
    if is_empty(&tx, "pages")? {
        let mut stmt = tx.prepare("INSERT INTO pages (id, page_number) VALUES (?1, ?1)")?;
        for page in 1..=LAST_PAGE {
            stmt.execute(params![page])?;
        }
        info!("seeded {} pages", LAST_PAGE);
    }
    tx.commit()?;
    Ok(())
}

fn is_empty(conn: &Connection, table: &str) -> Result<bool> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table)?);
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count == 0)
}

/// Every user-visible table, sorted by name.
pub fn list_tables(conn: &Connection) -> Result<Vec<Table>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != ?1
         ORDER BY name",
    )?;
    let names = stmt
        .query_map(params![AUDIT_TABLE], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    names.iter().map(|name| get_table(conn, name)).collect()
}

/// Reads a table's schema from `PRAGMA table_info`.
pub fn get_table(conn: &Connection, name: &str) -> Result<Table> {
    if name == AUDIT_TABLE || name.starts_with("sqlite_") {
        return Err(AdminError::TableNotFound(name.to_string()));
    }
    let quoted =
        quote_identifier(name).map_err(|_| AdminError::TableNotFound(name.to_string()))?;

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quoted))?;
    let infos = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if infos.is_empty() {
        return Err(AdminError::TableNotFound(name.to_string()));
    }

    let pk_columns: Vec<&String> = infos
        .iter()
        .filter(|(_, _, _, pk)| *pk > 0)
        .map(|(name, _, _, _)| name)
        .collect();
    let primary_key = match pk_columns.as_slice() {
        [single] => Some((*single).clone()),
        _ => None,
    };

    let columns = infos
        .iter()
        .map(|(name, declared, not_null, _)| Column {
            name: name.clone(),
            column_type: ColumnType::from_declared(declared),
            not_null: *not_null != 0,
        })
        .collect();

    Ok(Table {
        name: name.to_string(),
        columns,
        primary_key,
    })
}
