use crate::error::{AdminError, Result};
use crate::storage::quote_identifier;
use common::model::row::{Row, Value};
use common::model::table::{ColumnType, Table};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode, OptionalExtension};

pub(crate) fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Real(v) => SqlValue::Real(*v),
        Value::Text(v) => SqlValue::Text(v.clone()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        // Blobs are read as lossy UTF-8 text; non-UTF-8 bytes do not survive
        // an export.
        ValueRef::Text(v) | ValueRef::Blob(v) => {
            Value::Text(String::from_utf8_lossy(v).into_owned())
        }
    }
}

/// The SQLite message of a constraint violation, if `err` is one. Such
/// failures belong to a single row; any other storage error does not.
pub fn constraint_violation(err: &AdminError) -> Option<String> {
    match err {
        AdminError::Storage(rusqlite::Error::SqliteFailure(e, msg))
            if e.code == ErrorCode::ConstraintViolation =>
        {
            Some(msg.clone().unwrap_or_else(|| e.to_string()))
        }
        _ => None,
    }
}

/// The SQL expression addressing a row: the quoted primary key, or `rowid`.
fn key_expr(table: &Table) -> Result<String> {
    match &table.primary_key {
        Some(pk) => quote_identifier(pk),
        None => Ok("rowid".to_string()),
    }
}

fn column_list(table: &Table) -> Result<String> {
    Ok(table
        .columns
        .iter()
        .map(|c| quote_identifier(&c.name))
        .collect::<Result<Vec<_>>>()?
        .join(", "))
}

/// Parses a row identifier taken from a URL path.
pub fn parse_row_id(table: &Table, raw: &str) -> Result<Value> {
    let integer_key = match table.primary_key_index() {
        Some(idx) => table.columns[idx].column_type == ColumnType::Integer,
        None => true,
    };
    if integer_key {
        raw.parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| AdminError::RowNotFound {
                table: table.name.clone(),
                id: raw.to_string(),
            })
    } else {
        Ok(Value::Text(raw.to_string()))
    }
}

/// All rows of `table`, ordered by identifier ascending.
pub fn get_rows(conn: &Connection, table: &Table) -> Result<Vec<Row>> {
    let sql = format!(
        "SELECT {key}, {columns} FROM {table} ORDER BY {key}",
        key = key_expr(table)?,
        columns = column_list(table)?,
        table = quote_identifier(&table.name)?,
    );
    let width = table.columns.len();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            let id = from_sql(row.get_ref(0)?);
            let values = (1..=width)
                .map(|i| row.get_ref(i).map(from_sql))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(Row { id, values })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn find_row(conn: &Connection, table: &Table, id: &Value) -> Result<Option<Row>> {
    let sql = format!(
        "SELECT {key}, {columns} FROM {table} WHERE {key} = ?1",
        key = key_expr(table)?,
        columns = column_list(table)?,
        table = quote_identifier(&table.name)?,
    );
    let width = table.columns.len();
    let row = conn
        .query_row(&sql, [to_sql(id)], |row| {
            let id = from_sql(row.get_ref(0)?);
            let values = (1..=width)
                .map(|i| row.get_ref(i).map(from_sql))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(Row { id, values })
        })
        .optional()?;
    Ok(row)
}

pub fn row_exists(conn: &Connection, table: &Table, id: &Value) -> Result<bool> {
    let sql = format!(
        "SELECT 1 FROM {table} WHERE {key} = ?1",
        key = key_expr(table)?,
        table = quote_identifier(&table.name)?,
    );
    Ok(conn
        .query_row(&sql, [to_sql(id)], |_| Ok(()))
        .optional()?
        .is_some())
}

/// Whether a row with exactly these column values exists. Used to address rows
/// of tables without a single-column primary key, where the export carries no
/// identifier.
pub fn row_matches(conn: &Connection, table: &Table, values: &[Value]) -> Result<bool> {
    let conditions = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| Ok(format!("{} IS ?{}", quote_identifier(&c.name)?, i + 1)))
        .collect::<Result<Vec<_>>>()?
        .join(" AND ");
    let sql = format!(
        "SELECT 1 FROM {} WHERE {} LIMIT 1",
        quote_identifier(&table.name)?,
        conditions
    );
    Ok(conn
        .query_row(&sql, params_from_iter(values.iter().map(to_sql)), |_| Ok(()))
        .optional()?
        .is_some())
}

/// Inserts a row and returns its identifier. A `Null` integer primary key
/// lets SQLite assign the next id.
pub fn insert_row(conn: &Connection, table: &Table, values: &[Value]) -> Result<Value> {
    let placeholders = (1..=values.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(&table.name)?,
        column_list(table)?,
        placeholders
    );
    conn.execute(&sql, params_from_iter(values.iter().map(to_sql)))?;

    match table.primary_key_index().map(|idx| &values[idx]) {
        Some(id) if !id.is_null() => Ok(id.clone()),
        _ => Ok(Value::Integer(conn.last_insert_rowid())),
    }
}

/// Overwrites every column of the row addressed by `id`. Returns `false` when
/// no such row exists.
pub fn update_row(conn: &Connection, table: &Table, id: &Value, values: &[Value]) -> Result<bool> {
    let assignments = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| Ok(format!("{} = ?{}", quote_identifier(&c.name)?, i + 1)))
        .collect::<Result<Vec<_>>>()?
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        quote_identifier(&table.name)?,
        assignments,
        key_expr(table)?,
        values.len() + 1
    );
    let params = values.iter().map(to_sql).chain(std::iter::once(to_sql(id)));
    let changed = conn.execute(&sql, params_from_iter(params))?;
    Ok(changed > 0)
}

/// Deletes the row addressed by `id`. Returns `false` when nothing was deleted.
pub fn delete_row(conn: &Connection, table: &Table, id: &Value) -> Result<bool> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1",
        quote_identifier(&table.name)?,
        key_expr(table)?
    );
    Ok(conn.execute(&sql, [to_sql(id)])? > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::catalog::get_table;
    use crate::storage::test_support::temp_store;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn keyless_rows_match_on_every_column() {
        let (_dir, store) = temp_store();
        let conn = store.connect().unwrap();
        conn.execute_batch(
            "CREATE TABLE juz_notes (juz INTEGER, note TEXT);
             INSERT INTO juz_notes VALUES (1, NULL), (2, 'tricky');",
        )
        .unwrap();
        let notes = get_table(&conn, "juz_notes").unwrap();
        assert!(row_matches(&conn, &notes, &[Value::Integer(1), Value::Null]).unwrap());
        assert!(row_matches(&conn, &notes, &[Value::Integer(2), text("tricky")]).unwrap());
        assert!(!row_matches(&conn, &notes, &[Value::Integer(2), Value::Null]).unwrap());
    }

    #[test]
    fn utf8_blob_cells_read_as_text() {
        let (_dir, store) = temp_store();
        let conn = store.connect().unwrap();
        conn.execute_batch(
            "CREATE TABLE attachments (id INTEGER PRIMARY KEY, data BLOB);
             INSERT INTO attachments VALUES (1, X'6A757A'), (2, X'FF');",
        )
        .unwrap();
        let attachments = get_table(&conn, "attachments").unwrap();
        let rows = get_rows(&conn, &attachments).unwrap();
        assert_eq!(rows[0].values[1], text("juz"));
        assert_eq!(rows[1].values[1], text("\u{FFFD}"));
    }

    #[test]
    fn rows_come_back_in_identifier_order() {
        let (_dir, store) = temp_store();
        let conn = store.connect().unwrap();
        let modes = get_table(&conn, "modes").unwrap();
        let rows = get_rows(&conn, &modes).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].id, Value::Integer(1));
        assert_eq!(rows[0].values[1], text("1. Full Cycle"));
        assert_eq!(rows[4].values[1], text("5. SRS"));
        assert_eq!(rows[4].values[2], Value::Null);
    }

    #[test]
    fn insert_update_delete_cycle() {
        let (_dir, store) = temp_store();
        let conn = store.connect().unwrap();
        let users = get_table(&conn, "users").unwrap();

        let id = insert_row(&conn, &users, &[Value::Null, text("Adhil"), Value::Null, Value::Null])
            .unwrap();
        assert_eq!(id, Value::Integer(1));
        assert!(row_exists(&conn, &users, &id).unwrap());

        let updated = update_row(
            &conn,
            &users,
            &id,
            &[
                id.clone(),
                text("Adhil Madhani"),
                text("adhil@bisquared.com"),
                text("Abcd1234"),
            ],
        )
        .unwrap();
        assert!(updated);
        let row = find_row(&conn, &users, &id).unwrap().unwrap();
        assert_eq!(row.values[1], text("Adhil Madhani"));
        assert_eq!(row.values[2], text("adhil@bisquared.com"));

        assert!(delete_row(&conn, &users, &id).unwrap());
        assert!(!delete_row(&conn, &users, &id).unwrap());
        assert!(find_row(&conn, &users, &id).unwrap().is_none());
    }

    #[test]
    fn update_of_missing_row_reports_false() {
        let (_dir, store) = temp_store();
        let conn = store.connect().unwrap();
        let modes = get_table(&conn, "modes").unwrap();
        let missing = Value::Integer(99);
        assert!(!update_row(&conn, &modes, &missing, &[missing.clone(), text("x"), Value::Null])
            .unwrap());
    }

    #[test]
    fn rowid_tables_are_addressable() {
        let (_dir, store) = temp_store();
        let conn = store.connect().unwrap();
        conn.execute_batch("CREATE TABLE tags (label TEXT, weight REAL)")
            .unwrap();
        let tags = get_table(&conn, "tags").unwrap();
        let id = insert_row(&conn, &tags, &[text("juz amma"), Value::Real(0.5)]).unwrap();
        let rows = get_rows(&conn, &tags).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].values[1], Value::Real(0.5));
    }

    #[test]
    fn duplicate_keys_are_constraint_violations() {
        let (_dir, store) = temp_store();
        let conn = store.connect().unwrap();
        let modes = get_table(&conn, "modes").unwrap();
        let err = insert_row(&conn, &modes, &[Value::Integer(1), text("again"), Value::Null])
            .unwrap_err();
        let message = constraint_violation(&err).unwrap();
        assert!(message.contains("UNIQUE"));
        assert!(constraint_violation(&AdminError::TableNotFound("x".into())).is_none());
    }

    #[test]
    fn row_ids_parse_per_key_type() {
        let (_dir, store) = temp_store();
        let conn = store.connect().unwrap();
        let modes = get_table(&conn, "modes").unwrap();
        assert_eq!(parse_row_id(&modes, "3").unwrap(), Value::Integer(3));
        assert!(matches!(
            parse_row_id(&modes, "three"),
            Err(AdminError::RowNotFound { .. })
        ));
    }
}
