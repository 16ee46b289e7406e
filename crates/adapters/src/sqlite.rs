use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use litebrowse_core::schema::{ColumnDescriptor, TableDescriptor, TableKind};
use litebrowse_core::sql::{self, BoundSql, StatementKind};
use litebrowse_core::store::{Grid, QueryOutcome, StoreError};
use litebrowse_core::value::{format_size, Value};
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};

/// Table names with this prefix are reserved by SQLite itself and are never
/// listed.
const INTERNAL_TABLE_PREFIX: &str = "sqlite_";

/// The data-access façade: owns the single database connection.
///
/// The connection is behind a mutex so independently scheduled operations
/// serialize on the handle; the store itself holds no other state.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteStore {
    /// Opens the database file and validates the connection with a ping,
    /// failing fast rather than on first use.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(to_connect_error)?;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(to_connect_error)?;

        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Closes the connection. The store is consumed so this happens exactly
    /// once.
    pub fn close(self) -> Result<(), StoreError> {
        let conn = self
            .conn
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        conn.close()
            .map_err(|(_, source)| StoreError::Query(source.to_string()))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All user table names, sorted lexicographically, excluding SQLite's
    /// internal bookkeeping tables.
    pub fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE ?1 \
                 ORDER BY name",
            )
            .map_err(to_query_error)?;

        let rows = stmt
            .query_map([format!("{INTERNAL_TABLE_PREFIX}%")], |row| {
                row.get::<_, String>(0)
            })
            .map_err(to_query_error)?;

        let mut tables = Vec::new();
        for row in rows {
            tables.push(row.map_err(to_scan_error)?);
        }
        Ok(tables)
    }

    /// Column metadata for one table, ordered by ordinal.
    ///
    /// SQLite reports zero rows both for a missing table and for a table
    /// with no columns; the two collapse into `NotFound`.
    pub fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescriptor>, StoreError> {
        let conn = self.conn();
        let pragma = format!("PRAGMA table_info({})", sql::quote_identifier(table));
        let mut stmt = conn.prepare(&pragma).map_err(to_query_error)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ColumnDescriptor {
                    ordinal: row.get::<_, i64>(0)?.unsigned_abs() as usize,
                    name: row.get(1)?,
                    decl_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    not_null: row.get::<_, i64>(3)? != 0,
                    default_value: row.get(4)?,
                    primary_key: row.get::<_, i64>(5)? != 0,
                })
            })
            .map_err(to_query_error)?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row.map_err(to_scan_error)?);
        }

        if columns.is_empty() {
            return Err(StoreError::NotFound(table.to_string()));
        }
        Ok(columns)
    }

    /// Table identity plus a row count. Views never get a row count; that is
    /// a schema-level limitation, not a bug.
    pub fn table_info(&self, table: &str) -> Result<TableDescriptor, StoreError> {
        let kind = {
            let conn = self.conn();
            let result = conn.query_row(
                "SELECT type FROM sqlite_master WHERE name = ?1 AND type IN ('table', 'view')",
                [table],
                |row| row.get::<_, String>(0),
            );
            match result {
                Ok(kind) if kind == "view" => TableKind::View,
                Ok(_) => TableKind::Table,
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    return Err(StoreError::NotFound(table.to_string()));
                }
                Err(source) => return Err(to_query_error(source)),
            }
        };

        let column_count = self.describe_table(table)?.len();

        let row_count = match kind {
            TableKind::View => None,
            TableKind::Table => {
                let conn = self.conn();
                let count = conn
                    .query_row(
                        &format!("SELECT COUNT(*) FROM {}", sql::quote_identifier(table)),
                        [],
                        |row| row.get::<_, i64>(0),
                    )
                    .map_err(to_query_error)?;
                Some(count.unsigned_abs())
            }
        };

        Ok(TableDescriptor {
            name: table.to_string(),
            kind,
            row_count,
            column_count,
        })
    }

    /// Read-only diagnostic summary of the whole database file.
    ///
    /// The mapping is intentionally free-form so the key set can grow
    /// without breaking consumers.
    pub fn database_info(&self) -> Result<Vec<(String, String)>, StoreError> {
        let (page_size, page_count, encoding, foreign_keys) = {
            let conn = self.conn();
            let page_size = pragma_i64(&conn, "PRAGMA page_size")?;
            let page_count = pragma_i64(&conn, "PRAGMA page_count")?;
            let encoding = conn
                .query_row("PRAGMA encoding", [], |row| row.get::<_, String>(0))
                .map_err(to_query_error)?;
            let foreign_keys = pragma_i64(&conn, "PRAGMA foreign_keys")?;
            (page_size, page_count, encoding, foreign_keys)
        };

        let table_count = self.list_tables()?.len();
        let total_size = page_size.unsigned_abs() * page_count.unsigned_abs();

        Ok(vec![
            ("Page size".to_string(), page_size.to_string()),
            ("Page count".to_string(), page_count.to_string()),
            ("Size".to_string(), format_size(total_size)),
            ("Encoding".to_string(), encoding),
            (
                "Foreign keys".to_string(),
                if foreign_keys != 0 { "on" } else { "off" }.to_string(),
            ),
            ("Tables".to_string(), table_count.to_string()),
            ("Path".to_string(), self.path.display().to_string()),
        ])
    }

    /// One page of rows, every value encoded for display.
    pub fn list_page(&self, table: &str, limit: u32, offset: u32) -> Result<Grid, StoreError> {
        self.run_select(&sql::page_sql(table, limit, offset))
    }

    /// Case-insensitive substring search over the table's text-like columns.
    /// An empty term is exactly the plain page listing.
    pub fn search(
        &self,
        table: &str,
        term: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Grid, StoreError> {
        let columns = self.describe_table(table)?;
        self.run_select(&sql::search_sql(table, &columns, term, limit, offset))
    }

    /// Updates the single row whose `id` equals the edited row's id value.
    ///
    /// `values` pairs positionally with `columns`; each input string is
    /// coerced through the codec with its column's declared type.
    pub fn update_row(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
        values: &[String],
    ) -> Result<(), StoreError> {
        let id_index = columns
            .iter()
            .position(|column| column.name == "id")
            .ok_or_else(|| StoreError::NoIdentityColumn(table.to_string()))?;
        let row_id = values
            .get(id_index)
            .ok_or_else(|| StoreError::Scan("row is shorter than its column list".to_string()))?;

        let bound = sql::update_sql(table, columns, values, row_id)?;
        let conn = self.conn();
        let affected = conn
            .execute(&bound.sql, params_from_iter(bound.params.iter().map(to_sql_value)))
            .map_err(to_query_error)?;

        if affected == 0 {
            return Err(StoreError::NoRowsAffected);
        }
        Ok(())
    }

    /// Executes one ad-hoc statement: read statements return rows through
    /// the shared extraction path, anything else returns a mutation summary.
    pub fn execute(&self, statement: &str) -> Result<QueryOutcome, StoreError> {
        let trimmed = statement.trim();
        if trimmed.is_empty() {
            return Err(StoreError::EmptyQuery);
        }

        match sql::classify(trimmed) {
            StatementKind::Read => {
                let grid = self.run_select(&BoundSql {
                    sql: trimmed.to_string(),
                    params: Vec::new(),
                })?;
                Ok(QueryOutcome::Rows(grid))
            }
            StatementKind::Write => {
                let conn = self.conn();
                let affected = conn.execute(trimmed, []).map_err(to_query_error)?;
                Ok(QueryOutcome::Mutation {
                    rows_affected: affected as u64,
                    last_insert_id: conn.last_insert_rowid(),
                })
            }
        }
    }

    /// Runs several statements in one batch. Used by the seed routine and
    /// tests; ad-hoc user statements go through `execute` instead.
    pub fn execute_batch(&self, statements: &str) -> Result<(), StoreError> {
        self.conn()
            .execute_batch(statements)
            .map_err(to_query_error)
    }

    /// Shared row-extraction path for paging, search, and ad-hoc reads, so
    /// formatting is consistent everywhere.
    fn run_select(&self, bound: &BoundSql) -> Result<Grid, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&bound.sql).map_err(to_query_error)?;

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        let column_count = columns.len();

        let mut rows = stmt
            .query(params_from_iter(bound.params.iter().map(to_sql_value)))
            .map_err(to_query_error)?;

        let mut grid_rows = Vec::new();
        while let Some(row) = rows.next().map_err(to_query_error)? {
            let mut display = Vec::with_capacity(column_count);
            for index in 0..column_count {
                let value = row.get_ref(index).map_err(to_scan_error)?;
                display.push(value_ref_to_value(value).encode());
            }
            grid_rows.push(display);
        }

        Ok(Grid {
            columns,
            rows: grid_rows,
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn pragma_i64(conn: &Connection, pragma: &str) -> Result<i64, StoreError> {
    conn.query_row(pragma, [], |row| row.get::<_, i64>(0))
        .map_err(to_query_error)
}

fn value_ref_to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(value) => Value::Integer(value),
        ValueRef::Real(value) => Value::Float(value),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

fn to_sql_value(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Integer(value) => rusqlite::types::Value::Integer(*value),
        Value::Float(value) => rusqlite::types::Value::Real(*value),
        Value::Text(value) => rusqlite::types::Value::Text(value.clone()),
        Value::Blob(bytes) => rusqlite::types::Value::Blob(bytes.clone()),
        Value::Boolean(value) => rusqlite::types::Value::Integer(i64::from(*value)),
    }
}

fn to_connect_error(source: rusqlite::Error) -> StoreError {
    StoreError::Connect(source.to_string())
}

fn to_query_error(source: rusqlite::Error) -> StoreError {
    tracing::debug!(error = %source, "statement failed");
    StoreError::Query(source.to_string())
}

fn to_scan_error(source: rusqlite::Error) -> StoreError {
    StoreError::Scan(source.to_string())
}
