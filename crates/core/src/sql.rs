use crate::schema::ColumnDescriptor;
use crate::store::StoreError;
use crate::value::Value;

/// A generated statement with its bound parameters, in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSql {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Read/write classification of an ad-hoc statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Write,
}

/// Quotes a table or column name for direct inclusion in SQL text.
///
/// Identifiers cannot be bound as parameters, so this is the single place
/// where schema-derived strings enter generated SQL. Embedded double quotes
/// are doubled and the result is wrapped in double quotes.
#[must_use]
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// `SELECT * FROM <table> LIMIT ? OFFSET ?` with both bounds as parameters.
#[must_use]
pub fn page_sql(table: &str, limit: u32, offset: u32) -> BoundSql {
    BoundSql {
        sql: format!("SELECT * FROM {} LIMIT ? OFFSET ?", quote_identifier(table)),
        params: vec![
            Value::Integer(i64::from(limit)),
            Value::Integer(i64::from(offset)),
        ],
    }
}

/// Whether a declared column type can hold searchable text.
///
/// Untyped columns qualify because SQLite permits heterogeneous content in
/// them.
#[must_use]
pub fn is_searchable(decl_type: &str) -> bool {
    if decl_type.is_empty() {
        return true;
    }
    let upper = decl_type.to_ascii_uppercase();
    upper.contains("TEXT") || upper.contains("CHAR")
}

/// Case-insensitive substring search across a table's text-like columns.
///
/// Builds one `LIKE ?` clause per eligible column joined by `OR`, with a
/// `%term%` parameter for each, followed by the limit/offset parameters. An
/// empty term or a table with no text-like columns degenerates to the plain
/// page listing.
#[must_use]
pub fn search_sql(
    table: &str,
    columns: &[ColumnDescriptor],
    term: &str,
    limit: u32,
    offset: u32,
) -> BoundSql {
    let searchable: Vec<&ColumnDescriptor> = columns
        .iter()
        .filter(|column| is_searchable(&column.decl_type))
        .collect();

    if term.is_empty() || searchable.is_empty() {
        return page_sql(table, limit, offset);
    }

    let clauses = searchable
        .iter()
        .map(|column| format!("{} LIKE ?", quote_identifier(&column.name)))
        .collect::<Vec<_>>()
        .join(" OR ");

    let pattern = format!("%{term}%");
    let mut params: Vec<Value> = searchable
        .iter()
        .map(|_| Value::Text(pattern.clone()))
        .collect();
    params.push(Value::Integer(i64::from(limit)));
    params.push(Value::Integer(i64::from(offset)));

    BoundSql {
        sql: format!(
            "SELECT * FROM {} WHERE {clauses} LIMIT ? OFFSET ?",
            quote_identifier(table)
        ),
        params,
    }
}

/// Single-row update keyed on the column literally named `id`.
///
/// One SET clause per supplied column in caller order; every input string is
/// coerced through the codec with that column's declared type. Fails fast
/// when the column list carries no `id` column, since the WHERE clause
/// could never match a unique row.
pub fn update_sql(
    table: &str,
    columns: &[ColumnDescriptor],
    values: &[String],
    row_id: &str,
) -> Result<BoundSql, StoreError> {
    let id_column = columns
        .iter()
        .find(|column| column.name == "id")
        .ok_or_else(|| StoreError::NoIdentityColumn(table.to_string()))?;

    let assignments = columns
        .iter()
        .map(|column| format!("{} = ?", quote_identifier(&column.name)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut params: Vec<Value> = columns
        .iter()
        .zip(values)
        .map(|(column, value)| Value::decode(&column.decl_type, value))
        .collect();
    params.push(Value::decode(&id_column.decl_type, row_id));

    Ok(BoundSql {
        sql: format!(
            "UPDATE {} SET {assignments} WHERE \"id\" = ?",
            quote_identifier(table)
        ),
        params,
    })
}

/// Classifies a statement by its leading keyword.
///
/// A textual-prefix heuristic, not a parse; kept behind this function so a
/// real parser can replace it without touching callers.
#[must_use]
pub fn classify(statement: &str) -> StatementKind {
    let trimmed = statement.trim_start();
    let read_prefixes = ["SELECT", "PRAGMA", "EXPLAIN"];
    if read_prefixes.iter().any(|prefix| {
        trimmed
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    }) {
        StatementKind::Read
    } else {
        StatementKind::Write
    }
}
