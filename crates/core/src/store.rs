use thiserror::Error;

/// A rectangular query result: column names plus rows of display strings.
///
/// Every row has exactly one entry per column, positionally aligned with
/// the column sequence it was produced with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Outcome of an ad-hoc statement: a row set for reads, a summary for
/// writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Rows(Grid),
    Mutation {
        rows_affected: u64,
        last_insert_id: i64,
    },
}

/// Failure taxonomy for every store operation.
///
/// Only `Connect` is fatal; the session stores everything else for display
/// and keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    Connect(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("failed to decode result row: {0}")]
    Scan(String),
    #[error("no such table: {0}")]
    NotFound(String),
    #[error("query is empty")]
    EmptyQuery,
    #[error("update matched no rows")]
    NoRowsAffected,
    #[error("table `{0}` has no `id` column to edit by")]
    NoIdentityColumn(String),
}

#[cfg(test)]
mod tests {
    use super::StoreError;

    #[test]
    fn errors_render_with_context() {
        assert_eq!(
            StoreError::NotFound("users".to_string()).to_string(),
            "no such table: users"
        );
        assert_eq!(
            StoreError::NoIdentityColumn("logs".to_string()).to_string(),
            "table `logs` has no `id` column to edit by"
        );
        assert_eq!(StoreError::EmptyQuery.to_string(), "query is empty");
    }
}
