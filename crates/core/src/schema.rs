/// Whether a schema object is a plain table or a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Table,
    View,
}

impl TableKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::View => "view",
        }
    }
}

/// A snapshot of one table's identity and size.
///
/// Never cached across schema-mutating statements; callers re-fetch after
/// any ad-hoc statement that could alter structure. `row_count` is absent
/// for views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub kind: TableKind,
    pub row_count: Option<u64>,
    pub column_count: usize,
}

/// One column as reported by `PRAGMA table_info`.
///
/// `primary_key` collapses the pragma's PK ordinal to a boolean, so the
/// position of a column inside a composite key is lost. `default_value` of
/// `None` means the column has no default clause, which is distinct from a
/// default of NULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub ordinal: usize,
    pub name: String,
    pub decl_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}
