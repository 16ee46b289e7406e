/// Largest blob rendered as hex before falling back to a size placeholder.
const BLOB_PREVIEW_LIMIT: usize = 50;

/// A single database value as a closed set of storage classes.
///
/// SQLite is dynamically typed, so any column can hold any of these at
/// runtime; the codec pattern-matches the tag instead of trusting the
/// declared column type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
}

impl Value {
    /// Renders a value as a display/edit string.
    ///
    /// Blobs over 50 bytes collapse to a `<BLOB: N bytes>` placeholder and
    /// cannot be recovered from the encoded form; editing full blobs is out
    /// of scope.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::Blob(bytes) if bytes.len() > BLOB_PREVIEW_LIMIT => {
                format!("<BLOB: {} bytes>", bytes.len())
            }
            Self::Blob(bytes) => hex::encode(bytes),
            Self::Boolean(value) => {
                if *value {
                    "1".to_string()
                } else {
                    "0".to_string()
                }
            }
        }
    }

    /// Parses an edited string back into a value using the column's declared
    /// type.
    ///
    /// Mirrors SQLite column affinity: the declared type is matched against
    /// `INT`, then `REAL|FLOAT|DOUBLE|DECIMAL`, then `BOOL`, in that order,
    /// since a type string can match more than one pattern. An empty string
    /// or the literal `NULL` is always NULL. Any parse failure or unmatched
    /// type keeps the original text unchanged.
    #[must_use]
    pub fn decode(declared_type: &str, text: &str) -> Self {
        if text.is_empty() || text == "NULL" {
            return Self::Null;
        }

        let affinity = declared_type.to_ascii_uppercase();
        if affinity.contains("INT") {
            return text
                .parse::<i64>()
                .map_or_else(|_| Self::Text(text.to_string()), Self::Integer);
        }

        if ["REAL", "FLOAT", "DOUBLE", "DECIMAL"]
            .iter()
            .any(|pattern| affinity.contains(pattern))
        {
            return text
                .parse::<f64>()
                .map_or_else(|_| Self::Text(text.to_string()), Self::Float);
        }

        if affinity.contains("BOOL") {
            return match text {
                "true" | "TRUE" | "1" => Self::Integer(1),
                "false" | "FALSE" | "0" => Self::Integer(0),
                other => Self::Text(other.to_string()),
            };
        }

        Self::Text(text.to_string())
    }
}

/// Formats a byte count with binary (1024-based) units and one decimal place
/// above the unit threshold.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["KB", "MB", "GB", "TB", "PB", "EB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut scaled = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for candidate in &UNITS[1..] {
        if scaled < 1024.0 {
            break;
        }
        scaled /= 1024.0;
        unit = candidate;
    }

    format!("{scaled:.1} {unit}")
}
