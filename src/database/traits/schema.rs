//! Dialect-neutral table metadata.

use serde::Serialize;

use super::dialect::Dialect;
use super::row::Value;

/// Index classification of a column, when one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    Primary,
    Unique,
    Index,
}

impl IndexType {
    /// Map a MySQL-style key marker (`PRI`, `UNI`, `MUL`).
    pub fn from_key_marker(marker: &str) -> Option<Self> {
        match marker.trim().to_uppercase().as_str() {
            "PRI" | "PRIMARY" | "PRIMARY KEY" => Some(Self::Primary),
            "UNI" | "UNIQUE" => Some(Self::Unique),
            "MUL" | "INDEX" | "KEY" => Some(Self::Index),
            _ => None,
        }
    }
}

/// One column of a described table.
///
/// Built fresh by every `describe_table` call; never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    #[serde(rename = "columnName")]
    pub name: String,
    /// Type as spelled by the engine (`character varying(255)`, `Nullable(UInt64)`)
    pub column_type: String,
    pub is_nullable: bool,
    pub default_value: Option<Value>,
    pub is_primary_key: bool,
    pub index_type: Option<IndexType>,
    /// Engine annotation such as `auto_increment` or `identity`
    pub extra: Option<String>,
    pub comment: Option<String>,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            is_nullable: true,
            default_value: None,
            is_primary_key: false,
            index_type: None,
            extra: None,
            comment: None,
        }
    }

    pub fn with_nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }

    pub fn with_default(mut self, default: Option<Value>) -> Self {
        self.default_value = default.filter(|v| !v.is_null());
        self
    }

    /// Set the index classification. `Primary` also marks the primary key.
    pub fn with_index(mut self, index_type: Option<IndexType>) -> Self {
        if index_type == Some(IndexType::Primary) {
            self.is_primary_key = true;
        }
        self.index_type = index_type;
        self
    }

    pub fn with_extra(mut self, extra: Option<String>) -> Self {
        self.extra = non_empty(extra);
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = non_empty(comment);
        self
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

/// A table reference as given by a caller: `table` or `schema.table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Schema (Postgres, DuckDB) or database (MySQL, ClickHouse)
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    /// Split on the first unquoted dot and strip `"` or `` ` `` quoting.
    pub fn parse(input: &str) -> Self {
        Self::parse_folded(input, false)
    }

    /// Like [`TableRef::parse`], but unquoted parts are folded the way the
    /// dialect folds identifiers. Postgres stores `Users` as `users`.
    pub fn parse_for(dialect: Dialect, input: &str) -> Self {
        Self::parse_folded(input, dialect == Dialect::Postgres)
    }

    fn parse_folded(input: &str, lowercase_unquoted: bool) -> Self {
        let input = input.trim();
        let mut in_quote: Option<char> = None;
        let mut split_at = None;

        for (idx, ch) in input.char_indices() {
            match (in_quote, ch) {
                (None, '"' | '`') => in_quote = Some(ch),
                (Some(q), c) if c == q => in_quote = None,
                (None, '.') => {
                    split_at = Some(idx);
                    break;
                }
                _ => {}
            }
        }

        match split_at {
            Some(idx) => Self {
                schema: Some(identifier(&input[..idx], lowercase_unquoted)),
                name: identifier(&input[idx + 1..], lowercase_unquoted),
            },
            None => Self {
                schema: None,
                name: identifier(input, lowercase_unquoted),
            },
        }
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

fn identifier(part: &str, lowercase_unquoted: bool) -> String {
    let part = part.trim();
    for q in ['"', '`'] {
        if part.len() >= 2 && part.starts_with(q) && part.ends_with(q) {
            let doubled = format!("{q}{q}");
            return part[1..part.len() - 1].replace(&doubled, &q.to_string());
        }
    }
    if lowercase_unquoted {
        part.to_lowercase()
    } else {
        part.to_string()
    }
}
