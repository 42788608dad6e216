//! Qualified `schema.table` names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A table name with an optional schema, keyed everywhere as `schema.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct QualifiedName {
    pub schema: Option<String>,
    pub table: String,
}

impl QualifiedName {
    pub fn new(schema: Option<&str>, table: &str) -> Self {
        Self {
            schema: schema.filter(|s| !s.is_empty()).map(str::to_string),
            table: table.to_string(),
        }
    }

    pub fn parse(qname: &str) -> Self {
        let (schema, table) = q_name_split(qname);
        Self { schema, table }
    }

    /// Name of the table without its schema.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether `name` refers to this table, either bare or qualified.
    pub fn matches(&self, name: &str) -> bool {
        name == self.table || name == self.to_string()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&q_name_join(self.schema.as_deref(), &self.table))
    }
}

impl From<String> for QualifiedName {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for QualifiedName {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<QualifiedName> for String {
    fn from(value: QualifiedName) -> Self {
        value.to_string()
    }
}

/// Split `schema.table` into its parts. Only the first `.` separates; an empty schema is none.
pub fn q_name_split(qname: &str) -> (Option<String>, String) {
    match qname.split_once('.') {
        Some(("", table)) => (None, table.to_string()),
        Some((schema, table)) => (Some(schema.to_string()), table.to_string()),
        None => (None, qname.to_string()),
    }
}

/// Join a schema and table into `schema.table`, or just `table` without a schema.
pub fn q_name_join(schema: Option<&str>, table: &str) -> String {
    match schema {
        Some(schema) if !schema.is_empty() => format!("{}.{}", schema, table),
        _ => table.to_string(),
    }
}
