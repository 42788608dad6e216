//! Fatal errors and non-fatal diagnostics of a generation run.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::qname::QualifiedName;
use crate::sql::SqlParseError;

/// Invalid configuration, reported before any inference runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown case option {value:?}, expected one of {expected}")]
    UnknownCase {
        value: String,
        expected: &'static str,
    },
    #[error("Unknown nullable field type {0:?}, expected NULL, OPTIONAL or NULL_AND_OPTIONAL")]
    UnknownNullableFieldType(String),
    #[error("Empty entry in pkSuffixes")]
    EmptyPkSuffix,
    #[error("Table {0} is both included and skipped")]
    ConflictingTableFilter(String),
    #[error("Invalid options: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AutoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Introspection error: {0}")]
    Introspect(#[from] SqlParseError),
    #[error("Tables {first} and {second} both resolve to model name {model}")]
    ModelNameCollision {
        model: String,
        first: QualifiedName,
        second: QualifiedName,
    },
    #[error("Property {prop} on model {model} ({table}) is produced by both {first} and {second}")]
    PropertyCollision {
        table: QualifiedName,
        model: String,
        prop: String,
        first: String,
        second: String,
    },
}

/// A non-fatal condition collected during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// A foreign key points at a table that is not part of this run.
    #[serde(rename_all = "camelCase")]
    UnresolvedReference {
        table: QualifiedName,
        column: String,
        target: QualifiedName,
    },
    /// A type override names a table or column that does not exist.
    #[serde(rename_all = "camelCase")]
    MalformedOverride {
        table: String,
        column: Option<String>,
    },
}

impl Diagnostic {
    /// Log the diagnostic and collect it.
    pub fn emit(self, sink: &mut Vec<Diagnostic>) {
        tracing::warn!("{}", self);
        sink.push(self);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnresolvedReference {
                table,
                column,
                target,
            } => write!(
                f,
                "Foreign key {}.{} references {}, which is not part of this run; relation dropped",
                table, column, target
            ),
            Diagnostic::MalformedOverride {
                table,
                column: Some(column),
            } => write!(
                f,
                "Type override for {}.{} ignored: no such column",
                table, column
            ),
            Diagnostic::MalformedOverride {
                table,
                column: None,
            } => write!(f, "Type overrides for {} ignored: no such table", table),
        }
    }
}
