//! Which database produced a dump.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Decide from the dump itself
    #[default]
    Auto,
    /// Plain DDL, SQLite included
    Generic,
    Postgres,
    /// MySQL and MariaDB
    MySql,
}

/// Headers written by the dump tools.
const POSTGRES_HEADERS: &[&str] = &["postgresql database dump", "pg_dump"];
const MYSQL_HEADERS: &[&str] = &["mysql dump", "mysqldump", "mariadb dump"];

/// Syntax only one of the two dialects uses.
const POSTGRES_MARKERS: &[&str] = &[
    "serial",
    "[]",
    "::",
    "nextval(",
    "timestamptz",
    "jsonb",
    "create sequence",
    "owner to",
    "set search_path",
    "generated by default as identity",
    "$$",
];
const MYSQL_MARKERS: &[&str] = &[
    "auto_increment",
    "engine=",
    "unsigned",
    "tinyint",
    "`",
    "/*!",
    "default charset",
    "lock tables",
];

fn score(content: &str, markers: &[&str]) -> usize {
    markers.iter().filter(|m| content.contains(*m)).count()
}

impl Dialect {
    /// Dialect by name; `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "generic" | "sqlite" => Some(Self::Generic),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            _ => None,
        }
    }

    /// Guess the dialect of a dump: tool headers first, then dialect-only syntax.
    pub fn detect(content: &str) -> Self {
        let lower = content.to_lowercase();

        if POSTGRES_HEADERS.iter().any(|h| lower.contains(h)) {
            return Self::Postgres;
        }
        if MYSQL_HEADERS.iter().any(|h| lower.contains(h)) {
            return Self::MySql;
        }

        let postgres = score(&lower, POSTGRES_MARKERS);
        let mysql = score(&lower, MYSQL_MARKERS);
        match postgres.cmp(&mysql) {
            std::cmp::Ordering::Greater => Self::Postgres,
            std::cmp::Ordering::Less => Self::MySql,
            std::cmp::Ordering::Equal => Self::Generic,
        }
    }

    /// `Auto` becomes the detected dialect; anything else is kept.
    pub fn resolve(self, content: &str) -> Self {
        match self {
            Self::Auto => Self::detect(content),
            other => other,
        }
    }
}
