//! Schema introspection from SQL dumps.

mod dialect;
mod lexer;
mod parser;
mod types;

pub use dialect::Dialect;
pub use parser::{SqlParseError, parse_sql};
pub use types::{emitted_type, normalize_type};

use crate::model::TableData;
use crate::resolver::TypeMapper;

/// A source of schema metadata together with its native type table.
pub trait SchemaIntrospector: TypeMapper {
    fn dialect(&self) -> Dialect;

    fn introspect(&self) -> Result<TableData, SqlParseError>;
}

macro_rules! dump_introspector {
    ($(#[$doc:meta])* $name:ident, $dialect:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            sql: String,
        }

        impl $name {
            pub fn new(sql: impl Into<String>) -> Self {
                Self { sql: sql.into() }
            }
        }

        impl TypeMapper for $name {
            fn map_type(&self, native: &str) -> String {
                emitted_type(native, $dialect)
            }
        }

        impl SchemaIntrospector for $name {
            fn dialect(&self) -> Dialect {
                $dialect
            }

            fn introspect(&self) -> Result<TableData, SqlParseError> {
                parse_sql(&self.sql, $dialect)
            }
        }
    };
}

dump_introspector!(
    /// `pg_dump --schema-only` output.
    PostgresDump,
    Dialect::Postgres
);
dump_introspector!(
    /// `mysqldump --no-data` output.
    MySqlDump,
    Dialect::MySql
);
dump_introspector!(
    /// Plain DDL without dialect-specific syntax.
    GenericDump,
    Dialect::Generic
);

/// Pick the introspector for a dump, detecting the dialect when `Auto`.
pub fn introspector_for(sql: &str, dialect: Dialect) -> Box<dyn SchemaIntrospector> {
    match dialect.resolve(sql) {
        Dialect::Postgres => Box::new(PostgresDump::new(sql)),
        Dialect::MySql => Box::new(MySqlDump::new(sql)),
        Dialect::Generic | Dialect::Auto => Box::new(GenericDump::new(sql)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_introspector_for_detects_dialect() {
        let mysql = introspector_for("CREATE TABLE t (id INT AUTO_INCREMENT);", Dialect::Auto);
        assert_eq!(mysql.dialect(), Dialect::MySql);
        assert_eq!(mysql.map_type("tinyint(1)"), "boolean");

        let generic = introspector_for("CREATE TABLE t (id INT);", Dialect::Auto);
        assert_eq!(generic.dialect(), Dialect::Generic);
    }

    #[test]
    fn test_introspect_uses_own_dialect() {
        let dump = PostgresDump::new("CREATE TABLE t (id INT PRIMARY KEY);");
        let td = dump.introspect().unwrap();
        assert_eq!(td.indexes.values().next().unwrap()[0].name, "t_pkey");
        assert_eq!(dump.map_type("jsonb"), "object");
    }
}
