//! Native SQL types: canonical names and the scalar types emitted for models.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Dialect;

static ENUM_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'((?:[^']|'')*)'").expect("valid enum literal pattern"));

/// Canonical lowercase name of a native type, without length or precision.
pub fn normalize_type(sql_type: &str, dialect: Dialect) -> String {
    let lower = sql_type.trim().to_lowercase();
    if let Some(inner) = lower.strip_suffix("[]") {
        return format!("{}[]", normalize_type(inner, dialect));
    }
    let base = base_type(&lower);

    match dialect {
        Dialect::Postgres => map_postgres_type(base),
        Dialect::MySql => map_mysql_type(base, &lower),
        _ => map_generic_type(base),
    }
}

/// Whether the type fills itself from a sequence.
pub fn is_serial(sql_type: &str) -> bool {
    matches!(
        base_type(&sql_type.to_lowercase()),
        "serial" | "serial2" | "serial4" | "serial8" | "smallserial" | "bigserial"
    )
}

/// Scalar type of the generated model for a native column type.
pub fn emitted_type(sql_type: &str, dialect: Dialect) -> String {
    let trimmed = sql_type.trim();
    if let Some(inner) = trimmed.strip_suffix("[]") {
        return format!("{}[]", emitted_type(inner, dialect));
    }

    let canonical = normalize_type(trimmed, dialect);
    let scalar = match canonical.as_str() {
        "int" | "bigint" | "smallint" | "mediumint" | "tinyint" | "float" | "double"
        | "decimal" | "money" | "year" => "number",
        "varchar" | "char" | "text" | "uuid" | "citext" | "inet" | "cidr" | "macaddr"
        | "time" | "interval" | "xml" | "tsvector" => "string",
        "boolean" | "bit" => "boolean",
        "timestamp" | "date" => "Date",
        "json" => "object",
        "bytea" | "blob" | "binary" => "Buffer",
        "enum" | "set" => return enum_union(trimmed),
        _ => "any",
    };
    scalar.to_string()
}

/// `ENUM('a','b')` → `'a' | 'b'`
fn enum_union(sql_type: &str) -> String {
    let values: Vec<String> = ENUM_VALUE
        .captures_iter(sql_type)
        .map(|c| format!("'{}'", c[1].replace("''", "\\'")))
        .collect();
    if values.is_empty() {
        "string".to_string()
    } else {
        values.join(" | ")
    }
}

/// Type name without length, precision or MySQL attributes.
fn base_type(lower: &str) -> &str {
    let mut base = lower.split('(').next().unwrap_or(lower).trim();
    for attr in [" zerofill", " unsigned", " signed"] {
        base = base.strip_suffix(attr).unwrap_or(base).trim_end();
    }
    base
}

fn map_postgres_type(base: &str) -> String {
    match base {
        // Integer types
        "int" | "int4" | "integer" | "serial" | "serial4" => "int".to_string(),
        "bigint" | "int8" | "bigserial" | "serial8" => "bigint".to_string(),
        "smallint" | "int2" | "smallserial" | "serial2" => "smallint".to_string(),

        // Floating point
        "real" | "float4" => "float".to_string(),
        "double precision" | "float8" => "double".to_string(),
        "decimal" | "numeric" => "decimal".to_string(),
        "money" => "money".to_string(),

        // String types
        "varchar" | "character varying" => "varchar".to_string(),
        "char" | "character" | "bpchar" => "char".to_string(),
        "text" | "name" => "text".to_string(),
        "citext" => "citext".to_string(),

        // Date/time
        "timestamp" | "timestamptz" | "timestamp with time zone"
        | "timestamp without time zone" => "timestamp".to_string(),
        "date" => "date".to_string(),
        "time" | "timetz" | "time with time zone" | "time without time zone" => {
            "time".to_string()
        }
        "interval" => "interval".to_string(),

        // Boolean
        "boolean" | "bool" => "boolean".to_string(),

        // Binary
        "bytea" => "bytea".to_string(),

        // UUID
        "uuid" => "uuid".to_string(),

        // JSON
        "json" | "jsonb" => "json".to_string(),

        // Default: keep original
        _ => base.to_string(),
    }
}

fn map_mysql_type(base: &str, full: &str) -> String {
    match base {
        // Integer types
        "int" | "integer" => "int".to_string(),
        "bigint" | "serial" => "bigint".to_string(),
        "smallint" => "smallint".to_string(),
        "mediumint" => "mediumint".to_string(),
        "tinyint" => {
            // TINYINT(1) is the MySQL boolean
            if full.starts_with("tinyint(1)") {
                "boolean".to_string()
            } else {
                "tinyint".to_string()
            }
        }
        "bool" | "boolean" => "boolean".to_string(),
        "bit" => "bit".to_string(),

        // Floating point
        "float" | "real" => "float".to_string(),
        "double" | "double precision" => "double".to_string(),
        "decimal" | "numeric" | "dec" => "decimal".to_string(),

        // String types
        "varchar" => "varchar".to_string(),
        "char" => "char".to_string(),
        "text" | "longtext" | "mediumtext" | "tinytext" => "text".to_string(),

        // Date/time
        "datetime" | "timestamp" => "timestamp".to_string(),
        "date" => "date".to_string(),
        "time" => "time".to_string(),
        "year" => "year".to_string(),

        // Binary
        "blob" | "longblob" | "mediumblob" | "tinyblob" => "blob".to_string(),
        "binary" | "varbinary" => "binary".to_string(),

        // JSON
        "json" => "json".to_string(),

        // Enum/Set
        "enum" => "enum".to_string(),
        "set" => "set".to_string(),

        // Default
        _ => base.to_string(),
    }
}

fn map_generic_type(base: &str) -> String {
    match base {
        "int" | "integer" => "int".to_string(),
        "bigint" => "bigint".to_string(),
        "smallint" | "tinyint" => "smallint".to_string(),
        "real" | "float" => "float".to_string(),
        "double" | "double precision" => "double".to_string(),
        "decimal" | "numeric" => "decimal".to_string(),
        "varchar" | "character varying" | "nvarchar" => "varchar".to_string(),
        "char" | "character" | "nchar" => "char".to_string(),
        "text" | "clob" => "text".to_string(),
        "timestamp" | "datetime" => "timestamp".to_string(),
        "date" => "date".to_string(),
        "time" => "time".to_string(),
        "boolean" | "bool" => "boolean".to_string(),
        "blob" | "binary" | "varbinary" => "blob".to_string(),
        "uuid" => "uuid".to_string(),
        "json" => "json".to_string(),
        "enum" => "enum".to_string(),
        _ => base.to_string(),
    }
}
