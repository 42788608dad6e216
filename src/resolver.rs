//! Emitted property types: scalar mapping, nullability and per-column overrides.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Diagnostic;
use crate::model::{Field, TableData};
use crate::names::{ModelNames, lookup};
use crate::options::{AutoOptions, ColumnTypeOverride};
use crate::qname::QualifiedName;

/// Maps a native column type to the scalar type of the generated model.
pub trait TypeMapper {
    fn map_type(&self, native: &str) -> String;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedField {
    pub column: String,
    pub prop: String,
    /// Empty for virtual fields
    pub native_type: String,
    /// Emitted type, `| null` included
    pub ts_type: String,
    pub nullable: bool,
    pub optional: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub default_value: Option<String>,
    pub comment: Option<String>,
    /// Import path of an overridden type
    pub source: Option<String>,
    pub is_default_import: bool,
    pub is_virtual: bool,
}

/// Report overrides that point at tables or columns this run does not know.
pub fn check_overrides(td: &TableData, options: &AutoOptions, diagnostics: &mut Vec<Diagnostic>) {
    for (table, columns) in &options.type_overrides.tables {
        let Some(fields) = td
            .tables
            .iter()
            .find(|(name, _)| name.to_string() == *table)
            .map(|(_, fields)| fields)
        else {
            Diagnostic::MalformedOverride {
                table: table.clone(),
                column: None,
            }
            .emit(diagnostics);
            continue;
        };
        for column in columns.keys().filter(|c| !fields.contains_key(*c)) {
            Diagnostic::MalformedOverride {
                table: table.clone(),
                column: Some(column.clone()),
            }
            .emit(diagnostics);
        }
    }
}

/// Resolve the properties of every named table, columns first, then virtual fields.
pub fn resolve_fields<M: TypeMapper + ?Sized>(
    td: &TableData,
    names: &BTreeMap<QualifiedName, ModelNames>,
    options: &AutoOptions,
    mapper: &M,
) -> BTreeMap<QualifiedName, Vec<ResolvedField>> {
    let mut resolved = BTreeMap::new();

    for (table, model) in names {
        let Some(fields) = td.tables.get(table) else {
            continue;
        };
        let key = table.to_string();
        let mut props: Vec<ResolvedField> = fields
            .iter()
            .map(|(column, field)| {
                let prop = model.properties.get(column).cloned().unwrap_or_default();
                let ov = options.type_overrides.column(&key, column);
                resolve_column(column, prop, field, ov, options, mapper)
            })
            .collect();

        if let Some(virtuals) = lookup(&options.virtual_fields, table) {
            for (column, virtual_field) in virtuals.iter().filter(|(c, _)| !fields.contains_key(*c)) {
                props.push(ResolvedField {
                    column: column.clone(),
                    prop: model.properties.get(column).cloned().unwrap_or_default(),
                    ts_type: virtual_field.type_name.clone(),
                    is_virtual: true,
                    ..Default::default()
                });
            }
        }
        resolved.insert(table.clone(), props);
    }
    resolved
}

fn resolve_column<M: TypeMapper + ?Sized>(
    column: &str,
    prop: String,
    field: &Field,
    ov: Option<&ColumnTypeOverride>,
    options: &AutoOptions,
    mapper: &M,
) -> ResolvedField {
    let policy = options.type_overrides.nullable_field_type;
    let nullable = field.allow_null && !field.primary_key;

    let scalar = ov
        .and_then(|o| o.type_name.clone())
        .unwrap_or_else(|| mapper.map_type(&field.native_type));
    let ts_type = if nullable && policy.marks_null() {
        format!("{} | null", scalar)
    } else {
        scalar
    };
    let optional = ov
        .and_then(|o| o.is_optional)
        .unwrap_or(nullable && policy.marks_optional());

    ResolvedField {
        column: column.to_string(),
        prop,
        native_type: field.native_type.clone(),
        ts_type,
        nullable,
        optional,
        primary_key: field.primary_key,
        auto_increment: field.auto_increment,
        default_value: field.default_value.clone(),
        comment: field.comment.clone(),
        source: ov.and_then(|o| o.source.clone()),
        is_default_import: ov.and_then(|o| o.is_default).unwrap_or(false),
        is_virtual: false,
    }
}
