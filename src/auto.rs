//! The generation pipeline.
//!
//! Stages run in a fixed order over one owned [`TableData`]:
//! validation, table filter, relationship inference, name resolution and
//! type resolution. A fatal error aborts the run and nothing partial is
//! returned; everything else ends up in [`Generated::diagnostics`].

use serde::Serialize;

use crate::error::{AutoError, Diagnostic};
use crate::model::{IndexSpec, TableData};
use crate::names::{ModelNames, resolve_names};
use crate::options::AutoOptions;
use crate::qname::QualifiedName;
use crate::relater::build_relations;
use crate::resolver::{ResolvedField, TypeMapper, check_overrides, resolve_fields};

/// One generated model, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub table: QualifiedName,
    pub model_name: String,
    pub file_name: String,
    pub has_trigger: bool,
    pub fields: Vec<ResolvedField>,
    pub indexes: Vec<IndexSpec>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Generated {
    pub table_data: TableData,
    /// Standalone models, sorted by table
    pub models: Vec<Model>,
    /// Tables folded into many-to-many relations; no standalone model
    pub join_tables: Vec<ModelNames>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Generated {
    pub fn model(&self, table: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.table.matches(table))
    }
}

pub fn generate<M: TypeMapper + ?Sized>(
    mut td: TableData,
    options: &AutoOptions,
    mapper: &M,
) -> Result<Generated, AutoError> {
    options.validate()?;

    let before = td.tables.len();
    filter_tables(&mut td, options);
    tracing::debug!(kept = td.tables.len(), skipped = before - td.tables.len(), "Filtered tables");

    let mut diagnostics = build_relations(&mut td, options);
    tracing::debug!(relations = td.relations.len(), "Inferred relations");

    let mut names = resolve_names(&td, options)?;
    check_overrides(&td, options, &mut diagnostics);
    let mut fields = resolve_fields(&td, &names, options, mapper);

    let join_tables: Vec<QualifiedName> = td.join_tables().into_iter().cloned().collect();
    let join_names = join_tables
        .iter()
        .filter_map(|table| names.remove(table))
        .collect();

    let models = names
        .into_values()
        .map(|n| Model {
            has_trigger: td.has_trigger(&n.table),
            fields: fields.remove(&n.table).unwrap_or_default(),
            indexes: td.indexes.get(&n.table).cloned().unwrap_or_default(),
            table: n.table,
            model_name: n.model_name,
            file_name: n.file_name,
        })
        .collect::<Vec<_>>();
    tracing::debug!(models = models.len(), join_tables = join_tables.len(), "Resolved models");

    Ok(Generated {
        table_data: td,
        models,
        join_tables: join_names,
        diagnostics,
    })
}

fn filter_tables(td: &mut TableData, options: &AutoOptions) {
    let listed = |names: &[String], table: &QualifiedName| names.iter().any(|n| table.matches(n));

    td.retain_tables(|table| {
        let in_schema = match (&options.schema, &table.schema) {
            (Some(wanted), Some(schema)) => wanted == schema,
            _ => true,
        };
        let included = options
            .tables
            .as_deref()
            .is_none_or(|names| listed(names, table));
        let skipped = options
            .skip_tables
            .as_deref()
            .is_some_and(|names| listed(names, table));
        in_schema && included && !skipped
    });
}
