//! Model, file and property names for every table of a run.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::Serialize;

use crate::case::recase;
use crate::error::AutoError;
use crate::model::TableData;
use crate::options::AutoOptions;
use crate::qname::QualifiedName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelNames {
    pub table: QualifiedName,
    pub model_name: String,
    pub file_name: String,
    /// column → property, virtual fields last
    pub properties: IndexMap<String, String>,
}

/// Name every table and check that names are unambiguous.
///
/// Two tables may not share a model name, and within one model no two
/// columns or relations may produce the same property.
pub fn resolve_names(
    td: &TableData,
    options: &AutoOptions,
) -> Result<BTreeMap<QualifiedName, ModelNames>, AutoError> {
    let mut names = BTreeMap::new();
    let mut models: HashMap<String, &QualifiedName> = HashMap::new();

    for (table, fields) in &td.tables {
        let model_name = recase(options.case_model, table.table(), options.singularize);
        if let Some(first) = models.insert(model_name.clone(), table) {
            return Err(AutoError::ModelNameCollision {
                model: model_name,
                first: first.clone(),
                second: table.clone(),
            });
        }

        let mut properties: IndexMap<String, String> = fields
            .keys()
            .map(|column| (column.clone(), recase(options.case_prop, column, false)))
            .collect();
        if let Some(virtuals) = lookup(&options.virtual_fields, table) {
            for column in virtuals.keys() {
                properties
                    .entry(column.clone())
                    .or_insert_with(|| recase(options.case_prop, column, false));
            }
        }

        names.insert(
            table.clone(),
            ModelNames {
                table: table.clone(),
                model_name,
                file_name: recase(options.case_file, table.table(), options.singularize),
                properties,
            },
        );
    }

    check_properties(td, &names)?;
    Ok(names)
}

/// Per-table options may be keyed bare or qualified.
pub(crate) fn lookup<'a, V>(map: &'a IndexMap<String, V>, table: &QualifiedName) -> Option<&'a V> {
    map.get(&table.to_string())
        .or_else(|| map.get(table.table()))
}

fn check_properties(
    td: &TableData,
    names: &BTreeMap<QualifiedName, ModelNames>,
) -> Result<(), AutoError> {
    // (table, prop) → what produced it
    let mut owners: HashMap<(QualifiedName, String), String> = HashMap::new();

    let mut claim = |table: &QualifiedName, prop: &str, source: String| -> Result<(), AutoError> {
        let Some(model) = names.get(table) else {
            return Ok(());
        };
        match owners.entry((model.table.clone(), prop.to_string())) {
            Entry::Occupied(first) => Err(AutoError::PropertyCollision {
                table: table.clone(),
                model: model.model_name.clone(),
                prop: prop.to_string(),
                first: first.get().clone(),
                second: source,
            }),
            Entry::Vacant(slot) => {
                slot.insert(source);
                Ok(())
            }
        }
    };

    for model in names.values() {
        for (column, prop) in &model.properties {
            claim(&model.table, prop, format!("column {}", column))?;
        }
    }

    for rel in &td.relations {
        let source = format!("relation {}", rel.constraint_name);
        // Each side's property lives on the opposite model.
        claim(&rel.child_table, &rel.parent_prop, source.clone())?;
        claim(&rel.parent_table, &rel.child_prop, source)?;
    }
    Ok(())
}
