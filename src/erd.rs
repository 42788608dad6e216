//! Text rendering of a generated model set in ERD notation.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use unicode_width::UnicodeWidthStr;

use crate::auto::{Generated, Model};
use crate::model::{FkSpec, IndexSpec, Relation, RelationKind};
use crate::qname::QualifiedName;

/// Model name and column → property map of one table.
type Names<'a> = HashMap<&'a QualifiedName, (&'a str, HashMap<&'a str, &'a str>)>;

/// Serialize generated models and their relations to ERD notation.
pub fn serialize(generated: &Generated) -> String {
    let names = collect_names(generated);
    let mut output = String::new();

    for (i, model) in generated.models.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        serialize_model(&mut output, model, generated, &names);
    }

    let relations = &generated.table_data.relations;
    if !relations.is_empty() {
        output.push_str("\nrel {\n");
        for rel in relations {
            serialize_relation(&mut output, rel);
        }
        output.push_str("}\n");
    }

    let arrangement = generate_arrangement(generated);
    if !arrangement.is_empty() {
        output.push_str("\n@hint.arrangement = {\n");
        for row in &arrangement {
            output.push_str("    ");
            output.push_str(&row.join(" "));
            output.push('\n');
        }
        output.push_str("}\n");
    }

    output
}

fn collect_names(generated: &Generated) -> Names<'_> {
    let mut names: Names<'_> = HashMap::new();
    for model in &generated.models {
        let props = model
            .fields
            .iter()
            .map(|f| (f.column.as_str(), f.prop.as_str()))
            .collect();
        names.insert(&model.table, (model.model_name.as_str(), props));
    }
    for join in &generated.join_tables {
        let props = join
            .properties
            .iter()
            .map(|(column, prop)| (column.as_str(), prop.as_str()))
            .collect();
        names.insert(&join.table, (join.model_name.as_str(), props));
    }
    names
}

/// Rows of model names, parents above their children.
fn generate_arrangement(generated: &Generated) -> Vec<Vec<String>> {
    if generated.models.is_empty() {
        return vec![];
    }

    let models: BTreeSet<&str> = generated
        .models
        .iter()
        .map(|m| m.model_name.as_str())
        .collect();

    // child -> parents
    let mut parents: BTreeMap<&str, BTreeSet<&str>> =
        models.iter().map(|m| (*m, BTreeSet::new())).collect();
    for rel in &generated.table_data.relations {
        if rel.is_m2m || rel.parent_model == rel.child_model {
            continue;
        }
        if models.contains(rel.parent_model.as_str()) {
            if let Some(deps) = parents.get_mut(rel.child_model.as_str()) {
                deps.insert(rel.parent_model.as_str());
            }
        }
    }

    // Level 0 = no parents
    let mut levels: BTreeMap<&str, usize> = parents
        .iter()
        .filter(|(_, deps)| deps.is_empty())
        .map(|(model, _)| (*model, 0))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for (model, deps) in &parents {
            if levels.contains_key(model) {
                continue;
            }
            let parent_levels: Vec<usize> = deps.iter().filter_map(|p| levels.get(p).copied()).collect();
            if parent_levels.len() == deps.len() {
                let level = parent_levels.iter().max().copied().unwrap_or(0) + 1;
                levels.insert(model, level);
                changed = true;
            }
        }
    }

    // Cycles go below everything else
    let max_level = levels.values().copied().max().unwrap_or(0);
    for model in &models {
        levels.entry(model).or_insert(max_level + 1);
    }

    let final_max_level = levels.values().copied().max().unwrap_or(0);
    let mut rows: Vec<Vec<String>> = vec![vec![]; final_max_level + 1];
    for (model, level) in &levels {
        rows[*level].push(model.to_string());
    }

    rows.into_iter().filter(|r| !r.is_empty()).collect()
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(text));
    format!("{}{}", text, " ".repeat(fill))
}

fn serialize_model(output: &mut String, model: &Model, generated: &Generated, names: &Names<'_>) {
    output.push_str(&format!("entity {} {{\n", model.model_name));

    let td = &generated.table_data;
    let pk = td.primary_key(&model.table);
    let composite_pk = pk.len() > 1;
    let foreign_keys = td.foreign_keys.get(&model.table);
    let columns = td.tables.get(&model.table);

    let prop_width = model
        .fields
        .iter()
        .map(|f| UnicodeWidthStr::width(f.prop.as_str()))
        .max()
        .unwrap_or(0);
    let type_width = model
        .fields
        .iter()
        .map(|f| UnicodeWidthStr::width(f.ts_type.as_str()))
        .max()
        .unwrap_or(0);

    for field in &model.fields {
        let mut modifiers = Vec::new();
        if field.is_virtual {
            modifiers.push("virtual".to_string());
        }
        if field.primary_key && !composite_pk {
            modifiers.push("pk".to_string());
        }
        if columns
            .and_then(|c| c.get(&field.column))
            .is_some_and(|c| c.unique)
        {
            modifiers.push("unique".to_string());
        }
        if !field.is_virtual && !field.nullable {
            modifiers.push("not null".to_string());
        }
        if field.auto_increment {
            modifiers.push("increment".to_string());
        }
        if let Some(fk) = foreign_keys.and_then(|fks| fks.get(&field.column)) {
            modifiers.push(format!("fk -> {}", fk_target(fk, names)));
        }
        if let Some(val) = &field.default_value {
            modifiers.push(format!("default {}", quote_default(val)));
        }
        if let Some(comment) = &field.comment {
            modifiers.push(format!(": \"{}\"", comment));
        }

        let line = format!(
            "    {} {} {}",
            pad(&field.prop, prop_width),
            pad(&field.ts_type, type_width),
            modifiers.join(" ")
        );
        output.push_str(line.trim_end());
        output.push('\n');
    }

    if composite_pk {
        let props: Vec<&str> = pk.iter().map(|c| prop_of(names, &model.table, c)).collect();
        output.push_str(&format!("    primary_key({})\n", props.join(", ")));
    }
    for index in model.indexes.iter().filter(|i| !i.primary) {
        serialize_index(output, index, model, names);
    }

    output.push_str("}\n");
}

fn prop_of<'a>(names: &Names<'a>, table: &QualifiedName, column: &'a str) -> &'a str {
    names
        .get(table)
        .and_then(|(_, props)| props.get(column).copied())
        .unwrap_or(column)
}

fn fk_target(fk: &FkSpec, names: &Names<'_>) -> String {
    match names.get(&fk.target_table) {
        Some((model, props)) => {
            let prop = props
                .get(fk.target_column.as_str())
                .copied()
                .unwrap_or(fk.target_column.as_str());
            format!("{}.{}", model, prop)
        }
        None => format!("{}.{}", fk.target_table, fk.target_column),
    }
}

fn quote_default(val: &str) -> String {
    // Function calls stay bare
    let is_function_call = val.contains('(') && val.ends_with(')');
    let needs_quote = !is_function_call && (val.is_empty() || val.contains(' ') || val.starts_with('\''));
    if needs_quote {
        format!("\"{}\"", val)
    } else {
        val.to_string()
    }
}

fn serialize_index(output: &mut String, index: &IndexSpec, model: &Model, names: &Names<'_>) {
    let props: Vec<&str> = index
        .fields
        .iter()
        .map(|f| prop_of(names, &model.table, f.attribute.as_str()))
        .collect();
    let kind = if index.unique { "unique" } else { "index" };
    output.push_str(&format!(
        "    {}({}) name = {}\n",
        kind,
        props.join(", "),
        index.name
    ));
}

fn serialize_relation(output: &mut String, rel: &Relation) {
    let line = match rel.kind() {
        RelationKind::OneToOne => format!(
            "    {} 1 -- 1 {} as {}",
            rel.parent_model, rel.child_model, rel.parent_prop
        ),
        RelationKind::OneToMany => format!(
            "    {} 1 -- * {} as {}",
            rel.parent_model, rel.child_model, rel.parent_prop
        ),
        RelationKind::ManyToMany => format!(
            "    {} * -- * {} through {}",
            rel.parent_model,
            rel.child_model,
            rel.join_model.as_deref().unwrap_or_default()
        ),
    };
    output.push_str(&line);
    output.push('\n');
}
