//! In-memory schema model for one generation run.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::qname::QualifiedName;

/// Columns of one table, in declaration order.
pub type TableFields = IndexMap<String, Field>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Field {
    /// Native database type, e.g. `VARCHAR(255)`
    #[serde(rename = "type")]
    pub native_type: String,
    pub allow_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
    pub auto_increment: bool,
    /// Column-level unique constraint
    pub unique: bool,
    pub comment: Option<String>,
}

impl Field {
    /// Values the database fills in by itself.
    pub fn is_generated(&self) -> bool {
        self.auto_increment || self.default_value.is_some()
    }
}

/// One foreign-key column. Columns sharing a constraint name form one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FkSpec {
    pub constraint_name: String,
    pub source_table: QualifiedName,
    pub source_column: String,
    pub target_table: QualifiedName,
    pub target_column: String,
    /// The source column is part of its table's primary key
    #[serde(default)]
    pub is_primary_key: bool,
    /// The source column alone is unique
    #[serde(default)]
    pub is_unique: bool,
    /// The source column is filled from a sequence
    #[serde(default)]
    pub is_serial_key: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexField {
    pub attribute: String,
    pub order: Option<String>,
    pub length: Option<u32>,
    pub collate: Option<String>,
}

/// Dialect-specific index details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dialect", rename_all = "camelCase")]
pub enum IndexExtra {
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    Postgres { indkey: String, definition: String },
    #[serde(rename_all = "camelCase")]
    MySql { table_name: String, index_type: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexSpec {
    pub name: String,
    pub primary: bool,
    pub unique: bool,
    pub fields: Vec<IndexField>,
    pub extra: IndexExtra,
}

impl IndexSpec {
    pub fn columns(&self) -> BTreeSet<&str> {
        self.fields.iter().map(|f| f.attribute.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToMany,
}

/// An association between two models, inferred from foreign keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// Table on the "one" side, e.g. customers
    pub parent_table: QualifiedName,
    /// e.g. Customer
    pub parent_model: String,
    /// Property on the child model that refers to the parent, e.g. customer
    pub parent_prop: String,
    /// Foreign key property, e.g. customerId
    pub parent_id: String,
    /// e.g. orders
    pub child_table: QualifiedName,
    /// e.g. Order
    pub child_model: String,
    /// Property on the parent model that refers to the children, e.g. orders
    pub child_prop: String,
    /// Foreign key towards the child (many-to-many only)
    pub child_id: Option<String>,
    /// Join model (many-to-many only)
    pub join_model: Option<String>,
    /// Join table (many-to-many only)
    pub join_table: Option<QualifiedName>,
    /// All key properties of a composite foreign key; empty for single-column keys
    pub key_columns: Vec<String>,
    pub constraint_name: String,
    pub is_one: bool,
    #[serde(rename = "isM2M")]
    pub is_m2m: bool,
}

impl Relation {
    pub fn kind(&self) -> RelationKind {
        match (self.is_one, self.is_m2m) {
            (_, true) => RelationKind::ManyToMany,
            (true, false) => RelationKind::OneToOne,
            (false, false) => RelationKind::OneToMany,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FkShape {
    Simple,
    Composite,
    SelfReferencing,
}

/// A foreign-key constraint with its columns grouped back together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub constraint_name: String,
    pub child: QualifiedName,
    pub parent: QualifiedName,
    /// (source column, target column) in declaration order
    pub columns: Vec<(String, String)>,
}

impl ForeignKey {
    pub fn shape(&self) -> FkShape {
        if self.child == self.parent {
            FkShape::SelfReferencing
        } else if self.columns.len() > 1 {
            FkShape::Composite
        } else {
            FkShape::Simple
        }
    }

    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }

    /// First source column; every key has at least one.
    pub fn first_column(&self) -> &str {
        &self.columns[0].0
    }

    pub fn source_columns(&self) -> BTreeSet<&str> {
        self.columns.iter().map(|(source, _)| source.as_str()).collect()
    }
}

/// Everything introspected about the schema, keyed by qualified table name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableData {
    pub tables: BTreeMap<QualifiedName, TableFields>,
    pub foreign_keys: BTreeMap<QualifiedName, IndexMap<String, FkSpec>>,
    pub has_trigger_tables: BTreeMap<QualifiedName, bool>,
    pub indexes: BTreeMap<QualifiedName, Vec<IndexSpec>>,
    #[serde(skip_deserializing)]
    pub relations: Vec<Relation>,
}

impl TableData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary key columns of `table`, from column flags and primary indexes.
    pub fn primary_key(&self, table: &QualifiedName) -> BTreeSet<&str> {
        let mut pk: BTreeSet<&str> = self
            .tables
            .get(table)
            .map(|fields| {
                fields
                    .iter()
                    .filter(|(_, f)| f.primary_key)
                    .map(|(name, _)| name.as_str())
                    .collect()
            })
            .unwrap_or_default();

        if let Some(indexes) = self.indexes.get(table) {
            for index in indexes.iter().filter(|i| i.primary) {
                pk.extend(index.columns());
            }
        }
        pk
    }

    /// Column sets carrying a unique constraint, excluding the primary key.
    pub fn unique_keys(&self, table: &QualifiedName) -> Vec<BTreeSet<&str>> {
        let mut keys: Vec<BTreeSet<&str>> = Vec::new();

        if let Some(fields) = self.tables.get(table) {
            for (name, _) in fields.iter().filter(|(_, f)| f.unique) {
                keys.push(BTreeSet::from([name.as_str()]));
            }
        }
        if let Some(indexes) = self.indexes.get(table) {
            for index in indexes.iter().filter(|i| i.unique && !i.primary) {
                let cols = index.columns();
                if !keys.contains(&cols) {
                    keys.push(cols);
                }
            }
        }
        keys
    }

    /// Foreign keys of `table`, grouped by constraint, in column order.
    pub fn foreign_key_groups(&self, table: &QualifiedName) -> Vec<ForeignKey> {
        let mut groups: Vec<ForeignKey> = Vec::new();
        let Some(specs) = self.foreign_keys.get(table) else {
            return groups;
        };

        for spec in specs.values() {
            let existing = groups.iter_mut().find(|g| {
                g.constraint_name == spec.constraint_name && g.parent == spec.target_table
            });
            match existing {
                Some(group) => group
                    .columns
                    .push((spec.source_column.clone(), spec.target_column.clone())),
                None => groups.push(ForeignKey {
                    constraint_name: spec.constraint_name.clone(),
                    child: table.clone(),
                    parent: spec.target_table.clone(),
                    columns: vec![(spec.source_column.clone(), spec.target_column.clone())],
                }),
            }
        }
        groups
    }

    /// Drop every table for which `keep` is false.
    ///
    /// Foreign keys of the remaining tables that point at dropped tables are
    /// left in place; relationship inference reports them.
    pub fn retain_tables(&mut self, mut keep: impl FnMut(&QualifiedName) -> bool) {
        self.tables.retain(|name, _| keep(name));
        let tables = &self.tables;
        self.foreign_keys.retain(|name, _| tables.contains_key(name));
        self.has_trigger_tables.retain(|name, _| tables.contains_key(name));
        self.indexes.retain(|name, _| tables.contains_key(name));
    }

    /// Tables collapsed into many-to-many relations.
    pub fn join_tables(&self) -> BTreeSet<&QualifiedName> {
        self.relations
            .iter()
            .filter_map(|r| r.join_table.as_ref())
            .collect()
    }

    pub fn has_trigger(&self, table: &QualifiedName) -> bool {
        self.has_trigger_tables.get(table).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(native_type: &str) -> Field {
        Field {
            native_type: native_type.to_string(),
            ..Default::default()
        }
    }

    fn fk(constraint: &str, column: &str, target: &str, target_column: &str) -> FkSpec {
        FkSpec {
            constraint_name: constraint.to_string(),
            source_table: QualifiedName::parse("order_lines"),
            source_column: column.to_string(),
            target_table: QualifiedName::parse(target),
            target_column: target_column.to_string(),
            is_primary_key: false,
            is_unique: false,
            is_serial_key: false,
        }
    }

    #[test]
    fn test_foreign_key_groups_composite() {
        let mut td = TableData::new();
        let lines = QualifiedName::parse("order_lines");
        td.foreign_keys.insert(
            lines.clone(),
            IndexMap::from([
                ("order_id".to_string(), fk("fk_line", "order_id", "orders", "id")),
                ("line_no".to_string(), fk("fk_line", "line_no", "orders", "no")),
                ("product_id".to_string(), fk("fk_prod", "product_id", "products", "id")),
            ]),
        );

        let groups = td.foreign_key_groups(&lines);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].columns.len(), 2);
        assert_eq!(groups[0].shape(), FkShape::Composite);
        assert_eq!(groups[1].shape(), FkShape::Simple);
        assert_eq!(groups[1].first_column(), "product_id");
    }

    #[test]
    fn test_primary_and_unique_keys() {
        let mut td = TableData::new();
        let users = QualifiedName::parse("users");
        let mut id = field("int");
        id.primary_key = true;
        let mut email = field("varchar");
        email.unique = true;
        td.tables.insert(
            users.clone(),
            IndexMap::from([("id".to_string(), id), ("email".to_string(), email)]),
        );
        td.indexes.insert(
            users.clone(),
            vec![IndexSpec {
                name: "users_name_org".to_string(),
                unique: true,
                fields: vec![
                    IndexField {
                        attribute: "name".to_string(),
                        ..Default::default()
                    },
                    IndexField {
                        attribute: "org".to_string(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
        );

        assert_eq!(td.primary_key(&users), BTreeSet::from(["id"]));
        let unique = td.unique_keys(&users);
        assert_eq!(unique.len(), 2);
        assert!(unique.contains(&BTreeSet::from(["name", "org"])));
    }

    #[test]
    fn test_retain_tables() {
        let mut td = TableData::new();
        for name in ["a", "b"] {
            let q = QualifiedName::parse(name);
            td.tables.insert(q.clone(), IndexMap::new());
            td.has_trigger_tables.insert(q, true);
        }
        td.retain_tables(|q| q.table() == "a");
        assert_eq!(td.tables.len(), 1);
        assert!(td.has_trigger(&QualifiedName::parse("a")));
        assert!(!td.has_trigger(&QualifiedName::parse("b")));
    }

    fn relation() -> Relation {
        Relation {
            parent_table: QualifiedName::parse("customers"),
            parent_model: "Customer".to_string(),
            parent_prop: "customer".to_string(),
            parent_id: "customerId".to_string(),
            child_table: QualifiedName::parse("orders"),
            child_model: "Order".to_string(),
            child_prop: "orders".to_string(),
            child_id: None,
            join_model: None,
            join_table: None,
            key_columns: vec![],
            constraint_name: "orders_customer_id_fkey".to_string(),
            is_one: false,
            is_m2m: false,
        }
    }

    #[test]
    fn test_relation_kind() {
        assert_eq!(relation().kind(), RelationKind::OneToMany);
    }

    #[test]
    fn test_relation_flags_serialize_camel_case() {
        let mut rel = relation();
        rel.is_m2m = true;
        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json["isM2M"], serde_json::Value::Bool(true));
        assert_eq!(json["isOne"], serde_json::Value::Bool(false));
        assert!(json.get("isM2m").is_none());
        assert_eq!(json["parentTable"], "customers");
    }
}
