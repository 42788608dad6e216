//! Relationship inference from foreign keys.
//!
//! Every foreign key becomes a one-to-one or one-to-many [`Relation`]; pure
//! join tables collapse into a single many-to-many relation between the two
//! tables they link. Property names for both sides are assigned here, since
//! they depend on every other relation touching the same model.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::case::recase;
use crate::error::Diagnostic;
use crate::inflect::{pluralize, singularize};
use crate::model::{FkShape, ForeignKey, Relation, TableData};
use crate::options::AutoOptions;
use crate::qname::QualifiedName;

/// Fill `td.relations` from `td.foreign_keys` and return the diagnostics.
pub fn build_relations(td: &mut TableData, options: &AutoOptions) -> Vec<Diagnostic> {
    let mut relater = Relater::new(options);
    relater.run(td);
    td.relations = relater.relations;
    relater.diagnostics
}

struct Relater<'a> {
    options: &'a AutoOptions,
    /// `table.name` for every relation property already handed out, singular form
    used_names: HashSet<String>,
    relations: Vec<Relation>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Relater<'a> {
    fn new(options: &'a AutoOptions) -> Self {
        Self {
            options,
            used_names: HashSet::new(),
            relations: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn run(&mut self, td: &TableData) {
        let mut keys_by_table: Vec<(QualifiedName, Vec<ForeignKey>, bool)> = Vec::new();
        for child in td.tables.keys() {
            let mut keys = td.foreign_key_groups(child);
            // Judged on every declared key, including ones whose target is gone.
            let is_join = match keys.as_slice() {
                [first, second] => is_join_table(td, child, first, second),
                _ => false,
            };
            keys.retain(|fk| self.resolves(td, fk));
            if !keys.is_empty() {
                keys_by_table.push((child.clone(), keys, is_join));
            }
        }

        let mut pair_counts: HashMap<(&QualifiedName, &QualifiedName), usize> = HashMap::new();
        for (_, keys, _) in &keys_by_table {
            for fk in keys {
                *pair_counts.entry((&fk.child, &fk.parent)).or_default() += 1;
            }
        }

        for (child, keys, is_join) in &keys_by_table {
            if let ([first, second], true) = (keys.as_slice(), *is_join) {
                tracing::debug!(table = %child, "Collapsing join table into many-to-many relation");
                self.add_many_to_many(child, first, second);
                continue;
            }
            for fk in keys {
                let shared = pair_counts
                    .get(&(&fk.child, &fk.parent))
                    .is_some_and(|count| *count > 1);
                self.add_relation(td, fk, shared);
            }
        }
    }

    fn resolves(&mut self, td: &TableData, fk: &ForeignKey) -> bool {
        if td.tables.contains_key(&fk.parent) {
            return true;
        }
        Diagnostic::UnresolvedReference {
            table: fk.child.clone(),
            column: fk.first_column().to_string(),
            target: fk.parent.clone(),
        }
        .emit(&mut self.diagnostics);
        false
    }

    fn model_name(&self, table: &QualifiedName) -> String {
        recase(self.options.case_model, table.table(), self.options.singularize)
    }

    fn prop_name(&self, column: &str) -> String {
        recase(self.options.case_prop, column, false)
    }

    fn add_relation(&mut self, td: &TableData, fk: &ForeignKey, shared: bool) {
        let is_one = is_one(td, fk);

        let (parent_prop, child_prop) = if self.options.no_alias {
            let parent = recase(self.options.case_prop, fk.parent.table(), true);
            let child = recase(self.options.case_prop, fk.child.table(), true);
            (parent, if is_one { child } else { pluralize(&child) })
        } else {
            let parent = self.parent_alias(fk);
            let child = self.child_alias(fk, shared);
            (parent, if is_one { child } else { pluralize(&child) })
        };

        let key_columns = if fk.is_composite() {
            fk.columns
                .iter()
                .map(|(source, _)| self.prop_name(source))
                .collect()
        } else {
            Vec::new()
        };

        self.relations.push(Relation {
            parent_table: fk.parent.clone(),
            parent_model: self.model_name(&fk.parent),
            parent_prop,
            parent_id: self.prop_name(fk.first_column()),
            child_table: fk.child.clone(),
            child_model: self.model_name(&fk.child),
            child_prop,
            child_id: None,
            join_model: None,
            join_table: None,
            key_columns,
            constraint_name: fk.constraint_name.clone(),
            is_one,
            is_m2m: false,
        });
    }

    fn add_many_to_many(&mut self, join: &QualifiedName, first: &ForeignKey, second: &ForeignKey) {
        let (parent_prop, child_prop) = if self.options.no_alias {
            (
                pluralize(&recase(self.options.case_prop, first.parent.table(), true)),
                pluralize(&recase(self.options.case_prop, second.parent.table(), true)),
            )
        } else {
            (
                pluralize(&self.m2m_alias(first, &second.parent)),
                pluralize(&self.m2m_alias(second, &first.parent)),
            )
        };

        self.relations.push(Relation {
            parent_table: first.parent.clone(),
            parent_model: self.model_name(&first.parent),
            parent_prop,
            parent_id: self.prop_name(first.first_column()),
            child_table: second.parent.clone(),
            child_model: self.model_name(&second.parent),
            child_prop,
            child_id: Some(self.prop_name(second.first_column())),
            join_model: Some(self.model_name(join)),
            join_table: Some(join.clone()),
            key_columns: Vec::new(),
            constraint_name: first.constraint_name.clone(),
            is_one: false,
            is_m2m: true,
        });
    }

    /// Claim `name` on the model of `owner`.
    fn claim(&mut self, owner: &QualifiedName, name: &str) {
        self.used_names
            .insert(format!("{}.{}", owner, singularize(name)));
    }

    fn is_used(&self, owner: &QualifiedName, name: &str) -> bool {
        self.used_names
            .contains(&format!("{}.{}", owner, singularize(name)))
    }

    /// Property on the child model pointing at the parent, e.g. `customer` for `customer_id`.
    fn parent_alias(&mut self, fk: &ForeignKey) -> String {
        let column = fk.first_column();
        let mut name = match fk.shape() {
            FkShape::Composite => singularize(fk.parent.table()),
            FkShape::Simple | FkShape::SelfReferencing => self.trim_id(column),
        };
        if name == column {
            // The column keeps its own name as a property.
            name = format!("{}_{}", column, fk.parent.table());
        }
        if self.is_used(&fk.child, &name) {
            name = format!("{}_{}", name, fk.parent.table());
        }
        self.claim(&fk.child, &name);
        recase(self.options.case_prop, &name, true)
    }

    /// Property on the parent model pointing at the children, singular form.
    fn child_alias(&mut self, fk: &ForeignKey, shared: bool) -> String {
        let mut name = fk.child.table().to_string();
        if shared || self.is_used(&fk.parent, &name) {
            name = format!("{}_{}", self.trim_id(fk.first_column()), fk.child.table());
        }
        let name = singularize(&name);
        self.claim(&fk.parent, &name);
        recase(self.options.case_prop, &name, false)
    }

    /// Singular property on the model of `owner` pointing through the join table at `fk.parent`.
    fn m2m_alias(&mut self, fk: &ForeignKey, owner: &QualifiedName) -> String {
        let mut name = singularize(&self.trim_id(fk.first_column()));
        if name == fk.first_column() || self.is_used(owner, &name) {
            name = format!("{}_{}", name, fk.child.table());
        }
        self.claim(owner, &name);
        recase(self.options.case_prop, &name, true)
    }

    /// Strip a primary-key suffix (`_id`, `Id`, ...) from a column name.
    fn trim_id(&self, column: &str) -> String {
        let mut name = column.to_string();
        for suffix in &self.options.pk_suffixes {
            let tail = format!("_{}", suffix.to_lowercase());
            if name.len() > tail.len() && name.to_lowercase().ends_with(&tail) {
                name.truncate(name.len() - tail.len());
            }
        }
        if name.len() > 3 && name.to_lowercase().ends_with("id") {
            name.truncate(name.len() - 2);
        }
        name
    }
}

/// One-to-one when the key columns are the child's whole primary key or a unique key.
///
/// Key flags recorded on the foreign-key specs count as much as the column
/// and index definitions of the child table.
fn is_one(td: &TableData, fk: &ForeignKey) -> bool {
    let columns = fk.source_columns();
    let specs = td.foreign_keys.get(&fk.child);

    let mut pk = td.primary_key(&fk.child);
    if let Some(specs) = specs {
        pk.extend(
            specs
                .values()
                .filter(|spec| spec.is_primary_key)
                .map(|spec| spec.source_column.as_str()),
        );
    }
    if !pk.is_empty() && pk == columns {
        return true;
    }

    if let [(column, _)] = fk.columns.as_slice() {
        if specs
            .and_then(|specs| specs.get(column))
            .is_some_and(|spec| spec.is_unique)
        {
            return true;
        }
    }
    td.unique_keys(&fk.child).iter().any(|key| *key == columns)
}

/// A pure link between two other tables: no payload beyond generated columns,
/// a primary key that is either the two keys or entirely generated, and no
/// other table pointing at it.
fn is_join_table(
    td: &TableData,
    table: &QualifiedName,
    first: &ForeignKey,
    second: &ForeignKey,
) -> bool {
    if first.parent == second.parent
        || first.shape() == FkShape::SelfReferencing
        || second.shape() == FkShape::SelfReferencing
    {
        return false;
    }
    let referenced = td
        .foreign_keys
        .iter()
        .filter(|(other, _)| *other != table)
        .any(|(_, specs)| specs.values().any(|spec| spec.target_table == *table));
    if referenced {
        return false;
    }
    let Some(fields) = td.tables.get(table) else {
        return false;
    };

    let key_columns: BTreeSet<&str> = first
        .source_columns()
        .union(&second.source_columns())
        .copied()
        .collect();
    let pk = td.primary_key(table);

    let payload_free = fields
        .iter()
        .filter(|(name, _)| !key_columns.contains(name.as_str()))
        .all(|(_, field)| field.is_generated());
    let pk_is_link = pk.is_empty()
        || pk == key_columns
        || pk
            .iter()
            .all(|col| fields.get(*col).is_some_and(|f| f.is_generated()));

    payload_free && pk_is_link
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CaseOption;
    use crate::model::{Field, FkSpec, RelationKind};
    use crate::sql::{Dialect, SchemaIntrospector, introspector_for};
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn infer(sql: &str, options: &AutoOptions) -> (TableData, Vec<Diagnostic>) {
        let mut td = introspector_for(sql, Dialect::Generic).introspect().unwrap();
        let diagnostics = build_relations(&mut td, options);
        (td, diagnostics)
    }

    fn camel() -> AutoOptions {
        AutoOptions {
            case_model: CaseOption::Pascal,
            case_prop: CaseOption::Camel,
            ..Default::default()
        }
    }

    #[test]
    fn test_unique_fk_is_one_to_one() {
        let sql = r#"
            CREATE TABLE customers (id INT PRIMARY KEY, name TEXT);
            CREATE TABLE orders (
                id INT PRIMARY KEY,
                customer_id INT NOT NULL UNIQUE REFERENCES customers(id)
            );
        "#;
        let (td, diagnostics) = infer(sql, &camel());

        assert!(diagnostics.is_empty());
        assert_eq!(td.relations.len(), 1);
        let rel = &td.relations[0];
        assert!(rel.is_one);
        assert!(!rel.is_m2m);
        assert_eq!(rel.parent_table.to_string(), "customers");
        assert_eq!(rel.child_table.to_string(), "orders");
        assert_eq!(rel.parent_prop, "customer");
        assert_eq!(rel.child_prop, "order");
        assert_eq!(rel.parent_id, "customerId");
    }

    #[test]
    fn test_plain_fk_is_one_to_many() {
        let sql = r#"
            CREATE TABLE customers (id INT PRIMARY KEY);
            CREATE TABLE orders (id INT PRIMARY KEY, customer_id INT REFERENCES customers(id));
        "#;
        let (td, _) = infer(sql, &camel());

        let rel = &td.relations[0];
        assert_eq!(rel.kind(), RelationKind::OneToMany);
        assert_eq!(rel.parent_model, "Customers");
        assert_eq!(rel.child_model, "Orders");
        assert_eq!(rel.parent_prop, "customer");
        assert_eq!(rel.child_prop, "orders");
    }

    #[test]
    fn test_fk_as_whole_primary_key_is_one_to_one() {
        let sql = r#"
            CREATE TABLE employees (id INT PRIMARY KEY);
            CREATE TABLE employee_details (
                employee_id INT PRIMARY KEY REFERENCES employees(id),
                bio TEXT
            );
        "#;
        let (td, _) = infer(sql, &camel());

        assert_eq!(td.relations.len(), 1);
        assert!(td.relations[0].is_one);
        assert_eq!(td.relations[0].child_prop, "employeeDetail");
    }

    #[test]
    fn test_join_table_collapses_to_many_to_many() {
        let sql = r#"
            CREATE TABLE posts (id INT PRIMARY KEY, title TEXT);
            CREATE TABLE tags (id INT PRIMARY KEY, label TEXT);
            CREATE TABLE post_tags (
                post_id INT NOT NULL REFERENCES posts(id),
                tag_id INT NOT NULL REFERENCES tags(id),
                PRIMARY KEY (post_id, tag_id)
            );
        "#;
        let (td, _) = infer(sql, &camel());

        assert_eq!(td.relations.len(), 1);
        let rel = &td.relations[0];
        assert!(rel.is_m2m);
        assert!(!rel.is_one);
        assert_eq!(rel.parent_table.to_string(), "posts");
        assert_eq!(rel.child_table.to_string(), "tags");
        assert_eq!(rel.join_model.as_deref(), Some("PostTags"));
        assert_eq!(rel.parent_id, "postId");
        assert_eq!(rel.child_id.as_deref(), Some("tagId"));
        assert_eq!(rel.parent_prop, "posts");
        assert_eq!(rel.child_prop, "tags");

        let join_tables: Vec<String> = td.join_tables().iter().map(|q| q.to_string()).collect();
        assert_eq!(join_tables, vec!["post_tags"]);
    }

    #[test]
    fn test_join_table_with_payload_keeps_its_model() {
        let sql = r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE groups (id INT PRIMARY KEY);
            CREATE TABLE memberships (
                user_id INT NOT NULL REFERENCES users(id),
                group_id INT NOT NULL REFERENCES groups(id),
                role VARCHAR(20) NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (user_id, group_id)
            );
        "#;
        let (td, _) = infer(sql, &camel());

        assert_eq!(td.relations.len(), 2);
        assert!(td.relations.iter().all(|r| r.kind() == RelationKind::OneToMany));
        assert!(td.join_tables().is_empty());
    }

    #[test]
    fn test_join_table_with_surrogate_serial_key() {
        let sql = r#"
            CREATE TABLE posts (id INT PRIMARY KEY);
            CREATE TABLE tags (id INT PRIMARY KEY);
            CREATE TABLE post_tags (
                id INT AUTO_INCREMENT PRIMARY KEY,
                post_id INT NOT NULL REFERENCES posts(id),
                tag_id INT NOT NULL REFERENCES tags(id),
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
        "#;
        let (td, _) = infer(sql, &camel());

        assert_eq!(td.relations.len(), 1);
        assert!(td.relations[0].is_m2m);
    }

    #[test]
    fn test_self_reference_has_distinct_props() {
        let sql = r#"
            CREATE TABLE employees (
                id INT PRIMARY KEY,
                manager_id INT REFERENCES employees(id)
            );
        "#;
        let (td, _) = infer(sql, &camel());

        assert_eq!(td.relations.len(), 1);
        let rel = &td.relations[0];
        assert_eq!(rel.parent_prop, "manager");
        assert_eq!(rel.child_prop, "employees");
        assert_ne!(rel.parent_prop, rel.child_prop);
    }

    #[test]
    fn test_self_reference_twice() {
        let sql = r#"
            CREATE TABLE employees (
                id INT PRIMARY KEY,
                manager_id INT REFERENCES employees(id),
                mentor_id INT REFERENCES employees(id)
            );
        "#;
        let (td, _) = infer(sql, &camel());

        let props: Vec<(&str, &str)> = td
            .relations
            .iter()
            .map(|r| (r.parent_prop.as_str(), r.child_prop.as_str()))
            .collect();
        assert_eq!(
            props,
            vec![
                ("manager", "managerEmployees"),
                ("mentor", "mentorEmployees")
            ]
        );
    }

    #[test]
    fn test_two_fks_to_same_parent_are_disambiguated() {
        let sql = r#"
            CREATE TABLE addresses (id INT PRIMARY KEY, street TEXT);
            CREATE TABLE shipments (
                id INT PRIMARY KEY,
                origin_id INT NOT NULL REFERENCES addresses(id),
                dest_id INT NOT NULL REFERENCES addresses(id)
            );
        "#;
        let (td, _) = infer(sql, &camel());

        assert_eq!(td.relations.len(), 2);
        let origin = &td.relations[0];
        let dest = &td.relations[1];
        assert_eq!(origin.parent_prop, "origin");
        assert_eq!(dest.parent_prop, "dest");
        assert_eq!(origin.child_prop, "originShipments");
        assert_eq!(dest.child_prop, "destShipments");
        assert_eq!(origin.parent_id, "originId");
        assert_eq!(dest.parent_id, "destId");
    }

    #[test]
    fn test_missing_target_is_dropped_with_diagnostic() {
        let sql = r#"
            CREATE TABLE orders (id INT PRIMARY KEY, customer_id INT REFERENCES customers(id));
        "#;
        let (td, diagnostics) = infer(sql, &camel());

        assert!(td.relations.is_empty());
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnresolvedReference {
                table: QualifiedName::parse("orders"),
                column: "customer_id".to_string(),
                target: QualifiedName::parse("customers"),
            }]
        );
    }

    #[test]
    fn test_no_alias_uses_table_names() {
        let sql = r#"
            CREATE TABLE customers (id INT PRIMARY KEY);
            CREATE TABLE orders (id INT PRIMARY KEY, buyer_id INT REFERENCES customers(id));
        "#;
        let options = AutoOptions {
            no_alias: true,
            ..camel()
        };
        let (td, _) = infer(sql, &options);

        let rel = &td.relations[0];
        assert_eq!(rel.parent_prop, "customer");
        assert_eq!(rel.child_prop, "orders");
        assert!(!rel.is_one);
    }

    #[test]
    fn test_composite_fk_is_one_relation() {
        let sql = r#"
            CREATE TABLE orders (
                order_no INT,
                region VARCHAR(4),
                PRIMARY KEY (order_no, region)
            );
            CREATE TABLE invoices (
                id INT PRIMARY KEY,
                order_no INT NOT NULL,
                region VARCHAR(4) NOT NULL,
                CONSTRAINT fk_invoice_order FOREIGN KEY (order_no, region)
                    REFERENCES orders(order_no, region)
            );
        "#;
        let (td, _) = infer(sql, &camel());

        assert_eq!(td.relations.len(), 1);
        let rel = &td.relations[0];
        assert_eq!(rel.constraint_name, "fk_invoice_order");
        assert_eq!(rel.key_columns, vec!["orderNo", "region"]);
        assert_eq!(rel.parent_prop, "order");
        assert_eq!(rel.child_prop, "invoices");
        assert!(!rel.is_one);
    }

    #[test]
    fn test_column_without_id_suffix_keeps_column_prop_free() {
        let sql = r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE posts (id INT PRIMARY KEY, author INT REFERENCES users(id));
        "#;
        let (td, _) = infer(sql, &camel());

        assert_eq!(td.relations[0].parent_prop, "authorUser");
        assert_eq!(td.relations[0].parent_id, "author");
    }

    #[test]
    fn test_relation_order_is_stable() {
        let sql = r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE posts (id INT PRIMARY KEY, user_id INT REFERENCES users(id));
            CREATE TABLE comments (
                id INT PRIMARY KEY,
                post_id INT REFERENCES posts(id),
                user_id INT REFERENCES users(id)
            );
        "#;
        let (first, _) = infer(sql, &camel());
        let (second, _) = infer(sql, &camel());

        assert_eq!(first.relations, second.relations);
        let children: Vec<String> = first
            .relations
            .iter()
            .map(|r| format!("{}->{}", r.child_table, r.parent_table))
            .collect();
        assert_eq!(children, vec!["comments->posts", "comments->users", "posts->users"]);
    }

    #[test]
    fn test_self_referencing_link_is_not_a_join_table() {
        let sql = r#"
            CREATE TABLE trees (id INT PRIMARY KEY);
            CREATE TABLE nodes (
                id INT AUTO_INCREMENT PRIMARY KEY,
                parent_id INT REFERENCES nodes(id),
                tree_id INT REFERENCES trees(id)
            );
        "#;
        let (td, _) = infer(sql, &camel());

        assert!(td.join_tables().is_empty());
        assert_eq!(td.relations.len(), 2);
        assert!(td.relations.iter().all(|r| r.kind() == RelationKind::OneToMany));
        assert_eq!(td.relations[0].parent_prop, "parent");
        assert_eq!(td.relations[1].parent_prop, "tree");
    }

    #[test]
    fn test_referenced_join_table_keeps_its_model() {
        let sql = r#"
            CREATE TABLE posts (id INT PRIMARY KEY);
            CREATE TABLE tags (id INT PRIMARY KEY);
            CREATE TABLE post_tags (
                post_id INT NOT NULL REFERENCES posts(id),
                tag_id INT NOT NULL REFERENCES tags(id),
                PRIMARY KEY (post_id, tag_id)
            );
            CREATE TABLE tag_votes (
                id INT PRIMARY KEY,
                post_id INT NOT NULL,
                tag_id INT NOT NULL,
                CONSTRAINT fk_vote_tagging FOREIGN KEY (post_id, tag_id)
                    REFERENCES post_tags(post_id, tag_id)
            );
        "#;
        let (td, _) = infer(sql, &camel());

        assert!(td.join_tables().is_empty());
        assert!(td.relations.iter().all(|r| !r.is_m2m));
        let edges: Vec<String> = td
            .relations
            .iter()
            .map(|r| format!("{}->{}", r.child_table, r.parent_table))
            .collect();
        assert_eq!(
            edges,
            vec!["post_tags->posts", "post_tags->tags", "tag_votes->post_tags"]
        );
    }

    #[test]
    fn test_third_key_to_skipped_table_blocks_join_collapse() {
        let sql = r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE posts (id INT PRIMARY KEY);
            CREATE TABLE tags (id INT PRIMARY KEY);
            CREATE TABLE post_tags (
                post_id INT NOT NULL REFERENCES posts(id),
                tag_id INT NOT NULL REFERENCES tags(id),
                added_by INT DEFAULT 0 REFERENCES users(id),
                PRIMARY KEY (post_id, tag_id)
            );
        "#;
        let mut td = introspector_for(sql, Dialect::Generic).introspect().unwrap();
        td.retain_tables(|q| q.table() != "users");
        let diagnostics = build_relations(&mut td, &camel());

        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnresolvedReference {
                table: QualifiedName::parse("post_tags"),
                column: "added_by".to_string(),
                target: QualifiedName::parse("users"),
            }]
        );
        assert!(td.join_tables().is_empty());
        assert_eq!(td.relations.len(), 2);
        assert!(td.relations.iter().all(|r| r.kind() == RelationKind::OneToMany));
    }

    fn spec(table: &QualifiedName, column: &str, target: &QualifiedName) -> FkSpec {
        FkSpec {
            constraint_name: format!("{}_{}_fkey", table, column),
            source_table: table.clone(),
            source_column: column.to_string(),
            target_table: target.clone(),
            target_column: "id".to_string(),
            is_primary_key: false,
            is_unique: false,
            is_serial_key: false,
        }
    }

    /// `customers` and a child table whose only key information is on its foreign-key spec.
    fn flagged(child: &str, column: &str, flag: impl FnOnce(&mut FkSpec)) -> TableData {
        let mut td = TableData::new();
        let customers = QualifiedName::parse("customers");
        let child = QualifiedName::parse(child);
        let mut fk = spec(&child, column, &customers);
        flag(&mut fk);

        td.tables.insert(
            customers.clone(),
            IndexMap::from([("id".to_string(), Field::default())]),
        );
        td.tables.insert(
            child.clone(),
            IndexMap::from([
                (column.to_string(), Field::default()),
                ("note".to_string(), Field::default()),
            ]),
        );
        td.foreign_keys
            .insert(child, IndexMap::from([(column.to_string(), fk)]));
        td
    }

    #[test]
    fn test_unique_flag_on_fk_spec_is_one_to_one() {
        let mut td = flagged("accounts", "customer_id", |fk| fk.is_unique = true);
        let diagnostics = build_relations(&mut td, &camel());

        assert!(diagnostics.is_empty());
        assert_eq!(td.relations.len(), 1);
        assert!(td.relations[0].is_one);
        assert_eq!(td.relations[0].child_prop, "account");
    }

    #[test]
    fn test_primary_key_flag_on_fk_spec_is_one_to_one() {
        let mut td = flagged("customer_details", "customer_id", |fk| fk.is_primary_key = true);
        build_relations(&mut td, &camel());
        assert!(td.relations[0].is_one);

        let mut td = flagged("orders", "customer_id", |_| {});
        build_relations(&mut td, &camel());
        assert!(!td.relations[0].is_one);
    }
}
