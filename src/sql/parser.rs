//! DDL parser building the schema model from a SQL dump.

use indexmap::IndexMap;
use thiserror::Error;

use super::dialect::Dialect;
use super::lexer::{LexError, Lexer, Spanned, Token};
use super::types::is_serial;
use crate::model::{Field, FkSpec, IndexExtra, IndexField, IndexSpec, TableData};
use crate::qname::QualifiedName;

#[derive(Debug, Error)]
pub enum SqlParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("Line {line}: expected {expected}, found {found:?}")]
    Expected {
        expected: String,
        found: Token,
        line: usize,
    },
    #[error("Unexpected end of input, expected {0}")]
    UnexpectedEof(String),
}

/// Parse a SQL dump into table data.
pub fn parse_sql(input: &str, dialect: Dialect) -> Result<TableData, SqlParseError> {
    let dialect = dialect.resolve(input);
    let tokens = Lexer::new(input).tokenize()?;
    let td = Parser::new(tokens, dialect).parse()?;
    tracing::debug!(
        ?dialect,
        tables = td.tables.len(),
        foreign_keys = td.foreign_keys.values().map(|fks| fks.len()).sum::<usize>(),
        "Parsed SQL dump"
    );
    Ok(td)
}

/// A constraint from a column definition, a table body or `ALTER TABLE`.
#[derive(Debug)]
enum TableConstraint {
    PrimaryKey {
        name: Option<String>,
        fields: Vec<IndexField>,
    },
    Unique {
        name: Option<String>,
        fields: Vec<IndexField>,
    },
    Index {
        name: Option<String>,
        unique: bool,
        fields: Vec<IndexField>,
        method: Option<String>,
    },
    ForeignKey {
        name: Option<String>,
        columns: Vec<String>,
        target: QualifiedName,
        target_columns: Vec<String>,
    },
}

struct Parser {
    tokens: Vec<Token>,
    /// Start line of each token
    lines: Vec<usize>,
    pos: usize,
    dialect: Dialect,
    td: TableData,
}

fn is_ident(token: &Token, word: &str) -> bool {
    matches!(token, Token::Ident(s) if s.eq_ignore_ascii_case(word))
}

/// Join type or expression fragments, spacing only between words.
fn join_parts(parts: &[String]) -> String {
    let is_word = |p: &str| !matches!(p, "(" | ")" | "," | "[]" | "::");
    let mut out = String::new();
    let mut prev: Option<&str> = None;
    for part in parts {
        if let Some(prev) = prev {
            if is_word(part) && (is_word(prev) || prev == ")") {
                out.push(' ');
            }
        }
        out.push_str(part);
        prev = Some(part);
    }
    out
}

impl Parser {
    fn new(spanned: Vec<Spanned>, dialect: Dialect) -> Self {
        let (tokens, lines) = spanned.into_iter().unzip();
        Self {
            tokens,
            lines,
            pos: 0,
            dialect,
            td: TableData::new(),
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos + 1).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn expected(&self, what: &str) -> SqlParseError {
        match self.current() {
            Token::Eof => SqlParseError::UnexpectedEof(what.to_string()),
            found => SqlParseError::Expected {
                expected: what.to_string(),
                found: found.clone(),
                line: self.lines.get(self.pos).copied().unwrap_or_default(),
            },
        }
    }

    fn at_ident(&self, word: &str) -> bool {
        is_ident(self.current(), word)
    }

    fn take_ident(&mut self) -> Option<String> {
        match self.current() {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        }
    }

    fn parse(mut self) -> Result<TableData, SqlParseError> {
        while self.current() != &Token::Eof {
            match self.current() {
                Token::Create => self.parse_create()?,
                Token::Alter => self.parse_alter_table()?,
                Token::Ident(s) if s.eq_ignore_ascii_case("COMMENT") => self.parse_comment(),
                Token::Semicolon => self.advance(),
                _ => self.skip_statement(),
            }
        }
        self.finish();
        Ok(self.td)
    }

    fn parse_create(&mut self) -> Result<(), SqlParseError> {
        self.advance(); // CREATE
        let mut unique = false;

        loop {
            match self.current() {
                Token::Table => {
                    self.advance();
                    self.skip_if_not_exists();
                    return self.parse_create_table();
                }
                Token::Index => {
                    self.advance();
                    return self.parse_create_index(unique);
                }
                Token::Unique => {
                    unique = true;
                    self.advance();
                }
                Token::Ident(s) if s.eq_ignore_ascii_case("TRIGGER") => {
                    self.advance();
                    self.parse_create_trigger();
                    return Ok(());
                }
                Token::Ident(s)
                    if [
                        "VIEW", "FUNCTION", "PROCEDURE", "SEQUENCE", "TYPE", "SCHEMA",
                        "EXTENSION", "DATABASE", "DOMAIN", "EVENT", "MATERIALIZED",
                    ]
                    .iter()
                    .any(|kw| s.eq_ignore_ascii_case(kw)) =>
                {
                    self.skip_statement();
                    return Ok(());
                }
                // OR REPLACE, TEMPORARY, UNLOGGED, DEFINER=..., CONSTRAINT (trigger)
                Token::Ident(_) | Token::Constraint => self.advance(),
                _ => {
                    self.skip_statement();
                    return Ok(());
                }
            }
        }
    }

    fn skip_if_not_exists(&mut self) {
        if self.current() == &Token::If {
            self.advance(); // IF
            if self.current() == &Token::Not {
                self.advance(); // NOT
            }
            if self.current() == &Token::Exists {
                self.advance(); // EXISTS
            }
        }
    }

    /// `name` or `schema.name`; a missing schema is taken from `default_schema`.
    fn parse_qualified_name(&mut self, default_schema: Option<&str>) -> Option<QualifiedName> {
        let first = self.take_ident()?;
        if self.current() == &Token::Dot {
            self.advance();
            let table = self.take_ident()?;
            return Some(QualifiedName::new(Some(&first), &table));
        }
        Some(QualifiedName::new(default_schema, &first))
    }

    fn parse_create_table(&mut self) -> Result<(), SqlParseError> {
        let Some(table) = self.parse_qualified_name(None) else {
            self.skip_statement();
            return Ok(());
        };
        if self.current() != &Token::LParen {
            // CREATE TABLE ... AS / LIKE / PARTITION OF
            self.skip_statement();
            return Ok(());
        }
        self.advance();

        let mut fields: IndexMap<String, Field> = IndexMap::new();
        let mut constraints = Vec::new();

        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Comma => {
                    self.advance();
                }
                Token::Constraint => {
                    self.advance();
                    let name = self.take_ident();
                    constraints.extend(self.parse_table_constraint(name, &table)?);
                }
                Token::Primary | Token::Foreign | Token::Unique | Token::Index | Token::Key
                | Token::Check => {
                    constraints.extend(self.parse_table_constraint(None, &table)?);
                }
                Token::Ident(s)
                    if ["FULLTEXT", "SPATIAL", "EXCLUDE", "LIKE"]
                        .iter()
                        .any(|kw| s.eq_ignore_ascii_case(kw)) =>
                {
                    self.skip_until(&[Token::Comma, Token::RParen]);
                }
                Token::Ident(_) => {
                    if let Some((name, field, inline)) = self.parse_column(&table)? {
                        fields.insert(name, field);
                        constraints.extend(inline);
                    }
                }
                Token::Eof => break,
                _ => {
                    self.advance();
                }
            }
        }

        // Table options (ENGINE=, COMMENT=, ...)
        self.skip_statement();

        self.td.tables.insert(table.clone(), fields);
        for constraint in constraints {
            self.apply_constraint(&table, constraint);
        }
        Ok(())
    }

    fn parse_column(
        &mut self,
        table: &QualifiedName,
    ) -> Result<Option<(String, Field, Vec<TableConstraint>)>, SqlParseError> {
        let name = match self.current() {
            Token::Ident(n) => n.clone(),
            _ => return Ok(None),
        };
        self.advance();

        // Type
        let mut type_parts = Vec::new();
        let mut paren_depth = 0;

        loop {
            match self.current() {
                Token::Ident(t)
                    if paren_depth == 0
                        && ["COLLATE", "COMMENT", "GENERATED", "CHARSET"]
                            .iter()
                            .any(|kw| t.eq_ignore_ascii_case(kw)) =>
                {
                    break;
                }
                Token::Ident(t)
                    if paren_depth == 0
                        && t.eq_ignore_ascii_case("CHARACTER")
                        && is_ident(self.peek(), "SET") =>
                {
                    break;
                }
                Token::Ident(t) => {
                    type_parts.push(t.clone());
                    self.advance();
                }
                Token::LParen => {
                    paren_depth += 1;
                    type_parts.push("(".to_string());
                    self.advance();
                }
                Token::RParen if paren_depth > 0 => {
                    paren_depth -= 1;
                    type_parts.push(")".to_string());
                    self.advance();
                }
                Token::Num(n) => {
                    type_parts.push(n.clone());
                    self.advance();
                }
                Token::Str(s) if paren_depth > 0 => {
                    type_parts.push(format!("'{}'", s.replace('\'', "''")));
                    self.advance();
                }
                Token::Comma if paren_depth > 0 => {
                    type_parts.push(",".to_string());
                    self.advance();
                }
                Token::ArraySuffix => {
                    type_parts.push("[]".to_string());
                    self.advance();
                }
                _ => break,
            }
        }

        if type_parts.is_empty() {
            return Ok(None);
        }

        let native_type = join_parts(&type_parts);
        let mut field = Field {
            auto_increment: is_serial(&native_type),
            native_type,
            allow_null: true,
            ..Default::default()
        };
        let mut constraints = Vec::new();
        let mut constraint_name: Option<String> = None;

        // Modifiers
        loop {
            match self.current() {
                Token::Primary => {
                    self.advance();
                    if self.current() == &Token::Key {
                        self.advance();
                    }
                    field.primary_key = true;
                    field.allow_null = false;
                    constraints.push(TableConstraint::PrimaryKey {
                        name: constraint_name.take(),
                        fields: vec![IndexField {
                            attribute: name.clone(),
                            ..Default::default()
                        }],
                    });
                }
                Token::Not => {
                    self.advance();
                    if self.current() == &Token::Null {
                        self.advance();
                        field.allow_null = false;
                    }
                }
                Token::Null => {
                    self.advance();
                }
                Token::Unique => {
                    self.advance();
                    if self.current() == &Token::Key {
                        self.advance();
                    }
                    field.unique = true;
                    constraint_name = None;
                }
                Token::Default => {
                    self.advance();
                    field.default_value = self.parse_default_value();
                    if field
                        .default_value
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().starts_with("nextval("))
                    {
                        field.auto_increment = true;
                    }
                }
                Token::References => {
                    // Inline FK reference
                    self.advance();
                    let (target, target_columns) = self.parse_reference(table)?;
                    constraints.push(TableConstraint::ForeignKey {
                        name: constraint_name.take(),
                        columns: vec![name.clone()],
                        target,
                        target_columns,
                    });
                    self.skip_on_actions();
                }
                Token::AutoIncrement => {
                    self.advance();
                    field.auto_increment = true;
                }
                Token::Check => {
                    self.advance();
                    self.skip_parenthesized();
                }
                Token::Constraint => {
                    self.advance();
                    constraint_name = self.take_ident();
                }
                Token::On => {
                    // ON UPDATE CURRENT_TIMESTAMP and inline FK actions
                    self.skip_on_actions();
                }
                Token::Ident(s) if s.eq_ignore_ascii_case("COMMENT") => {
                    self.advance();
                    if let Token::Str(comment) = self.current() {
                        field.comment = Some(comment.clone());
                        self.advance();
                    }
                }
                Token::Ident(s) if s.eq_ignore_ascii_case("COLLATE") => {
                    self.advance();
                    self.advance();
                }
                Token::Ident(s) if s.eq_ignore_ascii_case("GENERATED") => {
                    self.advance();
                    if self.parse_generated() {
                        field.auto_increment = true;
                    }
                }
                Token::Comma | Token::RParen | Token::Semicolon | Token::Eof => break,
                _ => {
                    self.advance();
                }
            }
        }

        Ok(Some((name, field, constraints)))
    }

    /// After GENERATED: true for identity columns, false for computed ones.
    fn parse_generated(&mut self) -> bool {
        while self.at_ident("ALWAYS")
            || self.at_ident("BY")
            || self.at_ident("AS")
            || self.current() == &Token::Default
        {
            self.advance();
        }
        if self.at_ident("IDENTITY") {
            self.advance();
            if self.current() == &Token::LParen {
                self.skip_parenthesized();
            }
            return true;
        }
        if self.current() == &Token::LParen {
            self.skip_parenthesized();
        }
        false
    }

    fn parse_default_value(&mut self) -> Option<String> {
        let value = match self.current() {
            Token::Str(s) => {
                let val = s.clone();
                self.advance();
                Some(val)
            }
            Token::Num(n) => {
                let val = n.clone();
                self.advance();
                Some(val)
            }
            Token::Null => {
                self.advance();
                None
            }
            Token::Ident(s) => {
                let mut val = s.clone();
                self.advance();
                // Function calls like NOW()
                if self.current() == &Token::LParen {
                    self.advance();
                    val.push('(');
                    val.push_str(&self.collect_until_paren());
                    val.push(')');
                }
                Some(val)
            }
            Token::LParen => {
                // Expression in parentheses
                self.advance();
                Some(format!("({})", self.collect_until_paren()))
            }
            _ => None,
        };

        // 'active'::character varying
        while self.current() == &Token::Cast {
            self.advance();
            while matches!(self.current(), Token::Ident(_) | Token::ArraySuffix) {
                self.advance();
            }
            if self.current() == &Token::LParen {
                self.skip_parenthesized();
            }
        }
        value
    }

    /// Collect tokens up to the closing parenthesis, which is consumed.
    fn collect_until_paren(&mut self) -> String {
        let mut parts = Vec::new();
        let mut depth = 1;

        loop {
            match self.current() {
                Token::LParen => {
                    depth += 1;
                    parts.push("(".to_string());
                }
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        break;
                    }
                    parts.push(")".to_string());
                }
                Token::Ident(s) | Token::Num(s) => parts.push(s.clone()),
                Token::Str(s) => parts.push(format!("'{}'", s)),
                Token::Comma => parts.push(",".to_string()),
                Token::Cast => parts.push("::".to_string()),
                Token::Null => parts.push("NULL".to_string()),
                Token::Eof | Token::Semicolon => break,
                _ => {}
            }
            self.advance();
        }

        join_parts(&parts)
    }

    /// `table [(col, ...)]` after REFERENCES; unqualified targets share the source schema.
    fn parse_reference(
        &mut self,
        source: &QualifiedName,
    ) -> Result<(QualifiedName, Vec<String>), SqlParseError> {
        let Some(target) = self.parse_qualified_name(source.schema.as_deref()) else {
            return Err(self.expected("referenced table"));
        };
        let columns = self.parse_column_list();
        Ok((target, columns))
    }

    fn parse_table_constraint(
        &mut self,
        name: Option<String>,
        table: &QualifiedName,
    ) -> Result<Option<TableConstraint>, SqlParseError> {
        let constraint = match self.current() {
            Token::Primary => {
                self.advance();
                if self.current() == &Token::Key {
                    self.advance();
                }
                self.parse_index_method();
                let fields = self.parse_index_fields();
                Some(TableConstraint::PrimaryKey { name, fields })
            }
            Token::Foreign => {
                self.advance();
                if self.current() == &Token::Key {
                    self.advance();
                }
                // MySQL allows an index name here
                let name = match self.take_ident() {
                    Some(index_name) => name.or(Some(index_name)),
                    None => name,
                };
                let columns = self.parse_column_list();
                if self.current() != &Token::References {
                    return Err(self.expected("REFERENCES"));
                }
                self.advance();
                let (target, target_columns) = self.parse_reference(table)?;
                self.skip_on_actions();
                Some(TableConstraint::ForeignKey {
                    name,
                    columns,
                    target,
                    target_columns,
                })
            }
            Token::Unique => {
                self.advance();
                if matches!(self.current(), Token::Key | Token::Index) {
                    self.advance();
                }
                let name = match self.take_ident() {
                    Some(index_name) => name.or(Some(index_name)),
                    None => name,
                };
                self.parse_index_method();
                let fields = self.parse_index_fields();
                Some(TableConstraint::Unique { name, fields })
            }
            Token::Index | Token::Key => {
                self.advance();
                let name = self.take_ident().or(name);
                let mut method = self.parse_index_method();
                let fields = self.parse_index_fields();
                method = self.parse_index_method().or(method);
                Some(TableConstraint::Index {
                    name,
                    unique: false,
                    fields,
                    method,
                })
            }
            Token::Check => {
                self.advance();
                self.skip_parenthesized();
                None
            }
            _ => None,
        };

        self.skip_until(&[Token::Comma, Token::RParen, Token::Semicolon]);
        Ok(constraint)
    }

    /// `USING btree`, if present.
    fn parse_index_method(&mut self) -> Option<String> {
        if !self.at_ident("USING") {
            return None;
        }
        self.advance();
        self.take_ident()
    }

    /// `(col [(len)] [COLLATE x] [ASC|DESC] [NULLS FIRST|LAST], ...)`
    fn parse_index_fields(&mut self) -> Vec<IndexField> {
        let mut fields = Vec::new();
        if self.current() != &Token::LParen {
            return fields;
        }
        self.advance();

        loop {
            match self.current() {
                Token::Ident(name) => {
                    let mut field = IndexField {
                        attribute: name.clone(),
                        ..Default::default()
                    };
                    self.advance();
                    if self.current() == &Token::LParen {
                        self.advance();
                        let inner = self.collect_until_paren();
                        match inner.parse::<u32>() {
                            Ok(length) => field.length = Some(length),
                            // Expression index, e.g. lower(email)
                            Err(_) => field.attribute = format!("{}({})", field.attribute, inner),
                        }
                    }
                    self.parse_index_field_options(&mut field);
                    fields.push(field);
                }
                Token::LParen => {
                    self.advance();
                    let mut field = IndexField {
                        attribute: format!("({})", self.collect_until_paren()),
                        ..Default::default()
                    };
                    self.parse_index_field_options(&mut field);
                    fields.push(field);
                }
                Token::Comma => {
                    self.advance();
                }
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof | Token::Semicolon => break,
                _ => {
                    self.advance();
                }
            }
        }
        fields
    }

    fn parse_index_field_options(&mut self, field: &mut IndexField) {
        loop {
            match self.current() {
                Token::Ident(s) if s.eq_ignore_ascii_case("ASC") || s.eq_ignore_ascii_case("DESC") => {
                    field.order = Some(s.to_uppercase());
                    self.advance();
                }
                Token::Ident(s) if s.eq_ignore_ascii_case("COLLATE") => {
                    self.advance();
                    field.collate = match self.current() {
                        Token::Ident(c) | Token::Str(c) => Some(c.clone()),
                        _ => None,
                    };
                    self.advance();
                }
                Token::Comma | Token::RParen | Token::Semicolon | Token::Eof => break,
                // NULLS FIRST/LAST, operator classes
                _ => self.advance(),
            }
        }
    }

    fn parse_column_list(&mut self) -> Vec<String> {
        let mut cols = Vec::new();

        if self.current() != &Token::LParen {
            return cols;
        }
        self.advance();

        loop {
            match self.current() {
                Token::Ident(name) => {
                    cols.push(name.clone());
                    self.advance();
                }
                Token::Comma => {
                    self.advance();
                }
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => break,
                _ => {
                    self.advance();
                }
            }
        }

        cols
    }

    fn skip_on_actions(&mut self) {
        while self.current() == &Token::On {
            self.advance();
            // DELETE or UPDATE
            if matches!(self.current(), Token::Delete | Token::Update) {
                self.advance();
            }
            // Action: CASCADE, RESTRICT, SET NULL, SET DEFAULT, NO ACTION
            match self.current() {
                Token::Cascade | Token::Restrict => {
                    self.advance();
                }
                Token::Ident(s) if s.to_uppercase() == "SET" => {
                    self.advance();
                    if matches!(self.current(), Token::Null | Token::Default) {
                        self.advance();
                    }
                }
                Token::Ident(s) if s.to_uppercase() == "NO" => {
                    self.advance();
                    if let Token::Ident(a) = self.current() {
                        if a.to_uppercase() == "ACTION" {
                            self.advance();
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn skip_parenthesized(&mut self) {
        if self.current() != &Token::LParen {
            self.advance();
            return;
        }
        self.advance();
        let mut depth = 1;
        while depth > 0 {
            match self.current() {
                Token::LParen => {
                    depth += 1;
                    self.advance();
                }
                Token::RParen => {
                    depth -= 1;
                    self.advance();
                }
                Token::Eof => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn skip_statement(&mut self) {
        while !matches!(self.current(), Token::Semicolon | Token::Eof) {
            self.advance();
        }
        if self.current() == &Token::Semicolon {
            self.advance();
        }
    }

    fn skip_until(&mut self, tokens: &[Token]) {
        while !tokens.contains(self.current()) && self.current() != &Token::Eof {
            if self.current() == &Token::LParen {
                self.skip_parenthesized();
            } else {
                self.advance();
            }
        }
    }

    /// ALTER TABLE [ONLY] [IF EXISTS] name action [, action ...]
    fn parse_alter_table(&mut self) -> Result<(), SqlParseError> {
        self.advance(); // ALTER

        if self.current() != &Token::Table {
            self.skip_statement();
            return Ok(());
        }
        self.advance(); // TABLE
        if self.current() == &Token::Only {
            self.advance();
        }
        if self.current() == &Token::If {
            self.advance();
            if self.current() == &Token::Exists {
                self.advance();
            }
        }
        if self.current() == &Token::Only {
            self.advance();
        }

        let Some(table) = self.parse_qualified_name(None) else {
            self.skip_statement();
            return Ok(());
        };

        loop {
            match self.current() {
                Token::Add => {
                    self.advance();
                    self.parse_alter_add(&table)?;
                }
                Token::Alter => {
                    self.advance();
                    self.parse_alter_column(&table);
                }
                Token::Ident(s) if s.eq_ignore_ascii_case("MODIFY") => {
                    self.advance();
                    if self.at_ident("COLUMN") {
                        self.advance();
                    }
                    if let Some((name, field, inline)) = self.parse_column(&table)? {
                        self.replace_column(&table, name, field);
                        for constraint in inline {
                            self.apply_constraint(&table, constraint);
                        }
                    }
                }
                Token::Semicolon => {
                    self.advance();
                    return Ok(());
                }
                Token::Eof => return Ok(()),
                Token::LParen => self.skip_parenthesized(),
                _ => self.advance(),
            }
        }
    }

    fn parse_alter_add(&mut self, table: &QualifiedName) -> Result<(), SqlParseError> {
        let constraint = match self.current() {
            Token::Constraint => {
                self.advance();
                let name = self.take_ident();
                self.parse_table_constraint(name, table)?
            }
            Token::Primary | Token::Foreign | Token::Unique | Token::Index | Token::Key
            | Token::Check => self.parse_table_constraint(None, table)?,
            _ => {
                if self.at_ident("COLUMN") {
                    self.advance();
                }
                self.skip_if_not_exists();
                if let Some((name, field, inline)) = self.parse_column(table)? {
                    if let Some(fields) = self.td.tables.get_mut(table) {
                        fields.insert(name, field);
                    }
                    for constraint in inline {
                        self.apply_constraint(table, constraint);
                    }
                }
                None
            }
        };
        if let Some(constraint) = constraint {
            self.apply_constraint(table, constraint);
        }
        Ok(())
    }

    /// ALTER [COLUMN] name SET DEFAULT x | SET NOT NULL | DROP ...
    fn parse_alter_column(&mut self, table: &QualifiedName) {
        if self.at_ident("COLUMN") {
            self.advance();
        }
        let Some(column) = self.take_ident() else {
            return;
        };
        if !self.at_ident("SET") {
            return;
        }
        self.advance();

        match self.current() {
            Token::Default => {
                self.advance();
                let default_value = self.parse_default_value();
                if let Some(field) = self.column_mut(table, &column) {
                    field.auto_increment |= default_value
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().starts_with("nextval("));
                    field.default_value = default_value;
                }
            }
            Token::Not => {
                self.advance();
                if self.current() == &Token::Null {
                    self.advance();
                    if let Some(field) = self.column_mut(table, &column) {
                        field.allow_null = false;
                    }
                }
            }
            _ => {}
        }
    }

    /// CREATE [UNIQUE] INDEX [CONCURRENTLY] [IF NOT EXISTS] [name] ON [ONLY] table [USING m] (fields)
    fn parse_create_index(&mut self, unique: bool) -> Result<(), SqlParseError> {
        if self.at_ident("CONCURRENTLY") {
            self.advance();
        }
        self.skip_if_not_exists();
        let name = self.take_ident();
        if self.current() != &Token::On {
            self.skip_statement();
            return Ok(());
        }
        self.advance();
        if self.current() == &Token::Only {
            self.advance();
        }
        let Some(table) = self.parse_qualified_name(None) else {
            self.skip_statement();
            return Ok(());
        };

        let mut method = self.parse_index_method();
        let fields = self.parse_index_fields();
        method = self.parse_index_method().or(method);
        self.skip_statement();

        self.apply_constraint(
            &table,
            TableConstraint::Index {
                name,
                unique,
                fields,
                method,
            },
        );
        Ok(())
    }

    /// CREATE TRIGGER name {BEFORE|AFTER|INSTEAD OF} events ON table ...
    fn parse_create_trigger(&mut self) {
        while !matches!(self.current(), Token::On | Token::Semicolon | Token::Eof) {
            self.advance();
        }
        if self.current() == &Token::On {
            self.advance();
            if let Some(table) = self.parse_qualified_name(None) {
                tracing::debug!(table = %table, "Found trigger");
                self.td.has_trigger_tables.insert(table, true);
            }
        }
        self.skip_statement();
    }

    /// COMMENT ON COLUMN [schema.]table.column IS 'text'
    fn parse_comment(&mut self) {
        self.advance(); // COMMENT
        if self.current() != &Token::On || !is_ident(self.peek(), "COLUMN") {
            self.skip_statement();
            return;
        }
        self.advance();
        self.advance();

        let mut parts = Vec::new();
        while let Some(part) = self.take_ident() {
            parts.push(part);
            if self.current() != &Token::Dot {
                break;
            }
            self.advance();
        }
        if self.at_ident("IS") {
            self.advance();
            let comment = match self.current() {
                Token::Str(s) => Some(s.clone()),
                _ => None,
            };
            if let [schema @ .., table, column] = parts.as_slice() {
                let table = QualifiedName::new(schema.first().map(String::as_str), table);
                if let Some(field) = self.column_mut(&table, column) {
                    field.comment = comment;
                }
            }
        }
        self.skip_statement();
    }

    fn column_mut(&mut self, table: &QualifiedName, column: &str) -> Option<&mut Field> {
        self.td.tables.get_mut(table)?.get_mut(column)
    }

    /// MySQL MODIFY: new definition, same position.
    fn replace_column(&mut self, table: &QualifiedName, name: String, mut field: Field) {
        if let Some(existing) = self.column_mut(table, &name) {
            field.primary_key |= existing.primary_key;
            field.unique |= existing.unique;
            if field.primary_key {
                field.allow_null = false;
            }
            *existing = field;
        }
    }

    fn apply_constraint(&mut self, table: &QualifiedName, constraint: TableConstraint) {
        match constraint {
            TableConstraint::PrimaryKey { name, mut fields } => {
                for f in &fields {
                    if let Some(field) = self.column_mut(table, &f.attribute) {
                        field.primary_key = true;
                        field.allow_null = false;
                    }
                }
                let mut name = name;
                let indexes = self.td.indexes.entry(table.clone()).or_default();
                if let Some(pos) = indexes.iter().position(|i| i.primary) {
                    // A second PRIMARY KEY clause extends the first.
                    let existing = indexes.remove(pos);
                    name = name.or(Some(existing.name));
                    let mut merged = existing.fields;
                    for f in fields {
                        if !merged.iter().any(|m| m.attribute == f.attribute) {
                            merged.push(f);
                        }
                    }
                    fields = merged;
                }
                let name = name.unwrap_or_else(|| self.primary_index_name(table));
                self.push_index(table, name, true, true, fields, None);
            }
            TableConstraint::Unique { name, fields } => {
                if let [single] = fields.as_slice() {
                    if let Some(field) = self.column_mut(table, &single.attribute) {
                        field.unique = true;
                    }
                }
                let name = name.unwrap_or_else(|| derived_name(table, &fields, "key"));
                self.push_index(table, name, false, true, fields, None);
            }
            TableConstraint::Index {
                name,
                unique,
                fields,
                method,
            } => {
                let name = name.unwrap_or_else(|| derived_name(table, &fields, "idx"));
                self.push_index(table, name, false, unique, fields, method.as_deref());
            }
            TableConstraint::ForeignKey {
                name,
                columns,
                target,
                target_columns,
            } => {
                let constraint_name = name.unwrap_or_else(|| {
                    format!("{}_{}_fkey", table.table(), columns.join("_"))
                });
                let target_columns = if target_columns.is_empty() {
                    let pk: Vec<String> = self
                        .td
                        .primary_key(&target)
                        .into_iter()
                        .map(str::to_string)
                        .collect();
                    if pk.is_empty() { vec!["id".to_string()] } else { pk }
                } else {
                    target_columns
                };

                let specs = self.td.foreign_keys.entry(table.clone()).or_default();
                for (i, column) in columns.iter().enumerate() {
                    let target_column = target_columns
                        .get(i)
                        .or(target_columns.first())
                        .cloned()
                        .unwrap_or_default();
                    specs.insert(
                        column.clone(),
                        FkSpec {
                            constraint_name: constraint_name.clone(),
                            source_table: table.clone(),
                            source_column: column.clone(),
                            target_table: target.clone(),
                            target_column,
                            is_primary_key: false,
                            is_unique: false,
                            is_serial_key: false,
                        },
                    );
                }
            }
        }
    }

    fn primary_index_name(&self, table: &QualifiedName) -> String {
        match self.dialect {
            Dialect::MySql => "PRIMARY".to_string(),
            _ => format!("{}_pkey", table.table()),
        }
    }

    fn push_index(
        &mut self,
        table: &QualifiedName,
        name: String,
        primary: bool,
        unique: bool,
        fields: Vec<IndexField>,
        method: Option<&str>,
    ) {
        let extra = self.index_extra(table, &name, unique, &fields, method);
        self.td.indexes.entry(table.clone()).or_default().push(IndexSpec {
            name,
            primary,
            unique,
            fields,
            extra,
        });
    }

    fn index_extra(
        &self,
        table: &QualifiedName,
        name: &str,
        unique: bool,
        fields: &[IndexField],
        method: Option<&str>,
    ) -> IndexExtra {
        match self.dialect {
            Dialect::Postgres => {
                let columns = self.td.tables.get(table);
                let indkey = fields
                    .iter()
                    .map(|f| {
                        columns
                            .and_then(|c| c.get_index_of(&f.attribute))
                            .map_or(0, |i| i + 1)
                            .to_string()
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                let list = fields
                    .iter()
                    .map(|f| match &f.order {
                        Some(order) if order == "DESC" => format!("{} DESC", f.attribute),
                        _ => f.attribute.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                IndexExtra::Postgres {
                    indkey,
                    definition: format!(
                        "CREATE {}INDEX {} ON {} USING {} ({})",
                        if unique { "UNIQUE " } else { "" },
                        name,
                        table,
                        method.unwrap_or("btree").to_lowercase(),
                        list
                    ),
                }
            }
            Dialect::MySql => IndexExtra::MySql {
                table_name: table.table().to_string(),
                index_type: method.unwrap_or("BTREE").to_uppercase(),
            },
            _ => IndexExtra::None,
        }
    }

    /// Derive per-column key flags once every constraint is known.
    fn finish(&mut self) {
        let mut flags = Vec::new();
        for (table, specs) in &self.td.foreign_keys {
            let pk = self.td.primary_key(table);
            let unique_keys = self.td.unique_keys(table);
            for column in specs.keys() {
                let field = self.td.tables.get(table).and_then(|f| f.get(column));
                let is_unique = unique_keys
                    .iter()
                    .any(|key| key.len() == 1 && key.contains(column.as_str()));
                flags.push((
                    table.clone(),
                    column.clone(),
                    pk.contains(column.as_str()),
                    is_unique,
                    field.is_some_and(|f| f.auto_increment),
                ));
            }
        }

        for (table, column, is_primary_key, is_unique, is_serial_key) in flags {
            if let Some(spec) = self
                .td
                .foreign_keys
                .get_mut(&table)
                .and_then(|specs| specs.get_mut(&column))
            {
                spec.is_primary_key = is_primary_key;
                spec.is_unique = is_unique;
                spec.is_serial_key = is_serial_key;
            }
        }
    }
}

/// `{table}_{col}_{col}_{suffix}`, the PostgreSQL naming scheme.
fn derived_name(table: &QualifiedName, fields: &[IndexField], suffix: &str) -> String {
    let columns: Vec<&str> = fields.iter().map(|f| f.attribute.as_str()).collect();
    format!("{}_{}_{}", table.table(), columns.join("_"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn q(name: &str) -> QualifiedName {
        QualifiedName::parse(name)
    }

    #[test]
    fn test_parse_simple_table() {
        let sql = r#"
            CREATE TABLE users (
                id INT PRIMARY KEY,
                email VARCHAR(255) NOT NULL UNIQUE,
                nickname VARCHAR(40) DEFAULT 'anon',
                score DECIMAL(10, 2)
            );
        "#;

        let td = parse_sql(sql, Dialect::Generic).unwrap();
        assert_eq!(td.tables.len(), 1);

        let users = &td.tables[&q("users")];
        let names: Vec<&str> = users.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "email", "nickname", "score"]);

        assert!(users["id"].primary_key);
        assert!(!users["id"].allow_null);
        assert!(!users["email"].allow_null);
        assert!(users["email"].unique);
        assert_eq!(users["email"].native_type, "VARCHAR(255)");
        assert_eq!(users["nickname"].default_value.as_deref(), Some("anon"));
        assert!(users["nickname"].allow_null);
        assert_eq!(users["score"].native_type, "DECIMAL(10,2)");
        assert_eq!(td.primary_key(&q("users")), BTreeSet::from(["id"]));
    }

    #[test]
    fn test_parse_with_foreign_key() {
        let sql = r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE orders (
                id INT PRIMARY KEY,
                user_id INT NOT NULL REFERENCES users(id) ON DELETE CASCADE
            );
        "#;

        let td = parse_sql(sql, Dialect::Generic).unwrap();
        assert_eq!(td.tables.len(), 2);

        let fk = &td.foreign_keys[&q("orders")]["user_id"];
        assert_eq!(fk.constraint_name, "orders_user_id_fkey");
        assert_eq!(fk.source_table, q("orders"));
        assert_eq!(fk.target_table, q("users"));
        assert_eq!(fk.target_column, "id");
        assert!(!fk.is_primary_key);
        assert!(!fk.is_unique);
    }

    #[test]
    fn test_reference_inherits_schema() {
        let sql = r#"
            CREATE TABLE sales.customers (id INT PRIMARY KEY);
            CREATE TABLE sales.orders (
                id INT PRIMARY KEY,
                customer_id INT REFERENCES customers,
                rep_id INT REFERENCES hr.staff(id)
            );
        "#;

        let td = parse_sql(sql, Dialect::Generic).unwrap();
        let fks = &td.foreign_keys[&q("sales.orders")];
        assert_eq!(fks["customer_id"].target_table, q("sales.customers"));
        assert_eq!(fks["customer_id"].target_column, "id");
        assert_eq!(fks["rep_id"].target_table, q("hr.staff"));
    }

    #[test]
    fn test_composite_keys_and_named_constraints() {
        let sql = r#"
            CREATE TABLE order_lines (
                order_id INT NOT NULL,
                line_no INT NOT NULL,
                sku VARCHAR(20),
                CONSTRAINT order_lines_pk PRIMARY KEY (order_id, line_no),
                CONSTRAINT uq_sku UNIQUE (order_id, sku),
                CONSTRAINT fk_order FOREIGN KEY (order_id) REFERENCES orders (id)
                    ON DELETE CASCADE ON UPDATE NO ACTION,
                CHECK (line_no > 0)
            );
        "#;

        let td = parse_sql(sql, Dialect::Generic).unwrap();
        let table = q("order_lines");
        assert_eq!(td.primary_key(&table), BTreeSet::from(["order_id", "line_no"]));

        let indexes = &td.indexes[&table];
        assert_eq!(indexes[0].name, "order_lines_pk");
        assert!(indexes[0].primary);
        assert_eq!(indexes[1].name, "uq_sku");
        assert!(indexes[1].unique);
        assert!(!td.tables[&table]["sku"].unique);

        let fk = &td.foreign_keys[&table]["order_id"];
        assert_eq!(fk.constraint_name, "fk_order");
        assert!(fk.is_primary_key);
    }

    #[test]
    fn test_parse_postgres_serial() {
        let sql = r#"
            CREATE TABLE users (
                id SERIAL PRIMARY KEY,
                tags TEXT[],
                created_at TIMESTAMP WITH TIME ZONE DEFAULT now(),
                status VARCHAR(10) DEFAULT 'active'::character varying NOT NULL
            );
        "#;

        let td = parse_sql(sql, Dialect::Postgres).unwrap();
        let users = &td.tables[&q("users")];

        assert_eq!(users["id"].native_type, "SERIAL");
        assert!(users["id"].auto_increment);
        assert_eq!(users["tags"].native_type, "TEXT[]");
        assert_eq!(users["created_at"].native_type, "TIMESTAMP WITH TIME ZONE");
        assert_eq!(users["created_at"].default_value.as_deref(), Some("now()"));
        assert_eq!(users["status"].default_value.as_deref(), Some("active"));
        assert!(!users["status"].allow_null);
    }

    #[test]
    fn test_parse_pg_dump() {
        let sql = r#"
            -- PostgreSQL database dump
            SET statement_timeout = 0;
            CREATE FUNCTION public.touch() RETURNS trigger
                LANGUAGE plpgsql AS $$
            BEGIN
                CREATE TABLE never (id int);
                RETURN NEW;
            END;
            $$;

            CREATE TABLE public.authors (
                id integer NOT NULL,
                name character varying(80) NOT NULL
            );
            CREATE TABLE public.books (
                id integer NOT NULL,
                author_id integer NOT NULL,
                isbn character varying(13)
            );
            CREATE SEQUENCE public.books_id_seq START WITH 1 INCREMENT BY 1;
            ALTER TABLE public.books OWNER TO postgres;
            ALTER TABLE ONLY public.books ALTER COLUMN id SET DEFAULT nextval('public.books_id_seq'::regclass);
            ALTER TABLE ONLY public.authors
                ADD CONSTRAINT authors_pkey PRIMARY KEY (id);
            ALTER TABLE ONLY public.books
                ADD CONSTRAINT books_pkey PRIMARY KEY (id);
            CREATE UNIQUE INDEX books_isbn_idx ON public.books USING btree (isbn);
            ALTER TABLE ONLY public.books
                ADD CONSTRAINT books_author_id_fkey FOREIGN KEY (author_id) REFERENCES public.authors(id);
            COMMENT ON COLUMN public.books.isbn IS 'ISBN-13';
            CREATE TRIGGER books_touch BEFORE UPDATE ON public.books
                FOR EACH ROW EXECUTE FUNCTION public.touch();
        "#;

        let td = parse_sql(sql, Dialect::Auto).unwrap();
        let books = q("public.books");

        assert_eq!(td.tables.len(), 2);
        assert!(!td.tables.contains_key(&q("never")));

        let fields = &td.tables[&books];
        assert!(fields["id"].primary_key);
        assert!(fields["id"].auto_increment);
        assert_eq!(
            fields["id"].default_value.as_deref(),
            Some("nextval('public.books_id_seq'::regclass)")
        );
        assert_eq!(fields["isbn"].comment.as_deref(), Some("ISBN-13"));
        assert_eq!(fields["author_id"].native_type, "integer");

        let fk = &td.foreign_keys[&books]["author_id"];
        assert_eq!(fk.constraint_name, "books_author_id_fkey");
        assert_eq!(fk.target_table, q("public.authors"));

        let isbn_index = td.indexes[&books]
            .iter()
            .find(|i| i.name == "books_isbn_idx")
            .unwrap();
        assert!(isbn_index.unique);
        assert_eq!(
            isbn_index.extra,
            IndexExtra::Postgres {
                indkey: "3".to_string(),
                definition: "CREATE UNIQUE INDEX books_isbn_idx ON public.books USING btree (isbn)"
                    .to_string(),
            }
        );
        assert!(td.has_trigger(&books));
        assert!(!td.has_trigger(&q("public.authors")));
    }

    #[test]
    fn test_parse_mysql_dump() {
        let sql = r#"
            -- MySQL dump 10.13
            /*!40101 SET NAMES utf8 */;
            CREATE TABLE `users` (
              `id` int(11) NOT NULL AUTO_INCREMENT,
              `email` varchar(120) COLLATE utf8mb4_bin NOT NULL COMMENT 'login',
              `active` tinyint(1) NOT NULL DEFAULT '1',
              `role` enum('admin','member') DEFAULT NULL,
              PRIMARY KEY (`id`),
              UNIQUE KEY `users_email` (`email`),
              KEY `users_role` (`role`(4)) USING BTREE
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
            CREATE TABLE `posts` (
              `id` int(11) NOT NULL AUTO_INCREMENT,
              `user_id` int(11) NOT NULL,
              PRIMARY KEY (`id`),
              KEY `fk_posts_user` (`user_id`),
              CONSTRAINT `fk_posts_user` FOREIGN KEY (`user_id`) REFERENCES `users` (`id`) ON DELETE CASCADE
            ) ENGINE=InnoDB;
            DELIMITER ;;
            /*!50003 CREATE*/ /*!50017 DEFINER=`root`@`localhost`*/ /*!50003 TRIGGER posts_bi BEFORE INSERT ON `posts` FOR EACH ROW SET NEW.id = NEW.id */;;
            DELIMITER ;
        "#;

        let td = parse_sql(sql, Dialect::Auto).unwrap();
        let users = &td.tables[&q("users")];

        assert!(users["id"].auto_increment);
        assert!(users["id"].primary_key);
        assert_eq!(users["email"].comment.as_deref(), Some("login"));
        assert!(users["email"].unique);
        assert_eq!(users["active"].default_value.as_deref(), Some("1"));
        assert_eq!(users["role"].native_type, "enum('admin','member')");
        assert_eq!(users["role"].default_value, None);

        let indexes = &td.indexes[&q("users")];
        assert_eq!(indexes[0].name, "PRIMARY");
        let role = indexes.iter().find(|i| i.name == "users_role").unwrap();
        assert_eq!(role.fields[0].length, Some(4));
        assert_eq!(
            role.extra,
            IndexExtra::MySql {
                table_name: "users".to_string(),
                index_type: "BTREE".to_string(),
            }
        );

        let fk = &td.foreign_keys[&q("posts")]["user_id"];
        assert_eq!(fk.constraint_name, "fk_posts_user");
        assert_eq!(fk.target_table, q("users"));
        assert!(td.has_trigger(&q("posts")));
    }

    #[test]
    fn test_alter_table_adds_columns_and_keys() {
        let sql = r#"
            CREATE TABLE users (id INT);
            CREATE TABLE profiles (id INT);
            ALTER TABLE users ADD PRIMARY KEY (id);
            ALTER TABLE profiles
                ADD COLUMN user_id INT NOT NULL,
                ADD CONSTRAINT profiles_user_uq UNIQUE (user_id),
                ADD FOREIGN KEY (user_id) REFERENCES users (id);
            ALTER TABLE profiles MODIFY id INT NOT NULL AUTO_INCREMENT;
        "#;

        let td = parse_sql(sql, Dialect::Generic).unwrap();
        let profiles = &td.tables[&q("profiles")];

        assert!(td.tables[&q("users")]["id"].primary_key);
        assert!(profiles["user_id"].unique);
        assert!(!profiles["user_id"].allow_null);
        assert!(profiles["id"].auto_increment);

        let fk = &td.foreign_keys[&q("profiles")]["user_id"];
        assert_eq!(fk.constraint_name, "profiles_user_id_fkey");
        assert!(fk.is_unique);
    }

    #[test]
    fn test_generated_identity_is_auto_increment() {
        let sql = r#"
            CREATE TABLE events (
                id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                total INT GENERATED ALWAYS AS (a + b) STORED
            );
        "#;

        let td = parse_sql(sql, Dialect::Postgres).unwrap();
        let events = &td.tables[&q("events")];
        assert!(events["id"].auto_increment);
        assert!(events["id"].primary_key);
        assert!(!events["total"].auto_increment);
    }

    #[test]
    fn test_missing_reference_target_is_error() {
        let sql = "CREATE TABLE t (\n  a INT,\n  FOREIGN KEY (a) REFERENCES );";
        let err = parse_sql(sql, Dialect::Generic).unwrap_err();
        assert!(matches!(err, SqlParseError::Expected { line: 3, .. }));
    }

    #[test]
    fn test_lex_error_is_reported() {
        let err = parse_sql("CREATE TABLE t (a TEXT DEFAULT 'open", Dialect::Generic).unwrap_err();
        assert!(matches!(err, SqlParseError::Lex(LexError::UnterminatedString(1))));
    }
}
