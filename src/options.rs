//! Generation options.
//!
//! Option names follow the JSON configuration files of the generator
//! (`caseModel`, `noAlias`, `typeOverrides`, ...), so a config file can be
//! deserialized directly into [`AutoOptions`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::case::{CaseFileOption, CaseOption};
use crate::error::ConfigError;

/// How nullable columns are represented in the generated model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NullableFieldType {
    /// `T | null`
    Null,
    /// optional property
    Optional,
    /// both
    #[default]
    NullAndOptional,
}

impl NullableFieldType {
    pub fn marks_null(self) -> bool {
        matches!(self, Self::Null | Self::NullAndOptional)
    }

    pub fn marks_optional(self) -> bool {
        matches!(self, Self::Optional | Self::NullAndOptional)
    }
}

impl TryFrom<String> for NullableFieldType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_uppercase().as_str() {
            "NULL" => Ok(Self::Null),
            "OPTIONAL" => Ok(Self::Optional),
            "NULL_AND_OPTIONAL" => Ok(Self::NullAndOptional),
            _ => Err(ConfigError::UnknownNullableFieldType(value)),
        }
    }
}

/// Replacement for the computed type of one column. Unset fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnTypeOverride {
    /// Name of the type
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// Import path of the type, relative to the generated file
    pub source: Option<String>,
    /// Whether the type is a default export
    pub is_default: Option<bool>,
    /// Forced optionality
    pub is_optional: Option<bool>,
}

pub type TableTypeOverride = IndexMap<String, ColumnTypeOverride>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeOverrides {
    pub tables: IndexMap<String, TableTypeOverride>,
    pub nullable_field_type: NullableFieldType,
}

impl TypeOverrides {
    /// Exact lookup by qualified table name, then column name.
    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnTypeOverride> {
        self.tables.get(table).and_then(|columns| columns.get(column))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualFieldOptions {
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Extra, non-persisted properties per table: table → column → options.
pub type VirtualFields = IndexMap<String, IndexMap<String, VirtualFieldOptions>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoOptions {
    /// Case of model names
    pub case_model: CaseOption,
    /// Case of property names
    pub case_prop: CaseOption,
    /// Case of file names
    pub case_file: CaseFileOption,
    /// Whether to singularize model and file names
    pub singularize: bool,
    /// Whether to avoid alias properties in relations
    pub no_alias: bool,
    /// Only tables in this schema
    pub schema: Option<String>,
    /// Tables to export (default all)
    pub tables: Option<Vec<String>>,
    /// Tables to skip
    pub skip_tables: Option<Vec<String>>,
    pub type_overrides: TypeOverrides,
    /// Suffixes trimmed from foreign key columns when naming relation properties
    pub pk_suffixes: Vec<String>,
    pub virtual_fields: VirtualFields,
}

impl Default for AutoOptions {
    fn default() -> Self {
        Self {
            case_model: CaseOption::Original,
            case_prop: CaseOption::Original,
            case_file: CaseFileOption::Original,
            singularize: false,
            no_alias: false,
            schema: None,
            tables: None,
            skip_tables: None,
            type_overrides: TypeOverrides::default(),
            pk_suffixes: vec!["id".to_string()],
            virtual_fields: VirtualFields::default(),
        }
    }
}

impl AutoOptions {
    /// Parse and validate options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pk_suffixes.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::EmptyPkSuffix);
        }
        if let (Some(tables), Some(skip)) = (&self.tables, &self.skip_tables) {
            if let Some(table) = tables.iter().find(|t| skip.contains(t)) {
                return Err(ConfigError::ConflictingTableFilter(table.clone()));
            }
        }
        Ok(())
    }
}
