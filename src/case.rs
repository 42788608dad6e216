//! Case policies for generated identifiers.

use heck::{ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::inflect::singularize;

/// Case policy for model and property names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum CaseOption {
    /// Keep the database spelling
    #[default]
    Original,
    /// lower_snake
    Lower,
    /// camelCase
    Camel,
    /// PascalCase
    Pascal,
    /// UPPER_SNAKE
    Upper,
}

/// Case policy for file names; adds kebab-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum CaseFileOption {
    #[default]
    Original,
    Lower,
    Camel,
    Pascal,
    Upper,
    Kebab,
}

impl CaseOption {
    /// Parse either the single-letter form (`o l c p u`) or the long name.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "o" | "original" => Ok(Self::Original),
            "l" | "lower" | "snake" => Ok(Self::Lower),
            "c" | "camel" => Ok(Self::Camel),
            "p" | "pascal" => Ok(Self::Pascal),
            "u" | "upper" => Ok(Self::Upper),
            _ => Err(ConfigError::UnknownCase {
                value: s.to_string(),
                expected: "o, l, c, p, u",
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        CaseFileOption::from(self).as_str()
    }
}

impl CaseFileOption {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "k" | "kebab" => Ok(Self::Kebab),
            other => CaseOption::parse(other)
                .map(Self::from)
                .map_err(|_| ConfigError::UnknownCase {
                    value: s.to_string(),
                    expected: "o, l, c, p, u, k",
                }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "o",
            Self::Lower => "l",
            Self::Camel => "c",
            Self::Pascal => "p",
            Self::Upper => "u",
            Self::Kebab => "k",
        }
    }
}

impl From<CaseOption> for CaseFileOption {
    fn from(value: CaseOption) -> Self {
        match value {
            CaseOption::Original => Self::Original,
            CaseOption::Lower => Self::Lower,
            CaseOption::Camel => Self::Camel,
            CaseOption::Pascal => Self::Pascal,
            CaseOption::Upper => Self::Upper,
        }
    }
}

impl TryFrom<String> for CaseOption {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<String> for CaseFileOption {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CaseOption> for &'static str {
    fn from(value: CaseOption) -> Self {
        value.as_str()
    }
}

impl From<CaseFileOption> for &'static str {
    fn from(value: CaseFileOption) -> Self {
        value.as_str()
    }
}

/// Change the casing of `value` according to `opt`, singularizing first when asked.
pub fn recase(opt: impl Into<CaseFileOption>, value: &str, singular: bool) -> String {
    let value = if singular {
        singularize(value)
    } else {
        value.to_string()
    };
    if value.is_empty() {
        return value;
    }

    match opt.into() {
        CaseFileOption::Original => value,
        CaseFileOption::Lower => value.to_snake_case(),
        CaseFileOption::Camel => value.to_lower_camel_case(),
        CaseFileOption::Pascal => value.to_upper_camel_case(),
        CaseFileOption::Upper => value.to_shouty_snake_case(),
        CaseFileOption::Kebab => value.to_kebab_case(),
    }
}
