use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Reserved name prefix for columns outside the published schema.
pub const EXTENSION_PREFIX: &str = "x_";

pub fn is_extension_column(name: &str) -> bool {
    name.starts_with(EXTENSION_PREFIX)
}

/// Lowercases a version id and strips a leading `v`: `V1_2` becomes `1.2`.
pub fn normalize_version(version: &str) -> String {
    let lowered = version.trim().to_ascii_lowercase();
    lowered
        .strip_prefix('v')
        .unwrap_or(&lowered)
        .replace('_', ".")
}

/// True when two version ids name the same FOCUS release.
pub fn versions_match(a: &str, b: &str) -> bool {
    normalize_version(a) == normalize_version(b)
}

/// Spec-declared importance of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FeatureLevel {
    Mandatory,
    Recommended,
    Conditional,
    Optional,
}

impl FeatureLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureLevel::Mandatory => "Mandatory",
            FeatureLevel::Recommended => "Recommended",
            FeatureLevel::Conditional => "Conditional",
            FeatureLevel::Optional => "Optional",
        }
    }
}

impl fmt::Display for FeatureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mandatory" => Ok(FeatureLevel::Mandatory),
            "recommended" => Ok(FeatureLevel::Recommended),
            "conditional" => Ok(FeatureLevel::Conditional),
            "optional" => Ok(FeatureLevel::Optional),
            _ => Err(format!("Unknown feature level: {s}")),
        }
    }
}

impl TryFrom<String> for FeatureLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FeatureLevel> for String {
    fn from(value: FeatureLevel) -> Self {
        value.as_str().to_string()
    }
}

/// Declared data type of a spec column.
///
/// Spec documents spell these several ways (`Date/Time`, `date-time`,
/// `JSON`, `structured`); parsing is case-insensitive and unknown types are
/// rejected so coercion never meets one at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    String,
    DateTime,
    Decimal,
    Structured,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "String",
            DataType::DateTime => "Date/Time",
            DataType::Decimal => "Decimal",
            DataType::Structured => "JSON",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(DataType::String),
            "date/time" | "datetime" | "date-time" => Ok(DataType::DateTime),
            "decimal" => Ok(DataType::Decimal),
            "json" | "structured" => Ok(DataType::Structured),
            _ => Err(format!("Unsupported data type in spec: {s}")),
        }
    }
}

impl TryFrom<String> for DataType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub feature_level: FeatureLevel,
    pub allows_nulls: bool,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Format tag from the published schema (e.g. `Currency`, `DateTime`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_scale: Option<u32>,
}

impl ColumnSpec {
    pub fn new(
        name: impl Into<String>,
        feature_level: FeatureLevel,
        data_type: DataType,
        allows_nulls: bool,
    ) -> Self {
        Self {
            name: name.into(),
            feature_level,
            allows_nulls,
            data_type,
            description: None,
            value_format: None,
            allowed_values: None,
            numeric_precision: None,
            numeric_scale: None,
        }
    }

    #[must_use]
    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_numeric_limits(mut self, precision: Option<u32>, scale: Option<u32>) -> Self {
        self.numeric_precision = precision;
        self.numeric_scale = scale;
        self
    }

    pub fn is_extension(&self) -> bool {
        is_extension_column(&self.name)
    }
}

/// A versioned column schema. Column order is the canonical output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSpec {
    pub version: String,
    pub columns: Vec<ColumnSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
}

impl FocusSpec {
    pub fn new(version: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        Self {
            version: version.into(),
            columns,
            source: None,
            metadata: None,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn mandatory_columns(&self) -> Vec<&ColumnSpec> {
        self.columns
            .iter()
            .filter(|c| c.feature_level == FeatureLevel::Mandatory)
            .collect()
    }
}


#[cfg(test)]
mod version_tests {
    use super::*;

    #[test]
    fn versions_normalize_prefix_case_and_separator() {
        assert_eq!(normalize_version("v1.2"), "1.2");
        assert_eq!(normalize_version("V1.3 "), "1.3");
        assert_eq!(normalize_version("1_2"), "1.2");
        assert!(versions_match("v1.2", "1.2"));
        assert!(versions_match("V1_3", "1.3"));
        assert!(!versions_match("v1.2", "1.3"));
    }
}
