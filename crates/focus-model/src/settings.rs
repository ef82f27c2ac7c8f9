//! Layered validation settings.
//!
//! Every field is optional at every level so a mapping-wide default and a
//! per-column override can be merged key by key: a field present in the
//! override wins, an absent one falls back to the default.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Recursive, override-wins merge.
pub trait Merge {
    #[must_use]
    fn merge(&self, overrides: &Self) -> Self;
}

fn merge_value<T: Clone>(base: &Option<T>, overrides: &Option<T>) -> Option<T> {
    overrides.clone().or_else(|| base.clone())
}

fn merge_nested<T: Merge + Clone>(base: &Option<T>, overrides: &Option<T>) -> Option<T> {
    match (base, overrides) {
        (Some(b), Some(o)) => Some(b.merge(o)),
        _ => merge_value(base, overrides),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    #[default]
    Permissive,
    Strict,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Permissive => f.write_str("permissive"),
            ValidationMode::Strict => f.write_str("strict"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ValidationMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<PresenceSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<NullableSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<AllowedValuesSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DateTimeSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal: Option<DecimalSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string: Option<StringSettings>,
    #[serde(rename = "json", alias = "structured", skip_serializing_if = "Option::is_none")]
    pub structured: Option<StructuredSettings>,
}

impl ValidationSettings {
    /// Baseline applied beneath every mapping-level default.
    pub fn engine_defaults() -> Self {
        Self {
            mode: Some(ValidationMode::Permissive),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode.unwrap_or_default()
    }

    /// `Some(false)` only when presence enforcement was explicitly disabled.
    pub fn enforce_presence(&self) -> Option<bool> {
        self.presence.as_ref().and_then(|p| p.enforce)
    }

    pub fn allow_nulls(&self) -> Option<bool> {
        self.nullable.as_ref().and_then(|n| n.allow_nulls)
    }

    pub fn case_insensitive_values(&self) -> bool {
        self.allowed_values
            .as_ref()
            .and_then(|a| a.case_insensitive)
            .unwrap_or(false)
    }

    pub fn datetime_format(&self) -> Option<&str> {
        self.datetime.as_ref().and_then(|d| d.format.as_deref())
    }

    pub fn object_only(&self) -> bool {
        self.structured
            .as_ref()
            .and_then(|s| s.object_only)
            .unwrap_or(false)
    }
}

impl Merge for ValidationSettings {
    fn merge(&self, overrides: &Self) -> Self {
        Self {
            mode: merge_value(&self.mode, &overrides.mode),
            presence: merge_nested(&self.presence, &overrides.presence),
            nullable: merge_nested(&self.nullable, &overrides.nullable),
            allowed_values: merge_nested(&self.allowed_values, &overrides.allowed_values),
            datetime: merge_nested(&self.datetime, &overrides.datetime),
            decimal: merge_nested(&self.decimal, &overrides.decimal),
            string: merge_nested(&self.string, &overrides.string),
            structured: merge_nested(&self.structured, &overrides.structured),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enforce: Option<bool>,
}

impl Merge for PresenceSettings {
    fn merge(&self, overrides: &Self) -> Self {
        Self {
            enforce: merge_value(&self.enforce, &overrides.enforce),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NullableSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_nulls: Option<bool>,
}

impl Merge for NullableSettings {
    fn merge(&self, overrides: &Self) -> Self {
        Self {
            allow_nulls: merge_value(&self.allow_nulls, &overrides.allow_nulls),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowedValuesSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_insensitive: Option<bool>,
}

impl Merge for AllowedValuesSettings {
    fn merge(&self, overrides: &Self) -> Self {
        Self {
            case_insensitive: merge_value(&self.case_insensitive, &overrides.case_insensitive),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateTimeSettings {
    /// A chrono `strftime` pattern every value must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Merge for DateTimeSettings {
    fn merge(&self, overrides: &Self) -> Self {
        Self {
            format: merge_value(&self.format, &overrides.format),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecimalSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integer_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
}

impl Merge for DecimalSettings {
    fn merge(&self, overrides: &Self) -> Self {
        Self {
            precision: merge_value(&self.precision, &overrides.precision),
            scale: merge_value(&self.scale, &overrides.scale),
            integer_only: merge_value(&self.integer_only, &overrides.integer_only),
            min: merge_value(&self.min, &overrides.min),
            max: merge_value(&self.max, &overrides.max),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StringSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_empty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim: Option<bool>,
}

impl StringSettings {
    /// True when no string check was configured at all.
    pub fn is_unset(&self) -> bool {
        self.min_length.is_none()
            && self.max_length.is_none()
            && self.allow_empty.is_none()
            && self.trim.is_none()
    }
}

impl Merge for StringSettings {
    fn merge(&self, overrides: &Self) -> Self {
        Self {
            min_length: merge_value(&self.min_length, &overrides.min_length),
            max_length: merge_value(&self.max_length, &overrides.max_length),
            allow_empty: merge_value(&self.allow_empty, &overrides.allow_empty),
            trim: merge_value(&self.trim, &overrides.trim),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_only: Option<bool>,
}

impl Merge for StructuredSettings {
    fn merge(&self, overrides: &Self) -> Self {
        Self {
            object_only: merge_value(&self.object_only, &overrides.object_only),
        }
    }
}
