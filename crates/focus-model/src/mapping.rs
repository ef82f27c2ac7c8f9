use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::settings::ValidationSettings;
use crate::spec::is_extension_column;
use crate::step::Step;

/// Produces one target column from an ordered list of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    pub target: String,
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationSettings>,
}

impl MappingRule {
    pub fn new(target: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            target: target.into(),
            steps,
            description: None,
            validation: None,
        }
    }

    #[must_use]
    pub fn with_validation(mut self, validation: ValidationSettings) -> Self {
        self.validation = Some(validation);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_extension(&self) -> bool {
        is_extension_column(&self.target)
    }
}

/// Dataset-level metadata carried by a mapping file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(default = "default_dataset_type")]
    pub dataset_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_instance_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped_columns: Option<Vec<String>>,
}

fn default_dataset_type() -> String {
    "CostAndUsage".to_string()
}

impl Default for DatasetMetadata {
    fn default() -> Self {
        Self {
            creation_date: None,
            dataset_type: default_dataset_type(),
            dataset_instance_name: None,
            skipped_columns: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingConfig {
    pub spec_version: String,
    rules: Vec<MappingRule>,
    pub validation_defaults: ValidationSettings,
    #[serde(flatten)]
    pub metadata: DatasetMetadata,
}

impl MappingConfig {
    /// Build a mapping; target names must be unique.
    pub fn new(spec_version: impl Into<String>, rules: Vec<MappingRule>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for rule in &rules {
            if !seen.insert(rule.target.as_str()) {
                return Err(ModelError::DuplicateTarget(rule.target.clone()));
            }
        }
        Ok(Self {
            spec_version: spec_version.into(),
            rules,
            validation_defaults: ValidationSettings::default(),
            metadata: DatasetMetadata::default(),
        })
    }

    #[must_use]
    pub fn with_validation_defaults(mut self, defaults: ValidationSettings) -> Self {
        self.validation_defaults = defaults;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: DatasetMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    pub fn rule_for_target(&self, target: &str) -> Option<&MappingRule> {
        self.rules.iter().find(|r| r.target == target)
    }

    /// Extension targets in mapping order.
    pub fn extension_targets(&self) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| r.is_extension())
            .map(|r| r.target.as_str())
            .collect()
    }
}
