//! Pipeline configuration parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_config_schema;
use crate::legal::{CaseDocument, DocumentGraph};
use crate::profile::Profile;
use crate::rules::{CompiledRule, CustomRule, PatternError};
use crate::types::{Domain, SourceMetadata};

/// Errors that can occur when loading configuration or corpus files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Schema validation failed: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("Config validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Everything needed to configure a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    pub domain: Domain,

    /// ISO 639-3 code; picks the profile when `profile` is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Explicit profile override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,

    #[serde(default)]
    pub source: SourceMetadata,

    #[serde(default)]
    pub custom_rules: Vec<CustomRule>,
}

impl PipelineConfig {
    /// A config with only the domain set.
    pub fn for_domain(domain: Domain) -> Self {
        Self {
            domain,
            language: None,
            profile: None,
            source: SourceMetadata::default(),
            custom_rules: Vec::new(),
        }
    }

    /// Parse a config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a config file, choosing the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_yaml_file(path),
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        validate_config_schema(&value).map_err(ConfigError::SchemaError)?;
        let config: PipelineConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic checks the schema cannot express.
    fn validate(&self) -> Result<(), ConfigError> {
        for rule in &self.custom_rules {
            if rule.id.trim().is_empty() {
                return Err(ConfigError::MissingField("custom_rules[].id".to_string()));
            }
            if rule.pattern.is_empty() {
                return Err(ConfigError::MissingField(format!(
                    "custom_rules[{}].pattern",
                    rule.id
                )));
            }
        }

        self.validate_unique_rule_ids()?;

        Ok(())
    }

    fn validate_unique_rule_ids(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();

        for rule in &self.custom_rules {
            if !seen.insert(&rule.id) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate rule ID: {}",
                    rule.id
                )));
            }
        }

        Ok(())
    }

    /// Compile every active rule and report the ones that fail.
    ///
    /// Failing rules do not make a config invalid; a run skips them.
    pub fn pattern_errors(&self) -> Vec<PatternError> {
        self.custom_rules
            .iter()
            .filter(|r| r.active)
            .filter_map(|r| CompiledRule::compile(r).err())
            .collect()
    }
}

/// Load a case corpus from a JSON array of documents.
pub fn load_corpus(path: impl AsRef<Path>) -> Result<DocumentGraph, ConfigError> {
    let contents = fs::read_to_string(path)?;
    parse_corpus(&contents)
}

/// Parse a case corpus from a JSON array of documents.
pub fn parse_corpus(json: &str) -> Result<DocumentGraph, ConfigError> {
    let documents: Vec<CaseDocument> = serde_json::from_str(json)?;
    if let Some(doc) = documents.iter().find(|d| d.id.trim().is_empty()) {
        return Err(ConfigError::MissingField(format!(
            "corpus document id (title \"{}\")",
            doc.title
        )));
    }
    Ok(DocumentGraph::from_documents(documents))
}
