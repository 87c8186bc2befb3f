//! Settings types

use std::path::PathBuf;

use ncv_validate::{FolderRule, PipelineConfig, RecordFilter, RuleDefinition, ValidationPolicy};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LOG_LEVEL;

/// Complete validator settings
///
/// Every section has a default so a missing file or section yields a
/// working lenient configuration with no rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory of YAML rule files; relative paths resolve against the
    /// directory of the settings file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_dir: Option<PathBuf>,
    /// Exclusions and unmatched handling
    pub validation: ValidationPolicy,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
    /// Restricts runs to records under these roots
    pub filter: RecordFilter,
    pub classes: Vec<ClassDeclaration>,
    pub rules: Vec<RuleDefinition>,
    pub folder_rules: Vec<FolderRule>,
}

/// One class of the content hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl ClassDeclaration {
    pub fn new(name: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(String::from),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON output format
    pub json_format: bool,

    /// Log to a daily-rolling file in addition to stdout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json_format: false,
            file_output: None,
        }
    }
}
