//! Convention Rules
//!
//! A [`RuleDefinition`] is the raw entry supplied by configuration; a
//! [`ConventionRule`] is its compiled, immutable form bound to one target
//! class. Rules without an explicit id get one derived from their content
//! so the id survives reloads while the rule is unchanged.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Severity;
use crate::hierarchy::ClassPath;
use crate::pattern::{self, CompileError, Evaluation, PatternExpression, PatternOptions};

/// Hex characters kept from the content digest
const DERIVED_ID_LEN: usize = 12;

fn default_true() -> bool {
    true
}

/// Uncompiled rule as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Explicit identifier; derived from the rule content when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Class the rule is declared for
    pub target: String,
    /// Pattern source text
    pub pattern: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
    /// Higher wins when several enabled rules target the same class
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
}

impl RuleDefinition {
    pub fn new(target: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            id: None,
            target: target.into(),
            pattern: pattern.into(),
            severity: Severity::Error,
            enabled: true,
            description: String::new(),
            priority: 0,
            case_sensitive: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    fn options(&self) -> PatternOptions {
        PatternOptions {
            case_sensitive: self.case_sensitive,
        }
    }

    /// Identifier used for this definition: the explicit id, or one derived
    /// from a SHA-256 digest of every other field
    pub fn resolved_id(&self) -> String {
        if let Some(id) = self.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            return id.to_string();
        }

        let priority = self.priority.to_string();
        let mut hasher = Sha256::new();
        for field in [
            self.target.as_str(),
            self.pattern.as_str(),
            if self.case_sensitive { "cs" } else { "ci" },
            if self.severity == Severity::Error { "error" } else { "warning" },
            if self.enabled { "on" } else { "off" },
            self.description.as_str(),
            priority.as_str(),
        ] {
            hasher.update(field.as_bytes());
            hasher.update([0x1f]);
        }
        let digest = hex::encode(hasher.finalize());
        format!("r-{}", &digest[..DERIVED_ID_LEN])
    }
}

/// Compiled rule bound to one target class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConventionRule {
    pub id: String,
    pub target: ClassPath,
    pub pattern: PatternExpression,
    pub severity: Severity,
    pub enabled: bool,
    pub description: String,
    pub priority: i32,
}

impl ConventionRule {
    pub fn compile(definition: &RuleDefinition) -> Result<Self, CompileError> {
        let pattern = pattern::compile(&definition.pattern, definition.options())?;
        Ok(Self {
            id: definition.resolved_id(),
            target: ClassPath::new(definition.target.trim()),
            pattern,
            severity: definition.severity,
            enabled: definition.enabled,
            description: definition.description.clone(),
            priority: definition.priority,
        })
    }

    /// True only for the exact target class; subclasses are the table's concern
    pub fn applies_to(&self, class: &str) -> bool {
        self.target.as_str() == class
    }

    pub fn check(&self, name: &str) -> Evaluation {
        self.pattern.evaluate(name)
    }
}

/// Definition whose pattern failed to compile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenRule {
    pub id: String,
    pub definition: RuleDefinition,
    pub error: CompileError,
}

impl std::fmt::Display for BrokenRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rule {} for {} ('{}'): {}",
            self.id, self.definition.target, self.definition.pattern, self.error
        )
    }
}
