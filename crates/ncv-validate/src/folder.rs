//! Folder Rules
//!
//! Path-scoped rules: every record under a root folder must carry an
//! identifier token as the second `_`-separated part of its name
//! (`BP_Hero_Sword` under `/Game/Heroes` with token `Hero`), and may be
//! required to sit exactly one folder below the root.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Severity;
use crate::catalog::{Record, is_under};
use crate::hierarchy::{ClassHierarchy, ClassPath};

fn default_ignored_folders() -> Vec<String> {
    vec!["Shared".to_string(), "Unused".to_string()]
}

fn default_true() -> bool {
    true
}

/// Naming rule scoped to a folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRule {
    pub id: String,
    /// Folder the rule governs, e.g. `/Game/Characters`
    pub root: String,
    /// Token required as the second name part; may itself contain `_`
    #[serde(default)]
    pub identifier_token: Option<String>,
    /// Records must be exactly one folder below `root`
    #[serde(default)]
    pub require_flat: bool,
    /// Folder names that take a record out of scope anywhere in its path
    #[serde(default = "default_ignored_folders")]
    pub ignored_folders: Vec<String>,
    #[serde(default)]
    pub ignored_classes: Vec<ClassPath>,
    /// Also run the class rule after this rule passes
    #[serde(default = "default_true")]
    pub check_class_rule: bool,
    #[serde(default)]
    pub severity: Severity,
}

impl FolderRule {
    pub fn new(id: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
            identifier_token: None,
            require_flat: false,
            ignored_folders: default_ignored_folders(),
            ignored_classes: Vec::new(),
            check_class_rule: true,
            severity: Severity::Error,
        }
    }

    pub fn with_identifier_token(mut self, token: impl Into<String>) -> Self {
        self.identifier_token = Some(token.into());
        self
    }

    pub fn flat(mut self) -> Self {
        self.require_flat = true;
        self
    }

    pub fn skip_class_rule(mut self) -> Self {
        self.check_class_rule = false;
        self
    }

    pub fn in_scope(&self, record: &Record, hierarchy: &ClassHierarchy) -> bool {
        let folder = record.folder();
        if !is_under(folder, &self.root) {
            return false;
        }
        if folder
            .split('/')
            .any(|segment| self.ignored_folders.iter().any(|ignored| ignored == segment))
        {
            return false;
        }
        !self
            .ignored_classes
            .iter()
            .any(|ignored| hierarchy.is_a(&record.class_path, ignored.as_str()))
    }

    pub fn check(&self, record: &Record) -> Result<(), FolderViolation> {
        if self.require_flat {
            let root = self.root.trim_end_matches('/');
            let below = record.folder().strip_prefix(root).unwrap_or_default();
            let depth = below.split('/').filter(|s| !s.is_empty()).count();
            if depth != 1 {
                return Err(FolderViolation::NotFlat {
                    root: self.root.clone(),
                    depth,
                });
            }
        }

        let mut parts: Vec<String> = record
            .name
            .split('_')
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect();
        if parts.len() < 2 {
            return Err(FolderViolation::Unparsable {
                name: record.name.clone(),
            });
        }

        let Some(token) = self.identifier_token.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(());
        };

        let token_parts: Vec<&str> = token.split('_').filter(|p| !p.is_empty()).collect();
        if token_parts.len() > 1 {
            let mut index = 0;
            while index < parts.len() {
                let regroup = parts[index..]
                    .iter()
                    .map(String::as_str)
                    .take(token_parts.len())
                    .eq(token_parts.iter().copied());
                if regroup {
                    parts.splice(index..index + token_parts.len(), [token.to_string()]);
                }
                index += 1;
            }
        }

        match parts.get(1) {
            Some(found) if found == token => Ok(()),
            found => Err(FolderViolation::MissingIdentifier {
                expected_prefix: format!("{}_{token}", parts[0]),
                found: found.cloned().unwrap_or_default(),
            }),
        }
    }
}

/// Why a record failed a folder rule
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FolderViolation {
    #[error("records under {root} must all be in the same subfolder (found depth {depth})")]
    NotFlat { root: String, depth: usize },

    #[error("cannot parse '{name}': expected something like BP_XXX")]
    Unparsable { name: String },

    #[error("name must start with {expected_prefix} (found '{found}')")]
    MissingIdentifier {
        expected_prefix: String,
        found: String,
    },
}
