//! Exclusion Policy
//!
//! Decides which records are skipped before any rule is consulted, and how
//! records whose class has no rule are reported.

use serde::{Deserialize, Serialize};

use crate::Severity;
use crate::catalog::{Record, is_under};
use crate::hierarchy::{ClassHierarchy, ClassPath};

/// Outcome for records whose class resolves to no rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    /// Unmatched records pass (lenient, default)
    #[default]
    Pass,
    /// Unmatched records fail (strict mode)
    Fail,
}

/// Path and class exclusions plus unmatched handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    pub unmatched: UnmatchedPolicy,
    /// Severity attached to unmatched records in strict mode
    pub unmatched_severity: Severity,
    /// Paths under any of these directories are skipped
    pub excluded_directories: Vec<String>,
    /// When set, only paths under this root are validated (plus `extra_roots`
    /// and paths containing one of `extra_root_tokens`)
    pub content_root: Option<String>,
    pub extra_roots: Vec<String>,
    pub extra_root_tokens: Vec<String>,
    pub developers_folder: Option<String>,
    pub allow_developers_folder: bool,
    /// Records whose class is-a any of these are skipped
    pub excluded_classes: Vec<ClassPath>,
    /// Name prefix required of a `blueprint_kind` record whose class has no rule
    pub blueprints_prefix: Option<String>,
    pub blueprint_kind: String,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            unmatched: UnmatchedPolicy::Pass,
            unmatched_severity: Severity::Warning,
            excluded_directories: Vec::new(),
            content_root: None,
            extra_roots: Vec::new(),
            extra_root_tokens: Vec::new(),
            developers_folder: None,
            allow_developers_folder: false,
            excluded_classes: Vec::new(),
            blueprints_prefix: Some("BP_".to_string()),
            blueprint_kind: "Blueprint".to_string(),
        }
    }
}

impl ValidationPolicy {
    /// Lenient policy with no exclusions
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Policy that fails unmatched records
    pub fn strict() -> Self {
        Self {
            unmatched: UnmatchedPolicy::Fail,
            ..Self::default()
        }
    }

    pub fn is_strict(&self) -> bool {
        self.unmatched == UnmatchedPolicy::Fail
    }

    pub fn is_path_excluded(&self, path: &str) -> bool {
        if let Some(root) = self.content_root.as_deref()
            && !is_under(path, root)
            && !self.extra_roots.iter().any(|extra| is_under(path, extra))
            && !self
                .extra_root_tokens
                .iter()
                .any(|token| !token.is_empty() && path.contains(token.as_str()))
        {
            return true;
        }

        if let Some(developers) = self.developers_folder.as_deref()
            && !self.allow_developers_folder
            && is_under(path, developers)
        {
            return true;
        }

        self.excluded_directories
            .iter()
            .any(|excluded| is_under(path, excluded))
    }

    /// Fallback prefix for an unruled record, when the record is a blueprint
    pub fn blueprint_prefix_for(&self, record: &Record) -> Option<&str> {
        let prefix = self.blueprints_prefix.as_deref()?;
        (record.asset_kind.as_deref() == Some(self.blueprint_kind.as_str())).then_some(prefix)
    }

    /// The excluded class that `class` is-a, if any
    pub fn excluded_class<'a>(
        &'a self,
        class: &ClassPath,
        hierarchy: &ClassHierarchy,
    ) -> Option<&'a ClassPath> {
        self.excluded_classes
            .iter()
            .find(|excluded| hierarchy.is_a(class, excluded.as_str()))
    }
}
