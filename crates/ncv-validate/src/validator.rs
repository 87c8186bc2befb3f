//! Record Validator
//!
//! Applies exclusions, folder rules, class-rule resolution and pattern
//! evaluation to one record. Pure apart from trace logging.

use std::sync::Arc;

use serde::Serialize;
use tracing::trace;

use crate::Severity;
use crate::catalog::Record;
use crate::folder::{FolderRule, FolderViolation};
use crate::hierarchy::ClassPath;
use crate::pattern::{Evaluation, PatternViolation};
use crate::policy::{UnmatchedPolicy, ValidationPolicy};
use crate::rule::ConventionRule;
use crate::table::RuleTable;

/// Classification of a validation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Passed,
    Failed,
    /// No rule resolves for the record's class
    Unmatched,
    /// Skipped by path or class exclusion
    Excluded,
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "PASSED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Unmatched => write!(f, "UNMATCHED"),
            Self::Excluded => write!(f, "EXCLUDED"),
        }
    }
}

/// Structured reason attached to a non-passing result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureDetail {
    Pattern {
        rule_id: String,
        violation: PatternViolation,
    },
    Folder {
        rule_id: String,
        violation: FolderViolation,
    },
    NoRule {
        class: ClassPath,
    },
    BlueprintPrefix {
        expected: String,
    },
}

impl std::fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pattern { rule_id, violation } => write!(f, "[{rule_id}] {violation}"),
            Self::Folder { rule_id, violation } => write!(f, "[{rule_id}] {violation}"),
            Self::NoRule { class } => write!(f, "no naming rule for class '{class}'"),
            Self::BlueprintPrefix { expected } => {
                write!(f, "blueprint name must start with '{expected}'")
            }
        }
    }
}

/// Outcome of validating one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub record: Record,
    pub status: ResultStatus,
    pub passed: bool,
    /// Present on failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(serialize_with = "serialize_rule_id")]
    pub matched_rule: Option<Arc<ConventionRule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureDetail>,
}

fn serialize_rule_id<S: serde::Serializer>(
    rule: &Option<Arc<ConventionRule>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match rule {
        Some(rule) => serializer.serialize_some(&rule.id),
        None => serializer.serialize_none(),
    }
}

impl ValidationResult {
    fn excluded(record: &Record) -> Self {
        Self {
            record: record.clone(),
            status: ResultStatus::Excluded,
            passed: true,
            severity: None,
            matched_rule: None,
            failure: None,
        }
    }

    fn passed(record: &Record, matched_rule: Option<Arc<ConventionRule>>) -> Self {
        Self {
            record: record.clone(),
            status: ResultStatus::Passed,
            passed: true,
            severity: None,
            matched_rule,
            failure: None,
        }
    }

    fn failed(
        record: &Record,
        severity: Severity,
        matched_rule: Option<Arc<ConventionRule>>,
        failure: FailureDetail,
    ) -> Self {
        Self {
            record: record.clone(),
            status: ResultStatus::Failed,
            passed: false,
            severity: Some(severity),
            matched_rule,
            failure: Some(failure),
        }
    }

    pub fn location(&self) -> &str {
        &self.record.location_path
    }

    pub fn rule_id(&self) -> Option<&str> {
        self.matched_rule.as_deref().map(|rule| rule.id.as_str())
    }

    pub fn is_error(&self) -> bool {
        !self.passed && self.severity == Some(Severity::Error)
    }
}

/// Validates single records against a rule table
#[derive(Debug, Clone, Default)]
pub struct Validator {
    policy: ValidationPolicy,
    folder_rules: Vec<FolderRule>,
}

impl Validator {
    pub fn new(policy: ValidationPolicy, folder_rules: Vec<FolderRule>) -> Self {
        Self {
            policy,
            folder_rules,
        }
    }

    pub fn with_policy(policy: ValidationPolicy) -> Self {
        Self::new(policy, Vec::new())
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn folder_rules(&self) -> &[FolderRule] {
        &self.folder_rules
    }

    pub fn validate(&self, record: &Record, table: &RuleTable) -> ValidationResult {
        if self.policy.is_path_excluded(&record.location_path) {
            trace!(location = %record.location_path, "Excluded by path");
            return ValidationResult::excluded(record);
        }

        if let Some(class) = self.policy.excluded_class(&record.class_path, table.hierarchy()) {
            trace!(location = %record.location_path, excluded_class = %class, "Excluded by class");
            return ValidationResult::excluded(record);
        }

        let mut check_class_rule = true;
        for folder_rule in &self.folder_rules {
            if !folder_rule.in_scope(record, table.hierarchy()) {
                continue;
            }
            if let Err(violation) = folder_rule.check(record) {
                trace!(location = %record.location_path, rule_id = %folder_rule.id, "Folder rule failed");
                return ValidationResult::failed(
                    record,
                    folder_rule.severity,
                    None,
                    FailureDetail::Folder {
                        rule_id: folder_rule.id.clone(),
                        violation,
                    },
                );
            }
            check_class_rule &= folder_rule.check_class_rule;
        }
        if !check_class_rule {
            return ValidationResult::passed(record, None);
        }

        let Some(rule) = table.resolve(&record.class_path) else {
            trace!(location = %record.location_path, class = %record.class_path, "No rule for class");
            if let Some(prefix) = self.policy.blueprint_prefix_for(record) {
                return if record.name.starts_with(prefix) {
                    ValidationResult::passed(record, None)
                } else {
                    ValidationResult::failed(
                        record,
                        Severity::Error,
                        None,
                        FailureDetail::BlueprintPrefix {
                            expected: prefix.to_string(),
                        },
                    )
                };
            }
            return match self.policy.unmatched {
                UnmatchedPolicy::Pass => ValidationResult {
                    record: record.clone(),
                    status: ResultStatus::Unmatched,
                    passed: true,
                    severity: None,
                    matched_rule: None,
                    failure: None,
                },
                UnmatchedPolicy::Fail => ValidationResult {
                    record: record.clone(),
                    status: ResultStatus::Unmatched,
                    passed: false,
                    severity: Some(self.policy.unmatched_severity),
                    matched_rule: None,
                    failure: Some(FailureDetail::NoRule {
                        class: record.class_path.clone(),
                    }),
                },
            };
        };

        match rule.check(&record.name) {
            Evaluation::Matched => ValidationResult::passed(record, Some(Arc::clone(rule))),
            Evaluation::Violation(violation) => {
                trace!(location = %record.location_path, rule_id = %rule.id, %violation, "Pattern violation");
                ValidationResult::failed(
                    record,
                    rule.severity,
                    Some(Arc::clone(rule)),
                    FailureDetail::Pattern {
                        rule_id: rule.id.clone(),
                        violation,
                    },
                )
            }
        }
    }
}
