//! Validation Report
//!
//! Ordered results of one batch run plus summary counts. Immutable once
//! returned by the pipeline.

use serde::Serialize;

use crate::Severity;
use crate::validator::{ResultStatus, ValidationResult};

/// Summary statistics of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed_errors: usize,
    pub failed_warnings: usize,
    /// Records with no rule; in strict mode these are also counted as failures
    pub unmatched: usize,
    pub excluded: usize,
}

impl ReportSummary {
    pub fn from_results(results: &[ValidationResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.status {
                ResultStatus::Unmatched => summary.unmatched += 1,
                ResultStatus::Excluded => summary.excluded += 1,
                ResultStatus::Passed | ResultStatus::Failed => {}
            }
            if result.passed {
                if result.status == ResultStatus::Passed {
                    summary.passed += 1;
                }
            } else {
                match result.severity.unwrap_or(Severity::Error) {
                    Severity::Error => summary.failed_errors += 1,
                    Severity::Warning => summary.failed_warnings += 1,
                }
            }
        }
        summary
    }

    pub fn failed(&self) -> usize {
        self.failed_errors + self.failed_warnings
    }
}

/// Results of one batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    results: Vec<ValidationResult>,
    summary: ReportSummary,
    /// False when the run was cancelled before every record was validated
    complete: bool,
    /// Version of the rule snapshot the run used, when it came from a store
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot_version: Option<u64>,
}

impl Report {
    pub fn new(results: Vec<ValidationResult>, complete: bool) -> Self {
        let summary = ReportSummary::from_results(&results);
        Self {
            results,
            summary,
            complete,
            snapshot_version: None,
        }
    }

    pub(crate) fn with_snapshot_version(mut self, version: u64) -> Self {
        self.snapshot_version = Some(version);
        self
    }

    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    pub fn summary(&self) -> &ReportSummary {
        &self.summary
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn snapshot_version(&self) -> Option<u64> {
        self.snapshot_version
    }

    /// Results that did not pass, in report order
    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|result| !result.passed)
    }

    pub fn by_status(&self, status: ResultStatus) -> impl Iterator<Item = &ValidationResult> {
        self.results
            .iter()
            .filter(move |result| result.status == status)
    }

    pub fn has_errors(&self) -> bool {
        self.summary.failed_errors > 0
    }

    pub fn result_for(&self, location: &str) -> Option<&ValidationResult> {
        self.results
            .iter()
            .find(|result| result.record.location_path == location)
    }

    pub fn into_results(self) -> Vec<ValidationResult> {
        self.results
    }
}
