//! Validation Report Rendering
//!
//! Renders reports in multiple formats:
//! - JSON for tooling
//! - Human-readable for terminal output
//! - CI summary with GitHub Actions annotations

use std::fmt::Write;

use crate::Severity;
use crate::report::Report;
use crate::rule::BrokenRule;
use crate::table::ConfigurationConflict;
use crate::validator::ResultStatus;

/// Report renderer
pub struct Reporter;

impl Reporter {
    /// Generate JSON report
    pub fn to_json(report: &Report) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    /// Generate human-readable report
    pub fn to_human_readable(report: &Report) -> String {
        let mut output = String::new();
        let summary = report.summary();

        output.push_str("=== Naming Convention Validation Report ===\n\n");
        let _ = writeln!(
            output,
            "Timestamp: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        if let Some(version) = report.snapshot_version() {
            let _ = writeln!(output, "Rule snapshot: v{version}");
        }
        output.push('\n');

        output.push_str("--- Summary ---\n");
        let _ = writeln!(
            output,
            "Checked: {} / Passed: {} / Failed: {} / Unmatched: {} / Excluded: {}",
            summary.total,
            summary.passed,
            summary.failed(),
            summary.unmatched,
            summary.excluded
        );
        let _ = writeln!(output, "  Errors:   {}", summary.failed_errors);
        let _ = writeln!(output, "  Warnings: {}", summary.failed_warnings);
        output.push('\n');

        let status = if !report.is_complete() {
            "INCOMPLETE (cancelled)"
        } else if report.has_errors() {
            "FAILED"
        } else {
            "PASSED"
        };
        let _ = writeln!(output, "Status: {status}\n");

        let failures: Vec<_> = report.failures().collect();
        if !failures.is_empty() {
            output.push_str("--- Violations ---\n");
            for result in failures {
                let severity = result.severity.unwrap_or(Severity::Error);
                let detail = result
                    .failure
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                let _ = writeln!(
                    output,
                    "  [{severity}] {} ({}): {detail}",
                    result.record.location_path, result.record.class_path
                );
            }
            output.push('\n');
        }

        let unmatched: Vec<_> = report
            .by_status(ResultStatus::Unmatched)
            .filter(|result| result.passed)
            .collect();
        if !unmatched.is_empty() {
            output.push_str("--- Unmatched Classes ---\n");
            for result in unmatched {
                let _ = writeln!(
                    output,
                    "  [WARNING] {}: no naming rule for class '{}'",
                    result.record.location_path, result.record.class_path
                );
            }
            output.push('\n');
        }

        output
    }

    /// Generate CI summary (GitHub Actions format)
    pub fn to_ci_summary(report: &Report) -> String {
        let mut output = String::new();
        let summary = report.summary();

        output.push_str("## Naming Convention Validation\n\n");

        if !report.is_complete() {
            output.push_str("**Status:** :warning: INCOMPLETE\n\n");
        } else if report.has_errors() {
            output.push_str("**Status:** :x: FAILED\n\n");
        } else {
            output.push_str("**Status:** :white_check_mark: PASSED\n\n");
        }

        output.push_str("| Category | Count |\n");
        output.push_str("|----------|-------|\n");
        let _ = writeln!(output, "| Checked | {} |", summary.total);
        let _ = writeln!(output, "| Passed | {} |", summary.passed);
        let _ = writeln!(output, "| Errors | {} |", summary.failed_errors);
        let _ = writeln!(output, "| Warnings | {} |", summary.failed_warnings);
        let _ = writeln!(output, "| Unmatched | {} |", summary.unmatched);
        let _ = writeln!(output, "| Excluded | {} |", summary.excluded);
        output.push('\n');

        for result in report.failures() {
            let level = match result.severity.unwrap_or(Severity::Error) {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            let detail = result
                .failure
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            let _ = writeln!(
                output,
                "::{level} title=Naming::{}: {detail}",
                result.record.location_path
            );
        }

        output
    }

    /// List broken rules and rule conflicts for operators
    pub fn configuration_issues(
        broken_rules: &[BrokenRule],
        conflicts: &[ConfigurationConflict],
    ) -> String {
        let mut output = String::new();

        if broken_rules.is_empty() && conflicts.is_empty() {
            output.push_str("No configuration issues.\n");
            return output;
        }

        if !broken_rules.is_empty() {
            output.push_str("--- Broken Rules ---\n");
            for broken in broken_rules {
                let _ = writeln!(output, "  [ERROR] {broken}");
            }
            output.push('\n');
        }

        if !conflicts.is_empty() {
            output.push_str("--- Rule Conflicts ---\n");
            for conflict in conflicts {
                let _ = writeln!(output, "  [WARNING] {conflict}");
            }
            output.push('\n');
        }

        output
    }
}
