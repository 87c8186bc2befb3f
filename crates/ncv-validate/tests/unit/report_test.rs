//! Tests for report summaries and queries

use ncv_validate::{
    Report, ReportSummary, ResultStatus, RuleDefinition, Severity, ValidationPolicy, Validator,
};

use crate::test_utils::{prefix_rules, record, table};

fn sample_report(policy: ValidationPolicy) -> Report {
    let mut definitions = prefix_rules();
    definitions.push(
        RuleDefinition::new("Blueprint", "{PREFIX:BP_}{ALPHANUM}")
            .with_id("blueprint")
            .with_severity(Severity::Warning),
    );
    let table = table(definitions);
    let validator = Validator::with_policy(ValidationPolicy {
        excluded_directories: vec!["/Game/Legacy".to_string()],
        ..policy
    });

    let records = [
        record("T_Rock", "Texture2D", "/Game/Props"),
        record("Rock", "StaticMesh", "/Game/Props"),
        record("Door", "Blueprint", "/Game/Props"),
        record("Boom", "SoundWave", "/Game/Audio"),
        record("old", "Texture2D", "/Game/Legacy"),
        record("M_Rock", "Material", "/Game/Props"),
    ];
    let results = records.iter().map(|r| validator.validate(r, &table)).collect();
    Report::new(results, true)
}

#[test]
fn test_summary_counts_each_status() {
    let report = sample_report(ValidationPolicy::default());

    assert_eq!(
        *report.summary(),
        ReportSummary {
            total: 6,
            passed: 2,
            failed_errors: 1,
            failed_warnings: 1,
            unmatched: 1,
            excluded: 1,
        }
    );
    assert_eq!(report.summary().failed(), 2);
    assert!(report.has_errors());
}

#[test]
fn test_strict_unmatched_counts_as_failure() {
    let report = sample_report(ValidationPolicy::strict());
    let summary = report.summary();

    assert_eq!(summary.unmatched, 1);
    assert_eq!(summary.failed_warnings, 2);
    assert_eq!(summary.failed(), 3);
}

#[test]
fn test_failures_in_report_order() {
    let report = sample_report(ValidationPolicy::default());

    let failed: Vec<&str> = report.failures().map(|r| r.record.name.as_str()).collect();
    assert_eq!(failed, vec!["Rock", "Door"]);
}

#[test]
fn test_by_status_and_lookup() {
    let report = sample_report(ValidationPolicy::default());

    assert_eq!(report.by_status(ResultStatus::Passed).count(), 2);
    assert_eq!(report.by_status(ResultStatus::Excluded).count(), 1);
    assert_eq!(
        report
            .result_for("/Game/Audio/Boom")
            .map(|result| result.status),
        Some(ResultStatus::Unmatched)
    );
    assert!(report.result_for("/Game/Audio/Missing").is_none());
}

#[test]
fn test_warnings_alone_do_not_fail() {
    let table = table(vec![
        RuleDefinition::new("Blueprint", "{PREFIX:BP_}{ALPHANUM}")
            .with_severity(Severity::Warning),
    ]);
    let result = Validator::default().validate(&record("Door", "Blueprint", "/Game"), &table);
    let report = Report::new(vec![result], true);

    assert!(!report.has_errors());
    assert_eq!(report.summary().failed_warnings, 1);
}

#[test]
fn test_new_report_has_no_snapshot_version() {
    let report = Report::new(Vec::new(), false);

    assert_eq!(report.snapshot_version(), None);
    assert!(!report.is_complete());
    assert_eq!(*report.summary(), ReportSummary::default());
    assert!(report.into_results().is_empty());
}

#[test]
fn test_report_json_shape() {
    let report = sample_report(ValidationPolicy::default());
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["complete"], true);
    assert_eq!(json["summary"]["total"], 6);
    assert_eq!(json["results"].as_array().map(Vec::len), Some(6));
    assert!(json.get("snapshot_version").is_none());
}
