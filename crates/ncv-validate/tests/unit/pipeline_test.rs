//! Tests for the batch validation pipeline

use std::collections::{HashMap, HashSet};

use ncv_validate::{
    BatchPipeline, CancellationToken, InMemoryCatalog, PipelineConfig, PipelineError, Record,
    RecordFilter, RecordSource, ResultStatus, RuleSetBuild, RuleSnapshotStore, ValidationResult,
    Validator,
};

use crate::test_utils::{asset_hierarchy, mixed_records, prefix_rules, record, table};

fn pipeline(workers: usize, chunk_size: usize) -> BatchPipeline {
    BatchPipeline::new(
        PipelineConfig::default()
            .with_workers(workers)
            .with_chunk_size(chunk_size),
        Validator::default(),
    )
    .unwrap()
}

fn locations(results: &[ValidationResult]) -> Vec<&str> {
    results.iter().map(ValidationResult::location).collect()
}

/// Iterator that cancels `token` when the record at `at` is pulled
struct CancelAt {
    records: std::vec::IntoIter<Record>,
    pulled: usize,
    at: usize,
    token: CancellationToken,
}

impl Iterator for CancelAt {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.pulled == self.at {
            self.token.cancel();
        }
        self.pulled += 1;
        self.records.next()
    }
}

#[test]
fn test_results_follow_input_order() {
    let records = mixed_records(500);
    let report = pipeline(4, 16).run(records.clone(), &table(prefix_rules()));

    assert!(report.is_complete());
    assert_eq!(report.results().len(), 500);
    let expected: Vec<&str> = records.iter().map(|r| r.location_path.as_str()).collect();
    assert_eq!(locations(report.results()), expected);
}

#[test]
fn test_report_matches_sequential_validation() {
    let records = mixed_records(200);
    let table = table(prefix_rules());
    let validator = Validator::default();

    let sequential: Vec<ValidationResult> =
        records.iter().map(|r| validator.validate(r, &table)).collect();
    let report = pipeline(3, 7).run(records, &table);

    assert_eq!(report.results(), sequential.as_slice());
}

#[test]
fn test_zero_chunk_size_is_rejected() {
    let result = BatchPipeline::new(
        PipelineConfig::default().with_chunk_size(0),
        Validator::default(),
    );

    assert!(matches!(result, Err(PipelineError::InvalidChunkSize)));
}

#[test]
fn test_worker_count_is_bounded() {
    let pipeline = pipeline(2, 8);

    assert_eq!(pipeline.workers(), 2);
    assert_eq!(pipeline.config().chunk_size, 8);
}

#[test]
fn test_default_worker_count_uses_available_parallelism() {
    let pipeline = BatchPipeline::new(PipelineConfig::default(), Validator::default()).unwrap();

    assert!(pipeline.workers() >= 1);
}

#[test]
fn test_empty_input_is_complete() {
    let report = pipeline(2, 8).run(Vec::new(), &table(prefix_rules()));

    assert!(report.is_complete());
    assert!(report.results().is_empty());
    assert_eq!(report.summary().total, 0);
}

#[test]
fn test_cancelled_before_start_returns_nothing() {
    let token = CancellationToken::new();
    token.cancel();

    let report = pipeline(2, 8).run_with_cancel(mixed_records(50), &table(prefix_rules()), &token);

    assert!(!report.is_complete());
    assert!(report.results().is_empty());
}

#[test]
fn test_cancel_mid_run_keeps_validated_prefix() {
    let records = mixed_records(10);
    let token = CancellationToken::new();
    let source = CancelAt {
        records: records.clone().into_iter(),
        pulled: 0,
        at: 2,
        token: token.clone(),
    };

    let report = pipeline(1, 2).run_with_cancel(source, &table(prefix_rules()), &token);

    assert!(!report.is_complete());
    assert_eq!(
        locations(report.results()),
        vec![
            records[0].location_path.as_str(),
            records[1].location_path.as_str()
        ]
    );
}

#[test]
fn test_cancelled_results_are_a_subset_in_order() {
    let records = mixed_records(300);
    let token = CancellationToken::new();
    let source = CancelAt {
        records: records.clone().into_iter(),
        pulled: 0,
        at: 150,
        token: token.clone(),
    };

    let report = pipeline(4, 32).run_with_cancel(source, &table(prefix_rules()), &token);

    assert!(!report.is_complete());
    assert!(report.results().len() <= 150);
    let mut input = records.iter();
    for result in report.results() {
        assert!(input.any(|r| r.location_path == result.location()));
    }
}

#[test]
fn test_cancel_during_chunk_keeps_only_whole_chunks() {
    let chunk_size = 500;
    let records = mixed_records(20_000);
    let token = CancellationToken::new();
    let canceller = {
        let token = token.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(2));
            token.cancel();
        })
    };

    let report =
        pipeline(4, chunk_size).run_with_cancel(records.clone(), &table(prefix_rules()), &token);
    canceller.join().unwrap();

    let kept = report.results().len();
    assert_eq!(kept % chunk_size, 0);
    assert_eq!(report.is_complete(), kept == records.len());
    assert_eq!(
        locations(report.results()),
        records[..kept]
            .iter()
            .map(|r| r.location_path.as_str())
            .collect::<Vec<_>>()
    );
}

#[test]
fn test_permuted_input_yields_same_result_multiset() {
    let records = mixed_records(120);
    let mut permuted = records.clone();
    permuted.reverse();
    permuted.rotate_left(17);
    let table = table(prefix_rules());

    let first = pipeline(3, 10).run(records, &table);
    let second = pipeline(3, 10).run(permuted, &table);

    let by_location = |report: &ncv_validate::Report| -> HashMap<String, ValidationResult> {
        report
            .results()
            .iter()
            .map(|r| (r.location().to_string(), r.clone()))
            .collect()
    };
    assert_eq!(by_location(&first), by_location(&second));
    assert_eq!(first.summary(), second.summary());
}

#[test]
fn test_filter_restricts_records() {
    let records = vec![
        record("T_Rock", "Texture2D", "/Game/Props"),
        record("Rock", "StaticMesh", "/Game/Props"),
        record("Sky", "Texture2D", "/Game/Sky"),
    ];
    let pipeline = pipeline(2, 4).with_filter(RecordFilter::parse("/Game/Props"));

    let report = pipeline.run(records, &table(prefix_rules()));

    assert_eq!(
        locations(report.results()),
        vec!["/Game/Props/T_Rock", "/Game/Props/Rock"]
    );
    assert_eq!(report.summary().failed_errors, 1);
}

#[test]
fn test_subset_with_everything_changed_equals_full_run() {
    let records = mixed_records(60);
    let table = table(prefix_rules());
    let pipeline = pipeline(2, 8);
    let prior = pipeline.run(Vec::new(), &table);
    let changed: HashSet<String> = records.iter().map(|r| r.location_path.clone()).collect();

    let full = pipeline.run(records.clone(), &table);
    let subset = pipeline.run_subset(records, &table, &prior, &changed);

    assert_eq!(subset, full);
}

#[test]
fn test_subset_revalidates_changed_and_reuses_rest() {
    let table = table(prefix_rules());
    let pipeline = pipeline(2, 4);
    let before = vec![
        record("T_Rock", "Texture2D", "/Game/Props"),
        record("Mesh", "StaticMesh", "/Game/Props"),
        record("M_Rock", "Material", "/Game/Props"),
    ];
    let prior = pipeline.run(before, &table);
    assert_eq!(prior.summary().failed_errors, 1);

    // Mesh renamed in place, M_Rock deleted, a new texture added
    let after = vec![
        record("T_Rock", "Texture2D", "/Game/Props"),
        Record::new("SM_Rock", "StaticMesh", "/Game/Props/Mesh"),
        record("Grass", "Texture2D", "/Game/World"),
    ];
    let changed: HashSet<String> = ["/Game/Props/Mesh".to_string()].into_iter().collect();

    let report = pipeline.run_subset(after, &table, &prior, &changed);

    assert!(report.is_complete());
    assert_eq!(
        locations(report.results()),
        vec!["/Game/Props/T_Rock", "/Game/Props/Mesh", "/Game/World/Grass"]
    );
    assert_eq!(report.results()[0], prior.results()[0]);
    assert_eq!(report.results()[1].status, ResultStatus::Passed);
    assert_eq!(report.results()[2].status, ResultStatus::Failed);
    assert!(report.result_for("/Game/Props/M_Rock").is_none());
}

#[test]
fn test_run_snapshot_records_version() {
    let store = RuleSnapshotStore::new(RuleSetBuild::load(prefix_rules(), asset_hierarchy()));
    store.reload(prefix_rules(), asset_hierarchy());
    let token = CancellationToken::new();

    let report = pipeline(2, 8).run_snapshot(mixed_records(20), &store, &token);

    assert_eq!(report.snapshot_version(), Some(2));
    assert_eq!(report.results().len(), 20);
    assert_eq!(pipeline(2, 8).run(mixed_records(1), &store.current().table).snapshot_version(), None);
}

#[test]
fn test_run_source_validates_catalog() {
    let catalog: InMemoryCatalog = mixed_records(40).into_iter().collect();
    let table = table(prefix_rules());
    let token = CancellationToken::new();

    let report = pipeline(2, 8).run_source(&catalog, &table, &token);

    assert_eq!(report, pipeline(2, 8).run(catalog.records(), &table));
}

#[test]
fn test_revalidate_source_matches_full_run_after_edits() {
    let mut catalog: InMemoryCatalog = mixed_records(30).into_iter().collect();
    let table = table(prefix_rules());
    let pipeline = pipeline(2, 4);
    let token = CancellationToken::new();
    let prior = pipeline.run_source(&catalog, &table, &token);

    // Fix one misnamed record, break a good one, delete one and add one
    catalog.upsert(Record::new("T_Fixed", "Texture2D", "/Game/Content/Bad0"));
    catalog.upsert(Record::new("oops", "StaticMesh", "/Game/Content/SM_Item1"));
    catalog.remove("/Game/Content/M_Item2");
    catalog.push(record("M_New", "Material", "/Game/Content"));
    let changed: HashSet<String> = [
        "/Game/Content/Bad0",
        "/Game/Content/SM_Item1",
        "/Game/Content/M_Item2",
        "/Game/Content/M_New",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    let incremental = pipeline.revalidate_source(&catalog, &table, &prior, &changed, &token);
    let full = pipeline.run_source(&catalog, &table, &token);

    assert_eq!(incremental, full);
    assert_eq!(
        incremental.result_for("/Game/Content/Bad0").map(|r| r.status),
        Some(ResultStatus::Passed)
    );
    assert_eq!(
        incremental.result_for("/Game/Content/SM_Item1").map(|r| r.status),
        Some(ResultStatus::Failed)
    );
}
