//! Batch Validation Pipeline
//!
//! Pulls records lazily in fixed-size chunks and validates each chunk in
//! parallel on a bounded rayon pool. Results keep input order. A
//! cancellation token is polled before every record; a cancelled run
//! returns the results gathered so far with `complete = false`.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span};

use crate::catalog::{Record, RecordFilter, RecordSource};
use crate::report::Report;
use crate::snapshot::RuleSnapshotStore;
use crate::table::RuleTable;
use crate::validator::{ValidationResult, Validator};

/// Records pulled from the source per parallel chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Worker pool and chunking settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads; 0 uses the available parallelism
    pub max_workers: usize,
    pub chunk_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_workers: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl PipelineConfig {
    pub fn with_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    fn worker_count(self) -> usize {
        if self.max_workers > 0 {
            return self.max_workers;
        }
        std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Bounded, cancellable batch validator
#[derive(Debug)]
pub struct BatchPipeline {
    pool: rayon::ThreadPool,
    config: PipelineConfig,
    validator: Validator,
    filter: RecordFilter,
}

impl BatchPipeline {
    pub fn new(config: PipelineConfig, validator: Validator) -> Result<Self, PipelineError> {
        if config.chunk_size == 0 {
            return Err(PipelineError::InvalidChunkSize);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_count())
            .thread_name(|index| format!("ncv-worker-{index}"))
            .build()?;

        Ok(Self {
            pool,
            config,
            validator,
            filter: RecordFilter::default(),
        })
    }

    /// Only validate records under the filter's roots
    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    pub fn run(&self, records: impl IntoIterator<Item = Record>, table: &RuleTable) -> Report {
        self.run_with_cancel(records, table, &CancellationToken::new())
    }

    pub fn run_with_cancel(
        &self,
        records: impl IntoIterator<Item = Record>,
        table: &RuleTable,
        token: &CancellationToken,
    ) -> Report {
        let (results, complete) = self.execute(records.into_iter(), table, token);
        Report::new(results, complete)
    }

    /// Run against the store's current snapshot, loaded once up front
    pub fn run_snapshot(
        &self,
        records: impl IntoIterator<Item = Record>,
        store: &RuleSnapshotStore,
        token: &CancellationToken,
    ) -> Report {
        let snapshot = store.current();
        debug!(version = snapshot.version, "Validating against rule snapshot");
        self.run_with_cancel(records, &snapshot.table, token)
            .with_snapshot_version(snapshot.version)
    }

    /// Re-validate only records whose location is in `changed` or missing
    /// from `prior`; reuse prior results for the rest.
    ///
    /// Output follows the order of `records`; prior results for locations
    /// not in `records` are dropped.
    pub fn run_subset(
        &self,
        records: impl IntoIterator<Item = Record>,
        table: &RuleTable,
        prior: &Report,
        changed: &HashSet<String>,
    ) -> Report {
        self.run_subset_with_cancel(records, table, prior, changed, &CancellationToken::new())
    }

    pub fn run_subset_with_cancel(
        &self,
        records: impl IntoIterator<Item = Record>,
        table: &RuleTable,
        prior: &Report,
        changed: &HashSet<String>,
        token: &CancellationToken,
    ) -> Report {
        let previous: HashMap<&str, &ValidationResult> = prior
            .results()
            .iter()
            .map(|result| (result.location(), result))
            .collect();

        let mut slots: Vec<Option<ValidationResult>> = Vec::new();
        let mut stale: Vec<Record> = Vec::new();
        let mut stale_slots: HashMap<String, usize> = HashMap::new();
        for record in records.into_iter().filter(|r| self.filter.accepts(r)) {
            let reusable = if changed.contains(&record.location_path) {
                None
            } else {
                previous.get(record.location_path.as_str())
            };
            match reusable {
                Some(result) => slots.push(Some((*result).clone())),
                None => {
                    stale_slots.insert(record.location_path.clone(), slots.len());
                    slots.push(None);
                    stale.push(record);
                }
            }
        }

        let reused = slots.len() - stale.len();
        let (fresh, complete) = self.execute(stale.into_iter(), table, token);
        let revalidated = fresh.len();
        for result in fresh {
            if let Some(&slot) = stale_slots.get(result.location()) {
                slots[slot] = Some(result);
            }
        }

        info!(reused, revalidated, complete, "Incremental validation finished");
        Report::new(slots.into_iter().flatten().collect(), complete)
    }

    /// Full run over every record of `source`
    pub fn run_source(
        &self,
        source: &dyn RecordSource,
        table: &RuleTable,
        token: &CancellationToken,
    ) -> Report {
        self.run_with_cancel(source.records(), table, token)
    }

    /// Incremental run that fetches only the `changed` locations from `source`.
    ///
    /// Prior results keep their order and changed ones are replaced in place.
    /// Changed locations the source no longer has are dropped, and locations
    /// new to the report are appended in source order.
    pub fn revalidate_source(
        &self,
        source: &dyn RecordSource,
        table: &RuleTable,
        prior: &Report,
        changed: &HashSet<String>,
        token: &CancellationToken,
    ) -> Report {
        let records = source.records_at(changed);
        let order: Vec<String> = records
            .iter()
            .map(|record| record.location_path.clone())
            .collect();

        let (fresh, complete) = self.execute(records.into_iter(), table, token);
        let mut fresh: HashMap<String, ValidationResult> = fresh
            .into_iter()
            .map(|result| (result.record.location_path.clone(), result))
            .collect();

        let mut results = Vec::with_capacity(prior.results().len() + fresh.len());
        for result in prior.results() {
            if changed.contains(result.location()) {
                if let Some(updated) = fresh.remove(result.location()) {
                    results.push(updated);
                }
            } else {
                results.push(result.clone());
            }
        }
        results.extend(order.iter().filter_map(|location| fresh.remove(location)));

        Report::new(results, complete)
    }

    fn execute(
        &self,
        records: impl Iterator<Item = Record>,
        table: &RuleTable,
        token: &CancellationToken,
    ) -> (Vec<ValidationResult>, bool) {
        let span = info_span!(
            "batch_validation",
            workers = self.workers(),
            chunk_size = self.config.chunk_size
        );
        let _guard = span.enter();
        let started = Instant::now();

        let mut records = records.filter(|record| self.filter.accepts(record));
        let mut results = Vec::new();
        let mut complete = true;
        let mut chunk_index = 0usize;

        loop {
            let chunk: Vec<Record> = records.by_ref().take(self.config.chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            if token.is_cancelled() {
                complete = false;
                break;
            }

            let validated: Vec<Option<ValidationResult>> = self.pool.install(|| {
                chunk
                    .par_iter()
                    .map(|record| {
                        (!token.is_cancelled()).then(|| self.validator.validate(record, table))
                    })
                    .collect()
            });

            // A chunk cut short by cancellation is discarded whole
            let Some(validated) = validated.into_iter().collect::<Option<Vec<_>>>() else {
                debug!(chunk = chunk_index, "Chunk discarded after cancellation");
                complete = false;
                break;
            };
            debug!(
                chunk = chunk_index,
                validated = validated.len(),
                "Chunk validated"
            );
            results.extend(validated);
            chunk_index += 1;
        }

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            records = results.len(),
            chunks = chunk_index,
            complete,
            elapsed_ms,
            "Batch validation finished"
        );
        (results, complete)
    }
}
