//! Rule Snapshot Store
//!
//! The current rule set is an immutable, versioned snapshot behind an
//! `ArcSwap`. Publishing builds a new snapshot and swaps the pointer, so a
//! run that already holds a snapshot keeps validating against it.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::hierarchy::ClassHierarchy;
use crate::rule::{BrokenRule, RuleDefinition};
use crate::table::{ConfigurationConflict, RuleSetBuild, RuleTable};

/// Immutable published rule set
#[derive(Debug)]
pub struct RuleSnapshot {
    /// Starts at 1 and increases by one per publish
    pub version: u64,
    pub table: Arc<RuleTable>,
    pub broken_rules: Arc<[BrokenRule]>,
    pub conflicts: Arc<[ConfigurationConflict]>,
}

impl RuleSnapshot {
    fn from_build(version: u64, build: RuleSetBuild) -> Self {
        Self {
            version,
            table: Arc::new(build.table),
            broken_rules: build.broken_rules.into(),
            conflicts: build.conflicts.into(),
        }
    }
}

/// Holder of the current [`RuleSnapshot`]
#[derive(Debug)]
pub struct RuleSnapshotStore {
    current: ArcSwap<RuleSnapshot>,
}

impl RuleSnapshotStore {
    pub fn new(build: RuleSetBuild) -> Self {
        Self {
            current: ArcSwap::from_pointee(RuleSnapshot::from_build(1, build)),
        }
    }

    pub fn current(&self) -> Arc<RuleSnapshot> {
        self.current.load_full()
    }

    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Atomically replace the current snapshot with one built from `build`
    pub fn publish(&self, build: RuleSetBuild) -> Arc<RuleSnapshot> {
        let table = Arc::new(build.table);
        let broken_rules: Arc<[BrokenRule]> = build.broken_rules.into();
        let conflicts: Arc<[ConfigurationConflict]> = build.conflicts.into();

        // The closure may run more than once; the last attempt is the one stored.
        let mut published = None;
        let previous = self.current.rcu(|current| {
            let next = Arc::new(RuleSnapshot {
                version: current.version + 1,
                table: Arc::clone(&table),
                broken_rules: Arc::clone(&broken_rules),
                conflicts: Arc::clone(&conflicts),
            });
            published = Some(Arc::clone(&next));
            next
        });
        let published = published.unwrap_or_else(|| self.current.load_full());

        info!(
            from = previous.version,
            to = published.version,
            rules = published.table.rules().len(),
            broken = published.broken_rules.len(),
            "Rule snapshot published"
        );
        published
    }

    /// Compile `definitions` and publish the result
    pub fn reload(
        &self,
        definitions: impl IntoIterator<Item = RuleDefinition>,
        hierarchy: Arc<ClassHierarchy>,
    ) -> Arc<RuleSnapshot> {
        self.publish(RuleSetBuild::load(definitions, hierarchy))
    }
}
