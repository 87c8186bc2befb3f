//! Naming-Convention Validation Engine
//!
//! This crate checks the names of content records (meshes, textures,
//! materials, blueprints, ...) against studio-defined naming conventions:
//! - Convention rules bound to content classes, resolved through an
//!   explicit class hierarchy (nearest ancestor wins)
//! - A small pattern grammar (literals, prefix/suffix tags, enumerated and
//!   free placeholders, fixed-width numbers, separators)
//! - Path and class exclusions, strict or lenient handling of unmatched
//!   classes, folder-scoped identifier rules
//! - A bounded, cancellable batch pipeline with incremental re-runs
//! - Reports rendered as JSON, human-readable text or CI summaries
//!
//! # Example
//!
//! ```ignore
//! use ncv_validate::{
//!     BatchPipeline, ClassHierarchy, PipelineConfig, Record, RuleDefinition, RuleSetBuild,
//!     Validator,
//! };
//!
//! let mut builder = ClassHierarchy::builder();
//! builder.declare("Texture", Some("Asset"));
//! builder.declare("Texture2D", Some("Texture"));
//! let hierarchy = builder.build()?;
//!
//! let build = RuleSetBuild::load(
//!     vec![RuleDefinition::new("Texture2D", "{PREFIX:T_}{ALPHANUM}")],
//!     hierarchy.into(),
//! );
//!
//! let pipeline = BatchPipeline::new(PipelineConfig::default(), Validator::default())?;
//! let report = pipeline.run(records, &build.table);
//! ```

pub mod catalog;
pub mod folder;
pub mod hierarchy;
pub mod pattern;
pub mod pipeline;
pub mod policy;
pub mod report;
pub mod reporter;
pub mod rule;
pub mod snapshot;
pub mod table;
pub mod validator;

use serde::{Deserialize, Serialize};

pub use catalog::{InMemoryCatalog, Record, RecordFilter, RecordSource};
pub use folder::{FolderRule, FolderViolation};
pub use hierarchy::{ClassHierarchy, ClassHierarchyBuilder, ClassId, ClassPath, HierarchyError};
pub use pattern::{
    CharClass, CompileError, Evaluation, PatternExpression, PatternOptions, PatternViolation,
    Token, ViolationKind, compile, evaluate,
};
pub use pipeline::{BatchPipeline, PipelineConfig, PipelineError};
pub use policy::{UnmatchedPolicy, ValidationPolicy};
pub use report::{Report, ReportSummary};
pub use reporter::Reporter;
pub use rule::{BrokenRule, ConventionRule, RuleDefinition};
pub use snapshot::{RuleSnapshot, RuleSnapshotStore};
pub use table::{ConfigurationConflict, RuleSetBuild, RuleTable, TableBuild};
pub use validator::{FailureDetail, ResultStatus, ValidationResult, Validator};

/// Re-exported so callers can cancel runs without depending on tokio-util directly
pub use tokio_util::sync::CancellationToken;

/// Severity level attached to a failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "ERROR"),
            Self::Warning => write!(f, "WARNING"),
        }
    }
}
