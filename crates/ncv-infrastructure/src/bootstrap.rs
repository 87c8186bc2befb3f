//! Engine Bootstrap
//!
//! Turns [`Settings`] into a ready-to-run engine: class hierarchy, rule
//! snapshot store and batch pipeline. [`RuleReloader`] re-reads the
//! settings and rule files and publishes a fresh snapshot.

use std::sync::Arc;

use ncv_validate::{
    BatchPipeline, ClassHierarchy, RuleDefinition, RuleSetBuild, RuleSnapshot, RuleSnapshotStore,
    Validator,
};
use tracing::{info, warn};

use crate::config::{ClassDeclaration, Settings, SettingsLoader, YamlRuleLoader};
use crate::error::Result;

/// Rules and classes from settings plus the rules directory
struct RuleSources {
    rules: Vec<RuleDefinition>,
    classes: Vec<ClassDeclaration>,
}

impl RuleSources {
    fn collect(settings: &Settings) -> Result<Self> {
        let mut rules = settings.rules.clone();
        let mut classes = settings.classes.clone();
        if let Some(dir) = &settings.rules_dir {
            let files = YamlRuleLoader::load_dir(dir)?;
            rules.extend(files.rules);
            classes.extend(files.classes);
        }
        Ok(Self { rules, classes })
    }

    fn hierarchy(&self) -> Result<Arc<ClassHierarchy>> {
        let mut builder = ClassHierarchy::builder();
        for class in &self.classes {
            builder.declare(class.name.trim(), class.parent.as_deref().map(str::trim));
        }
        Ok(Arc::new(builder.build()?))
    }

    fn build(self) -> Result<RuleSetBuild> {
        let hierarchy = self.hierarchy()?;
        Ok(RuleSetBuild::load(self.rules, hierarchy))
    }
}

/// Engine components built from settings
#[derive(Debug)]
pub struct EngineBootstrap {
    store: Arc<RuleSnapshotStore>,
    pipeline: BatchPipeline,
}

impl EngineBootstrap {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let build = RuleSources::collect(settings)?.build()?;
        if build.has_issues() {
            warn!(
                broken = build.broken_rules.len(),
                conflicts = build.conflicts.len(),
                "Rule set loaded with issues"
            );
        }
        let store = Arc::new(RuleSnapshotStore::new(build));

        let validator = Validator::new(settings.validation.clone(), settings.folder_rules.clone());
        let pipeline =
            BatchPipeline::new(settings.pipeline, validator)?.with_filter(settings.filter.clone());

        info!(
            workers = pipeline.workers(),
            rules = store.current().table.rules().len(),
            folder_rules = settings.folder_rules.len(),
            "Engine ready"
        );
        Ok(Self { store, pipeline })
    }

    /// Load settings with `loader` and build the engine
    pub fn load(loader: &SettingsLoader) -> Result<Self> {
        Self::from_settings(&loader.load()?)
    }

    pub fn store(&self) -> &Arc<RuleSnapshotStore> {
        &self.store
    }

    pub fn pipeline(&self) -> &BatchPipeline {
        &self.pipeline
    }

    /// Reloader publishing into this engine's store
    pub fn reloader(&self, loader: SettingsLoader) -> RuleReloader {
        RuleReloader::new(loader, Arc::clone(&self.store))
    }
}

/// Re-reads rules and classes and publishes them as a new snapshot
///
/// Policy, folder rules and pipeline settings belong to the pipeline and
/// are not touched by a reload.
#[derive(Debug, Clone)]
pub struct RuleReloader {
    loader: SettingsLoader,
    store: Arc<RuleSnapshotStore>,
}

impl RuleReloader {
    pub fn new(loader: SettingsLoader, store: Arc<RuleSnapshotStore>) -> Self {
        Self { loader, store }
    }

    /// Publish the rules currently on disk
    ///
    /// On error nothing is published and the current snapshot stays live.
    pub fn reload(&self) -> Result<Arc<RuleSnapshot>> {
        let settings = self.loader.load()?;
        let build = RuleSources::collect(&settings)?.build()?;
        let snapshot = self.store.publish(build);
        info!(
            version = snapshot.version,
            broken = snapshot.broken_rules.len(),
            conflicts = snapshot.conflicts.len(),
            "Rules reloaded"
        );
        Ok(snapshot)
    }

    pub fn store(&self) -> &Arc<RuleSnapshotStore> {
        &self.store
    }
}
