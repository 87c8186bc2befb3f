//! Settings loader
//!
//! Handles loading settings from defaults, a TOML file and environment
//! variables, in that order (later sources override earlier).

use std::env;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};

use crate::config::Settings;
use crate::constants::{
    CONFIG_ENV_PREFIX, CONFIG_ENV_SEPARATOR, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME,
};
use crate::error::{Error, IoContext, Result};
use crate::logging::{log_config_loaded, parse_log_level};

/// Settings loader service
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    /// Settings file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl SettingsLoader {
    /// Create a loader that searches the default locations
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the settings file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load settings from all sources
    ///
    /// 1. `Settings::default()`
    /// 2. TOML file (explicit path, else the first default location found)
    /// 3. Environment variables, e.g. `NCV__VALIDATION__UNMATCHED=fail`
    pub fn load(&self) -> Result<Settings> {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));

        let file = match &self.config_path {
            Some(path) => {
                let exists = path.exists();
                log_config_loaded(path, exists);
                exists.then(|| path.clone())
            }
            None => Self::find_default_config_path(),
        };
        if let Some(path) = &file {
            figment = figment.merge(Toml::file(path));
            if self.config_path.is_none() {
                log_config_loaded(path, true);
            }
        }

        figment = figment.merge(
            Env::prefixed(&format!("{}{CONFIG_ENV_SEPARATOR}", self.env_prefix))
                .split(CONFIG_ENV_SEPARATOR),
        );

        let mut settings: Settings = figment.extract()?;

        if let (Some(rules_dir), Some(source)) = (settings.rules_dir.as_mut(), file.as_deref())
            && rules_dir.is_relative()
            && let Some(base) = source.parent()
        {
            *rules_dir = base.join(&*rules_dir);
        }

        validate_settings(&settings)?;
        Ok(settings)
    }

    /// Save settings as TOML
    pub fn save_to_file<P: AsRef<Path>>(&self, settings: &Settings, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(settings)?;
        std::fs::write(path.as_ref(), toml_string)
            .io_context(format!("Failed to write settings to {}", path.as_ref().display()))
    }

    /// Get the configured settings file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// First existing default settings file
    fn find_default_config_path() -> Option<PathBuf> {
        let current_dir = env::current_dir().ok()?;

        let candidates = [
            Some(current_dir.join(DEFAULT_CONFIG_FILENAME)),
            Some(
                current_dir
                    .join(format!(".{DEFAULT_CONFIG_DIR}"))
                    .join(DEFAULT_CONFIG_FILENAME),
            ),
            dirs::config_dir().map(|d| d.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME)),
        ];

        candidates.into_iter().flatten().find(|path| path.exists())
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate settings values
///
/// Malformed patterns are not rejected here: they surface as broken rules
/// when the rule set is built.
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_pipeline(settings)?;
    validate_logging(settings)?;
    validate_classes(settings)?;
    validate_rules(settings)?;
    validate_folder_rules(settings)?;
    Ok(())
}

fn validate_pipeline(settings: &Settings) -> Result<()> {
    if settings.pipeline.chunk_size == 0 {
        return Err(Error::configuration("Pipeline chunk size cannot be 0"));
    }
    Ok(())
}

fn validate_logging(settings: &Settings) -> Result<()> {
    parse_log_level(&settings.logging.level).map(|_| ())
}

fn validate_classes(settings: &Settings) -> Result<()> {
    if settings.classes.iter().any(|class| class.name.trim().is_empty()) {
        return Err(Error::configuration("Class names cannot be empty"));
    }
    Ok(())
}

fn validate_rules(settings: &Settings) -> Result<()> {
    if let Some(index) = settings
        .rules
        .iter()
        .position(|rule| rule.target.trim().is_empty())
    {
        return Err(Error::configuration(format!(
            "Rule #{} has an empty target class",
            index + 1
        )));
    }
    Ok(())
}

fn validate_folder_rules(settings: &Settings) -> Result<()> {
    for rule in &settings.folder_rules {
        if rule.id.trim().is_empty() {
            return Err(Error::configuration("Folder rule ids cannot be empty"));
        }
        if rule.root.trim().is_empty() {
            return Err(Error::configuration(format!(
                "Folder rule '{}' has an empty root",
                rule.id
            )));
        }
    }
    Ok(())
}
