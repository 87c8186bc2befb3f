//! Configuration
//!
//! Settings are merged by Figment from defaults, an optional TOML file and
//! `NCV__` environment variables. Rules may also live in a directory of
//! YAML files.

pub mod loader;
pub mod types;
pub mod yaml_rules;

pub use loader::SettingsLoader;
pub use types::{ClassDeclaration, LoggingConfig, Settings};
pub use yaml_rules::{RuleFileSet, YamlRuleLoader};
