//! # Infrastructure Layer
//!
//! Configuration and ambient concerns around the `ncv-validate` engine.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Figment settings (defaults, TOML, `NCV__` env) and YAML rule files |
//! | [`bootstrap`] | Engine construction from settings, rule reloads |
//! | [`logging`] | Structured logging with tracing |
//! | [`constants`] | File names, env prefixes and defaults |
//! | [`error`] | Infrastructure error type |

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;

pub use bootstrap::{EngineBootstrap, RuleReloader};
pub use config::{Settings, SettingsLoader};
pub use error::{Error, Result};
