//! Error handling types

use std::path::PathBuf;

use ncv_validate::{HierarchyError, PipelineError};
use thiserror::Error;

/// Result type alias for infrastructure operations
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure error
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {message}: {source}")]
    Io {
        /// What was being done
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be merged or extracted
    #[error("Failed to load configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// A rule file is not valid YAML or has the wrong shape
    #[error("Invalid rule file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Settings could not be written as TOML
    #[error("Failed to serialize settings to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Declared classes do not form a hierarchy
    #[error("Invalid class hierarchy: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// Worker pool could not be created
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Settings are well-formed but invalid
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the problem
        message: String,
    },
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for Error {
    fn from(error: figment::Error) -> Self {
        Self::Figment(Box::new(error))
    }
}

/// Attach a description to I/O failures
pub trait IoContext<T> {
    fn io_context<C: std::fmt::Display>(self, context: C) -> Result<T>;
}

impl<T> IoContext<T> for std::result::Result<T, std::io::Error> {
    fn io_context<C: std::fmt::Display>(self, context: C) -> Result<T> {
        self.map_err(|source| Error::Io {
            message: context.to_string(),
            source,
        })
    }
}
