//! Session runner configuration.
//!
//! Loaded via the `config` crate from environment variables prefixed with
//! `CANVASFLOW_`, using `__` to reach nested fields:
//!
//! - `CANVASFLOW_SCRIPT=demo.json`
//! - `CANVASFLOW_ENGINE__MAX_EXECUTIONS=500`
//! - `CANVASFLOW_ENGINE__SEED_BUILTINS=false`

use canvasflow_workflow::EngineConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Runner configuration composed from the engine's config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Script to replay. Without one the built-in demo runs.
    #[serde(default)]
    pub script: Option<PathBuf>,
}

impl SessionConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds a value of the wrong type.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(environment())
    }

    fn from_source(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("CANVASFLOW")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
