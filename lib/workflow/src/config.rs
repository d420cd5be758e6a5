//! Engine configuration.

use serde::Deserialize;

/// Settings fixed when an engine is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial state of the global kill switch.
    pub enabled: bool,
    /// Whether the built-in rule set is registered at construction.
    pub seed_builtins: bool,
    /// Ledger retention cap. Unset keeps every execution.
    pub max_executions: Option<usize>,
    /// Period of the `timer` trigger in milliseconds. Unset disables it.
    pub timer_interval_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed_builtins: true,
            max_executions: None,
            timer_interval_ms: None,
        }
    }
}

impl EngineConfig {
    /// A config with no built-in rules, for hosts that bring their own.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            seed_builtins: false,
            ..Self::default()
        }
    }
}
