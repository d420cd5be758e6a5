//! Error types for the workflow crate.
//!
//! - `ActionError`: a single action failed while mutating the scene
//! - `EngineError`: failures surfaced by the engine façade (wrapped in a
//!   rootcause `Report` at that boundary)

use canvasflow_core::{ExecutionId, RuleId};
use canvasflow_scene::SceneError;
use std::fmt;

/// Errors raised by an action handler.
///
/// Any of these fails the step and the execution it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The scene refused a read or mutation.
    Scene(SceneError),
    /// `apply-template` named a template nobody provides.
    UnknownTemplate { name: String },
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scene(e) => write!(f, "scene error: {e}"),
            Self::UnknownTemplate { name } => write!(f, "unknown template: {name}"),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<SceneError> for ActionError {
    fn from(e: SceneError) -> Self {
        Self::Scene(e)
    }
}

/// Errors returned by the engine façade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No rule with this ID is registered.
    RuleNotFound { rule_id: RuleId },
    /// The rule ran and one of its actions failed.
    ExecutionFailed {
        rule_id: RuleId,
        execution_id: ExecutionId,
        reason: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RuleNotFound { rule_id } => write!(f, "workflow rule not found: {rule_id}"),
            Self::ExecutionFailed {
                rule_id,
                execution_id,
                reason,
            } => write!(
                f,
                "execution {execution_id} of rule {rule_id} failed: {reason}"
            ),
        }
    }
}

impl std::error::Error for EngineError {}
