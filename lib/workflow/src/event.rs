//! Events the engine publishes to its listeners.
//!
//! Listeners (the editor's rule and history panels) only read these; the
//! engine never depends on what a listener does with them.

use crate::action::Severity;
use crate::execution::WorkflowExecution;
use crate::rule::WorkflowRule;
use canvasflow_core::{BusEvent, RuleId};
use serde::Serialize;
use std::fmt;

/// Names of engine events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EngineEventKind {
    #[serde(rename = "rule:added")]
    RuleAdded,
    #[serde(rename = "rule:removed")]
    RuleRemoved,
    #[serde(rename = "rule:enabled")]
    RuleEnabled,
    #[serde(rename = "rule:disabled")]
    RuleDisabled,
    #[serde(rename = "execution:started")]
    ExecutionStarted,
    #[serde(rename = "execution:completed")]
    ExecutionCompleted,
    #[serde(rename = "execution:failed")]
    ExecutionFailed,
    #[serde(rename = "content:suggestion")]
    ContentSuggestion,
    #[serde(rename = "user:notification")]
    UserNotification,
    #[serde(rename = "engine:toggled")]
    EngineToggled,
}

impl EngineEventKind {
    /// Returns the wire name of this event.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RuleAdded => "rule:added",
            Self::RuleRemoved => "rule:removed",
            Self::RuleEnabled => "rule:enabled",
            Self::RuleDisabled => "rule:disabled",
            Self::ExecutionStarted => "execution:started",
            Self::ExecutionCompleted => "execution:completed",
            Self::ExecutionFailed => "execution:failed",
            Self::ContentSuggestion => "content:suggestion",
            Self::UserNotification => "user:notification",
            Self::EngineToggled => "engine:toggled",
        }
    }
}

impl fmt::Display for EngineEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An engine event with its payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EngineEvent {
    #[serde(rename = "rule:added")]
    RuleAdded { rule: WorkflowRule },
    #[serde(rename = "rule:removed")]
    RuleRemoved { rule: WorkflowRule },
    #[serde(rename = "rule:enabled")]
    RuleEnabled { rule: WorkflowRule },
    #[serde(rename = "rule:disabled")]
    RuleDisabled { rule: WorkflowRule },
    #[serde(rename = "execution:started")]
    ExecutionStarted {
        execution: WorkflowExecution,
        rule: WorkflowRule,
    },
    #[serde(rename = "execution:completed")]
    ExecutionCompleted {
        execution: WorkflowExecution,
        rule: WorkflowRule,
    },
    #[serde(rename = "execution:failed")]
    ExecutionFailed {
        execution: WorkflowExecution,
        rule: WorkflowRule,
    },
    #[serde(rename = "content:suggestion", rename_all = "camelCase")]
    ContentSuggestion { message: String, rule_id: RuleId },
    #[serde(rename = "user:notification", rename_all = "camelCase")]
    UserNotification {
        message: String,
        severity: Severity,
        /// Display time in milliseconds.
        duration: u64,
        rule_id: RuleId,
    },
    #[serde(rename = "engine:toggled")]
    EngineToggled { enabled: bool },
}

impl BusEvent for EngineEvent {
    type Kind = EngineEventKind;

    fn kind(&self) -> EngineEventKind {
        match self {
            Self::RuleAdded { .. } => EngineEventKind::RuleAdded,
            Self::RuleRemoved { .. } => EngineEventKind::RuleRemoved,
            Self::RuleEnabled { .. } => EngineEventKind::RuleEnabled,
            Self::RuleDisabled { .. } => EngineEventKind::RuleDisabled,
            Self::ExecutionStarted { .. } => EngineEventKind::ExecutionStarted,
            Self::ExecutionCompleted { .. } => EngineEventKind::ExecutionCompleted,
            Self::ExecutionFailed { .. } => EngineEventKind::ExecutionFailed,
            Self::ContentSuggestion { .. } => EngineEventKind::ContentSuggestion,
            Self::UserNotification { .. } => EngineEventKind::UserNotification,
            Self::EngineToggled { .. } => EngineEventKind::EngineToggled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_match_wire_names() {
        let json = serde_json::to_value(EngineEventKind::ExecutionFailed).expect("serialize");
        assert_eq!(json, EngineEventKind::ExecutionFailed.as_str());
    }

    #[test]
    fn event_serializes_with_tag() {
        let event = EngineEvent::ContentSuggestion {
            message: "Add a control owner".to_string(),
            rule_id: RuleId::from("r1"),
        };
        assert_eq!(event.kind(), EngineEventKind::ContentSuggestion);

        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "content:suggestion");
        assert_eq!(json["ruleId"], "r1");
    }
}
