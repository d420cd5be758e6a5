//! Execution records.
//!
//! One `WorkflowExecution` is created per rule firing, with one
//! `WorkflowStep` per action that was attempted. Executions reference their
//! rule by ID only.

use crate::action::WorkflowAction;
use canvasflow_core::{ExecutionId, RuleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The overall state of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStatus {
    /// Actions are still being run.
    Running,
    /// Every action finished.
    Completed,
    /// An action failed; the remaining actions were skipped.
    Failed,
    /// Stopped from outside before finishing.
    Cancelled,
}

impl ExecutionStatus {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// The state of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    /// Waiting out the action's delay.
    Pending,
    /// The action is running.
    Running,
    /// The action finished.
    Completed,
    /// The action failed.
    Failed,
}

impl StepStatus {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A record of a single rule firing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecution {
    pub id: ExecutionId,
    pub rule_id: RuleId,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: ExecutionStatus,
    pub steps: Vec<WorkflowStep>,
    pub error: Option<String>,
}

impl WorkflowExecution {
    /// Creates a running execution for `rule_id`.
    #[must_use]
    pub fn start(rule_id: RuleId) -> Self {
        Self {
            id: ExecutionId::new(),
            rule_id,
            start_time: Utc::now(),
            end_time: None,
            status: ExecutionStatus::Running,
            steps: Vec::new(),
            error: None,
        }
    }

    /// Marks the execution as completed.
    pub fn complete(&mut self) {
        self.finish(ExecutionStatus::Completed);
    }

    /// Marks the execution as failed.
    pub fn fail(&mut self, error: String) {
        self.finish(ExecutionStatus::Failed);
        self.error = Some(error);
    }

    /// Marks the execution as cancelled, along with the step it was on.
    pub fn cancel(&mut self) {
        if let Some(step) = self.current_step_mut() {
            step.fail("cancelled".to_string());
        }
        self.finish(ExecutionStatus::Cancelled);
    }

    fn finish(&mut self, status: ExecutionStatus) {
        self.status = status;
        self.end_time = Some(Utc::now());
    }

    /// Returns the step currently being worked on, if any.
    pub fn current_step_mut(&mut self) -> Option<&mut WorkflowStep> {
        self.steps.last_mut().filter(|step| !step.status.is_terminal())
    }

    /// Returns how long the execution took, or has taken so far.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.end_time.unwrap_or_else(Utc::now) - self.start_time
    }
}

/// Execution record for one action within an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub action: WorkflowAction,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: StepStatus,
    pub result: Option<JsonValue>,
    pub error: Option<String>,
}

impl WorkflowStep {
    /// Creates a pending step.
    #[must_use]
    pub fn new(action: WorkflowAction) -> Self {
        Self {
            action,
            start_time: Utc::now(),
            end_time: None,
            status: StepStatus::Pending,
            result: None,
            error: None,
        }
    }

    /// Starts the step; its start time becomes now.
    pub fn start(&mut self) {
        self.status = StepStatus::Running;
        self.start_time = Utc::now();
    }

    /// Marks the step as completed.
    pub fn complete(&mut self, result: JsonValue) {
        self.status = StepStatus::Completed;
        self.end_time = Some(Utc::now());
        self.result = Some(result);
    }

    /// Marks the step as failed.
    pub fn fail(&mut self, error: String) {
        self.status = StepStatus::Failed;
        self.end_time = Some(Utc::now());
        self.error = Some(error);
    }
}
