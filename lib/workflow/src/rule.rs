//! Workflow rule definitions.
//!
//! A rule bundles one trigger, an AND-list of conditions and an ordered list
//! of actions, plus the metadata the editor's rule panel needs.

use crate::action::WorkflowAction;
use crate::condition::WorkflowCondition;
use crate::trigger::WorkflowTrigger;
use canvasflow_core::RuleId;
use serde::{Deserialize, Serialize};

/// Grouping used by the rule panel. Has no effect on evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCategory {
    Audit,
    Risk,
    Compliance,
    Process,
    #[default]
    General,
}

/// A declarative automation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRule {
    pub id: RuleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: RuleCategory,
    pub trigger: WorkflowTrigger,
    #[serde(default)]
    pub conditions: Vec<WorkflowCondition>,
    #[serde(default)]
    pub actions: Vec<WorkflowAction>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lower runs first among rules sharing a trigger.
    #[serde(default)]
    pub priority: i32,
}

fn default_enabled() -> bool {
    true
}

impl WorkflowRule {
    /// Creates an enabled rule with no conditions or actions.
    #[must_use]
    pub fn new(id: impl Into<RuleId>, name: impl Into<String>, trigger: WorkflowTrigger) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: RuleCategory::default(),
            trigger,
            conditions: Vec::new(),
            actions: Vec::new(),
            enabled: true,
            priority: 0,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: RuleCategory) -> Self {
        self.category = category;
        self
    }

    /// Appends a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: WorkflowCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Appends an action.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<WorkflowAction>) -> Self {
        self.actions.push(action.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Starts the rule disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Returns true for an enabled rule that would do nothing when fired.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.enabled && self.actions.is_empty()
    }
}
