//! The rule registry.
//!
//! Rules are kept in insertion order. Re-adding an ID replaces the rule in
//! place, which keeps tie-breaking between equal priorities stable.

use crate::builtin::builtin_rules;
use crate::event::EngineEvent;
use crate::rule::WorkflowRule;
use crate::trigger::TriggerContext;
use canvasflow_core::{EventBus, RuleId};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Registered workflow rules.
pub struct RuleRegistry {
    rules: RwLock<Vec<WorkflowRule>>,
    events: Arc<EventBus<EngineEvent>>,
}

impl RuleRegistry {
    /// Creates an empty registry publishing to `events`.
    #[must_use]
    pub fn new(events: Arc<EventBus<EngineEvent>>) -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
            events,
        }
    }

    /// Inserts `rule`, replacing any rule with the same ID. Emits `rule:added`.
    pub fn add(&self, rule: WorkflowRule) {
        {
            let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
            match rules.iter_mut().find(|existing| existing.id == rule.id) {
                Some(existing) => {
                    debug!(rule_id = %rule.id, "replacing workflow rule");
                    *existing = rule.clone();
                }
                None => rules.push(rule.clone()),
            }
        }
        info!(rule_id = %rule.id, name = %rule.name, "workflow rule added");
        self.events.emit(&EngineEvent::RuleAdded { rule });
    }

    /// Removes a rule. Emits `rule:removed` only if a rule was removed.
    pub fn remove(&self, rule_id: &RuleId) -> bool {
        let removed = {
            let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
            rules
                .iter()
                .position(|rule| rule.id == *rule_id)
                .map(|index| rules.remove(index))
        };

        match removed {
            Some(rule) => {
                info!(rule_id = %rule.id, "workflow rule removed");
                self.events.emit(&EngineEvent::RuleRemoved { rule });
                true
            }
            None => false,
        }
    }

    /// Enables a rule. Emits `rule:enabled` only on a change.
    pub fn enable(&self, rule_id: &RuleId) {
        if let Some(rule) = self.set_enabled(rule_id, true) {
            self.events.emit(&EngineEvent::RuleEnabled { rule });
        }
    }

    /// Disables a rule. Emits `rule:disabled` only on a change.
    pub fn disable(&self, rule_id: &RuleId) {
        if let Some(rule) = self.set_enabled(rule_id, false) {
            self.events.emit(&EngineEvent::RuleDisabled { rule });
        }
    }

    /// Flips the flag and returns the changed rule, or `None` if nothing changed.
    fn set_enabled(&self, rule_id: &RuleId, enabled: bool) -> Option<WorkflowRule> {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        let rule = rules
            .iter_mut()
            .find(|rule| rule.id == *rule_id && rule.enabled != enabled)?;
        rule.enabled = enabled;
        debug!(rule_id = %rule.id, enabled, "workflow rule toggled");
        Some(rule.clone())
    }

    /// Returns one rule by ID.
    #[must_use]
    pub fn get(&self, rule_id: &RuleId) -> Option<WorkflowRule> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|rule| rule.id == *rule_id)
            .cloned()
    }

    /// Returns every rule, in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<WorkflowRule> {
        self.rules.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns the enabled rules whose trigger matches `context`, by
    /// ascending priority. Ties keep insertion order.
    #[must_use]
    pub fn matching(&self, context: &TriggerContext) -> Vec<WorkflowRule> {
        let mut matching: Vec<WorkflowRule> = self
            .rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|rule| rule.enabled && rule.trigger.matches(context))
            .cloned()
            .collect();
        matching.sort_by_key(|rule| rule.priority);
        matching
    }

    /// Registers the built-in rules.
    pub fn seed_builtins(&self) {
        for rule in builtin_rules() {
            self.add(rule);
        }
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no rule is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every rule without emitting events.
    pub fn clear(&self) {
        self.rules.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
