//! The starter rule set every engine is seeded with.

use crate::action::{ActionKind, AlignAxis, ObjectSelector, Severity, WorkflowAction};
use crate::condition::{ConditionType, Operator, WorkflowCondition};
use crate::rule::{RuleCategory, WorkflowRule};
use crate::trigger::{TriggerType, WorkflowTrigger};
use canvasflow_scene::ObjectKind;

/// Returns the built-in rules, in seeding order.
#[must_use]
pub fn builtin_rules() -> Vec<WorkflowRule> {
    vec![
        WorkflowRule::new(
            "auto-connect-audit-flow",
            "Auto-connect audit flow",
            WorkflowTrigger::new(TriggerType::ObjectAdded).for_objects(ObjectKind::Rect),
        )
        .with_description("Links new audit steps to the previous one")
        .with_category(RuleCategory::Audit)
        .with_priority(1)
        .with_condition(WorkflowCondition::object_count_above(1))
        .with_condition(WorkflowCondition::text_contains_any("audit|review|control|evidence"))
        .with_action(ActionKind::ConnectObjects {
            selector: ObjectSelector::Latest {
                kind: ObjectKind::Rect,
                count: 2,
            },
            style: None,
        })
        .with_action(ActionKind::notify("Audit steps connected", Severity::Success)),
        WorkflowRule::new(
            "auto-format-risk-matrix",
            "Auto-format risk matrix",
            WorkflowTrigger::new(TriggerType::ObjectAdded).for_objects(ObjectKind::Rect),
        )
        .with_description("Colors a 3x3 risk grid by severity")
        .with_category(RuleCategory::Risk)
        .with_priority(2)
        .with_condition(WorkflowCondition::object_count_above(1))
        .with_condition(WorkflowCondition::text_contains_any("risk|high|medium|low"))
        .with_action(ActionKind::auto_format(
            "risk-matrix",
            &["#22c55e", "#eab308", "#ef4444"],
        )),
        WorkflowRule::new(
            "smart-compliance-checklist",
            "Smart compliance checklist",
            WorkflowTrigger::new(TriggerType::TextChanged),
        )
        .with_description("Suggests checklist items when compliance text appears")
        .with_category(RuleCategory::Compliance)
        .with_priority(3)
        .with_condition(WorkflowCondition::text_contains_any(
            "compliance|regulation|policy|requirement",
        ))
        .with_action(ActionKind::suggest(
            "Consider adding a compliance checklist: owner, evidence, review date",
        ))
        .with_action(ActionKind::notify(
            "Compliance content detected",
            Severity::Info,
        )),
        WorkflowRule::new(
            "auto-align-process-flow",
            "Auto-align process flow",
            WorkflowTrigger::new(TriggerType::ObjectModified),
        )
        .with_description("Lines process steps up after they are moved")
        .with_category(RuleCategory::Process)
        .with_priority(4)
        .with_condition(WorkflowCondition::object_count_above(2))
        .with_condition(WorkflowCondition::object_type_is("rect"))
        .with_action(
            WorkflowAction::new(ActionKind::auto_align(AlignAxis::Horizontal, 50.0)).after(1000),
        ),
        WorkflowRule::new(
            "smart-template-suggestions",
            "Smart template suggestions",
            WorkflowTrigger::new(TriggerType::ObjectAdded),
        )
        .with_description("Offers templates when a canvas is started")
        .with_category(RuleCategory::General)
        .with_priority(5)
        .with_condition(WorkflowCondition::new(ConditionType::ObjectCount, Operator::Equals, 1))
        .with_action(ActionKind::suggest(
            "Start from a template: audit-checklist, risk-matrix or process-flow",
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_ids_are_unique() {
        let rules = builtin_rules();
        let ids: HashSet<_> = rules.iter().map(|rule| rule.id.clone()).collect();
        assert_eq!(ids.len(), rules.len());
    }

    #[test]
    fn every_builtin_is_enabled_with_actions() {
        for rule in builtin_rules() {
            assert!(rule.enabled, "{} should start enabled", rule.id);
            assert!(!rule.actions.is_empty(), "{} has no actions", rule.id);
        }
    }

    #[test]
    fn align_rule_waits_a_second() {
        let rules = builtin_rules();
        let align = rules
            .iter()
            .find(|rule| rule.id.as_str() == "auto-align-process-flow")
            .expect("align rule");
        assert_eq!(align.actions[0].delay, Some(1000));
    }
}
