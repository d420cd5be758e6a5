//! Conditions: pure predicates over scene state.
//!
//! A rule's conditions form a logical AND. Evaluation stops at the first
//! condition that does not hold, and no condition ever mutates the scene.

use crate::trigger::TriggerContext;
use canvasflow_scene::SceneObject;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// What a condition reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionType {
    /// Number of content objects (helpers excluded).
    ObjectCount,
    /// Kind of the object that caused the event.
    ObjectType,
    /// Text of every text-bearing object; `value` holds `|`-separated terms.
    TextContains,
    /// Currently the same count as `ObjectCount`.
    CanvasSize,
    /// Reserved. Always holds.
    TimeElapsed,
    /// A predicate registered with the engine under the name in `value`.
    Custom,
}

/// How the observed value is compared with the condition's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operator {
    Equals,
    Greater,
    Less,
    /// Case-insensitive substring containment.
    Contains,
    /// `value` is a regular expression tested against the observed value.
    Matches,
    /// Holds whenever there is something to observe.
    Exists,
}

/// A single condition of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowCondition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub operator: Operator,
    #[serde(default)]
    pub value: JsonValue,
}

impl WorkflowCondition {
    /// Creates a condition.
    #[must_use]
    pub fn new(condition_type: ConditionType, operator: Operator, value: impl Into<JsonValue>) -> Self {
        Self {
            condition_type,
            operator,
            value: value.into(),
        }
    }

    /// `object-count > n`
    #[must_use]
    pub fn object_count_above(n: u64) -> Self {
        Self::new(ConditionType::ObjectCount, Operator::Greater, n)
    }

    /// `object-type == kind`
    #[must_use]
    pub fn object_type_is(kind: &str) -> Self {
        Self::new(ConditionType::ObjectType, Operator::Equals, kind)
    }

    /// `text-contains any of terms`
    #[must_use]
    pub fn text_contains_any(terms: &str) -> Self {
        Self::new(ConditionType::TextContains, Operator::Contains, terms)
    }

    /// A condition delegated to the predicate registered as `name`.
    #[must_use]
    pub fn custom(name: &str) -> Self {
        Self::new(ConditionType::Custom, Operator::Equals, name)
    }
}

/// The value a condition observed on the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Number(f64),
    Text(String),
    /// There was nothing to observe (e.g. no target object).
    Absent,
}

impl Observed {
    fn as_text(&self) -> Option<String> {
        match self {
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Absent => None,
        }
    }
}

fn json_as_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_as_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl Operator {
    /// Compares an observed value with the condition's value.
    #[must_use]
    pub fn apply(&self, actual: &Observed, expected: &JsonValue) -> bool {
        let Some(actual_text) = actual.as_text() else {
            return false;
        };

        match self {
            Self::Exists => true,
            Self::Equals => match (actual, json_as_number(expected)) {
                (Observed::Number(a), Some(e)) => *a == e,
                _ => actual_text == json_as_text(expected),
            },
            Self::Greater | Self::Less => {
                let (Observed::Number(a), Some(e)) = (actual, json_as_number(expected)) else {
                    return false;
                };
                if *self == Self::Greater { *a > e } else { *a < e }
            }
            Self::Contains => actual_text
                .to_lowercase()
                .contains(&json_as_text(expected).to_lowercase()),
            Self::Matches => {
                let pattern = json_as_text(expected);
                match Regex::new(&pattern) {
                    Ok(re) => re.is_match(&actual_text),
                    Err(e) => {
                        warn!(%pattern, error = %e, "invalid pattern in matches condition");
                        false
                    }
                }
            }
        }
    }
}

/// A caller-supplied predicate for `custom` conditions.
///
/// Predicates run inside the scene's event callback, so they must not block.
pub trait CustomPredicate: Send + Sync {
    /// Returns whether the condition holds for the scene as it was when the
    /// trigger fired.
    fn evaluate(&self, condition: &WorkflowCondition, objects: &[SceneObject], context: &TriggerContext) -> bool;
}

/// Number of objects that are content rather than editor helpers.
#[must_use]
pub fn content_count(objects: &[SceneObject]) -> usize {
    objects.iter().filter(|object| !object.kind.is_helper()).count()
}

/// All text on the scene, case-folded and joined with spaces.
#[must_use]
pub fn scene_text(objects: &[SceneObject]) -> String {
    objects
        .iter()
        .filter_map(SceneObject::text)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Evaluates conditions against a snapshot of the scene.
#[derive(Default)]
pub struct ConditionEvaluator {
    predicates: RwLock<HashMap<String, Arc<dyn CustomPredicate>>>,
}

impl ConditionEvaluator {
    /// Creates an evaluator with no custom predicates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the predicate used by `custom` conditions naming `name`.
    pub fn register(&self, name: impl Into<String>, predicate: Arc<dyn CustomPredicate>) {
        self.predicates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), predicate);
    }

    /// Drops every registered predicate.
    pub fn clear(&self) {
        self.predicates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns true if every condition holds, stopping at the first that does not.
    #[must_use]
    pub fn evaluate_all(
        &self,
        conditions: &[WorkflowCondition],
        objects: &[SceneObject],
        context: &TriggerContext,
    ) -> bool {
        for (index, condition) in conditions.iter().enumerate() {
            if !self.evaluate(condition, objects, context) {
                debug!(index, condition = ?condition.condition_type, "condition failed");
                return false;
            }
        }
        true
    }

    /// Evaluates one condition.
    #[must_use]
    pub fn evaluate(&self, condition: &WorkflowCondition, objects: &[SceneObject], context: &TriggerContext) -> bool {
        match condition.condition_type {
            ConditionType::ObjectCount | ConditionType::CanvasSize => {
                let count = content_count(objects);
                condition
                    .operator
                    .apply(&Observed::Number(count as f64), &condition.value)
            }
            ConditionType::ObjectType => {
                let actual = match context.target_kind() {
                    Some(kind) => Observed::Text(kind.as_str().to_string()),
                    None => Observed::Absent,
                };
                condition.operator.apply(&actual, &condition.value)
            }
            ConditionType::TextContains => {
                let text = scene_text(objects);
                json_as_text(&condition.value)
                    .split('|')
                    .map(|term| term.trim().to_lowercase())
                    .filter(|term| !term.is_empty())
                    .any(|term| text.contains(&term))
            }
            ConditionType::TimeElapsed => true,
            ConditionType::Custom => self.evaluate_custom(condition, objects, context),
        }
    }

    fn evaluate_custom(&self, condition: &WorkflowCondition, objects: &[SceneObject], context: &TriggerContext) -> bool {
        let name = json_as_text(&condition.value);
        let predicate = self
            .predicates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name)
            .cloned();

        match predicate {
            Some(predicate) => predicate.evaluate(condition, objects, context),
            None => {
                debug!(predicate = %name, "no predicate registered, condition holds");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::TriggerType;
    use canvasflow_scene::{InMemoryScene, ObjectBlueprint, ObjectKind, SceneAdapter};
    use serde_json::json;

    fn scene_with(blueprints: Vec<ObjectBlueprint>) -> InMemoryScene {
        let scene = InMemoryScene::new();
        for blueprint in blueprints {
            scene.add(blueprint);
        }
        scene
    }

    #[test]
    fn numeric_operators() {
        let three = Observed::Number(3.0);
        assert!(Operator::Equals.apply(&three, &json!(3)));
        assert!(Operator::Greater.apply(&three, &json!(2)));
        assert!(!Operator::Greater.apply(&three, &json!(3)));
        assert!(Operator::Less.apply(&three, &json!("10")));
        assert!(!Operator::Less.apply(&Observed::Text("a".into()), &json!(10)));
    }

    #[test]
    fn string_operators() {
        let kind = Observed::Text("Textbox".into());
        assert!(Operator::Equals.apply(&kind, &json!("Textbox")));
        assert!(!Operator::Equals.apply(&kind, &json!("rect")));
        assert!(Operator::Contains.apply(&kind, &json!("TEXT")));
        assert!(Operator::Matches.apply(&kind, &json!("^Text(box)?$")));
        assert!(!Operator::Matches.apply(&kind, &json!("([unclosed")));
    }

    #[test]
    fn absent_only_fails() {
        assert!(!Operator::Exists.apply(&Observed::Absent, &JsonValue::Null));
        assert!(!Operator::Equals.apply(&Observed::Absent, &json!("rect")));
        assert!(Operator::Exists.apply(&Observed::Number(0.0), &JsonValue::Null));
    }

    #[test]
    fn object_count_excludes_helpers() {
        let evaluator = ConditionEvaluator::new();
        let scene = scene_with(vec![
            ObjectBlueprint::rect(0.0, 0.0),
            ObjectBlueprint::rect(200.0, 0.0),
        ]);
        let objects = scene.objects();
        scene.add(ObjectBlueprint::connector(&objects[0], &objects[1]));
        scene.add(ObjectBlueprint::new(ObjectKind::ConnectionPoint));

        let objects = scene.objects();
        let context = TriggerContext::new(TriggerType::ObjectAdded);
        let equals_two = WorkflowCondition::new(ConditionType::ObjectCount, Operator::Equals, 2);
        assert!(evaluator.evaluate(&equals_two, &objects, &context));

        let canvas_size = WorkflowCondition::new(ConditionType::CanvasSize, Operator::Equals, 2);
        assert!(evaluator.evaluate(&canvas_size, &objects, &context));
    }

    #[test]
    fn object_type_reads_trigger_target() {
        let evaluator = ConditionEvaluator::new();
        let objects = scene_with(vec![ObjectBlueprint::rect(0.0, 0.0)]).objects();
        let rect = objects[0].clone();

        let condition = WorkflowCondition::object_type_is("rect");
        let with_target = TriggerContext::new(TriggerType::ObjectModified).with_target(rect);
        assert!(evaluator.evaluate(&condition, &objects, &with_target));

        assert!(!evaluator.evaluate(&condition, &objects, &TriggerContext::manual()));

        let exists = WorkflowCondition::new(ConditionType::ObjectType, Operator::Exists, JsonValue::Null);
        assert!(!evaluator.evaluate(&exists, &objects, &TriggerContext::manual()));
        assert!(evaluator.evaluate(&exists, &objects, &with_target));
    }

    #[test]
    fn text_contains_any_term_case_insensitively() {
        let evaluator = ConditionEvaluator::new();
        let objects = scene_with(vec![
            ObjectBlueprint::textbox(0.0, 0.0, "Quarterly"),
            ObjectBlueprint::rect(0.0, 0.0).with_text("HIGH Impact"),
        ])
        .objects();
        let context = TriggerContext::new(TriggerType::TextChanged);

        let any = WorkflowCondition::text_contains_any("risk|high|medium|low");
        assert!(evaluator.evaluate(&any, &objects, &context));

        let none = WorkflowCondition::text_contains_any("audit| evidence ");
        assert!(!evaluator.evaluate(&none, &objects, &context));
    }

    #[test]
    fn reserved_conditions_hold() {
        let evaluator = ConditionEvaluator::new();
        let context = TriggerContext::manual();
        let elapsed = WorkflowCondition::new(ConditionType::TimeElapsed, Operator::Greater, 1000);
        assert!(evaluator.evaluate(&elapsed, &[], &context));
        assert!(evaluator.evaluate(&WorkflowCondition::custom("unregistered"), &[], &context));
    }

    struct Counting {
        result: bool,
        calls: Arc<std::sync::Mutex<u32>>,
    }

    impl CustomPredicate for Counting {
        fn evaluate(&self, _condition: &WorkflowCondition, _objects: &[SceneObject], _context: &TriggerContext) -> bool {
            *self.calls.lock().unwrap() += 1;
            self.result
        }
    }

    #[test]
    fn evaluate_all_short_circuits() {
        let evaluator = ConditionEvaluator::new();
        let first_calls = Arc::new(std::sync::Mutex::new(0));
        let second_calls = Arc::new(std::sync::Mutex::new(0));
        evaluator.register(
            "first",
            Arc::new(Counting {
                result: false,
                calls: first_calls.clone(),
            }),
        );
        evaluator.register(
            "second",
            Arc::new(Counting {
                result: true,
                calls: second_calls.clone(),
            }),
        );

        let conditions = vec![WorkflowCondition::custom("first"), WorkflowCondition::custom("second")];
        assert!(!evaluator.evaluate_all(&conditions, &[], &TriggerContext::manual()));
        assert_eq!(*first_calls.lock().unwrap(), 1);
        assert_eq!(*second_calls.lock().unwrap(), 0);
    }

    #[test]
    fn condition_wire_format() {
        let condition: WorkflowCondition =
            serde_json::from_value(json!({"type": "object-count", "operator": "greater", "value": 1}))
                .expect("parse");
        assert_eq!(condition, WorkflowCondition::object_count_above(1));
    }
}
