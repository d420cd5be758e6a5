//! Triggers: which editor events start rule matching.

use canvasflow_scene::{ObjectKind, SceneEvent, SceneEventKind, SceneObject};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of event that causes rule matching to be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerType {
    /// An object was added to the scene.
    ObjectAdded,
    /// An operator finished changing an object.
    ObjectModified,
    /// An operator selected an object.
    ObjectSelected,
    /// Text content was edited.
    TextChanged,
    /// A saved canvas finished loading.
    CanvasLoaded,
    /// The engine's periodic timer ticked.
    Timer,
    /// Fired explicitly by the host application.
    Manual,
}

impl TriggerType {
    /// Returns the wire name of this trigger type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ObjectAdded => "object-added",
            Self::ObjectModified => "object-modified",
            Self::ObjectSelected => "object-selected",
            Self::TextChanged => "text-changed",
            Self::CanvasLoaded => "canvas-loaded",
            Self::Timer => "timer",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SceneEventKind> for TriggerType {
    fn from(kind: SceneEventKind) -> Self {
        match kind {
            SceneEventKind::ObjectAdded => Self::ObjectAdded,
            SceneEventKind::ObjectModified => Self::ObjectModified,
            SceneEventKind::SelectionCreated => Self::ObjectSelected,
            SceneEventKind::TextChanged => Self::TextChanged,
        }
    }
}

/// The trigger of a workflow rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTrigger {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    /// Only events about objects of this kind match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<ObjectKind>,
    /// Minimum time before the rule may fire again. Recorded, not enforced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
}

impl WorkflowTrigger {
    /// A trigger for every event of `trigger_type`.
    #[must_use]
    pub fn new(trigger_type: TriggerType) -> Self {
        Self {
            trigger_type,
            object_type: None,
            delay: None,
        }
    }

    /// Restricts the trigger to events about objects of `kind`.
    #[must_use]
    pub fn for_objects(mut self, kind: ObjectKind) -> Self {
        self.object_type = Some(kind);
        self
    }

    /// Returns true if an event described by `context` fires this trigger.
    #[must_use]
    pub fn matches(&self, context: &TriggerContext) -> bool {
        if self.trigger_type != context.trigger {
            return false;
        }
        match self.object_type {
            None => true,
            Some(kind) => context.target_kind() == Some(kind),
        }
    }
}

/// What caused a rule to be considered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerContext {
    pub trigger: TriggerType,
    /// The object the event is about, if any.
    pub target: Option<SceneObject>,
    /// Set when a person asked for the rule to run.
    pub manual: bool,
    /// The scene as it was when the trigger fired. Absent for manual runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Vec<SceneObject>>,
}

impl TriggerContext {
    /// A context with no target object.
    #[must_use]
    pub fn new(trigger: TriggerType) -> Self {
        Self {
            trigger,
            target: None,
            manual: false,
            snapshot: None,
        }
    }

    /// The context of a manual run. It never names a target object.
    #[must_use]
    pub fn manual() -> Self {
        Self {
            trigger: TriggerType::Manual,
            target: None,
            manual: true,
            snapshot: None,
        }
    }

    /// Adds a target object.
    #[must_use]
    pub fn with_target(mut self, target: SceneObject) -> Self {
        self.target = Some(target);
        self
    }

    /// Records the scene the trigger fired on.
    #[must_use]
    pub fn with_snapshot(mut self, objects: Vec<SceneObject>) -> Self {
        self.snapshot = Some(objects);
        self
    }

    /// Returns the kind of the target object, if any.
    #[must_use]
    pub fn target_kind(&self) -> Option<ObjectKind> {
        self.target.as_ref().map(|target| target.kind)
    }
}

impl From<&SceneEvent> for TriggerContext {
    fn from(event: &SceneEvent) -> Self {
        Self {
            trigger: event.kind.into(),
            target: event.target.clone(),
            manual: false,
            snapshot: None,
        }
    }
}
