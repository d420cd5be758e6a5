//! Actions: the steps a rule performs when it fires.
//!
//! Each action kind carries exactly the parameters it needs. On the wire an
//! action is a flat object tagged by `type`, with an optional `delay` in
//! milliseconds:
//!
//! ```json
//! { "type": "auto-align", "axis": "horizontal", "spacing": 50, "delay": 1000 }
//! ```

use crate::trigger::TriggerContext;
use canvasflow_core::ObjectId;
use canvasflow_scene::{ObjectBlueprint, ObjectKind, ObjectPatch, SceneObject};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single action of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowAction {
    #[serde(flatten)]
    pub kind: ActionKind,
    /// Milliseconds to wait before this action runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
}

impl WorkflowAction {
    /// An action that runs immediately.
    #[must_use]
    pub fn new(kind: ActionKind) -> Self {
        Self { kind, delay: None }
    }

    /// Waits `delay_ms` before running.
    #[must_use]
    pub fn after(mut self, delay_ms: u64) -> Self {
        self.delay = Some(delay_ms);
        self
    }
}

impl From<ActionKind> for WorkflowAction {
    fn from(kind: ActionKind) -> Self {
        Self::new(kind)
    }
}

/// What an action does, with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActionKind {
    /// Adds a new object to the scene.
    CreateObject { object: ObjectBlueprint },
    /// Applies a property bag to the triggering object.
    ModifyObject { properties: ObjectPatch },
    /// Links the selected objects through the connect strategy.
    ConnectObjects {
        selector: ObjectSelector,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<String>,
    },
    /// Inserts a named object cluster through the template strategy.
    #[serde(rename_all = "camelCase")]
    ApplyTemplate {
        template: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<Point>,
    },
    /// Publishes a `content:suggestion` event. Never touches the scene.
    SuggestContent { message: String },
    /// Publishes a `user:notification` event. Never touches the scene.
    NotifyUser {
        message: String,
        #[serde(default)]
        severity: Severity,
        /// How long the notification stays visible, in milliseconds.
        #[serde(default = "default_notification_duration")]
        duration: u64,
    },
    /// Lines up every rectangle along one axis.
    AutoAlign {
        #[serde(default)]
        axis: AlignAxis,
        #[serde(default = "default_spacing")]
        spacing: f64,
    },
    /// Colors rectangles cyclically through a palette, in stacking order.
    #[serde(rename_all = "camelCase")]
    AutoFormat {
        #[serde(default)]
        style: String,
        colors: Vec<String>,
        /// Fewer rectangles than this and nothing is recolored.
        #[serde(default = "default_min_objects")]
        min_objects: usize,
    },
    /// Any action type this build does not know.
    #[serde(other)]
    Unsupported,
}

fn default_notification_duration() -> u64 {
    3000
}

fn default_spacing() -> f64 {
    50.0
}

fn default_min_objects() -> usize {
    9
}

impl ActionKind {
    /// Returns the wire name of this action kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateObject { .. } => "create-object",
            Self::ModifyObject { .. } => "modify-object",
            Self::ConnectObjects { .. } => "connect-objects",
            Self::ApplyTemplate { .. } => "apply-template",
            Self::SuggestContent { .. } => "suggest-content",
            Self::NotifyUser { .. } => "notify-user",
            Self::AutoAlign { .. } => "auto-align",
            Self::AutoFormat { .. } => "auto-format",
            Self::Unsupported => "unsupported",
        }
    }

    /// `auto-align` with the given axis and spacing.
    #[must_use]
    pub fn auto_align(axis: AlignAxis, spacing: f64) -> Self {
        Self::AutoAlign { axis, spacing }
    }

    /// `auto-format` with the default minimum of nine rectangles.
    #[must_use]
    pub fn auto_format(style: &str, colors: &[&str]) -> Self {
        Self::AutoFormat {
            style: style.to_string(),
            colors: colors.iter().map(ToString::to_string).collect(),
            min_objects: default_min_objects(),
        }
    }

    /// `suggest-content` with a message.
    #[must_use]
    pub fn suggest(message: &str) -> Self {
        Self::SuggestContent {
            message: message.to_string(),
        }
    }

    /// `notify-user` with the default display duration.
    #[must_use]
    pub fn notify(message: &str, severity: Severity) -> Self {
        Self::NotifyUser {
            message: message.to_string(),
            severity,
            duration: default_notification_duration(),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A position on the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub left: f64,
    pub top: f64,
}

/// Axis for `auto-align`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignAxis {
    /// One row, left to right.
    #[default]
    Horizontal,
    /// One column, top to bottom.
    Vertical,
}

/// Severity of a user notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Which objects an action works on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "kebab-case")]
pub enum ObjectSelector {
    /// The object that caused the firing event.
    Target,
    /// The `count` most recently added objects of `kind`, oldest first.
    Latest { kind: ObjectKind, count: usize },
    /// Every object of `kind`, in stacking order.
    AllOfKind { kind: ObjectKind },
    /// Exactly these objects, in this order. Missing ones are skipped.
    Ids { ids: Vec<ObjectId> },
}

impl ObjectSelector {
    /// Picks objects out of a scene snapshot.
    #[must_use]
    pub fn select(&self, objects: &[SceneObject], context: &TriggerContext) -> Vec<SceneObject> {
        match self {
            Self::Target => context
                .target
                .as_ref()
                .and_then(|target| objects.iter().find(|object| object.id == target.id))
                .cloned()
                .into_iter()
                .collect(),
            Self::Latest { kind, count } => {
                let of_kind: Vec<&SceneObject> =
                    objects.iter().filter(|object| object.kind == *kind).collect();
                let skip = of_kind.len().saturating_sub(*count);
                of_kind.into_iter().skip(skip).cloned().collect()
            }
            Self::AllOfKind { kind } => objects
                .iter()
                .filter(|object| object.kind == *kind)
                .cloned()
                .collect(),
            Self::Ids { ids } => ids
                .iter()
                .filter_map(|id| objects.iter().find(|object| object.id == *id))
                .cloned()
                .collect(),
        }
    }
}

impl Point {
    /// Where a template lands when the action names no origin: on the
    /// triggering object, else the scene origin.
    #[must_use]
    pub fn for_context(origin: Option<Self>, context: &TriggerContext) -> Self {
        origin.unwrap_or_else(|| match &context.target {
            Some(target) => Self {
                left: target.left,
                top: target.top,
            },
            None => Self {
                left: 0.0,
                top: 0.0,
            },
        })
    }
}
