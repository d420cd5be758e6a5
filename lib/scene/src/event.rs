//! Events published by the editing surface.

use crate::object::SceneObject;
use canvasflow_core::BusEvent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The observable event kinds of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneEventKind {
    #[serde(rename = "object:added")]
    ObjectAdded,
    #[serde(rename = "object:modified")]
    ObjectModified,
    #[serde(rename = "selection:created")]
    SelectionCreated,
    #[serde(rename = "text:changed")]
    TextChanged,
}

impl SceneEventKind {
    /// Every kind, in a fixed order.
    pub const ALL: [Self; 4] = [
        Self::ObjectAdded,
        Self::ObjectModified,
        Self::SelectionCreated,
        Self::TextChanged,
    ];

    /// Returns the wire name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ObjectAdded => "object:added",
            Self::ObjectModified => "object:modified",
            Self::SelectionCreated => "selection:created",
            Self::TextChanged => "text:changed",
        }
    }
}

impl fmt::Display for SceneEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scene event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEvent {
    pub kind: SceneEventKind,
    /// Snapshot of the object the event is about, taken when it fired.
    pub target: Option<SceneObject>,
}

impl SceneEvent {
    /// Creates an event about `target`.
    #[must_use]
    pub fn new(kind: SceneEventKind, target: SceneObject) -> Self {
        Self {
            kind,
            target: Some(target),
        }
    }
}

impl BusEvent for SceneEvent {
    type Kind = SceneEventKind;

    fn kind(&self) -> SceneEventKind {
        self.kind
    }
}
