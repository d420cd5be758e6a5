//! Scene objects and the property bags used to create and change them.

use canvasflow_core::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The type of an object on the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Rect,
    Circle,
    Ellipse,
    Triangle,
    Line,
    Textbox,
    Image,
    Group,
    /// A line linking two other objects.
    Connector,
    /// An anchor drawn on a shape while a connector is being dragged.
    ConnectionPoint,
}

impl ObjectKind {
    /// Returns the wire name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
            Self::Triangle => "triangle",
            Self::Line => "line",
            Self::Textbox => "textbox",
            Self::Image => "image",
            Self::Group => "group",
            Self::Connector => "connector",
            Self::ConnectionPoint => "connection-point",
        }
    }

    /// Returns true for objects the editor draws to support other objects.
    ///
    /// Helpers are never counted as content.
    #[must_use]
    pub const fn is_helper(&self) -> bool {
        matches!(self, Self::Connector | Self::ConnectionPoint)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known object kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownObjectKind(pub String);

impl fmt::Display for UnknownObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown object kind: {}", self.0)
    }
}

impl std::error::Error for UnknownObjectKind {}

impl FromStr for ObjectKind {
    type Err = UnknownObjectKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "rect" => Self::Rect,
            "circle" => Self::Circle,
            "ellipse" => Self::Ellipse,
            "triangle" => Self::Triangle,
            "line" => Self::Line,
            "textbox" | "text" | "i-text" => Self::Textbox,
            "image" => Self::Image,
            "group" => Self::Group,
            "connector" => Self::Connector,
            "connection-point" => Self::ConnectionPoint,
            other => return Err(UnknownObjectKind(other.to_string())),
        };
        Ok(kind)
    }
}

/// An object currently on the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    /// Text content, for text-bearing objects.
    pub text: Option<String>,
    /// Endpoints of a connector.
    pub links: Option<(ObjectId, ObjectId)>,
}

impl SceneObject {
    /// Materialises a blueprint under a fresh ID.
    #[must_use]
    pub fn from_blueprint(blueprint: ObjectBlueprint) -> Self {
        Self {
            id: ObjectId::new(),
            kind: blueprint.kind,
            left: blueprint.left,
            top: blueprint.top,
            width: blueprint.width,
            height: blueprint.height,
            fill: blueprint.fill,
            stroke: blueprint.stroke,
            text: blueprint.text,
            links: blueprint.links,
        }
    }

    /// Returns the horizontal center of the bounding box.
    #[must_use]
    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    /// Returns the vertical center of the bounding box.
    #[must_use]
    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    /// Returns the text content, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Applies every property set in `patch`.
    pub fn apply(&mut self, patch: &ObjectPatch) {
        if let Some(left) = patch.left {
            self.left = left;
        }
        if let Some(top) = patch.top {
            self.top = top;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(fill) = &patch.fill {
            self.fill = Some(fill.clone());
        }
        if let Some(stroke) = &patch.stroke {
            self.stroke = Some(stroke.clone());
        }
        if let Some(text) = &patch.text {
            self.text = Some(text.clone());
        }
    }
}

/// Description of an object to be created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectBlueprint {
    pub kind: ObjectKind,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default = "default_extent")]
    pub width: f64,
    #[serde(default = "default_extent")]
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<(ObjectId, ObjectId)>,
}

fn default_extent() -> f64 {
    100.0
}

impl ObjectBlueprint {
    /// Creates a blueprint at the origin with the default extent.
    #[must_use]
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            left: 0.0,
            top: 0.0,
            width: default_extent(),
            height: default_extent(),
            fill: None,
            stroke: None,
            text: None,
            links: None,
        }
    }

    /// A rectangle at the given position.
    #[must_use]
    pub fn rect(left: f64, top: f64) -> Self {
        Self::new(ObjectKind::Rect).at(left, top)
    }

    /// A text box at the given position.
    #[must_use]
    pub fn textbox(left: f64, top: f64, text: impl Into<String>) -> Self {
        Self::new(ObjectKind::Textbox).at(left, top).with_text(text)
    }

    /// A connector between two objects, spanning their centers.
    #[must_use]
    pub fn connector(from: &SceneObject, to: &SceneObject) -> Self {
        let (x1, y1) = (from.center_x(), from.center_y());
        let (x2, y2) = (to.center_x(), to.center_y());
        Self {
            left: x1.min(x2),
            top: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
            links: Some((from.id, to.id)),
            ..Self::new(ObjectKind::Connector)
        }
    }

    /// Sets the position.
    #[must_use]
    pub fn at(mut self, left: f64, top: f64) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    /// Sets the size.
    #[must_use]
    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the fill color.
    #[must_use]
    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }

    /// Sets the stroke color.
    #[must_use]
    pub fn with_stroke(mut self, stroke: impl Into<String>) -> Self {
        self.stroke = Some(stroke.into());
        self
    }

    /// Sets the text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// A property bag applied to an existing object. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ObjectPatch {
    /// A patch that only moves the object.
    #[must_use]
    pub fn position(left: f64, top: f64) -> Self {
        Self {
            left: Some(left),
            top: Some(top),
            ..Self::default()
        }
    }

    /// A patch that only changes the fill color.
    #[must_use]
    pub fn fill(fill: impl Into<String>) -> Self {
        Self {
            fill: Some(fill.into()),
            ..Self::default()
        }
    }

    /// Returns true if the patch sets nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_are_connectors_and_connection_points() {
        assert!(ObjectKind::Connector.is_helper());
        assert!(ObjectKind::ConnectionPoint.is_helper());
        assert!(!ObjectKind::Rect.is_helper());
        assert!(!ObjectKind::Textbox.is_helper());
    }

    #[test]
    fn kind_parses_wire_names_and_aliases() {
        assert_eq!("rect".parse::<ObjectKind>(), Ok(ObjectKind::Rect));
        assert_eq!("i-text".parse::<ObjectKind>(), Ok(ObjectKind::Textbox));
        assert_eq!(
            "connection-point".parse::<ObjectKind>(),
            Ok(ObjectKind::ConnectionPoint)
        );
        assert!("hexagon".parse::<ObjectKind>().is_err());
    }

    #[test]
    fn kind_serializes_kebab_case() {
        let json = serde_json::to_string(&ObjectKind::ConnectionPoint).expect("serialize");
        assert_eq!(json, "\"connection-point\"");
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let mut object = SceneObject::from_blueprint(
            ObjectBlueprint::rect(10.0, 20.0).with_fill("#fff").with_text("risk"),
        );

        object.apply(&ObjectPatch::position(300.0, 40.0));
        assert_eq!((object.left, object.top), (300.0, 40.0));
        assert_eq!(object.fill.as_deref(), Some("#fff"));
        assert_eq!(object.text(), Some("risk"));

        object.apply(&ObjectPatch::fill("#ef4444"));
        assert_eq!(object.fill.as_deref(), Some("#ef4444"));
        assert_eq!(object.left, 300.0);
    }

    #[test]
    fn connector_spans_centers() {
        let a = SceneObject::from_blueprint(ObjectBlueprint::rect(0.0, 0.0));
        let b = SceneObject::from_blueprint(ObjectBlueprint::rect(200.0, 0.0));
        let connector = ObjectBlueprint::connector(&a, &b);

        assert_eq!(connector.kind, ObjectKind::Connector);
        assert_eq!(connector.links, Some((a.id, b.id)));
        assert_eq!(connector.left, 50.0);
        assert_eq!(connector.width, 200.0);
    }

    #[test]
    fn blueprint_defaults_from_json() {
        let blueprint: ObjectBlueprint =
            serde_json::from_str(r##"{"kind":"rect","left":5,"fill":"#ccc"}"##).expect("parse");
        assert_eq!(blueprint.width, 100.0);
        assert_eq!(blueprint.top, 0.0);
        assert_eq!(blueprint.fill.as_deref(), Some("#ccc"));
    }
}
