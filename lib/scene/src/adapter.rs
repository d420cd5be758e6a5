//! The seam between the automation engine and the editing surface.

use crate::error::SceneError;
use crate::event::{SceneEvent, SceneEventKind};
use crate::object::{ObjectBlueprint, ObjectPatch, SceneObject};
use canvasflow_core::{ObjectId, SubscriptionId};
use std::sync::Arc;

/// A callback invoked synchronously when the scene fires an event.
pub type SceneListener = Arc<dyn Fn(&SceneEvent) + Send + Sync>;

/// What the engine needs from a rendering surface.
///
/// Reads return snapshots; the engine never holds references into the
/// scene. Mutations apply immediately and are visible to every reader.
pub trait SceneAdapter: Send + Sync {
    /// Returns every object, in stacking (insertion) order.
    fn objects(&self) -> Vec<SceneObject>;

    /// Returns one object by ID.
    fn object(&self, id: ObjectId) -> Option<SceneObject>;

    /// Adds a new object to the scene.
    ///
    /// Fires `object:added`, like any other addition.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface refuses the object.
    fn insert(&self, blueprint: ObjectBlueprint) -> Result<SceneObject, SceneError>;

    /// Sets properties on an object programmatically.
    ///
    /// Programmatic changes fire no event; only operator edits do.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist.
    fn patch(&self, id: ObjectId, patch: &ObjectPatch) -> Result<SceneObject, SceneError>;

    /// Subscribes `listener` to events of `kind`.
    fn subscribe(&self, kind: SceneEventKind, listener: SceneListener) -> SubscriptionId;

    /// Removes a subscription. Returns whether anything was removed.
    fn unsubscribe(&self, kind: SceneEventKind, id: SubscriptionId) -> bool;
}
