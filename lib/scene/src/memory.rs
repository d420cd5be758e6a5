//! An in-memory scene.
//!
//! Holds objects in stacking order and publishes events through an
//! [`EventBus`]. Besides the [`SceneAdapter`] surface it exposes the
//! operator-level edits (`add`, `modify`, `select`, `edit_text`) that a real
//! editor would produce from mouse and keyboard input.

use crate::adapter::{SceneAdapter, SceneListener};
use crate::error::SceneError;
use crate::event::{SceneEvent, SceneEventKind};
use crate::object::{ObjectBlueprint, ObjectPatch, SceneObject};
use canvasflow_core::{EventBus, ObjectId, SubscriptionId};
use std::sync::{PoisonError, RwLock};
use tracing::trace;

/// A scene held entirely in memory.
#[derive(Default)]
pub struct InMemoryScene {
    objects: RwLock<Vec<SceneObject>>,
    events: EventBus<SceneEvent>,
}

impl InMemoryScene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object as an operator would. Fires `object:added`.
    pub fn add(&self, blueprint: ObjectBlueprint) -> SceneObject {
        let object = SceneObject::from_blueprint(blueprint);
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(object.clone());
        self.fire(SceneEventKind::ObjectAdded, object.clone());
        object
    }

    /// Changes an object as an operator would. Fires `object:modified`.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist.
    pub fn modify(&self, id: ObjectId, patch: &ObjectPatch) -> Result<SceneObject, SceneError> {
        let object = self.apply_patch(id, patch)?;
        self.fire(SceneEventKind::ObjectModified, object.clone());
        Ok(object)
    }

    /// Selects an object. Fires `selection:created`.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist.
    pub fn select(&self, id: ObjectId) -> Result<SceneObject, SceneError> {
        let object = self.object(id).ok_or(SceneError::ObjectNotFound { id })?;
        self.fire(SceneEventKind::SelectionCreated, object.clone());
        Ok(object)
    }

    /// Replaces an object's text as an operator typing would. Fires `text:changed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist.
    pub fn edit_text(&self, id: ObjectId, text: impl Into<String>) -> Result<SceneObject, SceneError> {
        let patch = ObjectPatch {
            text: Some(text.into()),
            ..ObjectPatch::default()
        };
        let object = self.apply_patch(id, &patch)?;
        self.fire(SceneEventKind::TextChanged, object.clone());
        Ok(object)
    }

    /// Removes every object without firing events.
    pub fn clear(&self) {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns the number of objects, helpers included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if the scene holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn apply_patch(&self, id: ObjectId, patch: &ObjectPatch) -> Result<SceneObject, SceneError> {
        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        let object = objects
            .iter_mut()
            .find(|object| object.id == id)
            .ok_or(SceneError::ObjectNotFound { id })?;
        object.apply(patch);
        Ok(object.clone())
    }

    // Called with no lock held so listeners can read the scene.
    fn fire(&self, kind: SceneEventKind, target: SceneObject) {
        trace!(event = %kind, object = %target.id, "scene event");
        self.events.emit(&SceneEvent::new(kind, target));
    }
}

impl SceneAdapter for InMemoryScene {
    fn objects(&self) -> Vec<SceneObject> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn object(&self, id: ObjectId) -> Option<SceneObject> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|object| object.id == id)
            .cloned()
    }

    fn insert(&self, blueprint: ObjectBlueprint) -> Result<SceneObject, SceneError> {
        Ok(self.add(blueprint))
    }

    fn patch(&self, id: ObjectId, patch: &ObjectPatch) -> Result<SceneObject, SceneError> {
        self.apply_patch(id, patch)
    }

    fn subscribe(&self, kind: SceneEventKind, listener: SceneListener) -> SubscriptionId {
        self.events.on(kind, move |event| listener(event))
    }

    fn unsubscribe(&self, kind: SceneEventKind, id: SubscriptionId) -> bool {
        self.events.off(kind, id)
    }
}
