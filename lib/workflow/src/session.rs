//! Editor sessions.
//!
//! A session owns one scene and the one engine bound to it. Whoever needs the
//! engine borrows it from the session; there is no global instance.

use crate::config::EngineConfig;
use crate::engine::WorkflowEngine;
use crate::trigger::{TriggerContext, TriggerType};
use canvasflow_scene::SceneAdapter;
use std::sync::Arc;
use tracing::info;

/// One editing session: a scene plus its automation engine.
pub struct EditorSession<S: SceneAdapter + 'static> {
    scene: Arc<S>,
    engine: WorkflowEngine,
}

impl<S: SceneAdapter + 'static> EditorSession<S> {
    /// Opens a session over `scene`, constructing its engine.
    pub fn open(scene: Arc<S>, config: EngineConfig) -> Self {
        let adapter: Arc<dyn SceneAdapter> = scene.clone();
        let engine = WorkflowEngine::new(adapter, config);
        info!("editor session opened");
        Self { scene, engine }
    }

    /// Returns the scene.
    #[must_use]
    pub fn scene(&self) -> &Arc<S> {
        &self.scene
    }

    /// Returns the engine.
    #[must_use]
    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    /// Announces that the canvas finished loading. Fires `canvas-loaded`.
    ///
    /// Returns how many executions were started.
    pub fn load(&self) -> usize {
        self.engine.dispatch(TriggerContext::new(TriggerType::CanvasLoaded))
    }

    /// Tears the engine down. Safe to call more than once.
    pub fn close(&self) {
        self.engine.cleanup();
        info!("editor session closed");
    }
}
