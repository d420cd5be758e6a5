//! Pluggable behavior for `connect-objects` and `apply-template`.
//!
//! The executor only selects objects and resolves an origin; how objects get
//! linked and what a template contains is decided by these strategies.

use crate::action::Point;
use crate::error::ActionError;
use async_trait::async_trait;
use canvasflow_scene::{ObjectBlueprint, ObjectKind, SceneAdapter, SceneObject};
use std::collections::HashMap;
use tracing::debug;

/// Links a set of objects on the scene.
#[async_trait]
pub trait ConnectStrategy: Send + Sync {
    /// Connects `objects`, returning whatever was created.
    async fn connect(
        &self,
        scene: &dyn SceneAdapter,
        objects: &[SceneObject],
        style: Option<&str>,
    ) -> Result<Vec<SceneObject>, ActionError>;
}

/// Links each object to the next one with a connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainConnector;

#[async_trait]
impl ConnectStrategy for ChainConnector {
    async fn connect(
        &self,
        scene: &dyn SceneAdapter,
        objects: &[SceneObject],
        style: Option<&str>,
    ) -> Result<Vec<SceneObject>, ActionError> {
        let mut created = Vec::with_capacity(objects.len().saturating_sub(1));
        for pair in objects.windows(2) {
            let mut blueprint = ObjectBlueprint::connector(&pair[0], &pair[1]);
            if let Some(style) = style {
                blueprint = blueprint.with_stroke(style);
            }
            created.push(scene.insert(blueprint)?);
        }
        debug!(connectors = created.len(), "chained objects");
        Ok(created)
    }
}

/// Inserts a named cluster of objects.
#[async_trait]
pub trait TemplateStrategy: Send + Sync {
    /// Inserts the template `name` at `origin`, returning the new objects.
    async fn apply(
        &self,
        scene: &dyn SceneAdapter,
        name: &str,
        origin: Point,
    ) -> Result<Vec<SceneObject>, ActionError>;
}

/// Templates held as blueprints positioned relative to the origin.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: HashMap<String, Vec<ObjectBlueprint>>,
}

impl TemplateLibrary {
    /// An empty library.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A library holding `audit-checklist`, `risk-matrix` and `process-flow`.
    #[must_use]
    pub fn with_builtins() -> Self {
        Self::empty()
            .with_template("audit-checklist", audit_checklist())
            .with_template("risk-matrix", risk_matrix())
            .with_template("process-flow", process_flow())
    }

    /// Adds or replaces a template.
    #[must_use]
    pub fn with_template(mut self, name: impl Into<String>, blueprints: Vec<ObjectBlueprint>) -> Self {
        self.templates.insert(name.into(), blueprints);
        self
    }

    /// Returns the template names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl TemplateStrategy for TemplateLibrary {
    async fn apply(
        &self,
        scene: &dyn SceneAdapter,
        name: &str,
        origin: Point,
    ) -> Result<Vec<SceneObject>, ActionError> {
        let blueprints = self
            .templates
            .get(name)
            .ok_or_else(|| ActionError::UnknownTemplate {
                name: name.to_string(),
            })?;

        let mut created = Vec::with_capacity(blueprints.len());
        for blueprint in blueprints {
            let placed = blueprint
                .clone()
                .at(origin.left + blueprint.left, origin.top + blueprint.top);
            created.push(scene.insert(placed)?);
        }
        debug!(template = name, objects = created.len(), "applied template");
        Ok(created)
    }
}

fn audit_checklist() -> Vec<ObjectBlueprint> {
    let mut blueprints = vec![ObjectBlueprint::textbox(0.0, 0.0, "Audit checklist")];
    for (row, label) in ["Scope", "Controls tested", "Evidence", "Findings"]
        .into_iter()
        .enumerate()
    {
        blueprints.push(
            ObjectBlueprint::rect(0.0, 40.0 + row as f64 * 70.0)
                .sized(240.0, 50.0)
                .with_text(label),
        );
    }
    blueprints
}

fn risk_matrix() -> Vec<ObjectBlueprint> {
    let levels = ["low", "medium", "high"];
    let mut blueprints = Vec::with_capacity(levels.len() * levels.len());
    for (row, likelihood) in levels.into_iter().rev().enumerate() {
        for (column, impact) in levels.into_iter().enumerate() {
            blueprints.push(
                ObjectBlueprint::rect(column as f64 * 110.0, row as f64 * 110.0)
                    .with_text(format!("{likelihood} likelihood / {impact} impact")),
            );
        }
    }
    blueprints
}

fn process_flow() -> Vec<ObjectBlueprint> {
    ["Start", "Process", "Review", "End"]
        .into_iter()
        .enumerate()
        .map(|(step, label)| {
            let kind = if step == 0 || step == 3 {
                ObjectKind::Ellipse
            } else {
                ObjectKind::Rect
            };
            ObjectBlueprint::new(kind)
                .at(step as f64 * 160.0, 0.0)
                .sized(120.0, 60.0)
                .with_text(label)
        })
        .collect()
}
