//! The action executor.
//!
//! Runs one rule's actions strictly in order, recording a step per action in
//! the ledger as it goes. A failing action fails the execution and skips the
//! rest; the failure is reported through `execution:failed`, never returned
//! to the caller as an error.

use crate::action::{ActionKind, AlignAxis, Point, WorkflowAction};
use crate::error::ActionError;
use crate::event::EngineEvent;
use crate::execution::{WorkflowExecution, WorkflowStep};
use crate::extension::{ConnectStrategy, TemplateStrategy};
use crate::ledger::ExecutionLedger;
use crate::rule::WorkflowRule;
use crate::trigger::TriggerContext;
use canvasflow_core::{EventBus, ExecutionId};
use canvasflow_scene::{ObjectKind, ObjectPatch, SceneAdapter, SceneObject};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runs rule actions against a scene.
pub struct ActionExecutor {
    scene: Arc<dyn SceneAdapter>,
    ledger: Arc<ExecutionLedger>,
    events: Arc<EventBus<EngineEvent>>,
    connector: Arc<dyn ConnectStrategy>,
    templates: Arc<dyn TemplateStrategy>,
}

impl ActionExecutor {
    /// Creates an executor.
    #[must_use]
    pub fn new(
        scene: Arc<dyn SceneAdapter>,
        ledger: Arc<ExecutionLedger>,
        events: Arc<EventBus<EngineEvent>>,
        connector: Arc<dyn ConnectStrategy>,
        templates: Arc<dyn TemplateStrategy>,
    ) -> Self {
        Self {
            scene,
            ledger,
            events,
            connector,
            templates,
        }
    }

    /// Runs every action of `rule` and returns the finished execution.
    pub async fn execute(&self, rule: &WorkflowRule, context: &TriggerContext) -> WorkflowExecution {
        let mut execution = WorkflowExecution::start(rule.id.clone());
        self.ledger.record(&execution);
        let unfinished = CancelOnDrop {
            ledger: self.ledger.as_ref(),
            id: execution.id,
            armed: true,
        };
        info!(
            rule_id = %rule.id,
            execution_id = %execution.id,
            trigger = %context.trigger,
            "execution started"
        );
        self.events.emit(&EngineEvent::ExecutionStarted {
            execution: execution.clone(),
            rule: rule.clone(),
        });

        for action in &rule.actions {
            execution.steps.push(WorkflowStep::new(action.clone()));
            self.ledger.update(&execution);

            if let Some(delay) = action.delay.filter(|delay| *delay > 0) {
                debug!(action = %action.kind, delay, "waiting before action");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            if let Some(step) = execution.current_step_mut() {
                step.start();
            }
            self.ledger.update(&execution);

            match self.run(action, rule, context).await {
                Ok(result) => {
                    if let Some(step) = execution.current_step_mut() {
                        step.complete(result);
                    }
                    self.ledger.update(&execution);
                }
                Err(e) => {
                    let message = e.to_string();
                    if let Some(step) = execution.current_step_mut() {
                        step.fail(message.clone());
                    }
                    execution.fail(message);
                    self.ledger.update(&execution);
                    warn!(
                        rule_id = %rule.id,
                        execution_id = %execution.id,
                        action = %action.kind,
                        error = %e,
                        "execution failed"
                    );
                    unfinished.disarm();
                    self.events.emit(&EngineEvent::ExecutionFailed {
                        execution: execution.clone(),
                        rule: rule.clone(),
                    });
                    return execution;
                }
            }
        }

        execution.complete();
        self.ledger.update(&execution);
        unfinished.disarm();
        info!(
            rule_id = %rule.id,
            execution_id = %execution.id,
            steps = execution.steps.len(),
            duration_ms = execution.duration().num_milliseconds(),
            "execution completed"
        );
        self.events.emit(&EngineEvent::ExecutionCompleted {
            execution: execution.clone(),
            rule: rule.clone(),
        });
        execution
    }

    async fn run(
        &self,
        action: &WorkflowAction,
        rule: &WorkflowRule,
        context: &TriggerContext,
    ) -> Result<JsonValue, ActionError> {
        match &action.kind {
            ActionKind::CreateObject { object } => {
                let created = self.scene.insert(object.clone())?;
                Ok(json!({ "objectId": created.id }))
            }
            ActionKind::ModifyObject { properties } => {
                let Some(target) = &context.target else {
                    debug!(rule_id = %rule.id, "modify-object has no target, skipping");
                    return Ok(skipped("no target object"));
                };
                let modified = self.scene.patch(target.id, properties)?;
                Ok(json!({ "objectId": modified.id }))
            }
            ActionKind::ConnectObjects { selector, style } => {
                let selected = selector.select(&self.scene.objects(), context);
                let created = self
                    .connector
                    .connect(self.scene.as_ref(), &selected, style.as_deref())
                    .await?;
                Ok(json!({ "connected": ids(&selected), "created": ids(&created) }))
            }
            ActionKind::ApplyTemplate { template, origin } => {
                let origin = Point::for_context(*origin, context);
                let created = self
                    .templates
                    .apply(self.scene.as_ref(), template, origin)
                    .await?;
                Ok(json!({ "template": template, "created": ids(&created) }))
            }
            ActionKind::SuggestContent { message } => {
                self.events.emit(&EngineEvent::ContentSuggestion {
                    message: message.clone(),
                    rule_id: rule.id.clone(),
                });
                Ok(json!({ "suggested": message }))
            }
            ActionKind::NotifyUser {
                message,
                severity,
                duration,
            } => {
                self.events.emit(&EngineEvent::UserNotification {
                    message: message.clone(),
                    severity: *severity,
                    duration: *duration,
                    rule_id: rule.id.clone(),
                });
                Ok(json!({ "notified": message }))
            }
            ActionKind::AutoAlign { axis, spacing } => self.auto_align(*axis, *spacing),
            ActionKind::AutoFormat {
                style,
                colors,
                min_objects,
            } => self.auto_format(style, colors, *min_objects, context),
            ActionKind::Unsupported => {
                warn!(rule_id = %rule.id, "unsupported action type, skipping");
                Ok(JsonValue::Null)
            }
        }
    }

    /// Places every rectangle one after another along `axis`, starting where
    /// the first one is and keeping its other coordinate.
    fn auto_align(&self, axis: AlignAxis, spacing: f64) -> Result<JsonValue, ActionError> {
        let rects = self.rects();
        let Some(first) = rects.first() else {
            return Ok(skipped("no rectangles"));
        };

        let (mut cursor, fixed) = match axis {
            AlignAxis::Horizontal => (first.left, first.top),
            AlignAxis::Vertical => (first.top, first.left),
        };
        for rect in &rects {
            let (patch, extent) = match axis {
                AlignAxis::Horizontal => (ObjectPatch::position(cursor, fixed), rect.width),
                AlignAxis::Vertical => (ObjectPatch::position(fixed, cursor), rect.height),
            };
            self.scene.patch(rect.id, &patch)?;
            cursor += extent + spacing;
        }

        debug!(aligned = rects.len(), ?axis, spacing, "rectangles aligned");
        Ok(json!({ "aligned": rects.len() }))
    }

    /// Fills rectangles with `colors`, cycling by stacking index.
    ///
    /// Works on the rectangles that were on the scene when the rule fired, so
    /// a burst of additions formats the grid once, on the firing that
    /// completed it.
    fn auto_format(
        &self,
        style: &str,
        colors: &[String],
        min_objects: usize,
        context: &TriggerContext,
    ) -> Result<JsonValue, ActionError> {
        let rects = match &context.snapshot {
            Some(objects) => rects_in(objects.iter().cloned()),
            None => self.rects(),
        };
        if rects.len() < min_objects {
            debug!(rects = rects.len(), min_objects, "too few rectangles to format");
            return Ok(skipped("too few rectangles"));
        }
        if colors.is_empty() {
            return Ok(skipped("empty palette"));
        }

        for (index, rect) in rects.iter().enumerate() {
            let color = &colors[index % colors.len()];
            self.scene.patch(rect.id, &ObjectPatch::fill(color.as_str()))?;
        }

        debug!(formatted = rects.len(), style, "rectangles formatted");
        Ok(json!({ "style": style, "formatted": rects.len() }))
    }

    fn rects(&self) -> Vec<SceneObject> {
        rects_in(self.scene.objects())
    }
}

/// Marks the execution cancelled if its future is dropped before finishing,
/// as happens when the engine aborts in-flight work.
struct CancelOnDrop<'a> {
    ledger: &'a ExecutionLedger,
    id: ExecutionId,
    armed: bool,
}

impl CancelOnDrop<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(execution_id = %self.id, "execution dropped before finishing");
            self.ledger.cancel(self.id);
        }
    }
}

fn rects_in(objects: impl IntoIterator<Item = SceneObject>) -> Vec<SceneObject> {
    objects
        .into_iter()
        .filter(|object| object.kind == ObjectKind::Rect)
        .collect()
}

fn skipped(reason: &str) -> JsonValue {
    json!({ "skipped": reason })
}

fn ids(objects: &[SceneObject]) -> Vec<String> {
    objects.iter().map(|object| object.id.to_string()).collect()
}
