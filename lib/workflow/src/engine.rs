//! The workflow engine façade.
//!
//! `WorkflowEngine` wires the registry, evaluator, executor, ledger and
//! dispatcher together against one scene. It is a cheap handle: clones share
//! the same engine.

use crate::condition::{ConditionEvaluator, CustomPredicate};
use crate::config::EngineConfig;
use crate::dispatcher::TriggerDispatcher;
use crate::error::EngineError;
use crate::event::{EngineEvent, EngineEventKind};
use crate::execution::{ExecutionStatus, WorkflowExecution};
use crate::executor::ActionExecutor;
use crate::extension::{ChainConnector, ConnectStrategy, TemplateLibrary, TemplateStrategy};
use crate::ledger::ExecutionLedger;
use crate::registry::RuleRegistry;
use crate::rule::WorkflowRule;
use crate::trigger::{TriggerContext, TriggerType};
use canvasflow_core::{EventBus, Result, RuleId, SubscriptionId};
use canvasflow_scene::SceneAdapter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Builds a [`WorkflowEngine`] with non-default strategies.
#[must_use]
pub struct EngineBuilder {
    scene: Arc<dyn SceneAdapter>,
    config: EngineConfig,
    connector: Arc<dyn ConnectStrategy>,
    templates: Arc<dyn TemplateStrategy>,
}

impl EngineBuilder {
    /// Sets the configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces how `connect-objects` links objects.
    pub fn connect_strategy(mut self, connector: Arc<dyn ConnectStrategy>) -> Self {
        self.connector = connector;
        self
    }

    /// Replaces where `apply-template` finds templates.
    pub fn template_strategy(mut self, templates: Arc<dyn TemplateStrategy>) -> Self {
        self.templates = templates;
        self
    }

    /// Creates the engine and starts listening to the scene.
    pub fn build(self) -> WorkflowEngine {
        let Self {
            scene,
            config,
            connector,
            templates,
        } = self;

        let events = Arc::new(EventBus::new());
        let ledger = Arc::new(ExecutionLedger::with_capacity(config.max_executions));
        let registry = Arc::new(RuleRegistry::new(Arc::clone(&events)));
        let evaluator = Arc::new(ConditionEvaluator::new());
        let executor = Arc::new(ActionExecutor::new(
            Arc::clone(&scene),
            Arc::clone(&ledger),
            Arc::clone(&events),
            connector,
            templates,
        ));
        let dispatcher = Arc::new(TriggerDispatcher::new(
            scene,
            Arc::clone(&registry),
            Arc::clone(&evaluator),
            Arc::clone(&executor),
            config.enabled,
        ));
        dispatcher.attach();

        if config.seed_builtins {
            registry.seed_builtins();
        }

        let timer = config
            .timer_interval_ms
            .and_then(|interval_ms| spawn_timer(Arc::downgrade(&dispatcher), interval_ms));

        info!(
            rules = registry.len(),
            enabled = config.enabled,
            "workflow engine started"
        );

        WorkflowEngine {
            inner: Arc::new(EngineInner {
                registry,
                ledger,
                events,
                evaluator,
                executor,
                dispatcher,
                timer: Mutex::new(timer),
                closed: AtomicBool::new(false),
            }),
        }
    }
}

struct EngineInner {
    registry: Arc<RuleRegistry>,
    ledger: Arc<ExecutionLedger>,
    events: Arc<EventBus<EngineEvent>>,
    evaluator: Arc<ConditionEvaluator>,
    executor: Arc<ActionExecutor>,
    dispatcher: Arc<TriggerDispatcher>,
    timer: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

/// Handle to a workflow automation engine bound to one scene.
#[derive(Clone)]
pub struct WorkflowEngine {
    inner: Arc<EngineInner>,
}

impl WorkflowEngine {
    /// Creates an engine for `scene` with the default strategies.
    pub fn new(scene: Arc<dyn SceneAdapter>, config: EngineConfig) -> Self {
        Self::builder(scene).config(config).build()
    }

    /// Starts building an engine for `scene`.
    pub fn builder(scene: Arc<dyn SceneAdapter>) -> EngineBuilder {
        EngineBuilder {
            scene,
            config: EngineConfig::default(),
            connector: Arc::new(ChainConnector),
            templates: Arc::new(TemplateLibrary::with_builtins()),
        }
    }

    /// Adds or replaces a rule.
    pub fn add_rule(&self, rule: WorkflowRule) {
        self.inner.registry.add(rule);
    }

    /// Removes a rule. Removing an unknown rule does nothing.
    pub fn remove_rule(&self, rule_id: &RuleId) -> bool {
        self.inner.registry.remove(rule_id)
    }

    /// Returns one rule.
    #[must_use]
    pub fn get_rule(&self, rule_id: &RuleId) -> Option<WorkflowRule> {
        self.inner.registry.get(rule_id)
    }

    /// Returns every rule, in insertion order.
    #[must_use]
    pub fn rules(&self) -> Vec<WorkflowRule> {
        self.inner.registry.list()
    }

    /// Enables a rule.
    pub fn enable_rule(&self, rule_id: &RuleId) {
        self.inner.registry.enable(rule_id);
    }

    /// Disables a rule.
    pub fn disable_rule(&self, rule_id: &RuleId) {
        self.inner.registry.disable(rule_id);
    }

    /// Runs a rule now, skipping trigger matching and conditions.
    ///
    /// Runs even while the engine is disabled.
    ///
    /// # Errors
    ///
    /// Returns `RuleNotFound` for an unknown ID, or `ExecutionFailed` if
    /// one of the rule's actions failed.
    #[instrument(skip_all, fields(rule_id = %rule_id))]
    pub async fn execute_rule_manually(
        &self,
        rule_id: &RuleId,
    ) -> Result<WorkflowExecution, EngineError> {
        let rule = self
            .inner
            .registry
            .get(rule_id)
            .ok_or_else(|| EngineError::RuleNotFound {
                rule_id: rule_id.clone(),
            })?;

        let execution = self
            .inner
            .executor
            .execute(&rule, &TriggerContext::manual())
            .await;

        if execution.status == ExecutionStatus::Failed {
            return Err(EngineError::ExecutionFailed {
                rule_id: rule.id,
                execution_id: execution.id,
                reason: execution.error.unwrap_or_default(),
            }
            .into());
        }
        Ok(execution)
    }

    /// Returns every recorded execution, oldest first.
    #[must_use]
    pub fn executions(&self) -> Vec<WorkflowExecution> {
        self.inner.ledger.all()
    }

    /// Returns the executions of one rule, oldest first.
    #[must_use]
    pub fn executions_by_rule(&self, rule_id: &RuleId) -> Vec<WorkflowExecution> {
        self.inner.ledger.by_rule(rule_id)
    }

    /// Sets the global kill switch. Emits `engine:toggled` when it changes.
    pub fn set_enabled(&self, enabled: bool) {
        if self.inner.dispatcher.set_enabled(enabled) != enabled {
            info!(enabled, "workflow engine toggled");
            self.inner.events.emit(&EngineEvent::EngineToggled { enabled });
        }
    }

    /// Returns the global kill switch.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.dispatcher.is_enabled()
    }

    /// Subscribes to engine events of `kind`.
    pub fn on<F>(&self, kind: EngineEventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.inner.events.on(kind, handler)
    }

    /// Removes a subscription.
    pub fn off(&self, kind: EngineEventKind, id: SubscriptionId) -> bool {
        self.inner.events.off(kind, id)
    }

    /// Fires a trigger that does not come from the scene, such as
    /// `canvas-loaded` or `timer`, through normal rule matching.
    ///
    /// Returns how many executions were started.
    #[instrument(skip_all, fields(trigger = %context.trigger))]
    pub fn dispatch(&self, context: TriggerContext) -> usize {
        self.inner.dispatcher.dispatch(context)
    }

    /// Registers the predicate behind `custom` conditions naming `name`.
    pub fn register_predicate(&self, name: impl Into<String>, predicate: Arc<dyn CustomPredicate>) {
        self.inner.evaluator.register(name, predicate);
    }

    /// Waits until every dispatch and execution started so far has finished.
    pub async fn settle(&self) {
        self.inner.dispatcher.settle().await;
    }

    /// Stops listening to the scene and drops rules, executions and
    /// subscribers. Safe to call more than once.
    pub fn cleanup(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(timer) = self
            .inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            timer.abort();
        }
        self.inner.dispatcher.detach();
        self.inner.registry.clear();
        self.inner.ledger.clear();
        self.inner.evaluator.clear();
        self.inner.events.clear();
        info!("workflow engine cleaned up");
    }
}

fn spawn_timer(dispatcher: Weak<TriggerDispatcher>, interval_ms: u64) -> Option<JoinHandle<()>> {
    if interval_ms == 0 {
        warn!("timer interval of 0ms ignored");
        return None;
    }
    let Ok(runtime) = Handle::try_current() else {
        warn!("no async runtime, timer trigger disabled");
        return None;
    };

    Some(runtime.spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(dispatcher) = dispatcher.upgrade() else {
                return;
            };
            let started = dispatcher.dispatch(TriggerContext::new(TriggerType::Timer));
            debug!(started, "timer tick");
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, AlignAxis, Severity, WorkflowAction};
    use crate::condition::WorkflowCondition;
    use crate::execution::StepStatus;
    use crate::trigger::WorkflowTrigger;
    use canvasflow_scene::{InMemoryScene, ObjectBlueprint, ObjectKind, ObjectPatch};

    fn engine_with(config: EngineConfig) -> (Arc<InMemoryScene>, WorkflowEngine) {
        let scene = Arc::new(InMemoryScene::new());
        let adapter: Arc<dyn SceneAdapter> = scene.clone();
        (scene, WorkflowEngine::new(adapter, config))
    }

    fn recorder(engine: &WorkflowEngine, kind: EngineEventKind) -> Arc<Mutex<Vec<EngineEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        engine.on(kind, move |event| sink.lock().expect("lock").push(event.clone()));
        seen
    }

    fn notify_rule(id: &str, trigger: TriggerType) -> WorkflowRule {
        WorkflowRule::new(id, id, WorkflowTrigger::new(trigger))
            .with_action(ActionKind::notify(id, Severity::Info))
    }

    #[tokio::test]
    async fn builtins_are_seeded_by_default() {
        let (_scene, engine) = engine_with(EngineConfig::default());
        assert_eq!(engine.rules().len(), 5);
        assert!(engine.get_rule(&RuleId::from("auto-format-risk-matrix")).is_some());
        assert!(engine.is_enabled());
    }

    #[tokio::test]
    async fn risk_matrix_is_colored_on_ninth_rectangle() {
        let (scene, engine) = engine_with(EngineConfig::empty());
        engine.add_rule(
            WorkflowRule::new(
                "risk",
                "Risk matrix",
                WorkflowTrigger::new(TriggerType::ObjectAdded).for_objects(ObjectKind::Rect),
            )
            .with_condition(WorkflowCondition::object_count_above(1))
            .with_condition(WorkflowCondition::text_contains_any("risk|high|medium|low"))
            .with_action(ActionKind::auto_format(
                "risk-matrix",
                &["#22c55e", "#eab308", "#ef4444"],
            )),
        );

        for i in 0..8 {
            scene.add(ObjectBlueprint::rect(f64::from(i % 3) * 110.0, f64::from(i / 3) * 110.0));
        }
        scene.add(ObjectBlueprint::rect(220.0, 220.0).with_text("risk"));
        engine.settle().await;

        assert_eq!(engine.executions_by_rule(&RuleId::from("risk")).len(), 1);

        let fills: Vec<_> = scene
            .objects()
            .into_iter()
            .map(|object| object.fill)
            .collect();
        let palette = ["#22c55e", "#eab308", "#ef4444"];
        let expected: Vec<_> = (0..9).map(|i| Some(palette[i % 3].to_string())).collect();
        assert_eq!(fills, expected);
    }

    #[tokio::test]
    async fn builtins_see_each_addition_in_a_burst() {
        let (scene, engine) = engine_with(EngineConfig::default());
        let suggestions = recorder(&engine, EngineEventKind::ContentSuggestion);

        for i in 0..9 {
            scene.add(
                ObjectBlueprint::rect(f64::from(i % 3) * 110.0, f64::from(i / 3) * 110.0)
                    .with_text("high risk"),
            );
        }
        engine.settle().await;

        let templates = engine.executions_by_rule(&RuleId::from("smart-template-suggestions"));
        assert_eq!(templates.len(), 1);
        assert_eq!(suggestions.lock().expect("lock").len(), 1);

        let formats = engine.executions_by_rule(&RuleId::from("auto-format-risk-matrix"));
        assert_eq!(formats.len(), 8);
        let recolours: Vec<_> = formats
            .iter()
            .filter_map(|execution| execution.steps[0].result.as_ref())
            .filter(|result| result.get("formatted").is_some())
            .collect();
        assert_eq!(recolours.len(), 1);
        assert!(scene.objects().iter().all(|object| object.fill.is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn process_flow_is_aligned_after_delay() {
        let (scene, engine) = engine_with(EngineConfig::empty());
        engine.add_rule(
            WorkflowRule::new("align", "Align", WorkflowTrigger::new(TriggerType::ObjectModified))
                .with_condition(WorkflowCondition::object_count_above(2))
                .with_condition(WorkflowCondition::object_type_is("rect"))
                .with_action(
                    WorkflowAction::new(ActionKind::auto_align(AlignAxis::Horizontal, 50.0))
                        .after(1000),
                ),
        );

        let a = scene.add(ObjectBlueprint::rect(0.0, 100.0));
        let b = scene.add(ObjectBlueprint::rect(400.0, 30.0));
        let c = scene.add(ObjectBlueprint::rect(90.0, 300.0));

        let started = tokio::time::Instant::now();
        scene
            .modify(c.id, &ObjectPatch::position(95.0, 310.0))
            .expect("modify");
        engine.settle().await;

        assert!(started.elapsed() >= Duration::from_millis(1000));
        let positions: Vec<_> = [a.id, b.id, c.id]
            .into_iter()
            .map(|id| {
                let object = scene.object(id).expect("object");
                (object.left, object.top)
            })
            .collect();
        assert_eq!(positions, vec![(0.0, 100.0), (150.0, 100.0), (300.0, 100.0)]);

        let executions = engine.executions_by_rule(&RuleId::from("align"));
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].steps[0].status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn disabled_rule_does_not_run() {
        let (scene, engine) = engine_with(EngineConfig::empty());
        engine.add_rule(notify_rule("r1", TriggerType::ObjectAdded));

        engine.disable_rule(&RuleId::from("r1"));
        scene.add(ObjectBlueprint::rect(0.0, 0.0));
        engine.settle().await;

        assert!(engine.executions_by_rule(&RuleId::from("r1")).is_empty());
    }

    #[tokio::test]
    async fn kill_switch_blocks_everything_but_manual_runs() {
        let (scene, engine) = engine_with(EngineConfig::empty());
        let toggles = recorder(&engine, EngineEventKind::EngineToggled);
        engine.add_rule(notify_rule("r1", TriggerType::ObjectAdded));

        engine.set_enabled(false);
        engine.set_enabled(false);
        scene.add(ObjectBlueprint::rect(0.0, 0.0));
        engine.settle().await;
        assert!(engine.executions().is_empty());
        assert_eq!(toggles.lock().expect("lock").len(), 1);

        let execution = engine
            .execute_rule_manually(&RuleId::from("r1"))
            .await
            .expect("manual run");
        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(engine.executions().len(), 1);
    }

    #[tokio::test]
    async fn manual_run_bypasses_trigger_and_conditions() {
        let (_scene, engine) = engine_with(EngineConfig::empty());
        engine.add_rule(
            notify_rule("never", TriggerType::CanvasLoaded)
                .with_condition(WorkflowCondition::object_count_above(100)),
        );

        let execution = engine
            .execute_rule_manually(&RuleId::from("never"))
            .await
            .expect("manual run");

        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(engine.executions_by_rule(&RuleId::from("never")).len(), 1);
    }

    #[tokio::test]
    async fn manual_run_of_unknown_rule_fails() {
        let (_scene, engine) = engine_with(EngineConfig::empty());

        let err = engine
            .execute_rule_manually(&RuleId::from("missing"))
            .await
            .expect_err("unknown rule");

        assert_eq!(
            err.current_context(),
            &EngineError::RuleNotFound {
                rule_id: RuleId::from("missing")
            }
        );
        assert!(engine.executions().is_empty());
    }

    #[tokio::test]
    async fn manual_run_reports_failed_execution() {
        let (_scene, engine) = engine_with(EngineConfig::empty());
        let failures = recorder(&engine, EngineEventKind::ExecutionFailed);
        engine.add_rule(
            WorkflowRule::new("broken", "Broken", WorkflowTrigger::new(TriggerType::Manual))
                .with_action(ActionKind::ApplyTemplate {
                    template: "kanban".to_string(),
                    origin: None,
                }),
        );

        let err = engine
            .execute_rule_manually(&RuleId::from("broken"))
            .await
            .expect_err("failed execution");

        assert!(matches!(
            err.current_context(),
            EngineError::ExecutionFailed { reason, .. } if reason == "unknown template: kanban"
        ));
        assert_eq!(failures.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn dispatch_fires_non_scene_triggers() {
        let (_scene, engine) = engine_with(EngineConfig::empty());
        engine.add_rule(notify_rule("loaded", TriggerType::CanvasLoaded));

        let started = engine.dispatch(TriggerContext::new(TriggerType::CanvasLoaded));
        engine.settle().await;

        assert_eq!(started, 1);
        assert_eq!(engine.executions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_trigger_fires_on_interval() {
        let (_scene, engine) = engine_with(EngineConfig {
            timer_interval_ms: Some(500),
            ..EngineConfig::empty()
        });
        engine.add_rule(notify_rule("tick", TriggerType::Timer));

        tokio::time::sleep(Duration::from_millis(1250)).await;
        engine.settle().await;

        assert_eq!(engine.executions_by_rule(&RuleId::from("tick")).len(), 2);
        engine.cleanup();
    }

    #[tokio::test]
    async fn ledger_respects_retention_cap() {
        let (_scene, engine) = engine_with(EngineConfig {
            max_executions: Some(2),
            ..EngineConfig::empty()
        });
        engine.add_rule(notify_rule("r1", TriggerType::Manual));

        for _ in 0..3 {
            engine
                .execute_rule_manually(&RuleId::from("r1"))
                .await
                .expect("manual run");
        }

        assert_eq!(engine.executions().len(), 2);
    }

    #[tokio::test]
    async fn remove_and_disable_are_idempotent() {
        let (_scene, engine) = engine_with(EngineConfig::empty());
        let removed = recorder(&engine, EngineEventKind::RuleRemoved);
        let disabled = recorder(&engine, EngineEventKind::RuleDisabled);
        engine.add_rule(notify_rule("r1", TriggerType::ObjectAdded));

        engine.disable_rule(&RuleId::from("r1"));
        engine.disable_rule(&RuleId::from("r1"));
        assert!(engine.remove_rule(&RuleId::from("r1")));
        assert!(!engine.remove_rule(&RuleId::from("r1")));

        assert_eq!(disabled.lock().expect("lock").len(), 1);
        assert_eq!(removed.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn off_stops_delivery() {
        let (_scene, engine) = engine_with(EngineConfig::empty());
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let id = engine.on(EngineEventKind::RuleAdded, move |_| {
            *sink.lock().expect("lock") += 1;
        });

        engine.add_rule(notify_rule("a", TriggerType::Manual));
        assert!(engine.off(EngineEventKind::RuleAdded, id));
        engine.add_rule(notify_rule("b", TriggerType::Manual));

        assert_eq!(*seen.lock().expect("lock"), 1);
    }

    #[tokio::test]
    async fn cleanup_is_idempotent_and_detaches() {
        let (scene, engine) = engine_with(EngineConfig::default());
        engine.cleanup();
        engine.cleanup();

        assert!(engine.rules().is_empty());
        scene.add(ObjectBlueprint::rect(0.0, 0.0));
        engine.settle().await;
        assert!(engine.executions().is_empty());
    }
}
