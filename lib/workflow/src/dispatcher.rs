//! The trigger dispatcher.
//!
//! Turns scene events into rule evaluation. Matching and condition
//! evaluation happen synchronously inside the scene's event callback, against
//! one snapshot of the scene, by ascending priority. Only executions are
//! spawned, so executions of one event may overlap.

use crate::condition::ConditionEvaluator;
use crate::executor::ActionExecutor;
use crate::registry::RuleRegistry;
use crate::trigger::TriggerContext;
use canvasflow_core::SubscriptionId;
use canvasflow_scene::{SceneAdapter, SceneEvent, SceneEventKind};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Tasks spawned by the dispatcher that have not been awaited yet.
#[derive(Default)]
struct InFlight {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl InFlight {
    /// Spawns `task` on the current runtime. Returns false if there is none.
    fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            return false;
        };
        let handle = runtime.spawn(task);
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|handle| !handle.is_finished());
        handles.push(handle);
        true
    }

    /// Waits until every spawned task, including ones spawned meanwhile, has finished.
    async fn settle(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> =
                std::mem::take(&mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner));
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    warn!(error = %e, "dispatched task did not finish");
                }
            }
        }
    }

    fn abort_all(&self) {
        for handle in self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
        {
            handle.abort();
        }
    }
}

/// Routes trigger contexts to matching rules.
pub struct TriggerDispatcher {
    scene: Arc<dyn SceneAdapter>,
    registry: Arc<RuleRegistry>,
    evaluator: Arc<ConditionEvaluator>,
    executor: Arc<ActionExecutor>,
    enabled: AtomicBool,
    in_flight: InFlight,
    subscriptions: Mutex<Vec<(SceneEventKind, SubscriptionId)>>,
}

impl TriggerDispatcher {
    /// Creates a dispatcher. It does not listen to the scene until [`attach`](Self::attach).
    #[must_use]
    pub fn new(
        scene: Arc<dyn SceneAdapter>,
        registry: Arc<RuleRegistry>,
        evaluator: Arc<ConditionEvaluator>,
        executor: Arc<ActionExecutor>,
        enabled: bool,
    ) -> Self {
        Self {
            scene,
            registry,
            evaluator,
            executor,
            enabled: AtomicBool::new(enabled),
            in_flight: InFlight::default(),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Subscribes to every scene event kind, once each.
    pub fn attach(self: &Arc<Self>) {
        let mut subscriptions = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !subscriptions.is_empty() {
            return;
        }

        for kind in SceneEventKind::ALL {
            let dispatcher = Arc::downgrade(self);
            let id = self.scene.subscribe(
                kind,
                Arc::new(move |event: &SceneEvent| on_scene_event(&dispatcher, event)),
            );
            subscriptions.push((kind, id));
        }
        debug!(kinds = subscriptions.len(), "dispatcher attached to scene");
    }

    /// Drops every scene subscription and aborts unfinished work.
    pub fn detach(&self) {
        let subscriptions = std::mem::take(
            &mut *self
                .subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for (kind, id) in subscriptions {
            self.scene.unsubscribe(kind, id);
        }
        self.in_flight.abort_all();
    }

    /// Sets the global kill switch. Returns the previous value.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        self.enabled.swap(enabled, Ordering::SeqCst)
    }

    /// Returns the global kill switch.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Evaluates every matching rule against the scene as it is now and
    /// spawns an execution for each one whose conditions hold. Returns how
    /// many executions were started.
    pub fn dispatch(&self, context: TriggerContext) -> usize {
        if !self.is_enabled() {
            return 0;
        }

        let rules = self.registry.matching(&context);
        if rules.is_empty() {
            return 0;
        }
        debug!(trigger = %context.trigger, candidates = rules.len(), "dispatching trigger");

        let context = Arc::new(context.with_snapshot(self.scene.objects()));
        let objects = context.snapshot.as_deref().unwrap_or_default();
        let mut started = 0;
        for rule in rules {
            debug!(rule_id = %rule.id, priority = rule.priority, "evaluating rule");
            if !self.evaluator.evaluate_all(&rule.conditions, &objects, &context) {
                continue;
            }

            let executor = Arc::clone(&self.executor);
            let context = Arc::clone(&context);
            let rule_id = rule.id.clone();
            if self.in_flight.spawn(async move {
                executor.execute(&rule, &context).await;
            }) {
                started += 1;
            } else {
                warn!(rule_id = %rule_id, "no async runtime, execution dropped");
            }
        }
        started
    }

    /// Waits for every in-flight execution to finish.
    pub async fn settle(&self) {
        self.in_flight.settle().await;
    }
}

// Runs inside the scene's emit, so conditions see the scene the event fired on.
fn on_scene_event(dispatcher: &Weak<TriggerDispatcher>, event: &SceneEvent) {
    if let Some(dispatcher) = dispatcher.upgrade() {
        dispatcher.dispatch(TriggerContext::from(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, Severity};
    use crate::condition::{ConditionType, CustomPredicate, Operator, WorkflowCondition};
    use crate::event::EngineEvent;
    use crate::extension::{ChainConnector, TemplateLibrary};
    use crate::ledger::ExecutionLedger;
    use crate::rule::WorkflowRule;
    use crate::trigger::{TriggerType, WorkflowTrigger};
    use canvasflow_core::{EventBus, RuleId};
    use canvasflow_scene::{InMemoryScene, ObjectBlueprint, SceneObject};

    struct Harness {
        scene: Arc<InMemoryScene>,
        registry: Arc<RuleRegistry>,
        evaluator: Arc<ConditionEvaluator>,
        ledger: Arc<ExecutionLedger>,
        dispatcher: Arc<TriggerDispatcher>,
    }

    fn harness() -> Harness {
        let scene = Arc::new(InMemoryScene::new());
        let adapter: Arc<dyn SceneAdapter> = scene.clone();
        let events = Arc::new(EventBus::<EngineEvent>::new());
        let ledger = Arc::new(ExecutionLedger::new());
        let registry = Arc::new(RuleRegistry::new(Arc::clone(&events)));
        let evaluator = Arc::new(ConditionEvaluator::new());
        let executor = Arc::new(ActionExecutor::new(
            Arc::clone(&adapter),
            Arc::clone(&ledger),
            events,
            Arc::new(ChainConnector),
            Arc::new(TemplateLibrary::with_builtins()),
        ));
        let dispatcher = Arc::new(TriggerDispatcher::new(
            adapter,
            Arc::clone(&registry),
            Arc::clone(&evaluator),
            executor,
            true,
        ));
        dispatcher.attach();
        Harness {
            scene,
            registry,
            evaluator,
            ledger,
            dispatcher,
        }
    }

    fn notify_rule(id: &str, trigger: TriggerType) -> WorkflowRule {
        WorkflowRule::new(id, id, WorkflowTrigger::new(trigger))
            .with_action(ActionKind::notify(id, Severity::Info))
    }

    /// Records the order in which it is consulted.
    struct Tracer {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl CustomPredicate for Tracer {
        fn evaluate(&self, _condition: &WorkflowCondition, _objects: &[SceneObject], _context: &TriggerContext) -> bool {
            self.log.lock().expect("lock").push(self.name);
            true
        }
    }

    #[tokio::test]
    async fn scene_event_starts_matching_rules() {
        let h = harness();
        h.registry.add(notify_rule("on-add", TriggerType::ObjectAdded));
        h.registry.add(notify_rule("on-text", TriggerType::TextChanged));

        h.scene.add(ObjectBlueprint::rect(0.0, 0.0));
        h.dispatcher.settle().await;

        let executions = h.ledger.all();
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].rule_id.as_str(), "on-add");
    }

    #[tokio::test]
    async fn conditions_are_evaluated_by_priority() {
        let h = harness();
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in ["second", "first"] {
            h.evaluator.register(
                name,
                Arc::new(Tracer {
                    name,
                    log: Arc::clone(&log),
                }),
            );
        }
        h.registry.add(
            notify_rule("second", TriggerType::ObjectAdded)
                .with_priority(2)
                .with_condition(WorkflowCondition::custom("second")),
        );
        h.registry.add(
            notify_rule("first", TriggerType::ObjectAdded)
                .with_priority(1)
                .with_condition(WorkflowCondition::custom("first")),
        );

        let started = h.dispatcher.dispatch(TriggerContext::new(TriggerType::ObjectAdded));
        h.dispatcher.settle().await;

        assert_eq!(started, 2);
        assert_eq!(*log.lock().expect("lock"), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn conditions_see_the_scene_each_event_fired_on() {
        let h = harness();
        h.registry.add(
            notify_rule("first-object", TriggerType::ObjectAdded).with_condition(WorkflowCondition::new(
                ConditionType::ObjectCount,
                Operator::Equals,
                1,
            )),
        );

        h.scene.add(ObjectBlueprint::rect(0.0, 0.0));
        h.scene.add(ObjectBlueprint::rect(200.0, 0.0));
        h.dispatcher.settle().await;

        assert_eq!(h.ledger.by_rule(&RuleId::from("first-object")).len(), 1);
    }

    #[tokio::test]
    async fn failing_condition_skips_rule() {
        let h = harness();
        h.registry.add(
            notify_rule("crowded", TriggerType::ObjectAdded)
                .with_condition(WorkflowCondition::object_count_above(5)),
        );

        h.scene.add(ObjectBlueprint::rect(0.0, 0.0));
        h.dispatcher.settle().await;

        assert!(h.ledger.is_empty());
    }

    #[tokio::test]
    async fn kill_switch_blocks_scene_events() {
        let h = harness();
        h.registry.add(notify_rule("on-add", TriggerType::ObjectAdded));

        assert!(h.dispatcher.set_enabled(false));
        h.scene.add(ObjectBlueprint::rect(0.0, 0.0));
        let started = h.dispatcher.dispatch(TriggerContext::new(TriggerType::ObjectAdded));
        h.dispatcher.settle().await;

        assert_eq!(started, 0);
        assert!(h.ledger.is_empty());
    }

    #[tokio::test]
    async fn detach_stops_listening() {
        let h = harness();
        h.registry.add(notify_rule("on-add", TriggerType::ObjectAdded));

        h.dispatcher.detach();
        h.scene.add(ObjectBlueprint::rect(0.0, 0.0));
        h.dispatcher.settle().await;

        assert!(h.ledger.is_empty());
    }

    #[test]
    fn scene_event_without_runtime_is_dropped() {
        let h = harness();
        h.registry.add(notify_rule("on-add", TriggerType::ObjectAdded));

        h.scene.add(ObjectBlueprint::rect(0.0, 0.0));

        assert!(h.ledger.is_empty());
    }
}
