//! Workflow automation engine for the canvasflow diagram editor.
//!
//! Rules react to editor events and run actions against the scene:
//!
//! - **Rules**: one trigger, an AND-list of conditions, an ordered action list
//! - **Registry**: the rule set, seeded with built-in rules
//! - **Dispatcher**: routes scene events to matching rules by priority
//! - **Conditions**: predicates over scene state and the triggering object
//! - **Executor**: runs actions in order, recording every step
//! - **Ledger**: the history of executions
//! - **Engine**: the façade a session owns, with its event bus

pub mod action;
pub mod builtin;
pub mod condition;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod event;
pub mod execution;
pub mod executor;
pub mod extension;
pub mod ledger;
pub mod registry;
pub mod rule;
pub mod session;
pub mod trigger;

pub use action::{ActionKind, AlignAxis, ObjectSelector, Point, Severity, WorkflowAction};
pub use builtin::builtin_rules;
pub use condition::{ConditionEvaluator, ConditionType, CustomPredicate, Operator, WorkflowCondition};
pub use config::EngineConfig;
pub use engine::{EngineBuilder, WorkflowEngine};
pub use error::{ActionError, EngineError};
pub use event::{EngineEvent, EngineEventKind};
pub use execution::{ExecutionStatus, StepStatus, WorkflowExecution, WorkflowStep};
pub use extension::{ChainConnector, ConnectStrategy, TemplateLibrary, TemplateStrategy};
pub use ledger::ExecutionLedger;
pub use registry::RuleRegistry;
pub use rule::{RuleCategory, WorkflowRule};
pub use session::EditorSession;
pub use trigger::{TriggerContext, TriggerType, WorkflowTrigger};
