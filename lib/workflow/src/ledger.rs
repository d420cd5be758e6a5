//! The execution ledger.
//!
//! Keeps every execution record in creation order, optionally capped at a
//! fixed number of entries with the oldest evicted first.

use crate::execution::WorkflowExecution;
use canvasflow_core::{ExecutionId, RuleId};
use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};
use tracing::trace;

#[derive(Default)]
struct Entries {
    order: VecDeque<ExecutionId>,
    by_id: HashMap<ExecutionId, WorkflowExecution>,
}

/// Append-only history of executions.
#[derive(Default)]
pub struct ExecutionLedger {
    entries: RwLock<Entries>,
    capacity: Option<usize>,
}

impl ExecutionLedger {
    /// Creates an unbounded ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger that keeps at most `capacity` executions.
    #[must_use]
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            entries: RwLock::default(),
            capacity,
        }
    }

    /// Appends a new execution.
    pub fn record(&self, execution: &WorkflowExecution) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.by_id.insert(execution.id, execution.clone()).is_none() {
            entries.order.push_back(execution.id);
        }

        if let Some(capacity) = self.capacity {
            while entries.order.len() > capacity {
                if let Some(evicted) = entries.order.pop_front() {
                    entries.by_id.remove(&evicted);
                    trace!(execution_id = %evicted, "evicted execution from ledger");
                }
            }
        }
    }

    /// Replaces the stored copy of an execution.
    ///
    /// Executions that were never recorded, or already evicted, are ignored.
    pub fn update(&self, execution: &WorkflowExecution) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.by_id.get_mut(&execution.id) {
            *existing = execution.clone();
        }
    }

    /// Marks a stored execution cancelled unless it already finished.
    pub fn cancel(&self, id: ExecutionId) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(execution) = entries.by_id.get_mut(&id) {
            if !execution.status.is_terminal() {
                execution.cancel();
                trace!(execution_id = %id, "execution cancelled");
            }
        }
    }

    /// Returns one execution by ID.
    #[must_use]
    pub fn get(&self, id: ExecutionId) -> Option<WorkflowExecution> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .get(&id)
            .cloned()
    }

    /// Returns every execution, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<WorkflowExecution> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .order
            .iter()
            .filter_map(|id| entries.by_id.get(id))
            .cloned()
            .collect()
    }

    /// Returns the executions of one rule, oldest first.
    #[must_use]
    pub fn by_rule(&self, rule_id: &RuleId) -> Vec<WorkflowExecution> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .order
            .iter()
            .filter_map(|id| entries.by_id.get(id))
            .filter(|execution| execution.rule_id == *rule_id)
            .cloned()
            .collect()
    }

    /// Returns the number of stored executions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }

    /// Returns true if no execution is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every execution.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.order.clear();
        entries.by_id.clear();
    }
}
