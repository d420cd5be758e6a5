//! Replays scripts against an editor session.

use crate::error::SessionError;
use crate::script::Command;
use canvasflow_core::{ObjectId, Result};
use canvasflow_scene::InMemoryScene;
use canvasflow_workflow::{EditorSession, EngineConfig, WorkflowExecution};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Drives one session through a script.
pub struct Runner {
    session: EditorSession<InMemoryScene>,
    added: Vec<ObjectId>,
}

impl Runner {
    /// Opens a fresh session over an empty scene.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            session: EditorSession::open(Arc::new(InMemoryScene::new()), config),
            added: Vec::new(),
        }
    }

    /// Returns the session being driven.
    #[must_use]
    pub fn session(&self) -> &EditorSession<InMemoryScene> {
        &self.session
    }

    /// Runs every command, then waits for all executions to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if a command addresses a missing object. Failing
    /// rules are not errors; they show up in the ledger.
    pub async fn run(&mut self, commands: &[Command]) -> Result<(), SessionError> {
        for (step, command) in commands.iter().enumerate() {
            debug!(step, ?command, "running command");
            self.apply(command).await?;
        }
        self.session.engine().settle().await;
        info!(
            commands = commands.len(),
            executions = self.session.engine().executions().len(),
            "script finished"
        );
        Ok(())
    }

    async fn apply(&mut self, command: &Command) -> Result<(), SessionError> {
        let scene = self.session.scene();
        match command {
            Command::Rule { rule } => self.session.engine().add_rule(rule.clone()),
            Command::Add { object } => {
                let added = scene.add(object.clone());
                self.added.push(added.id);
            }
            Command::Modify { index, properties } => {
                scene
                    .modify(self.object(*index)?, properties)
                    .map_err(SessionError::from)?;
            }
            Command::Select { index } => {
                scene.select(self.object(*index)?).map_err(SessionError::from)?;
            }
            Command::EditText { index, text } => {
                scene
                    .edit_text(self.object(*index)?, text.clone())
                    .map_err(SessionError::from)?;
            }
            Command::Load => {
                self.session.load();
            }
            Command::Run { rule } => {
                if let Err(e) = self.session.engine().execute_rule_manually(rule).await {
                    warn!(rule_id = %rule, error = %e, "manual run failed");
                }
            }
            Command::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
        }
        Ok(())
    }

    fn object(&self, index: usize) -> Result<ObjectId, SessionError> {
        let id = self.added.get(index).copied().ok_or(SessionError::NoSuchObject {
            index,
            added: self.added.len(),
        })?;
        Ok(id)
    }

    /// Returns the ledger as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn executions_json(&self) -> Result<String, SessionError> {
        let executions: Vec<WorkflowExecution> = self.session.engine().executions();
        let json = serde_json::to_string_pretty(&executions).map_err(|e| SessionError::Output {
            details: e.to_string(),
        })?;
        Ok(json)
    }

    /// Tears the session down.
    pub fn close(&self) {
        self.session.close();
    }
}
