//! Errors raised while running a session script.

use canvasflow_scene::SceneError;
use std::fmt;
use std::path::PathBuf;

/// Errors from the session runner.
#[derive(Debug)]
pub enum SessionError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// The script file could not be read.
    ReadScript { path: PathBuf, details: String },
    /// The script is not valid JSON for a command list.
    ParseScript { details: String },
    /// A command addressed an object that was never added.
    NoSuchObject { index: usize, added: usize },
    /// The scene refused a command.
    Scene(SceneError),
    /// The ledger could not be written out.
    Output { details: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::ReadScript { path, details } => {
                write!(f, "failed to read script '{}': {details}", path.display())
            }
            Self::ParseScript { details } => write!(f, "invalid script: {details}"),
            Self::NoSuchObject { index, added } => {
                write!(f, "object #{index} does not exist ({added} added so far)")
            }
            Self::Scene(e) => write!(f, "scene error: {e}"),
            Self::Output { details } => write!(f, "failed to write executions: {details}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<SceneError> for SessionError {
    fn from(e: SceneError) -> Self {
        Self::Scene(e)
    }
}
