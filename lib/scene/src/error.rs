//! Error types for scene operations.

use canvasflow_core::ObjectId;
use std::fmt;

/// Errors from scene reads and mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// No object with the given ID is on the scene.
    ObjectNotFound { id: ObjectId },
    /// The surface refused the mutation.
    Rejected { reason: String },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectNotFound { id } => write!(f, "scene object not found: {id}"),
            Self::Rejected { reason } => write!(f, "scene rejected mutation: {reason}"),
        }
    }
}

impl std::error::Error for SceneError {}
