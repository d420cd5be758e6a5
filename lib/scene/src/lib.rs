//! Scene model for the canvasflow diagram editor.
//!
//! The rendering surface itself lives outside this workspace. This crate
//! describes what the automation engine needs from it:
//!
//! - **Objects**: shapes, text and connectors with geometry and content
//! - **Events**: `object:added`, `object:modified`, `selection:created`, `text:changed`
//! - **Adapter**: the `SceneAdapter` trait the engine reads and mutates through
//! - **In-memory scene**: a complete adapter for headless sessions and tests

pub mod adapter;
pub mod error;
pub mod event;
pub mod memory;
pub mod object;

pub use adapter::{SceneAdapter, SceneListener};
pub use error::SceneError;
pub use event::{SceneEvent, SceneEventKind};
pub use memory::InMemoryScene;
pub use object::{ObjectBlueprint, ObjectKind, ObjectPatch, SceneObject};
