//! Headless editor session runner.
//!
//! Opens an editor session over an in-memory scene, replays a script of
//! operator actions against it and reports what the workflow engine did.

pub mod config;
pub mod error;
pub mod runner;
pub mod script;

pub use config::SessionConfig;
pub use error::SessionError;
pub use runner::Runner;
