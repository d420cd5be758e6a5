//! Core domain types and utilities for canvasflow.
//!
//! This crate provides the foundational pieces shared by the scene model and
//! the workflow automation engine: strongly-typed identifiers, the rootcause
//! `Result` alias, and a generic publish/subscribe event bus.

pub mod bus;
pub mod error;
pub mod id;

pub use bus::{BusEvent, EventBus, Handler};
pub use error::Result;
pub use id::{ExecutionId, ObjectId, ParseIdError, RuleId, SubscriptionId};
