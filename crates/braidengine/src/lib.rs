//! Workflow execution engine.
//!
//! Validates node/edge graphs, evaluates decision conditions and walks each
//! graph from its start node, persisting execution records and emitting
//! lifecycle events along the way.

mod condition;
mod engine;
mod queue;
mod registry;
mod store;
mod validator;

pub use condition::{evaluate, Evaluation};
pub use engine::WorkflowEngine;
pub use queue::{DispatchQueue, QueueConfig, QueueError, RetryPolicy, WorkflowJob};
pub use registry::HandlerRegistry;
pub use store::MemoryExecutionStore;
pub use validator::validate_graph;
