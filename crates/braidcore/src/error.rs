use crate::NodeKind;
use thiserror::Error;
use uuid::Uuid;

/// Structural problems found before execution starts. No execution record
/// exists when one of these is raised.
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("Invalid workflow: {reason}")]
    InvalidWorkflow { reason: String },

    #[error("Cyclic workflow: cycle through node '{node_id}'")]
    CyclicWorkflow { node_id: String },
}

impl ValidationError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ValidationError::InvalidWorkflow {
            reason: reason.into(),
        }
    }
}

/// Failures from the execution-record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Execution not found: {id}")]
    NotFound { id: Uuid },

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Umbrella error for a workflow run. Every variant is fatal: the run stops,
/// the record is finalized FAILED and the error propagates to the caller.
/// Condition-evaluation failures never appear here; they degrade to a false
/// routing result instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid configuration for node '{node_id}'")]
    InvalidNodeConfig { node_id: String },

    #[error("No handler for node type '{kind}'")]
    NoHandler { kind: NodeKind },

    #[error("No outgoing edge of '{node_id}' matches decision result {result}")]
    NoMatchingPath { node_id: String, result: String },

    #[error("Unknown integration type '{integration}' on node '{node_id}'")]
    UnknownIntegration {
        integration: String,
        node_id: String,
    },

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Node attribution for error events, where the variant carries one.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            EngineError::Validation(ValidationError::CyclicWorkflow { node_id })
            | EngineError::InvalidNodeConfig { node_id }
            | EngineError::NoMatchingPath { node_id, .. }
            | EngineError::UnknownIntegration { node_id, .. } => Some(node_id),
            _ => None,
        }
    }
}
