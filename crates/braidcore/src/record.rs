use crate::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub type ExecutionId = Uuid;

/// Lifecycle of a persisted execution. RUNNING transitions exactly once to
/// COMPLETED or FAILED; CANCELLED is flipped out-of-band by the product UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

/// One row of execution history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub id: ExecutionId,
    pub project_id: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Patch applied when a run reaches a terminal state.
#[derive(Debug, Clone)]
pub struct ExecutionUpdate {
    pub status: ExecutionStatus,
    pub results: Option<Value>,
    pub error: Option<String>,
}

impl ExecutionUpdate {
    pub fn completed(results: Value) -> Self {
        Self {
            status: ExecutionStatus::Completed,
            results: Some(results),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            results: None,
            error: Some(error.into()),
        }
    }
}

/// Persistence boundary for execution history.
///
/// The engine creates a RUNNING record per run and finalizes it exactly once.
/// `cancel` flips the stored status only; it never interrupts a running walk,
/// and a walk that finishes later overwrites the cancelled status.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn create(&self, project_id: &str) -> Result<ExecutionRecord, StoreError>;

    async fn update(&self, id: ExecutionId, update: ExecutionUpdate) -> Result<(), StoreError>;

    async fn cancel(&self, id: ExecutionId) -> Result<(), StoreError>;

    async fn get(&self, id: ExecutionId) -> Result<ExecutionRecord, StoreError>;
}
