use async_trait::async_trait;
use braidcore::{
    ExecutionId, ExecutionRecord, ExecutionStatus, ExecutionStore, ExecutionUpdate, StoreError,
};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory execution history. Production deployments swap in a
/// database-backed store; tests and the dev server use this one.
#[derive(Default)]
pub struct MemoryExecutionStore {
    records: RwLock<HashMap<ExecutionId, ExecutionRecord>>,
}

impl MemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record, most recent first. Not part of the store contract; the
    /// dev server's listing endpoint uses it.
    pub async fn list(&self) -> Vec<ExecutionRecord> {
        let records = self.records.read().await;
        let mut all: Vec<_> = records.values().cloned().collect();
        all.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all
    }
}

#[async_trait]
impl ExecutionStore for MemoryExecutionStore {
    async fn create(&self, project_id: &str) -> Result<ExecutionRecord, StoreError> {
        let record = ExecutionRecord {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            results: None,
            error: None,
        };
        self.records.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    /// Overwrites unconditionally: a run that finishes after an out-of-band
    /// cancel replaces the CANCELLED status. Preserved product behavior.
    async fn update(&self, id: ExecutionId, update: ExecutionUpdate) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound { id })?;

        record.status = update.status;
        if update.results.is_some() {
            record.results = update.results;
        }
        if update.error.is_some() {
            record.error = update.error;
        }
        if record.status.is_terminal() {
            record.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn cancel(&self, id: ExecutionId) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        record.status = ExecutionStatus::Cancelled;
        record.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn get(&self, id: ExecutionId) -> Result<ExecutionRecord, StoreError> {
        let records = self.records.read().await;
        records.get(&id).cloned().ok_or(StoreError::NotFound { id })
    }
}
