use crate::WorkflowEngine;
use braidcore::{ExecutionContext, Graph};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

/// A queued workflow run, shaped like the product's job payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowJob {
    pub project_id: String,
    pub user_id: String,
    pub graph: Graph,
    pub context: ExecutionContext,
}

/// Whole-job retry policy. There is no node-level retry anywhere in the
/// engine; a retried job is a fresh execution with a fresh record.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay_ms: 500,
            backoff_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// How many jobs may run at once.
    pub concurrency: usize,
    pub retry: RetryPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue is closed")]
    Closed,
}

/// Fire-and-forget intake for workflow runs.
///
/// A dispatcher task feeds submitted jobs to the engine; a semaphore bounds
/// how many run concurrently. Progress is observable through the execution
/// store and the event sink. Dropping every handle closes intake and lets
/// the dispatcher drain what is already queued.
#[derive(Clone)]
pub struct DispatchQueue {
    tx: mpsc::UnboundedSender<(Uuid, WorkflowJob)>,
}

impl DispatchQueue {
    pub fn new(engine: Arc<WorkflowEngine>, config: QueueConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(dispatch_loop(engine, config, rx));
        Self { tx }
    }

    /// Queue a job and return its id immediately.
    pub fn submit(&self, job: WorkflowJob) -> Result<Uuid, QueueError> {
        let job_id = Uuid::new_v4();
        tracing::info!(job_id = %job_id, project_id = %job.project_id, "Queueing workflow job");
        self.tx.send((job_id, job)).map_err(|_| QueueError::Closed)?;
        Ok(job_id)
    }
}

async fn dispatch_loop(
    engine: Arc<WorkflowEngine>,
    config: QueueConfig,
    mut rx: mpsc::UnboundedReceiver<(Uuid, WorkflowJob)>,
) {
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));

    while let Some((job_id, job)) = rx.recv().await {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let engine = engine.clone();
        let retry = config.retry.clone();

        tokio::spawn(async move {
            let _permit = permit;
            run_job(engine, retry, job_id, job).await;
        });
    }
}

async fn run_job(engine: Arc<WorkflowEngine>, retry: RetryPolicy, job_id: Uuid, job: WorkflowJob) {
    let attempts = retry.max_attempts.max(1);
    let mut delay = retry.delay_ms;

    for attempt in 1..=attempts {
        match engine.execute(&job.graph, job.context.clone()).await {
            Ok(_) => {
                tracing::info!(
                    job_id = %job_id,
                    project_id = %job.project_id,
                    attempt,
                    "Queued workflow completed"
                );
                return;
            }
            Err(err) if attempt < attempts => {
                tracing::warn!(
                    job_id = %job_id,
                    attempt,
                    "Queued workflow failed, retrying: {}",
                    err
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
                delay = (delay as f64 * retry.backoff_multiplier) as u64;
            }
            Err(err) => {
                tracing::error!(
                    job_id = %job_id,
                    project_id = %job.project_id,
                    attempt,
                    "Queued workflow failed: {}",
                    err
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HandlerRegistry, MemoryExecutionStore};
    use async_trait::async_trait;
    use braidcore::{
        Edge, EngineError, ExecutionStatus, Node, NodeHandler, NodeKind, NullSink,
    };
    use serde_json::{json, Value};

    struct StampHandler;

    #[async_trait]
    impl NodeHandler for StampHandler {
        async fn execute(&self, _node: &Node, _ctx: &ExecutionContext) -> Result<Value, EngineError> {
            Ok(json!({"ok": true}))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl NodeHandler for FailingHandler {
        async fn execute(&self, _node: &Node, _ctx: &ExecutionContext) -> Result<Value, EngineError> {
            Err(EngineError::Generation("induced failure".to_string()))
        }
    }

    fn test_registry() -> HandlerRegistry {
        HandlerRegistry::from_handlers([
            (NodeKind::Start, Arc::new(StampHandler) as Arc<dyn NodeHandler>),
            (NodeKind::End, Arc::new(StampHandler)),
            (NodeKind::Task, Arc::new(FailingHandler)),
        ])
    }

    fn direct_graph() -> Graph {
        let mut graph = Graph::new();
        graph.add_node(Node::new("start", NodeKind::Start, "Start"));
        graph.add_node(Node::new("end", NodeKind::End, "End"));
        graph.add_edge(Edge::new("e1", "start", "end"));
        graph
    }

    fn failing_graph() -> Graph {
        let mut graph = Graph::new();
        graph.add_node(Node::new("start", NodeKind::Start, "Start"));
        graph.add_node(Node::new("boom", NodeKind::Task, "Boom"));
        graph.add_node(Node::new("end", NodeKind::End, "End"));
        graph.add_edge(Edge::new("e1", "start", "boom"));
        graph.add_edge(Edge::new("e2", "boom", "end"));
        graph
    }

    fn job(graph: Graph) -> WorkflowJob {
        WorkflowJob {
            project_id: "proj".to_string(),
            user_id: "user".to_string(),
            graph,
            context: ExecutionContext::new("proj", "user"),
        }
    }

    #[tokio::test]
    async fn queued_job_lands_a_completed_record() {
        let store = Arc::new(MemoryExecutionStore::new());
        let engine = Arc::new(WorkflowEngine::new(
            test_registry(),
            store.clone(),
            Arc::new(NullSink),
        ));
        let queue = DispatchQueue::new(engine, QueueConfig::default());

        queue.submit(job(direct_graph())).unwrap();

        let mut completed = false;
        for _ in 0..400 {
            if store
                .list()
                .await
                .iter()
                .any(|r| r.status == ExecutionStatus::Completed)
            {
                completed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(completed, "queued workflow should land a completed record");
    }

    #[tokio::test]
    async fn failed_job_retries_as_a_whole_run() {
        let store = Arc::new(MemoryExecutionStore::new());
        let engine = Arc::new(WorkflowEngine::new(
            test_registry(),
            store.clone(),
            Arc::new(NullSink),
        ));
        let config = QueueConfig {
            concurrency: 2,
            retry: RetryPolicy {
                max_attempts: 2,
                delay_ms: 1,
                backoff_multiplier: 1.0,
            },
        };
        let queue = DispatchQueue::new(engine, config);

        queue.submit(job(failing_graph())).unwrap();

        // Each attempt is a fresh execution with its own record.
        let mut records = Vec::new();
        for _ in 0..400 {
            records = store.list().await;
            if records.len() == 2 && records.iter().all(|r| r.status.is_terminal()) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(records.len(), 2, "one record per attempt");
        assert!(records.iter().all(|r| r.status == ExecutionStatus::Failed));
        assert!(records
            .iter()
            .all(|r| r.error.as_deref() == Some("Generation failed: induced failure")));
    }
}
