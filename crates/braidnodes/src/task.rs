use async_trait::async_trait;
use braidcore::{EngineError, ExecutionContext, Node, NodeHandler};
use chrono::Utc;
use serde_json::{json, Map, Value};
use tokio::time::{sleep, Duration};

const SIMULATED_WORK_MS: u64 = 10;

/// Shared task executor used by task, loop and parallel nodes.
///
/// Simulates a short unit of work and echoes the configured payload back.
/// When the context carries a `loopIndex` variable the echo includes it, so
/// loop iterations stay distinguishable in the collected output.
pub async fn run_task(
    config: Option<&Map<String, Value>>,
    ctx: &ExecutionContext,
) -> Result<Value, EngineError> {
    let task_type = config
        .and_then(|c| c.get("taskType"))
        .and_then(|v| v.as_str())
        .unwrap_or("default");
    let data = config
        .and_then(|c| c.get("data"))
        .cloned()
        .unwrap_or_else(|| json!({}));

    sleep(Duration::from_millis(SIMULATED_WORK_MS)).await;

    let mut result = json!({
        "taskType": task_type,
        "result": "success",
        "data": data,
        "completedAt": Utc::now(),
    });
    if let (Some(map), Some(index)) = (result.as_object_mut(), ctx.variable("loopIndex")) {
        map.insert("loopIndex".to_string(), index.clone());
    }

    Ok(result)
}

/// Generic work step. Requires a label and a config block, then defers to
/// the shared task executor.
pub struct TaskHandler;

#[async_trait]
impl NodeHandler for TaskHandler {
    fn validate(&self, node: &Node) -> bool {
        !node.data.label.is_empty() && node.data.config.is_some()
    }

    async fn execute(&self, node: &Node, ctx: &ExecutionContext) -> Result<Value, EngineError> {
        run_task(node.config(), ctx).await
    }
}
