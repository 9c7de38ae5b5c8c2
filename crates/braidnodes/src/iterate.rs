use crate::task::run_task;
use async_trait::async_trait;
use braidcore::{EngineError, ExecutionContext, Node, NodeHandler};
use futures::future::try_join_all;
use serde_json::{json, Value};

/// Largest loop count a node may configure.
const MAX_ITERATIONS: f64 = 1000.0;

/// Runs the shared task executor a fixed number of times, sequentially.
///
/// Each iteration sees its own context copy with `loopIndex` set. The
/// iteration results stay local: they come back as the node's own array
/// result and are never merged into the parent results map. Counts above
/// `MAX_ITERATIONS` are rejected as configuration errors.
pub struct LoopHandler;

#[async_trait]
impl NodeHandler for LoopHandler {
    fn validate(&self, node: &Node) -> bool {
        match node.config_f64("iterations") {
            Some(count) => count <= MAX_ITERATIONS,
            None => false,
        }
    }

    async fn execute(&self, node: &Node, ctx: &ExecutionContext) -> Result<Value, EngineError> {
        let iterations = node.config_f64("iterations").unwrap_or(0.0).max(0.0) as u64;
        let mut collected = Vec::new();

        for index in 0..iterations {
            let mut iter_ctx = ctx.clone();
            iter_ctx
                .variables
                .insert("loopIndex".to_string(), json!(index));
            collected.push(run_task(node.config(), &iter_ctx).await?);
        }

        Ok(Value::Array(collected))
    }
}

/// Runs every task in `config.tasks` concurrently and joins the results in
/// definition order. The first failing task aborts the whole node.
pub struct ParallelHandler;

#[async_trait]
impl NodeHandler for ParallelHandler {
    fn validate(&self, node: &Node) -> bool {
        node.config_array("tasks").is_some()
    }

    async fn execute(&self, node: &Node, ctx: &ExecutionContext) -> Result<Value, EngineError> {
        let tasks = node.config_array("tasks").cloned().unwrap_or_default();
        let pending = tasks.iter().map(|task| run_task(task.as_object(), ctx));
        let results = try_join_all(pending).await?;

        Ok(Value::Array(results))
    }
}
