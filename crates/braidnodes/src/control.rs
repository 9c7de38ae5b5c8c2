use async_trait::async_trait;
use braidcore::{EngineError, ExecutionContext, Node, NodeHandler};
use chrono::Utc;
use serde_json::{json, Value};

/// Entry marker. Accepts any configuration and stamps the start of the run.
pub struct StartHandler;

#[async_trait]
impl NodeHandler for StartHandler {
    async fn execute(&self, _node: &Node, _ctx: &ExecutionContext) -> Result<Value, EngineError> {
        Ok(json!({
            "started": true,
            "timestamp": Utc::now(),
        }))
    }
}

/// Closing marker. Its stamp lands in the results map under the end node's
/// id; the engine then returns the whole accumulated map as the run output.
pub struct EndHandler;

#[async_trait]
impl NodeHandler for EndHandler {
    async fn execute(&self, _node: &Node, _ctx: &ExecutionContext) -> Result<Value, EngineError> {
        Ok(json!({
            "completed": true,
            "timestamp": Utc::now(),
        }))
    }
}
