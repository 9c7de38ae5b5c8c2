use async_trait::async_trait;
use braidcore::{EngineError, ExecutionContext, Node, NodeHandler};
use serde_json::{json, Value};

/// Placeholder for user-supplied code.
///
/// Execution stays stubbed until the runtime grows a sandbox; the marker
/// result makes that visible in run output instead of failing the workflow.
pub struct CustomHandler;

#[async_trait]
impl NodeHandler for CustomHandler {
    fn validate(&self, node: &Node) -> bool {
        node.config_str("code").is_some()
    }

    async fn execute(&self, node: &Node, _ctx: &ExecutionContext) -> Result<Value, EngineError> {
        tracing::warn!(node_id = %node.id, "Custom code execution is stubbed");

        Ok(json!({
            "executed": false,
            "note": "custom code execution is not enabled in this runtime",
        }))
    }
}
