use async_trait::async_trait;
use braidcore::{EngineError, ExecutionContext, Node, NodeHandler};
use braidengine::evaluate;
use serde_json::Value;

/// Evaluates the configured condition expression. The engine matches the
/// returned value against the node's outgoing edges to pick a branch.
pub struct DecisionHandler;

#[async_trait]
impl NodeHandler for DecisionHandler {
    fn validate(&self, node: &Node) -> bool {
        node.config_str("condition").is_some()
    }

    async fn execute(&self, node: &Node, ctx: &ExecutionContext) -> Result<Value, EngineError> {
        let expr = node.config_str("condition").unwrap_or_default();
        let outcome = evaluate(expr, ctx);

        // A malformed expression routes like a false condition instead of
        // failing the run.
        if let Some(reason) = outcome.degraded_reason() {
            tracing::warn!(node_id = %node.id, "Condition degraded to false: {}", reason);
        }

        Ok(outcome.as_value())
    }
}
