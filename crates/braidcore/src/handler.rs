use crate::{EngineError, ExecutionContext, Node};
use async_trait::async_trait;
use serde_json::Value;

/// Behavior for one node type.
///
/// The built-in handler set is closed: handlers are wired into an immutable
/// registry once at startup, keyed by [`crate::NodeKind`]. Handlers read the
/// context; all context mutation (results, path, current node) belongs to
/// the engine.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    /// Cheap configuration check run before `execute`. Returning false fails
    /// the run with `InvalidNodeConfig` naming the node.
    fn validate(&self, _node: &Node) -> bool {
        true
    }

    async fn execute(&self, node: &Node, ctx: &ExecutionContext) -> Result<Value, EngineError>;
}
