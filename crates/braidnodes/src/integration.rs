use async_trait::async_trait;
use braidcore::{EngineError, ExecutionContext, Node, NodeHandler};
use chrono::Utc;
use serde_json::{json, Value};

/// Dispatches to one of a fixed set of integration stubs by `config.type`.
///
/// Real third-party calls are out of scope for this runtime; each stub
/// answers with a plausible canned payload so workflows that reference an
/// integration still run end to end.
pub struct IntegrationHandler;

#[async_trait]
impl NodeHandler for IntegrationHandler {
    fn validate(&self, node: &Node) -> bool {
        node.config_str("type").is_some()
    }

    async fn execute(&self, node: &Node, _ctx: &ExecutionContext) -> Result<Value, EngineError> {
        let integration = node.config_str("type").unwrap_or_default();
        let action = node.config_str("action").unwrap_or("sync");

        let mut payload = match integration {
            "github" => json!({
                "integration": "github",
                "action": action,
                "repository": node.config_str("repository").unwrap_or("unset"),
                "status": "ok",
            }),
            "jira" => json!({
                "integration": "jira",
                "action": action,
                "project": node.config_str("project").unwrap_or("unset"),
                "status": "ok",
            }),
            "trello" => json!({
                "integration": "trello",
                "action": action,
                "board": node.config_str("board").unwrap_or("unset"),
                "status": "ok",
            }),
            "slack" => json!({
                "integration": "slack",
                "action": action,
                "channel": node.config_str("channel").unwrap_or("#general"),
                "status": "ok",
            }),
            other => {
                return Err(EngineError::UnknownIntegration {
                    integration: other.to_string(),
                    node_id: node.id.clone(),
                })
            }
        };

        if let Some(map) = payload.as_object_mut() {
            map.insert("timestamp".to_string(), json!(Utc::now()));
        }

        Ok(payload)
    }
}
