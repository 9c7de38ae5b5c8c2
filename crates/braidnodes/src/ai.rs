use async_trait::async_trait;
use braidcore::{
    EngineError, EngineEvent, ExecutionContext, GenerationOptions, Node, NodeHandler,
    SharedEventSink, TextGenerator,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Sends the node's prompt to the configured text-generation backend.
///
/// The prompt comes from `config.prompt`, falling back to the node
/// description. A generation failure emits a node-attributed error event
/// before aborting the run; the terminal workflow event for generation
/// errors carries no node id.
pub struct AiHandler {
    generator: Arc<dyn TextGenerator>,
    events: SharedEventSink,
}

impl AiHandler {
    pub fn new(generator: Arc<dyn TextGenerator>, events: SharedEventSink) -> Self {
        Self { generator, events }
    }

    fn resolve_prompt(node: &Node) -> Option<&str> {
        node.config_str("prompt").or(node.data.description.as_deref())
    }
}

#[async_trait]
impl NodeHandler for AiHandler {
    fn validate(&self, node: &Node) -> bool {
        Self::resolve_prompt(node).is_some()
    }

    async fn execute(&self, node: &Node, ctx: &ExecutionContext) -> Result<Value, EngineError> {
        let prompt = Self::resolve_prompt(node).unwrap_or_default();
        let task_type = node.config_str("taskType").unwrap_or("text-generation");
        let options = GenerationOptions {
            temperature: node.config_f64("temperature").unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: node
                .config_value("maxTokens")
                .and_then(|v| v.as_u64())
                .map(|v| v as u32)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            user_id: ctx.user_id.clone(),
            project_id: ctx.project_id.clone(),
        };

        tracing::debug!(node_id = %node.id, task_type, "Requesting generation");

        match self.generator.generate(task_type, prompt, options).await {
            Ok(response) => Ok(json!({
                "success": true,
                "response": response,
                "timestamp": Utc::now(),
            })),
            Err(err) => {
                self.events.emit(EngineEvent::WorkflowError {
                    node_id: Some(node.id.clone()),
                    error: err.to_string(),
                    timestamp: Utc::now(),
                });
                Err(err)
            }
        }
    }
}
