use crate::EngineError;
use async_trait::async_trait;

/// Tuning knobs forwarded to the generation backend, resolved per node from
/// its config with engine defaults.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub max_tokens: u32,
    pub user_id: String,
    pub project_id: String,
}

/// External AI text-generation backend. `ai` nodes call this; a failure is
/// fatal to the run.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        task_type: &str,
        prompt: &str,
        opts: GenerationOptions,
    ) -> Result<String, EngineError>;
}

/// Deterministic offline generator that echoes the prompt in a canned reply.
/// Default wiring for the CLI and server until a real backend is configured.
pub struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(
        &self,
        task_type: &str,
        prompt: &str,
        _opts: GenerationOptions,
    ) -> Result<String, EngineError> {
        Ok(format!("[{}] {}", task_type, prompt))
    }
}
