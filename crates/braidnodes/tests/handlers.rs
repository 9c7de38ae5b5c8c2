use async_trait::async_trait;
use braidcore::{
    EchoGenerator, EngineError, EngineEvent, ExecutionContext, GenerationOptions, MemorySink,
    Node, NodeHandler, NodeKind, NullSink, TextGenerator,
};
use braidnodes::{
    AiHandler, CustomHandler, DecisionHandler, EndHandler, IntegrationHandler, LoopHandler,
    ParallelHandler, StartHandler, TaskHandler,
};
use serde_json::json;
use std::sync::Arc;

fn ctx() -> ExecutionContext {
    ExecutionContext::new("proj-1", "user-1")
}

struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(
        &self,
        _task_type: &str,
        _prompt: &str,
        _opts: GenerationOptions,
    ) -> Result<String, EngineError> {
        Err(EngineError::Generation("backend offline".to_string()))
    }
}

#[tokio::test]
async fn start_and_end_stamp_their_results() {
    let node = Node::new("s", NodeKind::Start, "Start");
    let result = StartHandler.execute(&node, &ctx()).await.unwrap();
    assert_eq!(result["started"], json!(true));
    assert!(result["timestamp"].is_string());

    let node = Node::new("e", NodeKind::End, "End");
    let result = EndHandler.execute(&node, &ctx()).await.unwrap();
    assert_eq!(result["completed"], json!(true));
    assert!(result["timestamp"].is_string());
}

#[tokio::test]
async fn task_echoes_its_configuration() {
    let node = Node::new("t", NodeKind::Task, "Fetch")
        .with_config("taskType", "http")
        .with_config("data", json!({"url": "https://example.com"}));

    let result = TaskHandler.execute(&node, &ctx()).await.unwrap();
    assert_eq!(result["taskType"], json!("http"));
    assert_eq!(result["result"], json!("success"));
    assert_eq!(result["data"]["url"], json!("https://example.com"));
    assert!(result["completedAt"].is_string());
}

#[tokio::test]
async fn task_defaults_type_and_data() {
    let node = Node::new("t", NodeKind::Task, "Step").with_config("note", "untyped");

    let result = TaskHandler.execute(&node, &ctx()).await.unwrap();
    assert_eq!(result["taskType"], json!("default"));
    assert_eq!(result["data"], json!({}));
}

#[test]
fn task_requires_label_and_config() {
    let ok = Node::new("t", NodeKind::Task, "Step").with_config("taskType", "noop");
    assert!(TaskHandler.validate(&ok));

    let unlabeled = Node::new("t", NodeKind::Task, "").with_config("taskType", "noop");
    assert!(!TaskHandler.validate(&unlabeled));

    let unconfigured = Node::new("t", NodeKind::Task, "Step");
    assert!(!TaskHandler.validate(&unconfigured));
}

#[tokio::test]
async fn decision_evaluates_against_variables() {
    let node = Node::new("d", NodeKind::Decision, "Check").with_config("condition", "$score > 70");
    let ctx = ctx().with_variable("score", 85);

    let result = DecisionHandler.execute(&node, &ctx).await.unwrap();
    assert_eq!(result, json!(true));
}

#[tokio::test]
async fn decision_degrades_to_false_on_non_numeric_operands() {
    let node = Node::new("d", NodeKind::Decision, "Check").with_config("condition", "$name > 10");
    let ctx = ctx().with_variable("name", "alice");

    let result = DecisionHandler.execute(&node, &ctx).await.unwrap();
    assert_eq!(result, json!(false));
}

#[test]
fn decision_requires_a_condition() {
    assert!(!DecisionHandler.validate(&Node::new("d", NodeKind::Decision, "Check")));
}

#[tokio::test]
async fn loop_collects_an_indexed_result_per_iteration() {
    let node = Node::new("l", NodeKind::Loop, "Repeat")
        .with_config("iterations", 3)
        .with_config("taskType", "poll");

    let result = LoopHandler.execute(&node, &ctx()).await.unwrap();
    let items = result.as_array().unwrap();
    assert_eq!(items.len(), 3);
    for (index, item) in items.iter().enumerate() {
        assert_eq!(item["taskType"], json!("poll"));
        assert_eq!(item["loopIndex"], json!(index));
    }
}

#[tokio::test]
async fn loop_truncates_fractional_iteration_counts() {
    let node = Node::new("l", NodeKind::Loop, "Repeat").with_config("iterations", 2.7);

    let result = LoopHandler.execute(&node, &ctx()).await.unwrap();
    assert_eq!(result.as_array().unwrap().len(), 2);
}

#[test]
fn loop_requires_a_numeric_iteration_count() {
    let numeric = Node::new("l", NodeKind::Loop, "Repeat").with_config("iterations", 3);
    assert!(LoopHandler.validate(&numeric));

    let textual = Node::new("l", NodeKind::Loop, "Repeat").with_config("iterations", "three");
    assert!(!LoopHandler.validate(&textual));
}

#[test]
fn loop_rejects_oversized_iteration_counts() {
    let at_limit = Node::new("l", NodeKind::Loop, "Repeat").with_config("iterations", 1000);
    assert!(LoopHandler.validate(&at_limit));

    let absurd = Node::new("l", NodeKind::Loop, "Repeat").with_config("iterations", 1e30);
    assert!(!LoopHandler.validate(&absurd));
}

#[tokio::test]
async fn parallel_joins_tasks_in_definition_order() {
    let node = Node::new("p", NodeKind::Parallel, "Fan out").with_config(
        "tasks",
        json!([
            {"taskType": "alpha"},
            {"taskType": "beta"},
            {"taskType": "gamma"}
        ]),
    );

    let result = ParallelHandler.execute(&node, &ctx()).await.unwrap();
    let types: Vec<&str> = result
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["taskType"].as_str().unwrap())
        .collect();
    assert_eq!(types, ["alpha", "beta", "gamma"]);
}

#[tokio::test]
async fn integration_stubs_answer_for_known_services() {
    for service in ["github", "jira", "trello", "slack"] {
        let node = Node::new("i", NodeKind::Integration, "Sync")
            .with_config("type", service)
            .with_config("action", "notify");

        let result = IntegrationHandler.execute(&node, &ctx()).await.unwrap();
        assert_eq!(result["integration"], json!(service));
        assert_eq!(result["action"], json!("notify"));
        assert_eq!(result["status"], json!("ok"));
        assert!(result["timestamp"].is_string());
    }
}

#[tokio::test]
async fn unknown_integration_is_an_error() {
    let node = Node::new("i", NodeKind::Integration, "Sync").with_config("type", "salesforce");

    let err = IntegrationHandler.execute(&node, &ctx()).await.unwrap_err();
    match err {
        EngineError::UnknownIntegration {
            integration,
            node_id,
        } => {
            assert_eq!(integration, "salesforce");
            assert_eq!(node_id, "i");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ai_accepts_a_prompt_or_a_description() {
    let handler = AiHandler::new(Arc::new(EchoGenerator), Arc::new(NullSink));

    let with_prompt = Node::new("a", NodeKind::Ai, "Gen").with_config("prompt", "hi");
    assert!(handler.validate(&with_prompt));

    let with_description = Node::new("a", NodeKind::Ai, "Gen").with_description("summarize this");
    assert!(handler.validate(&with_description));

    assert!(!handler.validate(&Node::new("a", NodeKind::Ai, "Gen")));
}

#[tokio::test]
async fn ai_returns_the_generated_response() {
    let handler = AiHandler::new(Arc::new(EchoGenerator), Arc::new(NullSink));
    let node = Node::new("a", NodeKind::Ai, "Gen")
        .with_config("prompt", "write a haiku")
        .with_config("taskType", "creative");

    let result = handler.execute(&node, &ctx()).await.unwrap();
    assert_eq!(result["success"], json!(true));
    assert_eq!(result["response"], json!("[creative] write a haiku"));
    assert!(result["timestamp"].is_string());
}

#[tokio::test]
async fn ai_failure_reports_the_node_before_propagating() {
    let sink = Arc::new(MemorySink::new());
    let handler = AiHandler::new(Arc::new(FailingGenerator), sink.clone());
    let node = Node::new("a", NodeKind::Ai, "Gen").with_config("prompt", "hi");

    let err = handler.execute(&node, &ctx()).await.unwrap_err();
    assert!(matches!(err, EngineError::Generation(_)));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        EngineEvent::WorkflowError { node_id, error, .. } => {
            assert_eq!(node_id.as_deref(), Some("a"));
            assert!(error.contains("backend offline"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn custom_reports_stubbed_execution() {
    let node = Node::new("c", NodeKind::Custom, "Script").with_config("code", "return 1;");

    assert!(CustomHandler.validate(&node));
    assert!(!CustomHandler.validate(&Node::new("c", NodeKind::Custom, "Script")));

    let result = CustomHandler.execute(&node, &ctx()).await.unwrap();
    assert_eq!(result["executed"], json!(false));
}
