// crates/braidcli/src/main.rs

use anyhow::Result;
use braidcore::{
    BroadcastSink, EchoGenerator, Edge, EngineEvent, ExecutionContext, Graph, Node, NodeKind,
    NullSink, SharedEventSink,
};
use braidengine::{validate_graph, MemoryExecutionStore, WorkflowEngine};
use braidnodes::builtin_registry;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "braid")]
#[command(about = "Braid workflow engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow file
    Run {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Context variable as key=value (value parsed as JSON when possible)
        #[arg(long, value_name = "KEY=VALUE")]
        var: Vec<String>,

        /// Project the run is recorded under
        #[arg(long, default_value = "default")]
        project: String,

        /// User the run is attributed to
        #[arg(long, default_value = "anonymous")]
        user: String,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a workflow file
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// List available node kinds
    Nodes,

    /// Create a new example workflow
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

/// Parse a `key=value` assignment; the value is taken as JSON when it parses
/// and as a plain string otherwise.
fn parse_var(raw: &str) -> Result<(String, serde_json::Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Variable '{}' is not in key=value form", raw))?;
    let parsed = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), parsed))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            var,
            project,
            user,
            verbose,
        } => {
            // Initialize logging; quiet runs keep the event feed readable.
            if verbose {
                tracing_subscriber::fmt()
                    .with_max_level(tracing::Level::DEBUG)
                    .init();
            } else {
                tracing_subscriber::fmt()
                    .with_max_level(tracing::Level::WARN)
                    .init();
            }

            run_workflow(file, var, project, user).await?;
        }

        Commands::Validate { file } => {
            validate_workflow(file)?;
        }

        Commands::Nodes => {
            list_nodes();
        }

        Commands::Init { output } => {
            create_example_workflow(output)?;
        }
    }

    Ok(())
}

async fn run_workflow(file: PathBuf, vars: Vec<String>, project: String, user: String) -> Result<()> {
    println!("🚀 Loading workflow from: {}", file.display());

    let raw = std::fs::read_to_string(&file)?;
    let graph: Graph = serde_json::from_str(&raw)?;

    println!(
        "📋 Workflow: {} nodes, {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );
    println!();

    let mut context = ExecutionContext::new(project, user);
    for assignment in &vars {
        let (key, value) = parse_var(assignment)?;
        context.variables.insert(key, value);
    }

    // Wire up the engine with the built-in handlers
    let events = Arc::new(BroadcastSink::new(256));
    let sink: SharedEventSink = events.clone();
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = WorkflowEngine::new(
        builtin_registry(Arc::new(EchoGenerator), sink.clone()),
        store.clone(),
        sink,
    );

    // Spawn event listener for real-time output
    let mut updates = events.subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(event) = updates.recv().await {
            match event {
                EngineEvent::NodeStart { node_id, .. } => {
                    println!("  ⚡ Starting node: {}", node_id);
                }
                EngineEvent::NodeComplete { node_id, .. } => {
                    println!("  ✅ Node {} completed", node_id);
                }
                EngineEvent::WorkflowComplete { .. } => {
                    println!("✨ Workflow completed successfully");
                }
                EngineEvent::WorkflowError {
                    node_id: Some(node_id),
                    error,
                    ..
                } => {
                    println!("  ❌ Node {} failed: {}", node_id, error);
                }
                EngineEvent::WorkflowError { error, .. } => {
                    println!("💥 Workflow failed: {}", error);
                }
            }
        }
    });

    let outcome = engine.execute(&graph, context).await;

    // Wait for events to finish printing
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    listener.abort();

    println!();
    if let Some(record) = store.list().await.first() {
        println!("📊 Execution Summary:");
        println!("   Execution ID: {}", record.id);
        println!("   Status: {:?}", record.status);
    }

    let results = outcome?;

    println!();
    println!("📤 Results:");
    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}

fn validate_workflow(file: PathBuf) -> Result<()> {
    println!("🔍 Validating workflow: {}", file.display());

    let raw = std::fs::read_to_string(&file)?;
    let graph: Graph = serde_json::from_str(&raw)?;

    match validate_graph(&graph) {
        Ok(()) => {
            println!("✅ Workflow is valid:");
            println!("   Nodes: {}", graph.nodes.len());
            println!("   Edges: {}", graph.edges.len());
            Ok(())
        }
        Err(e) => {
            println!("❌ Workflow is invalid");
            Err(e.into())
        }
    }
}

fn list_nodes() {
    println!("📦 Available Node Kinds:");
    println!();

    let registry = builtin_registry(Arc::new(EchoGenerator), Arc::new(NullSink));
    for kind in registry.kinds() {
        println!("  • {}", kind);
        println!("    {}", kind.describe());
    }
}

fn create_example_workflow(output: PathBuf) -> Result<()> {
    let mut graph = Graph::new();
    graph.add_node(Node::new("start", NodeKind::Start, "Start"));
    graph.add_node(
        Node::new("greet", NodeKind::Task, "Greet")
            .with_config("taskType", "greeting")
            .with_config("data", json!({"message": "hello"})),
    );
    graph.add_node(
        Node::new("check", NodeKind::Decision, "Check score").with_config("condition", "$score > 70"),
    );
    graph.add_node(
        Node::new("celebrate", NodeKind::Task, "Celebrate").with_config("taskType", "celebrate"),
    );
    graph.add_node(Node::new("retry", NodeKind::Task, "Retry").with_config("taskType", "retry"));
    graph.add_node(Node::new("done", NodeKind::End, "Done"));
    graph.add_edge(Edge::new("e1", "start", "greet"));
    graph.add_edge(Edge::new("e2", "greet", "check"));
    graph.add_edge(Edge::new("e3", "check", "celebrate").with_condition(true));
    graph.add_edge(Edge::new("e4", "check", "retry").with_condition(false));
    graph.add_edge(Edge::new("e5", "celebrate", "done"));
    graph.add_edge(Edge::new("e6", "retry", "done"));

    let json = serde_json::to_string_pretty(&graph)?;
    std::fs::write(&output, json)?;

    println!("✨ Created example workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!("  braid run --file {} --var score=85", output.display());

    Ok(())
}
