use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Results accumulated during a run, keyed by node id. This is also the
/// workflow's final output once an end node is reached.
pub type ResultsMap = Map<String, Value>;

/// Mutable state threaded through one workflow run.
///
/// The context is exclusively owned by its run: the engine moves it through
/// the walk and clones it only where branches genuinely diverge (parallel
/// fan-out, loop iterations). Field names follow the persisted product
/// format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub project_id: String,
    pub user_id: String,
    /// User-supplied inputs, addressed as `$name` in condition expressions.
    #[serde(default)]
    pub variables: Map<String, Value>,
    /// Per-node results, addressed as `@nodeId.path` in condition expressions.
    #[serde(default)]
    pub results: ResultsMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_node_id: Option<String>,
    /// Visit order of executed nodes, for auditing.
    #[serde(default)]
    pub execution_path: Vec<String>,
}

impl ExecutionContext {
    pub fn new(project_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            user_id: user_id.into(),
            variables: Map::new(),
            results: Map::new(),
            current_node_id: None,
            execution_path: Vec::new(),
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn result(&self, node_id: &str) -> Option<&Value> {
        self.results.get(node_id)
    }
}
