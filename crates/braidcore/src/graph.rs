use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A workflow graph as the visual editor persists it: plain nodes and edges
/// addressed by string ids. Immutable for the duration of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// First node with the given id. Duplicate ids are not rejected by
    /// validation; lookups resolve to the first occurrence.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn start(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.kind == NodeKind::Start)
    }

    /// Outgoing edges of a node, in definition order.
    pub fn outgoing(&self, id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.source == id).collect()
    }
}

/// The closed set of node types the engine executes. There is no dynamic
/// registration; adding a type means adding a variant and a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Start,
    End,
    Task,
    Decision,
    Integration,
    Ai,
    Loop,
    Parallel,
    Custom,
}

impl NodeKind {
    pub const ALL: [NodeKind; 9] = [
        NodeKind::Start,
        NodeKind::End,
        NodeKind::Task,
        NodeKind::Decision,
        NodeKind::Integration,
        NodeKind::Ai,
        NodeKind::Loop,
        NodeKind::Parallel,
        NodeKind::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::End => "end",
            NodeKind::Task => "task",
            NodeKind::Decision => "decision",
            NodeKind::Integration => "integration",
            NodeKind::Ai => "ai",
            NodeKind::Loop => "loop",
            NodeKind::Parallel => "parallel",
            NodeKind::Custom => "custom",
        }
    }

    /// One-line description for listings.
    pub fn describe(&self) -> &'static str {
        match self {
            NodeKind::Start => "entry point of the workflow",
            NodeKind::End => "closes the run and returns accumulated results",
            NodeKind::Task => "generic task step, echoes its configured data",
            NodeKind::Decision => "routes by evaluating a condition expression",
            NodeKind::Integration => "third-party integration stub",
            NodeKind::Ai => "text generation through the configured backend",
            NodeKind::Loop => "runs the task executor N times sequentially",
            NodeKind::Parallel => "runs configured tasks concurrently",
            NodeKind::Custom => "user-supplied code (stubbed)",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single node of the graph. `kind` is serialized as `type` to match the
/// persisted editor format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub data: NodeData,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            data: NodeData {
                label: label.into(),
                config: None,
                description: None,
            },
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data
            .config
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.data.description = Some(description.into());
        self
    }

    pub fn config(&self) -> Option<&Map<String, Value>> {
        self.data.config.as_ref()
    }

    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.data.config.as_ref().and_then(|c| c.get(key))
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config_value(key).and_then(|v| v.as_str())
    }

    pub fn config_f64(&self, key: &str) -> Option<f64> {
        self.config_value(key).and_then(|v| v.as_f64())
    }

    pub fn config_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.config_value(key).and_then(|v| v.as_array())
    }
}

/// Editor-facing payload of a node: a display label plus handler-specific
/// free-form configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub data: EdgeData,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            data: EdgeData::default(),
        }
    }

    pub fn with_condition(mut self, condition: impl Into<Value>) -> Self {
        self.data.condition = Some(condition.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.data.label = Some(label.into());
        self
    }
}

/// Routing metadata on an edge. `condition` is kept as a raw JSON value
/// because persisted workflows store both strings ("yes") and bare booleans
/// (true) there; decision matching handles both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}
