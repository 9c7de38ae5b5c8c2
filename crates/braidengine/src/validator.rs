use braidcore::{Graph, NodeKind, ValidationError};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, Control, DfsEvent};
use std::collections::HashMap;

/// Structural validation, run before anything executes.
///
/// Checks run in a fixed order and stop at the first violation, so the
/// reported error is deterministic for a given graph: start count, end
/// presence, per-node fields, edge endpoints, then cycles.
pub fn validate_graph(graph: &Graph) -> Result<(), ValidationError> {
    let start_count = graph
        .nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Start)
        .count();
    if start_count != 1 {
        return Err(ValidationError::invalid(format!(
            "workflow must contain exactly one start node, found {}",
            start_count
        )));
    }

    if !graph.nodes.iter().any(|n| n.kind == NodeKind::End) {
        return Err(ValidationError::invalid(
            "workflow must contain at least one end node",
        ));
    }

    for node in &graph.nodes {
        if node.id.is_empty() {
            return Err(ValidationError::invalid(format!(
                "node of type '{}' has an empty id",
                node.kind
            )));
        }
        if node.data.label.is_empty() {
            return Err(ValidationError::invalid(format!(
                "node '{}' has an empty label",
                node.id
            )));
        }
    }

    for edge in &graph.edges {
        if graph.node(&edge.source).is_none() {
            return Err(ValidationError::invalid(format!(
                "edge '{}' references unknown source node '{}'",
                edge.id, edge.source
            )));
        }
        if graph.node(&edge.target).is_none() {
            return Err(ValidationError::invalid(format!(
                "edge '{}' references unknown target node '{}'",
                edge.id, edge.target
            )));
        }
    }

    detect_cycle(graph)
}

/// Depth-first search from the start node; a back edge means a cycle. Only
/// the region reachable from start is checked; nodes the walk can never
/// visit are not validated here.
fn detect_cycle(graph: &Graph) -> Result<(), ValidationError> {
    let mut dag: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();

    for node in &graph.nodes {
        let idx = dag.add_node(node.id.as_str());
        index.entry(node.id.as_str()).or_insert(idx);
    }
    for edge in &graph.edges {
        // Endpoints were resolved above; duplicate ids bind to the first
        // occurrence, consistent with Graph::node.
        if let (Some(&source), Some(&target)) = (
            index.get(edge.source.as_str()),
            index.get(edge.target.as_str()),
        ) {
            dag.add_edge(source, target, ());
        }
    }

    let start_idx = match graph.start().and_then(|n| index.get(n.id.as_str())) {
        Some(&idx) => idx,
        None => return Ok(()),
    };

    let outcome = depth_first_search(&dag, Some(start_idx), |event| {
        if let DfsEvent::BackEdge(_, target) = event {
            return Control::Break(target);
        }
        Control::Continue
    });

    if let Control::Break(idx) = outcome {
        return Err(ValidationError::CyclicWorkflow {
            node_id: dag[idx].to_string(),
        });
    }

    Ok(())
}
