use crate::{validate_graph, HandlerRegistry};
use braidcore::{
    Edge, EngineError, EngineEvent, ExecutionContext, ExecutionStore, ExecutionUpdate, Graph,
    Node, NodeKind, SharedEventSink, ValidationError,
};
use chrono::Utc;
use futures::future::{try_join_all, BoxFuture};
use serde_json::Value;
use std::sync::Arc;

/// Executes workflow graphs by walking them from their start node.
///
/// The walk is depth-first and result-driven: each node runs through its
/// handler, the result lands in the context under the node's id, and the
/// outgoing edges decide where to go next (decision routing, parallel
/// fan-out, or plain first-edge succession).
pub struct WorkflowEngine {
    registry: HandlerRegistry,
    store: Arc<dyn ExecutionStore>,
    events: SharedEventSink,
}

impl WorkflowEngine {
    pub fn new(
        registry: HandlerRegistry,
        store: Arc<dyn ExecutionStore>,
        events: SharedEventSink,
    ) -> Self {
        Self {
            registry,
            store,
            events,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Validate the graph, persist a RUNNING record and walk from the start
    /// node.
    ///
    /// On success the record is finalized COMPLETED with the returned value
    /// (the full results map whenever the run reached an end node); on
    /// failure it is finalized FAILED and the error propagates. Structural
    /// validation failures abort before any record exists.
    pub async fn execute(
        &self,
        graph: &Graph,
        context: ExecutionContext,
    ) -> Result<Value, EngineError> {
        validate_graph(graph)?;

        let record = self.store.create(&context.project_id).await?;
        tracing::info!(
            execution_id = %record.id,
            project_id = %context.project_id,
            "Starting workflow execution"
        );

        let start = match graph.start() {
            Some(node) => node,
            // validate_graph guarantees exactly one start node.
            None => return Err(ValidationError::invalid("workflow has no start node").into()),
        };

        match self.walk(graph, start, context).await {
            Ok(results) => {
                self.store
                    .update(record.id, ExecutionUpdate::completed(results.clone()))
                    .await?;
                self.events.emit(EngineEvent::WorkflowComplete {
                    results: results.clone(),
                    timestamp: Utc::now(),
                });
                tracing::info!(execution_id = %record.id, "Workflow execution completed");
                Ok(results)
            }
            Err(err) => {
                // The walk error stays primary even if the bookkeeping
                // update fails.
                if let Err(store_err) = self
                    .store
                    .update(record.id, ExecutionUpdate::failed(err.to_string()))
                    .await
                {
                    tracing::error!(
                        execution_id = %record.id,
                        "Failed to record execution failure: {}",
                        store_err
                    );
                }
                self.events.emit(EngineEvent::WorkflowError {
                    node_id: err.node_id().map(|id| id.to_string()),
                    error: err.to_string(),
                    timestamp: Utc::now(),
                });
                tracing::error!(execution_id = %record.id, "Workflow execution failed: {}", err);
                Err(err)
            }
        }
    }

    /// Execute one node, record its result, then descend along the outgoing
    /// edges. The context moves with the walk; it is cloned only where
    /// branches genuinely diverge.
    fn walk<'a>(
        &'a self,
        graph: &'a Graph,
        node: &'a Node,
        mut ctx: ExecutionContext,
    ) -> BoxFuture<'a, Result<Value, EngineError>> {
        Box::pin(async move {
            let handler = self.registry.resolve(node.kind)?;

            if !handler.validate(node) {
                return Err(EngineError::InvalidNodeConfig {
                    node_id: node.id.clone(),
                });
            }

            ctx.current_node_id = Some(node.id.clone());
            ctx.execution_path.push(node.id.clone());

            tracing::debug!(node_id = %node.id, kind = %node.kind, "Executing node");
            self.events.emit(EngineEvent::NodeStart {
                node_id: node.id.clone(),
                timestamp: Utc::now(),
            });

            let result = handler.execute(node, &ctx).await?;

            ctx.results.insert(node.id.clone(), result.clone());
            self.events.emit(EngineEvent::NodeComplete {
                node_id: node.id.clone(),
                result: result.clone(),
                timestamp: Utc::now(),
            });

            // An end node closes this branch with everything accumulated.
            if node.kind == NodeKind::End {
                return Ok(Value::Object(ctx.results));
            }

            let outgoing = graph.outgoing(&node.id);

            // Decisions route by matching the evaluated result against the
            // outgoing edges' metadata.
            if node.kind == NodeKind::Decision {
                let edge = outgoing
                    .iter()
                    .find(|edge| edge_matches(&result, edge))
                    .ok_or_else(|| EngineError::NoMatchingPath {
                        node_id: node.id.clone(),
                        result: result.to_string(),
                    })?;
                let target = self.target_node(graph, &edge.target)?;
                return self.walk(graph, target, ctx).await;
            }

            // A parallel node with several outgoing edges fans out into
            // concurrent sub-walks, each on its own copy of the context.
            // Join-all: the first failing branch aborts the whole node.
            if node.kind == NodeKind::Parallel && outgoing.len() > 1 {
                let branches = outgoing
                    .iter()
                    .map(|edge| -> Result<_, EngineError> {
                        let target = self.target_node(graph, &edge.target)?;
                        Ok(self.walk(graph, target, ctx.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let joined = try_join_all(branches).await?;
                let non_null: Vec<Value> =
                    joined.into_iter().filter(|v| !v.is_null()).collect();
                return Ok(Value::Array(non_null));
            }

            // Default succession: first outgoing edge only; extra edges on
            // non-parallel nodes are ignored. No outgoing edge means this
            // branch dead-ends with its own result.
            match outgoing.first() {
                Some(edge) => {
                    let target = self.target_node(graph, &edge.target)?;
                    self.walk(graph, target, ctx).await
                }
                None => Ok(result),
            }
        })
    }

    fn target_node<'g>(&self, graph: &'g Graph, id: &str) -> Result<&'g Node, EngineError> {
        graph.node(id).ok_or_else(|| {
            ValidationError::invalid(format!("edge targets unknown node '{}'", id)).into()
        })
    }
}

/// Decision result against edge metadata: `data.condition` is checked first,
/// then `data.label`. Booleans match both JSON booleans and the strings
/// "true"/"false"; strings match case-sensitively.
fn edge_matches(result: &Value, edge: &Edge) -> bool {
    if let Some(condition) = &edge.data.condition {
        return values_match(result, condition);
    }
    if let Some(label) = &edge.data.label {
        return values_match(result, &Value::String(label.clone()));
    }
    false
}

fn values_match(result: &Value, expected: &Value) -> bool {
    if result == expected {
        return true;
    }
    match (result, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => string_form(result) == string_form(expected),
    }
}

/// String form for loose matching: bare strings stay unquoted, everything
/// else renders as JSON.
fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
