use braidcore::{EngineError, NodeHandler, NodeKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable table of node handlers, keyed by node kind.
///
/// The handler set is closed: the table is built once at startup from a
/// complete pair list and never mutated afterwards. `NoHandler` is reachable
/// only through a deliberately partial table (tests build those).
pub struct HandlerRegistry {
    handlers: HashMap<NodeKind, Arc<dyn NodeHandler>>,
}

impl HandlerRegistry {
    pub fn from_handlers(
        pairs: impl IntoIterator<Item = (NodeKind, Arc<dyn NodeHandler>)>,
    ) -> Self {
        let handlers: HashMap<_, _> = pairs.into_iter().collect();
        for kind in handlers.keys() {
            tracing::debug!("Registered handler for node type: {}", kind);
        }
        Self { handlers }
    }

    pub fn resolve(&self, kind: NodeKind) -> Result<&Arc<dyn NodeHandler>, EngineError> {
        self.handlers
            .get(&kind)
            .ok_or(EngineError::NoHandler { kind })
    }

    /// Registered kinds, in `NodeKind` declaration order.
    pub fn kinds(&self) -> Vec<NodeKind> {
        NodeKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.handlers.contains_key(kind))
            .collect()
    }
}
