//! Built-in node handlers
//!
//! One handler per node kind, wired into a registry by [`builtin_registry`].
//! The set is closed: graphs validate against the known kinds, and custom
//! behavior stays stubbed until it can be sandboxed.

mod ai;
mod control;
mod custom;
mod decision;
mod integration;
mod iterate;
mod task;

pub use ai::AiHandler;
pub use control::{EndHandler, StartHandler};
pub use custom::CustomHandler;
pub use decision::DecisionHandler;
pub use integration::IntegrationHandler;
pub use iterate::{LoopHandler, ParallelHandler};
pub use task::{run_task, TaskHandler};

use braidcore::{NodeHandler, NodeKind, SharedEventSink, TextGenerator};
use braidengine::HandlerRegistry;
use std::sync::Arc;

/// Build the full built-in handler table.
///
/// The ai handler needs a generation backend and an event sink for its
/// failure reports; everything else is self-contained.
pub fn builtin_registry(
    generator: Arc<dyn TextGenerator>,
    events: SharedEventSink,
) -> HandlerRegistry {
    HandlerRegistry::from_handlers([
        (
            NodeKind::Start,
            Arc::new(StartHandler) as Arc<dyn NodeHandler>,
        ),
        (NodeKind::End, Arc::new(EndHandler)),
        (NodeKind::Task, Arc::new(TaskHandler)),
        (NodeKind::Decision, Arc::new(DecisionHandler)),
        (NodeKind::Integration, Arc::new(IntegrationHandler)),
        (NodeKind::Ai, Arc::new(AiHandler::new(generator, events))),
        (NodeKind::Loop, Arc::new(LoopHandler)),
        (NodeKind::Parallel, Arc::new(ParallelHandler)),
        (NodeKind::Custom, Arc::new(CustomHandler)),
    ])
}
