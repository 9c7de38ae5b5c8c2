//! Core abstractions for the braid workflow engine.
//!
//! Model types, the execution contract and collaborator traits shared by
//! every other crate. No walking logic lives here.

mod context;
mod error;
mod events;
mod generate;
mod graph;
mod handler;
mod record;

pub use context::{ExecutionContext, ResultsMap};
pub use error::{EngineError, StoreError, ValidationError};
pub use events::{
    BroadcastSink, EngineEvent, EventSink, MemorySink, NullSink, SharedEventSink,
};
pub use generate::{EchoGenerator, GenerationOptions, TextGenerator};
pub use graph::{Edge, EdgeData, Graph, Node, NodeData, NodeKind};
pub use handler::NodeHandler;
pub use record::{
    ExecutionId, ExecutionRecord, ExecutionStatus, ExecutionStore, ExecutionUpdate,
};

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
