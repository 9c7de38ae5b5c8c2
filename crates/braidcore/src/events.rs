use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Events pushed to live consumers while a workflow runs. The wire shape
/// (tag values, camelCase fields) is consumed by the product's execution
/// view and is part of the contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    #[serde(rename = "node:start", rename_all = "camelCase")]
    NodeStart {
        node_id: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "node:complete", rename_all = "camelCase")]
    NodeComplete {
        node_id: String,
        result: Value,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "workflow:complete")]
    WorkflowComplete {
        results: Value,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "workflow:error", rename_all = "camelCase")]
    WorkflowError {
        #[serde(skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

/// Non-blocking sink for engine events. The engine (and the ai handler) get
/// one injected; emission must never wait on a consumer.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub type SharedEventSink = Arc<dyn EventSink>;

/// Broadcast-backed sink for live consumers (server WebSocket relay, CLI
/// listener). Send errors from missing or lagging receivers are ignored.
pub struct BroadcastSink {
    sender: broadcast::Sender<EngineEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.sender.send(event);
    }
}

/// Collects every emitted event in memory. Intended for tests that assert on
/// the event stream.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<EngineEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: EngineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Discards everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: EngineEvent) {}
}
