use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::audit::{AuditError, AuditSink, Auditor};
use crate::database::{MemoryStore, Repositories};
use crate::state::AppState;

/// One payload received by a [`RecordingSink`]
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub function_name: String,
    pub record: Value,
}

/// Audit sink that forwards every invocation to a channel
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<AuditEvent>,
}

impl RecordingSink {
    pub fn new() -> (Arc<dyn AuditSink>, AuditEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), AuditEvents { rx })
    }
}

#[async_trait]
impl AuditSink for RecordingSink {
    async fn invoke(&self, function_name: &str, payload: String) -> Result<(), AuditError> {
        let record = serde_json::from_str(&payload).unwrap_or(Value::String(payload));
        let _ = self.tx.send(AuditEvent {
            function_name: function_name.to_string(),
            record,
        });
        Ok(())
    }
}

/// Receiving end of a [`RecordingSink`]
pub struct AuditEvents {
    rx: mpsc::UnboundedReceiver<AuditEvent>,
}

impl AuditEvents {
    /// Wait for the next dispatched record; panics after two seconds
    pub async fn next_event(&mut self) -> AuditEvent {
        tokio::time::timeout(Duration::from_secs(2), self.rx.recv())
            .await
            .expect("timed out waiting for audit event")
            .expect("audit channel closed")
    }

    /// Assert nothing else gets dispatched shortly after
    pub async fn assert_idle(&mut self) {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Ok(event) = self.rx.try_recv() {
            panic!("unexpected audit event: {}", event.record);
        }
    }
}

/// Application state over a fresh in-memory store and a recording audit sink
pub fn memory_state() -> (AppState, AuditEvents) {
    let (sink, events) = RecordingSink::new();
    let state = AppState::new(
        Repositories::from_store(MemoryStore::new()),
        Auditor::new(sink, "auditHandler"),
    );
    (state, events)
}
