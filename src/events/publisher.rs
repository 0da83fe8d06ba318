use crate::events::types::{AgentEvent, AgentEventType};
use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Outbound channel for agent progress events
///
/// Emission is best-effort: callers in the orchestration core log and discard
/// errors (see [`emit_best_effort`]).
#[async_trait]
pub trait NotificationBridge: Send + Sync {
    async fn emit_agent_event(&self, event: AgentEvent) -> Result<(), PublishError>;
}

/// Emit an event, logging and discarding any failure
pub async fn emit_best_effort(
    bridge: &dyn NotificationBridge,
    event_type: AgentEventType,
    run_id: &str,
    agent_name: &str,
    data: Value,
) {
    let event = AgentEvent::new(event_type, run_id, agent_name, data);
    if let Err(e) = bridge.emit_agent_event(event).await {
        warn!(
            run_id = %run_id,
            agent_name = %agent_name,
            event_type = %event_type,
            error = %e,
            "Failed to emit agent event - continuing"
        );
    }
}

/// Broadcast-backed bridge for in-process subscribers
#[derive(Debug, Clone)]
pub struct BroadcastNotificationBridge {
    sender: broadcast::Sender<AgentEvent>,
}

impl BroadcastNotificationBridge {
    /// Create a new bridge with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotificationBridge {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl NotificationBridge for BroadcastNotificationBridge {
    async fn emit_agent_event(&self, event: AgentEvent) -> Result<(), PublishError> {
        // No subscribers is acceptable - events are fire-and-forget
        if self.sender.send(event).is_err() {
            debug!("No subscribers for agent event");
        }
        Ok(())
    }
}

/// Bridge that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotificationBridge;

#[async_trait]
impl NotificationBridge for NoopNotificationBridge {
    async fn emit_agent_event(&self, _event: AgentEvent) -> Result<(), PublishError> {
        Ok(())
    }
}

/// In-memory bridge keeping every event, for hosts that poll instead of subscribe
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationBridge {
    events: Arc<Mutex<Vec<AgentEvent>>>,
}

impl RecordingNotificationBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AgentEvent> {
        self.events.lock().clone()
    }

    /// Events for one run, in emission order
    pub fn events_for_run(&self, run_id: &str) -> Vec<AgentEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.run_id == run_id)
            .cloned()
            .collect()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<AgentEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[async_trait]
impl NotificationBridge for RecordingNotificationBridge {
    async fn emit_agent_event(&self, event: AgentEvent) -> Result<(), PublishError> {
        self.events.lock().push(event);
        Ok(())
    }
}

/// Fan-out to several bridges; every bridge is attempted, the first error is reported
#[derive(Clone, Default)]
pub struct CompositeNotificationBridge {
    bridges: Vec<Arc<dyn NotificationBridge>>,
}

impl CompositeNotificationBridge {
    pub fn new(bridges: Vec<Arc<dyn NotificationBridge>>) -> Self {
        Self { bridges }
    }

    pub fn push(&mut self, bridge: Arc<dyn NotificationBridge>) {
        self.bridges.push(bridge);
    }

    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }
}

#[async_trait]
impl NotificationBridge for CompositeNotificationBridge {
    async fn emit_agent_event(&self, event: AgentEvent) -> Result<(), PublishError> {
        let results = join_all(
            self.bridges
                .iter()
                .map(|bridge| bridge.emit_agent_event(event.clone())),
        )
        .await;

        results.into_iter().collect::<Result<Vec<_>, _>>().map(|_| ())
    }
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Event channel is closed")]
    ChannelClosed,
    #[error("Event delivery failed: {0}")]
    Delivery(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
