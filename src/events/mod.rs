pub mod publisher;
pub mod types;

// Re-export key types for convenience
pub use publisher::{
    emit_best_effort, BroadcastNotificationBridge, CompositeNotificationBridge,
    NoopNotificationBridge, NotificationBridge, PublishError, RecordingNotificationBridge,
};
pub use types::{AgentEvent, AgentEventType};
