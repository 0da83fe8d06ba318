//! Agent progress event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Progress notifications emitted while a workflow runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentEventType {
    AgentStarted,
    AgentThinking,
    ToolExecuting,
    ToolCompleted,
    AgentCompleted,
    AgentError,
}

impl AgentEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AgentStarted => "agent_started",
            Self::AgentThinking => "agent_thinking",
            Self::ToolExecuting => "tool_executing",
            Self::ToolCompleted => "tool_completed",
            Self::AgentCompleted => "agent_completed",
            Self::AgentError => "agent_error",
        }
    }

    /// Whether the event closes an agent invocation
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AgentCompleted | Self::AgentError)
    }
}

impl fmt::Display for AgentEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single event keyed by run id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEvent {
    pub event_type: AgentEventType,
    pub run_id: String,
    pub agent_name: String,
    pub data: Value,
    pub emitted_at: DateTime<Utc>,
}

impl AgentEvent {
    pub fn new(
        event_type: AgentEventType,
        run_id: impl Into<String>,
        agent_name: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            event_type,
            run_id: run_id.into(),
            agent_name: agent_name.into(),
            data,
            emitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_serde() {
        for event_type in [
            AgentEventType::AgentStarted,
            AgentEventType::AgentThinking,
            AgentEventType::ToolExecuting,
            AgentEventType::ToolCompleted,
            AgentEventType::AgentCompleted,
            AgentEventType::AgentError,
        ] {
            let serialized = serde_json::to_value(event_type).unwrap();
            assert_eq!(serialized, Value::String(event_type.as_str().to_string()));
        }
    }

    #[test]
    fn test_terminal_events() {
        assert!(AgentEventType::AgentCompleted.is_terminal());
        assert!(AgentEventType::AgentError.is_terminal());
        assert!(!AgentEventType::AgentThinking.is_terminal());
    }
}
