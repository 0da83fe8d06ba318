//! # Sub-Agent Contract
//!
//! Every agent the supervisor can run implements [`SubAgent`]. Agents declare
//! their [`AgentCapabilities`] up front; the registry records them at
//! registration time so the executor never probes an agent at call time.

use crate::error::Result;
use crate::events::NotificationBridge;
use crate::models::ExecutionContext;
use crate::services::{LlmManager, ToolDispatcher};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Static description of what an agent does at run time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentCapabilities {
    /// Emits its own progress events when `stream_updates` is requested
    pub streams_updates: bool,
    /// Calls the request tool dispatcher
    pub uses_tools: bool,
    /// Calls the LLM manager
    pub uses_llm: bool,
}

impl AgentCapabilities {
    pub fn llm_agent() -> Self {
        Self {
            streams_updates: true,
            uses_tools: false,
            uses_llm: true,
        }
    }

    pub fn with_tools(mut self) -> Self {
        self.uses_tools = true;
        self
    }
}

#[async_trait]
pub trait SubAgent: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> AgentCapabilities {
        AgentCapabilities::default()
    }

    /// Run against a child context
    ///
    /// Returns the agent's domain payload. A payload carrying
    /// `"status": "failed"` is a logical failure and is handled by the
    /// executor exactly like an `Err`.
    async fn execute(&self, context: &mut ExecutionContext, stream_updates: bool) -> Result<Value>;
}

/// Request-scoped collaborators available to agents built through the registry
#[derive(Clone)]
pub struct AgentDependencies {
    pub llm: Arc<dyn LlmManager>,
    pub tools: Arc<dyn ToolDispatcher>,
    pub notifier: Arc<dyn NotificationBridge>,
}

impl fmt::Debug for AgentDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentDependencies").finish_non_exhaustive()
    }
}

/// Builds an agent from request-scoped dependencies
pub type AgentFactory = Arc<dyn Fn(&AgentDependencies) -> Arc<dyn SubAgent> + Send + Sync>;

/// Wrap a closure as an [`AgentFactory`]
pub fn agent_factory<F>(factory: F) -> AgentFactory
where
    F: Fn(&AgentDependencies) -> Arc<dyn SubAgent> + Send + Sync + 'static,
{
    Arc::new(factory)
}
