//! # Tool System
//!
//! Shared tool classes live in a [`ToolRegistry`]; every request gets its own
//! [`RequestToolDispatcher`] bound to the request's run id and notification
//! bridge. The bridge comes from the host application's [`HostState`] when a
//! [`ToolBridgeFactory`] is installed there, otherwise from the supervisor's
//! default bridge.

use crate::error::{Result, SupervisorError};
use crate::events::{emit_best_effort, AgentEventType, NotificationBridge};
use crate::models::ExecutionContext;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A callable tool exposed to sub-agents
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    async fn run(&self, params: Value) -> anyhow::Result<Value>;
}

/// Tool invocation surface handed to agents
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    /// Dispatch on behalf of a named agent
    async fn dispatch_tool_for(
        &self,
        agent_name: &str,
        tool_name: &str,
        params: Value,
    ) -> Result<Value>;

    async fn dispatch_tool(&self, tool_name: &str, params: Value) -> Result<Value> {
        self.dispatch_tool_for("supervisor", tool_name, params).await
    }

    fn has_tool(&self, tool_name: &str) -> bool;
}

/// Creates the notification bridge tools report through for one request
pub trait ToolBridgeFactory: Send + Sync {
    fn create_bridge(&self, context: &ExecutionContext) -> Arc<dyn NotificationBridge>;
}

/// Host application state the supervisor resolves request collaborators from
#[derive(Clone, Default)]
pub struct HostState {
    pub tool_bridge_factory: Option<Arc<dyn ToolBridgeFactory>>,
}

impl HostState {
    pub fn with_tool_bridge_factory(factory: Arc<dyn ToolBridgeFactory>) -> Self {
        Self {
            tool_bridge_factory: Some(factory),
        }
    }
}

impl fmt::Debug for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostState")
            .field(
                "tool_bridge_factory",
                &self.tool_bridge_factory.as_ref().map(|_| "<factory>"),
            )
            .finish()
    }
}

/// Shared set of tool classes
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool_name = %name, "Replacing previously registered tool");
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}

/// Request-scoped dispatcher; emits tool progress events for its run
pub struct RequestToolDispatcher {
    tools: ToolRegistry,
    bridge: Arc<dyn NotificationBridge>,
    run_id: String,
}

impl RequestToolDispatcher {
    /// Build the dispatcher for one request, resolving the bridge from host state
    pub fn build(
        tools: &ToolRegistry,
        host_state: &HostState,
        default_bridge: Arc<dyn NotificationBridge>,
        context: &ExecutionContext,
    ) -> Self {
        let bridge = match &host_state.tool_bridge_factory {
            Some(factory) => {
                debug!(run_id = %context.run_id, "Using host tool bridge factory");
                factory.create_bridge(context)
            }
            None => {
                info!(
                    run_id = %context.run_id,
                    "No host tool bridge factory available - falling back to default bridge"
                );
                default_bridge
            }
        };

        Self {
            tools: tools.clone(),
            bridge,
            run_id: context.run_id.clone(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.tool_names()
    }
}

#[async_trait]
impl ToolDispatcher for RequestToolDispatcher {
    async fn dispatch_tool_for(
        &self,
        agent_name: &str,
        tool_name: &str,
        params: Value,
    ) -> Result<Value> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| SupervisorError::ToolDispatch {
                tool_name: tool_name.to_string(),
                reason: "tool is not registered".to_string(),
            })?;

        emit_best_effort(
            self.bridge.as_ref(),
            AgentEventType::ToolExecuting,
            &self.run_id,
            agent_name,
            json!({ "tool_name": tool_name, "parameters": params.clone() }),
        )
        .await;

        let started = Instant::now();
        let outcome = tool.run(params).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                emit_best_effort(
                    self.bridge.as_ref(),
                    AgentEventType::ToolCompleted,
                    &self.run_id,
                    agent_name,
                    json!({
                        "tool_name": tool_name,
                        "result": result.clone(),
                        "execution_time_ms": elapsed_ms,
                    }),
                )
                .await;
                Ok(result)
            }
            Err(e) => {
                emit_best_effort(
                    self.bridge.as_ref(),
                    AgentEventType::ToolCompleted,
                    &self.run_id,
                    agent_name,
                    json!({
                        "tool_name": tool_name,
                        "error": e.to_string(),
                        "execution_time_ms": elapsed_ms,
                    }),
                )
                .await;
                Err(SupervisorError::ToolDispatch {
                    tool_name: tool_name.to_string(),
                    reason: format!("{e:#}"),
                })
            }
        }
    }

    fn has_tool(&self, tool_name: &str) -> bool {
        self.tools.contains(tool_name)
    }
}
