//! # Supervisor
//!
//! Entry point for one orchestration request. A [`Supervisor`] is long-lived
//! and holds only shared collaborators: the LLM manager, the default
//! notification bridge, tool classes, configuration and the executor. Every
//! call to [`Supervisor::execute`] builds its own [`RequestScope`] (tool
//! dispatcher and agent registry) and drops it when the call returns, so
//! concurrent requests never observe each other's agents.
//!
//! ## Sequence
//!
//! 1. Validate the context (identity fields, database session). Failures are
//!    returned as-is and nothing runs.
//! 2. When single-flight is enabled, wait for the keyed lock on `run_id`.
//! 3. Build the request scope.
//! 4. Lease the database session, run the workflow, release the lease.
//! 5. Any failure after validation is returned as
//!    [`SupervisorError::ExecutionFailed`] with the root cause as its source.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use supervisor_core::orchestration::Supervisor;
//! use supervisor_core::models::{ExecutionContext, NamedDbSession};
//! # async fn example(
//! #     llm: std::sync::Arc<dyn supervisor_core::services::LlmManager>,
//! #     bridge: std::sync::Arc<dyn supervisor_core::events::NotificationBridge>,
//! # ) -> supervisor_core::error::Result<()> {
//! let supervisor = Supervisor::create(llm, bridge);
//! let context = ExecutionContext::for_new_run("user-1", "thread-1")
//!     .with_db_session(NamedDbSession::handle("session-1"));
//!
//! let result = supervisor.execute(context, Some(true)).await?;
//! println!("success rate: {}", result.workflow.workflow_metadata.success_rate);
//! # Ok(())
//! # }
//! ```

use crate::agents::{AgentDependencies, AgentFactory};
use crate::config::SupervisorConfig;
use crate::constants::metadata_keys;
use crate::error::{Result, SupervisorError};
use crate::events::{BroadcastNotificationBridge, NotificationBridge};
use crate::logging::{log_error, log_workflow_operation};
use crate::models::ExecutionContext;
use crate::orchestration::dependency_resolver::DependencyResolver;
use crate::orchestration::run_locks::RunLocks;
use crate::orchestration::types::SupervisorResult;
use crate::orchestration::workflow_executor::{WorkflowExecutor, WorkflowExecutorConfig};
use crate::registry::AgentRegistry;
use crate::services::{
    with_managed_session, HostState, LlmManager, PassthroughSessionProvider,
    RequestToolDispatcher, SessionProvider, ToolRegistry,
};
use crate::validation::{validate_metadata_payload, validate_user_context};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Objects that exist for exactly one `execute` call
pub struct RequestScope {
    pub run_id: String,
    pub tool_dispatcher: Arc<RequestToolDispatcher>,
    pub registry: AgentRegistry,
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        debug!(run_id = %self.run_id, agents = self.registry.len(), "Request scope released");
    }
}

impl fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestScope")
            .field("run_id", &self.run_id)
            .field("registry", &self.registry)
            .finish()
    }
}

pub struct Supervisor {
    llm: Arc<dyn LlmManager>,
    notifier: Arc<dyn NotificationBridge>,
    config: SupervisorConfig,
    executor: WorkflowExecutor,
    session_provider: Arc<dyn SessionProvider>,
    tool_registry: ToolRegistry,
    host_state: HostState,
    agent_overrides: Vec<(String, AgentFactory)>,
    disabled_agents: HashSet<String>,
    run_locks: RunLocks,
}

impl Supervisor {
    /// Build a supervisor with default configuration; no agents are created yet
    pub fn create(llm: Arc<dyn LlmManager>, notifier: Arc<dyn NotificationBridge>) -> Self {
        let config = SupervisorConfig::default();
        let executor = WorkflowExecutor::new(
            DependencyResolver::default(),
            WorkflowExecutorConfig::from(&config),
            notifier.clone(),
        );

        Self {
            llm,
            notifier,
            config,
            executor,
            session_provider: Arc::new(PassthroughSessionProvider),
            tool_registry: ToolRegistry::new(),
            host_state: HostState::default(),
            agent_overrides: Vec::new(),
            disabled_agents: HashSet::new(),
            run_locks: RunLocks::new(),
        }
    }

    /// Build a supervisor that publishes to a new in-process broadcast channel
    pub fn with_broadcast(
        llm: Arc<dyn LlmManager>,
        config: SupervisorConfig,
    ) -> Result<(Self, Arc<BroadcastNotificationBridge>)> {
        let bridge = Arc::new(BroadcastNotificationBridge::new(config.event_buffer_size));
        let supervisor = Self::create(llm, bridge.clone()).with_config(config)?;
        Ok((supervisor, bridge))
    }

    /// Replace the configuration; the dependency table must be acyclic
    pub fn with_config(mut self, config: SupervisorConfig) -> Result<Self> {
        config.validate()?;
        let resolver = DependencyResolver::new(config.dependency_table())?;
        self.executor = WorkflowExecutor::new(
            resolver,
            WorkflowExecutorConfig::from(&config),
            self.notifier.clone(),
        );
        self.config = config;
        Ok(self)
    }

    pub fn with_session_provider(mut self, provider: Arc<dyn SessionProvider>) -> Self {
        self.session_provider = provider;
        self
    }

    pub fn with_tool_registry(mut self, tools: ToolRegistry) -> Self {
        self.tool_registry = tools;
        self
    }

    pub fn with_host_state(mut self, host_state: HostState) -> Self {
        self.host_state = host_state;
        self
    }

    /// Build `name` from `factory` instead of the default agent
    pub fn with_agent_override(mut self, name: impl Into<String>, factory: AgentFactory) -> Self {
        let name = name.into();
        self.disabled_agents.remove(&name);
        self.agent_overrides.retain(|(existing, _)| *existing != name);
        self.agent_overrides.push((name, factory));
        self
    }

    /// Leave `name` out of every request registry
    pub fn without_agent(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.agent_overrides.retain(|(existing, _)| *existing != name);
        self.disabled_agents.insert(name);
        self
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Run ids currently holding or awaiting the single-flight lock
    pub fn active_runs(&self) -> Vec<String> {
        self.run_locks.active_keys()
    }

    /// Orchestrate every configured agent for one request
    ///
    /// `stream_updates` falls back to the configured default when `None`.
    #[instrument(skip(self, context), fields(run_id = %context.run_id, user_id = %context.user_id))]
    pub async fn execute(
        &self,
        context: ExecutionContext,
        stream_updates: Option<bool>,
    ) -> Result<SupervisorResult> {
        validate_user_context(&context)?;
        validate_metadata_payload(&Value::Object(context.metadata.clone()))?;

        let _run_guard = if self.config.single_flight_per_run {
            Some(self.run_locks.acquire(&context.run_id).await)
        } else {
            None
        };

        let run_id = context.run_id.clone();
        self.orchestrate(context, stream_updates.unwrap_or(self.config.stream_updates))
            .await
            .map_err(|error| {
                log_error(
                    "supervisor",
                    "execute",
                    &error.to_string(),
                    Some(&format!("run_id={run_id}")),
                );
                SupervisorError::execution_failed(error)
            })
    }

    async fn orchestrate(
        &self,
        mut context: ExecutionContext,
        stream_updates: bool,
    ) -> Result<SupervisorResult> {
        let started = Instant::now();
        let flow_id = context
            .metadata_str(metadata_keys::FLOW_ID)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        info!(
            run_id = %context.run_id,
            user_id = %context.user_id,
            thread_id = %context.thread_id,
            flow_id = %flow_id,
            stream_updates = stream_updates,
            "Starting supervisor orchestration"
        );
        log_workflow_operation("execute", &context.run_id, &flow_id, "started", None);

        let scope = self.build_request_scope(&context)?;
        let db_session = context
            .db_session
            .clone()
            .ok_or_else(|| SupervisorError::MissingDbSession {
                user_id: context.user_id.clone(),
            })?;

        let executor = &self.executor;
        let registry = &scope.registry;
        let flow = flow_id.as_str();
        let request = &mut context;
        let workflow = with_managed_session(
            self.session_provider.as_ref(),
            &db_session,
            |session| async move {
                request.db_session = Some(session);
                Ok::<_, SupervisorError>(
                    executor
                        .execute_workflow(request, registry, flow, stream_updates)
                        .await,
                )
            },
        )
        .await?;

        let execution_time_ms = started.elapsed().as_millis() as u64;
        let orchestration_successful = workflow.workflow_metadata.failed_agents.is_empty()
            && !workflow.workflow_metadata.is_aborted();

        log_workflow_operation(
            "execute",
            &context.run_id,
            &flow_id,
            if orchestration_successful {
                "completed"
            } else {
                "degraded"
            },
            Some(&format!(
                "success_rate={:.2}",
                workflow.workflow_metadata.success_rate
            )),
        );

        drop(scope);

        Ok(SupervisorResult {
            run_id: context.run_id,
            user_id: context.user_id,
            thread_id: context.thread_id,
            workflow,
            orchestration_successful,
            execution_time_ms,
            metadata: context.metadata,
        })
    }

    /// Fresh dispatcher and registry for one request
    pub fn build_request_scope(&self, context: &ExecutionContext) -> Result<RequestScope> {
        let tool_dispatcher = Arc::new(RequestToolDispatcher::build(
            &self.tool_registry,
            &self.host_state,
            self.notifier.clone(),
            context,
        ));

        let mut registry = AgentRegistry::new(AgentDependencies {
            llm: self.llm.clone(),
            tools: tool_dispatcher.clone(),
            notifier: self.notifier.clone(),
        });

        for (name, factory) in &self.agent_overrides {
            registry.register_factory(name.clone(), factory)?;
        }
        registry.register_default_agents();
        for name in &self.disabled_agents {
            registry.unregister(name);
        }

        debug!(
            run_id = %context.run_id,
            agents = ?registry.agent_names(),
            tools = ?tool_dispatcher.tool_names(),
            "Request scope built"
        );

        Ok(RequestScope {
            run_id: context.run_id.clone(),
            tool_dispatcher,
            registry,
        })
    }
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("config", &self.config)
            .field(
                "agent_overrides",
                &self
                    .agent_overrides
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("disabled_agents", &self.disabled_agents)
            .field("tool_registry", &self.tool_registry)
            .field("run_locks", &self.run_locks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{agent_factory, SubAgent};
    use crate::events::NoopNotificationBridge;
    use crate::models::NamedDbSession;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoLlm;

    #[async_trait]
    impl LlmManager for EchoLlm {
        async fn ask_llm(&self, _prompt: &str, config: &str) -> Result<String> {
            Ok(format!(r#"{{"llm_config": "{config}"}}"#))
        }
    }

    struct Constant;

    #[async_trait]
    impl SubAgent for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        async fn execute(&self, _context: &mut ExecutionContext, _stream: bool) -> Result<Value> {
            Ok(json!({"constant": true}))
        }
    }

    fn supervisor() -> Supervisor {
        Supervisor::create(Arc::new(EchoLlm), Arc::new(NoopNotificationBridge))
            .with_config(SupervisorConfig::for_testing())
            .unwrap()
    }

    fn context() -> ExecutionContext {
        ExecutionContext::for_new_run("user-1", "thread-1")
            .with_db_session(NamedDbSession::handle("db"))
    }

    #[tokio::test]
    async fn test_default_agents_complete() {
        let result = supervisor().execute(context(), Some(false)).await.unwrap();

        assert!(result.orchestration_successful);
        assert_eq!(result.workflow.workflow_metadata.success_rate, 1.0);
        assert_eq!(result.metadata["triage_result"]["llm_config"], "triage");
        assert_eq!(result.metadata["report_result"]["llm_config"], "reporting");
    }

    #[tokio::test]
    async fn test_override_and_removal_shape_request_scope() {
        let supervisor = supervisor()
            .with_agent_override("triage", agent_factory(|_| Arc::new(Constant)))
            .without_agent("synthetic_data");

        let scope = supervisor.build_request_scope(&context()).unwrap();
        assert_eq!(scope.registry.get("triage").unwrap().name(), "constant");
        assert!(!scope.registry.contains("synthetic_data"));
        assert!(scope.registry.contains("data_helper"));
    }

    #[tokio::test]
    async fn test_each_request_gets_its_own_registry() {
        let supervisor = supervisor();
        let first = supervisor.build_request_scope(&context()).unwrap();
        let second = supervisor.build_request_scope(&context()).unwrap();

        let a = first.registry.get("triage").unwrap();
        let b = second.registry.get("triage").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_cyclic_config_is_rejected() {
        let mut config = SupervisorConfig::for_testing();
        config
            .dependencies
            .insert("triage".to_string(), vec!["reporting".to_string()]);

        let result = Supervisor::create(Arc::new(EchoLlm), Arc::new(NoopNotificationBridge))
            .with_config(config);
        assert!(matches!(result, Err(SupervisorError::CyclicDependency { .. })));
    }
}
