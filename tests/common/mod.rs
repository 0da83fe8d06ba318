//! Shared test doubles for integration and property tests
//!
//! Scripted agents record every invocation in a shared call log so tests can
//! assert exactly which agents ran, and in which order.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use supervisor_core::agents::{AgentDependencies, SubAgent};
use supervisor_core::error::{Result, SupervisorError};
use supervisor_core::events::{NoopNotificationBridge, NotificationBridge};
use supervisor_core::models::{DbSessionHandle, ExecutionContext, NamedDbSession};
use supervisor_core::registry::AgentRegistry;
use supervisor_core::services::{
    HostState, LlmManager, RequestToolDispatcher, SessionLease, SessionProvider, ToolRegistry,
};

/// Order in which scripted agents were invoked
pub type CallLog = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Clone)]
pub enum Behavior {
    /// Write `{name}_result` into the child context and return the payload
    Succeed(Value),
    /// Return an error
    Raise(String),
    /// Return a `"status": "failed"` payload
    ReportFailure(String),
    /// Sleep, then behave like `Succeed`
    SlowSucceed(Duration, Value),
}

pub struct ScriptedAgent {
    name: String,
    behavior: Behavior,
    calls: CallLog,
}

impl ScriptedAgent {
    pub fn new(name: &str, behavior: Behavior, calls: &CallLog) -> Arc<dyn SubAgent> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
            calls: calls.clone(),
        })
    }
}

#[async_trait]
impl SubAgent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, context: &mut ExecutionContext, _stream_updates: bool) -> Result<Value> {
        self.calls.lock().push(self.name.clone());

        let payload = match &self.behavior {
            Behavior::Succeed(payload) => payload.clone(),
            Behavior::SlowSucceed(delay, payload) => {
                tokio::time::sleep(*delay).await;
                payload.clone()
            }
            Behavior::Raise(reason) => {
                return Err(SupervisorError::AgentExecution {
                    agent_name: self.name.clone(),
                    reason: reason.clone(),
                })
            }
            Behavior::ReportFailure(reason) => {
                return Ok(json!({ "status": "failed", "error": reason }))
            }
        };

        context
            .metadata
            .insert(format!("{}_result", self.name), payload.clone());
        Ok(payload)
    }
}

/// LLM that answers every prompt with the same JSON object
pub struct ScriptedLlm {
    pub response: String,
    pub calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn json(response: Value) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmManager for ScriptedLlm {
    async fn ask_llm(&self, _prompt: &str, _llm_config_name: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Session provider counting acquisitions and releases
#[derive(Default)]
pub struct CountingSessionProvider {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub refuse: bool,
}

impl CountingSessionProvider {
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for CountingSessionProvider {
    async fn acquire(&self, handle: &DbSessionHandle) -> Result<SessionLease> {
        if self.refuse {
            return Err(SupervisorError::Session("connection pool exhausted".to_string()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(SessionLease::new(handle.clone()))
    }

    async fn release(&self, _lease: SessionLease) -> Result<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn new_call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().clone()
}

pub fn valid_context(run_id: &str) -> ExecutionContext {
    ExecutionContext::new("user-1", "thread-1", run_id)
        .with_db_session(NamedDbSession::handle(format!("db-{run_id}")))
        .with_metadata_entry("user_request", json!("Why did our cloud spend double?"))
}

pub fn dependencies(notifier: Arc<dyn NotificationBridge>) -> AgentDependencies {
    AgentDependencies {
        llm: ScriptedLlm::json(json!({})),
        tools: Arc::new(RequestToolDispatcher::build(
            &ToolRegistry::new(),
            &HostState::default(),
            notifier.clone(),
            &ExecutionContext::new("user-1", "thread-1", "run-test"),
        )),
        notifier,
    }
}

/// Registry holding exactly the given scripted agents
pub fn scripted_registry(agents: &[(&str, Behavior)], calls: &CallLog) -> AgentRegistry {
    let mut registry = AgentRegistry::new(dependencies(Arc::new(NoopNotificationBridge)));
    for (name, behavior) in agents {
        registry
            .register(*name, ScriptedAgent::new(name, behavior.clone(), calls))
            .expect("scripted agent registration");
    }
    registry
}

/// All five core agents succeeding, except those overridden
pub fn core_agents_with(overrides: &[(&str, Behavior)]) -> Vec<(&'static str, Behavior)> {
    ["triage", "data", "optimization", "actions", "reporting"]
        .into_iter()
        .map(|name| {
            let behavior = overrides
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, b)| b.clone())
                .unwrap_or_else(|| Behavior::Succeed(json!({ "agent": name })));
            (name, behavior)
        })
        .collect()
}
