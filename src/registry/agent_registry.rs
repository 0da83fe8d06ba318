//! # Agent Registry
//!
//! Maps agent names to agent instances for a single request.
//!
//! ## Isolation
//!
//! The supervisor builds a new registry for every execution, so agent
//! instances (and anything they hold) are never shared between users or
//! requests. The registry carries the request's [`AgentDependencies`],
//! including the notification bridge, so agents built through it can emit
//! progress events for the right run.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use supervisor_core::registry::AgentRegistry;
//! # fn example(deps: supervisor_core::agents::AgentDependencies) {
//! let mut registry = AgentRegistry::new(deps);
//! registry.register_default_agents();
//! assert!(registry.get("triage").is_some());
//! # }
//! ```

use crate::agents::base::{AgentCapabilities, AgentDependencies, AgentFactory, SubAgent};
use crate::agents::core_agents::{default_agent_specs, PromptAgent};
use crate::error::{Result, SupervisorError};
use crate::events::NotificationBridge;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One registered agent with capabilities captured at registration time
#[derive(Clone)]
pub struct AgentRegistration {
    pub name: String,
    pub agent: Arc<dyn SubAgent>,
    pub capabilities: AgentCapabilities,
    pub registered_at: DateTime<Utc>,
}

impl fmt::Debug for AgentRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRegistration")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("registered_at", &self.registered_at)
            .finish()
    }
}

/// Registry statistics
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryStats {
    pub total_agents: usize,
    pub streaming_agents: usize,
    pub tool_using_agents: usize,
    pub agent_names: Vec<String>,
}

/// Request-scoped agent registry
pub struct AgentRegistry {
    agents: HashMap<String, AgentRegistration>,
    /// Registration order, for stable listings
    order: Vec<String>,
    dependencies: AgentDependencies,
}

impl AgentRegistry {
    pub fn new(dependencies: AgentDependencies) -> Self {
        Self {
            agents: HashMap::new(),
            order: Vec::new(),
            dependencies,
        }
    }

    /// Register an agent, replacing any agent already registered under `name`
    pub fn register(&mut self, name: impl Into<String>, agent: Arc<dyn SubAgent>) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SupervisorError::Registration(
                "agent name must not be empty".to_string(),
            ));
        }

        let registration = AgentRegistration {
            capabilities: agent.capabilities(),
            name: name.clone(),
            agent,
            registered_at: Utc::now(),
        };

        if self.agents.insert(name.clone(), registration).is_some() {
            warn!(agent_name = %name, "Overriding registered agent");
        } else {
            self.order.push(name.clone());
            debug!(agent_name = %name, "Agent registered");
        }
        Ok(())
    }

    /// Build an agent from this registry's dependencies and register it
    pub fn register_factory(&mut self, name: impl Into<String>, factory: &AgentFactory) -> Result<()> {
        let agent = factory(&self.dependencies);
        self.register(name, agent)
    }

    /// Populate the default agent set; names already registered are left untouched
    pub fn register_default_agents(&mut self) -> usize {
        let mut added = 0;
        for spec in default_agent_specs() {
            if self.agents.contains_key(spec.name) {
                continue;
            }
            let agent = PromptAgent::shared(*spec, &self.dependencies);
            // Spec names are non-empty constants, so registration cannot fail
            if self.register(spec.name, agent).is_ok() {
                added += 1;
            }
        }

        info!(
            added = added,
            total_agents = self.agents.len(),
            "Default agents registered"
        );
        added
    }

    pub fn unregister(&mut self, name: &str) -> Option<AgentRegistration> {
        let removed = self.agents.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
            debug!(agent_name = %name, "Agent unregistered");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SubAgent>> {
        self.agents.get(name).map(|r| r.agent.clone())
    }

    pub fn registration(&self, name: &str) -> Option<&AgentRegistration> {
        self.agents.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// Names in registration order
    pub fn agent_names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn dependencies(&self) -> &AgentDependencies {
        &self.dependencies
    }

    pub fn notifier(&self) -> Arc<dyn NotificationBridge> {
        self.dependencies.notifier.clone()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            total_agents: self.agents.len(),
            streaming_agents: self
                .agents
                .values()
                .filter(|r| r.capabilities.streams_updates)
                .count(),
            tool_using_agents: self
                .agents
                .values()
                .filter(|r| r.capabilities.uses_tools)
                .count(),
            agent_names: self.order.clone(),
        }
    }
}

impl fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::base::agent_factory;
    use crate::constants::agents;
    use crate::events::NoopNotificationBridge;
    use crate::models::ExecutionContext;
    use crate::services::{HostState, LlmManager, RequestToolDispatcher, ToolRegistry};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct SilentLlm;

    #[async_trait]
    impl LlmManager for SilentLlm {
        async fn ask_llm(&self, _prompt: &str, _config: &str) -> Result<String> {
            Ok("{}".to_string())
        }
    }

    struct StaticAgent(&'static str);

    #[async_trait]
    impl SubAgent for StaticAgent {
        fn name(&self) -> &str {
            self.0
        }

        async fn execute(&self, _context: &mut ExecutionContext, _stream: bool) -> Result<Value> {
            Ok(json!({"agent": self.0}))
        }
    }

    fn deps() -> AgentDependencies {
        AgentDependencies {
            llm: Arc::new(SilentLlm),
            tools: Arc::new(RequestToolDispatcher::build(
                &ToolRegistry::new(),
                &HostState::default(),
                Arc::new(NoopNotificationBridge),
                &ExecutionContext::new("u", "t", "r"),
            )),
            notifier: Arc::new(NoopNotificationBridge),
        }
    }

    #[test]
    fn test_register_default_agents_is_idempotent() {
        let mut registry = AgentRegistry::new(deps());
        assert_eq!(registry.register_default_agents(), 8);
        assert_eq!(registry.register_default_agents(), 0);
        assert_eq!(registry.len(), 8);

        for agent in agents::CORE_AGENTS {
            assert!(registry.contains(agent));
        }
        assert_eq!(registry.agent_names()[0], agents::TRIAGE);
    }

    #[test]
    fn test_defaults_do_not_replace_overrides() {
        let mut registry = AgentRegistry::new(deps());
        registry
            .register(agents::TRIAGE, Arc::new(StaticAgent("custom_triage")))
            .unwrap();
        registry.register_default_agents();

        let triage = registry.get(agents::TRIAGE).unwrap();
        assert_eq!(triage.name(), "custom_triage");
    }

    #[test]
    fn test_override_keeps_single_entry() {
        let mut registry = AgentRegistry::new(deps());
        registry.register("a", Arc::new(StaticAgent("first"))).unwrap();
        registry.register("a", Arc::new(StaticAgent("second"))).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.agent_names(), &["a".to_string()]);
        assert_eq!(registry.get("a").unwrap().name(), "second");
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut registry = AgentRegistry::new(deps());
        assert!(matches!(
            registry.register(" ", Arc::new(StaticAgent("x"))),
            Err(SupervisorError::Registration(_))
        ));
    }

    #[test]
    fn test_factory_and_unregister() {
        let mut registry = AgentRegistry::new(deps());
        let factory = agent_factory(|_deps| Arc::new(StaticAgent("built")));
        registry.register_factory("built", &factory).unwrap();
        assert!(registry.contains("built"));

        assert!(registry.unregister("built").is_some());
        assert!(registry.get("built").is_none());
        assert!(registry.agent_names().is_empty());
    }

    #[test]
    fn test_stats_capture_capabilities() {
        let mut registry = AgentRegistry::new(deps());
        registry.register_default_agents();
        registry.register("plain", Arc::new(StaticAgent("plain"))).unwrap();

        let stats = registry.stats();
        assert_eq!(stats.total_agents, 9);
        assert_eq!(stats.streaming_agents, 8);
        assert_eq!(stats.tool_using_agents, 2);
        assert_eq!(
            registry.registration("plain").unwrap().capabilities,
            AgentCapabilities::default()
        );
    }
}
