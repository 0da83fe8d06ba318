//! # Agents
//!
//! The sub-agent contract and the default agent set.

pub mod base;
pub mod core_agents;

pub use base::{agent_factory, AgentCapabilities, AgentDependencies, AgentFactory, SubAgent};
pub use core_agents::{default_agent_specs, FallbackPolicy, PromptAgent, PromptAgentSpec};
