//! # Registry Infrastructure
//!
//! Request-scoped agent registration and lookup.

pub mod agent_registry;

pub use agent_registry::{AgentRegistration, AgentRegistry, RegistryStats};
