//! # Supervisor Configuration
//!
//! Layered configuration for the orchestration core: built-in defaults, an
//! optional TOML file, then `SUPERVISOR__*` environment overrides.
//!
//! ```toml
//! # config/supervisor.toml
//! execution_order = ["triage", "data", "optimization", "actions", "reporting"]
//! critical_agents = ["triage", "data"]
//!
//! [pacing]
//! enabled = true
//! min_agent_duration_ms = 500
//!
//! [dependencies]
//! data = ["triage"]
//! optimization = ["triage", "data"]
//! actions = ["triage", "data"]
//! reporting = ["triage", "data"]
//! ```
//!
//! A `[dependencies]` table replaces the built-in table as a whole; agents
//! left out of it have no prerequisites.
//!
//! Environment variables use a double-underscore separator, e.g.
//! `SUPERVISOR__PACING__ENABLED=false` or
//! `SUPERVISOR__EXECUTION_ORDER=triage,data,reporting`.

use crate::constants::{
    DEFAULT_AGENT_DEPENDENCIES, DEFAULT_CRITICAL_AGENTS, DEFAULT_EXECUTION_ORDER,
    DEFAULT_MIN_AGENT_DURATION_MS,
};
use crate::error::{Result, SupervisorError};
use crate::orchestration::dependency_resolver::DependencyTable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const ENV_PREFIX: &str = "SUPERVISOR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Fixed linear order the executor walks
    pub execution_order: Vec<String>,
    /// Agents whose failure aborts the remaining workflow
    pub critical_agents: Vec<String>,
    /// Prerequisites per agent
    pub dependencies: HashMap<String, Vec<String>>,
    pub pacing: PacingConfig,
    /// Capacity of the default broadcast notification channel
    pub event_buffer_size: usize,
    /// Default for `stream_updates` when the caller does not override it
    pub stream_updates: bool,
    /// Serialize concurrent executions that share a run id
    pub single_flight_per_run: bool,
}

/// Throttle applied after agents that finish faster than `min_agent_duration_ms`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub enabled: bool,
    pub min_agent_duration_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_agent_duration_ms: DEFAULT_MIN_AGENT_DURATION_MS,
        }
    }
}

impl PacingConfig {
    pub fn min_agent_duration(&self) -> Option<Duration> {
        self.enabled
            .then(|| Duration::from_millis(self.min_agent_duration_ms))
            .filter(|d| !d.is_zero())
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            execution_order: DEFAULT_EXECUTION_ORDER
                .iter()
                .map(|s| s.to_string())
                .collect(),
            critical_agents: DEFAULT_CRITICAL_AGENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            dependencies: DEFAULT_AGENT_DEPENDENCIES
                .iter()
                .map(|(agent, deps)| {
                    (
                        agent.to_string(),
                        deps.iter().map(|d| d.to_string()).collect(),
                    )
                })
                .collect(),
            pacing: PacingConfig::default(),
            event_buffer_size: 1000,
            stream_updates: true,
            single_flight_per_run: true,
        }
    }
}

impl SupervisorConfig {
    /// Configuration for tests: identical to the defaults but without pacing
    pub fn for_testing() -> Self {
        Self {
            pacing: PacingConfig {
                enabled: false,
                min_agent_duration_ms: 0,
            },
            ..Self::default()
        }
    }

    /// Load defaults, overlaid by environment variables
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load defaults, an optional TOML file, then environment variables
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading supervisor configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("execution_order")
                    .with_list_parse_key("critical_agents"),
            )
            .build()?;

        let config: SupervisorConfig = settings.try_deserialize()?;
        config.validate()?;

        debug!(
            execution_order = ?config.execution_order,
            critical_agents = ?config.critical_agents,
            pacing_enabled = config.pacing.enabled,
            "Supervisor configuration loaded"
        );

        Ok(config)
    }

    /// Check structural constraints, including an acyclic dependency table
    pub fn validate(&self) -> Result<()> {
        if self.execution_order.is_empty() {
            return Err(SupervisorError::Configuration(
                "execution_order must name at least one agent".to_string(),
            ));
        }

        if let Some(unknown) = self
            .critical_agents
            .iter()
            .find(|agent| !self.execution_order.contains(agent))
        {
            return Err(SupervisorError::Configuration(format!(
                "critical agent '{unknown}' is not part of execution_order"
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(SupervisorError::Configuration(
                "event_buffer_size must be greater than zero".to_string(),
            ));
        }

        self.dependency_table().validate_acyclic()
    }

    pub fn dependency_table(&self) -> DependencyTable {
        DependencyTable::from_map(self.dependencies.clone())
    }

    pub fn is_critical(&self, agent_name: &str) -> bool {
        self.critical_agents.iter().any(|a| a == agent_name)
    }
}
