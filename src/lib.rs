#![allow(clippy::doc_markdown)] // Allow technical terms like WebSocket, LLM in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Supervisor Core
//!
//! Orchestration core for a supervisor that runs a fixed set of sub-agents
//! against a single user request.
//!
//! ## Overview
//!
//! A request arrives as an [`ExecutionContext`] (user, thread, run identity plus
//! a database session handle). The [`Supervisor`] validates it, builds a fresh
//! agent registry and tool dispatcher for the request, and hands both to the
//! workflow executor. The executor walks the configured execution order once,
//! gating each agent on its prerequisites, isolating it in a child context and
//! merging its results back into the parent.
//!
//! Failure of a critical agent (triage, data) stops the pass; failure of any
//! other agent is recorded and the pass continues.
//!
//! ## Module Organization
//!
//! - [`models`] - Execution context and child derivation
//! - [`agents`] - Sub-agent contract and the default agent set
//! - [`registry`] - Request-scoped agent registry
//! - [`orchestration`] - Supervisor, workflow executor, dependency resolver, merge-back
//! - [`events`] - Notification bridge and agent lifecycle events
//! - [`services`] - LLM, tool and managed-session collaborators
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use supervisor_core::config::SupervisorConfig;
//! use supervisor_core::models::{ExecutionContext, NamedDbSession};
//! use supervisor_core::orchestration::Supervisor;
//! use std::sync::Arc;
//!
//! # async fn example(llm: Arc<dyn supervisor_core::services::LlmManager>) -> supervisor_core::Result<()> {
//! supervisor_core::logging::init_structured_logging();
//!
//! let (supervisor, events) = Supervisor::with_broadcast(llm, SupervisorConfig::load()?)?;
//! let mut updates = events.subscribe();
//!
//! let context = ExecutionContext::for_new_run("user-1", "thread-1")
//!     .with_db_session(NamedDbSession::handle("session-1"));
//! let result = supervisor.execute(context, None).await?;
//!
//! while let Ok(event) = updates.try_recv() {
//!     println!("{} {}", event.agent_name, event.event_type);
//! }
//! println!("{}", result.to_json());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod agents;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod registry;
pub mod services;
pub mod validation;

pub use agents::{AgentCapabilities, AgentDependencies, SubAgent};
pub use config::{PacingConfig, SupervisorConfig};
pub use error::{Result, SupervisorError};
pub use events::{AgentEvent, AgentEventType, NotificationBridge};
pub use models::{ExecutionContext, Metadata};
pub use orchestration::{
    AgentOutcome, DependencyResolver, Supervisor, SupervisorResult, WorkflowExecutor,
    WorkflowResult,
};
pub use registry::AgentRegistry;
