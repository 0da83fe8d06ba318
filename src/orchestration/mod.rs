//! # Orchestration Engine
//!
//! Runs the agent workflow for one request.
//!
//! ## Core Components
//!
//! - **Supervisor**: request entry point; validates, builds the request scope
//!   and owns the managed-session boundary
//! - **WorkflowExecutor**: linear pass over the execution order with the
//!   critical/non-critical failure policy and pacing
//! - **DependencyResolver**: prerequisite checks against an acyclic table
//! - **Metadata merge-back**: copies agent results from child to parent context
//! - **RunLocks**: optional single-flight guard keyed by run id

pub mod dependency_resolver;
pub mod metadata_merge;
pub mod run_locks;
pub mod supervisor;
pub mod types;
pub mod workflow_executor;

pub use dependency_resolver::{DependencyResolver, DependencyTable};
pub use metadata_merge::merge_child_metadata_to_parent;
pub use run_locks::{RunLockGuard, RunLocks};
pub use supervisor::{RequestScope, Supervisor};
pub use types::{AgentOutcome, SupervisorResult, WorkflowMetadata, WorkflowResult};
pub use workflow_executor::{WorkflowExecutor, WorkflowExecutorConfig};
