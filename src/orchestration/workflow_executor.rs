//! # Workflow Executor
//!
//! Drives one linear pass over the configured execution order.
//!
//! | Condition                                  | Action                                   |
//! |--------------------------------------------|------------------------------------------|
//! | Agent not registered for this request      | skip, no record                          |
//! | Prerequisites unmet, agent non-critical    | record `skipped`, continue                |
//! | Prerequisites unmet, agent critical        | record `skipped`, abort the pass          |
//! | Agent errors or returns `status: failed`   | record `failed`; abort only if critical   |
//! | Agent succeeds                             | record `completed`, merge metadata, pace  |
//!
//! Agents run strictly one after another in declared order, even where the
//! dependency table would allow independent agents to overlap. Each agent gets
//! a child context; only the merge-back step writes into the parent.
//!
//! Lifecycle notifications (`agent_started`, `agent_thinking`,
//! `agent_completed`, `agent_error`) are best-effort and never change the
//! outcome of a pass.

use crate::config::SupervisorConfig;
use crate::constants::{metadata_keys, status};
use crate::error::SupervisorError;
use crate::events::{emit_best_effort, AgentEventType, NotificationBridge};
use crate::logging::{log_agent_operation, log_workflow_operation};
use crate::models::{ExecutionContext, Metadata};
use crate::orchestration::dependency_resolver::DependencyResolver;
use crate::orchestration::metadata_merge::merge_child_metadata_to_parent;
use crate::orchestration::types::{AgentOutcome, WorkflowMetadata, WorkflowResult};
use crate::registry::AgentRegistry;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Executor settings derived from [`SupervisorConfig`]
#[derive(Debug, Clone)]
pub struct WorkflowExecutorConfig {
    pub execution_order: Vec<String>,
    pub critical_agents: HashSet<String>,
    /// Agents finishing faster than this are followed by a delay for the remainder
    pub min_agent_duration: Option<Duration>,
}

impl Default for WorkflowExecutorConfig {
    fn default() -> Self {
        Self::from(&SupervisorConfig::default())
    }
}

impl From<&SupervisorConfig> for WorkflowExecutorConfig {
    fn from(config: &SupervisorConfig) -> Self {
        Self {
            execution_order: config.execution_order.clone(),
            critical_agents: config.critical_agents.iter().cloned().collect(),
            min_agent_duration: config.pacing.min_agent_duration(),
        }
    }
}

impl WorkflowExecutorConfig {
    /// Default order and critical set, pacing disabled
    pub fn for_testing() -> Self {
        Self::from(&SupervisorConfig::for_testing())
    }

    pub fn with_execution_order(mut self, order: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.execution_order = order.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_critical_agents(
        mut self,
        agents: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.critical_agents = agents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_min_agent_duration(mut self, duration: Option<Duration>) -> Self {
        self.min_agent_duration = duration;
        self
    }

    pub fn is_critical(&self, agent_name: &str) -> bool {
        self.critical_agents.contains(agent_name)
    }
}

pub struct WorkflowExecutor {
    resolver: DependencyResolver,
    config: WorkflowExecutorConfig,
    notifier: Arc<dyn NotificationBridge>,
}

impl WorkflowExecutor {
    pub fn new(
        resolver: DependencyResolver,
        config: WorkflowExecutorConfig,
        notifier: Arc<dyn NotificationBridge>,
    ) -> Self {
        Self {
            resolver,
            config,
            notifier,
        }
    }

    pub fn config(&self) -> &WorkflowExecutorConfig {
        &self.config
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    /// Run every registered agent in order against `context`
    ///
    /// Agent failures are recorded in the result, never returned as errors.
    #[instrument(skip_all, fields(run_id = %context.run_id, flow_id = %flow_id))]
    pub async fn execute_workflow(
        &self,
        context: &mut ExecutionContext,
        registry: &AgentRegistry,
        flow_id: &str,
        stream_updates: bool,
    ) -> WorkflowResult {
        let order = &self.config.execution_order;
        let mut workflow_metadata = WorkflowMetadata::new(order.len());
        let mut results = Vec::new();
        let mut completed: HashSet<String> = HashSet::new();

        log_workflow_operation(
            "execute_workflow",
            &context.run_id,
            flow_id,
            "started",
            Some(&format!("{} agents in order", order.len())),
        );

        for (index, agent_name) in order.iter().enumerate() {
            let Some(agent) = registry.get(agent_name) else {
                debug!(agent_name = %agent_name, run_id = %context.run_id, "Agent not registered for this request - skipping");
                continue;
            };
            let critical = self.config.is_critical(agent_name);

            if !self.resolver.can_execute(agent_name, &completed) {
                let missing = self.resolver.missing_dependencies(agent_name, &completed);
                warn!(
                    agent_name = %agent_name,
                    run_id = %context.run_id,
                    missing_deps = ?missing,
                    critical = critical,
                    "Agent dependencies not met - skipping"
                );
                log_agent_operation(
                    "execute_agent",
                    &context.run_id,
                    agent_name,
                    status::SKIPPED,
                    None,
                    Some(&format!("missing: {}", missing.join(", "))),
                );
                results.push((agent_name.clone(), AgentOutcome::skipped(missing)));
                workflow_metadata.skipped_agents.insert(agent_name.clone());

                if critical {
                    Self::abort(&mut workflow_metadata, order, index, agent_name);
                    break;
                }
                continue;
            }

            let child_metadata = Self::child_metadata(agent_name, flow_id);
            let mut child = context.create_child_context(agent_name, child_metadata);

            self.emit(AgentEventType::AgentStarted, &context.run_id, agent_name, json!({
                "flow_id": flow_id,
                "critical": critical,
            }))
            .await;
            self.emit(AgentEventType::AgentThinking, &context.run_id, agent_name, json!({
                "message": format!("{agent_name} is analyzing the request"),
            }))
            .await;

            let started = Instant::now();
            let outcome = agent
                .execute(&mut child, stream_updates)
                .await
                .and_then(|payload| Self::reject_failed_payload(agent_name, payload));
            let elapsed = started.elapsed();
            let execution_time_ms = elapsed.as_millis() as u64;

            match outcome {
                Ok(output) => {
                    merge_child_metadata_to_parent(context, &child, agent_name);
                    completed.insert(agent_name.clone());
                    workflow_metadata.completed_agents.insert(agent_name.clone());

                    log_agent_operation(
                        "execute_agent",
                        &context.run_id,
                        agent_name,
                        status::COMPLETED,
                        Some(execution_time_ms),
                        None,
                    );
                    self.emit(AgentEventType::AgentCompleted, &context.run_id, agent_name, json!({
                        "execution_time_ms": execution_time_ms,
                    }))
                    .await;

                    results.push((
                        agent_name.clone(),
                        AgentOutcome::Completed {
                            output,
                            execution_time_ms,
                        },
                    ));

                    self.pace(agent_name, elapsed).await;
                }
                Err(error) => {
                    let message = error.to_string();
                    warn!(
                        agent_name = %agent_name,
                        run_id = %context.run_id,
                        critical = critical,
                        error = %message,
                        "Agent execution failed"
                    );
                    log_agent_operation(
                        "execute_agent",
                        &context.run_id,
                        agent_name,
                        status::FAILED,
                        Some(execution_time_ms),
                        Some(&message),
                    );
                    self.emit(AgentEventType::AgentError, &context.run_id, agent_name, json!({
                        "error": message,
                        "critical": critical,
                    }))
                    .await;

                    results.push((
                        agent_name.clone(),
                        AgentOutcome::Failed { error: message },
                    ));
                    workflow_metadata.failed_agents.insert(agent_name.clone());

                    if critical {
                        Self::abort(&mut workflow_metadata, order, index, agent_name);
                        break;
                    }
                }
            }
        }

        workflow_metadata.compute_success_rate();
        context.metadata.insert(
            metadata_keys::WORKFLOW_METADATA.to_string(),
            serde_json::to_value(&workflow_metadata).unwrap_or(Value::Null),
        );

        info!(
            run_id = %context.run_id,
            flow_id = %flow_id,
            completed = workflow_metadata.completed_agents.len(),
            failed = workflow_metadata.failed_agents.len(),
            skipped = workflow_metadata.skipped_agents.len(),
            aborted_by = ?workflow_metadata.aborted_by,
            success_rate = workflow_metadata.success_rate,
            "Workflow pass finished"
        );
        log_workflow_operation(
            "execute_workflow",
            &context.run_id,
            flow_id,
            if workflow_metadata.is_aborted() {
                "aborted"
            } else {
                status::COMPLETED
            },
            None,
        );

        WorkflowResult {
            results,
            workflow_metadata,
        }
    }

    fn child_metadata(agent_name: &str, flow_id: &str) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert(
            metadata_keys::AGENT_NAME.to_string(),
            Value::String(agent_name.to_string()),
        );
        metadata.insert(
            metadata_keys::FLOW_ID.to_string(),
            Value::String(flow_id.to_string()),
        );
        metadata
    }

    /// A `"status": "failed"` payload is handled exactly like a raised error
    fn reject_failed_payload(agent_name: &str, payload: Value) -> crate::error::Result<Value> {
        if payload.get("status").and_then(Value::as_str) != Some(status::FAILED) {
            return Ok(payload);
        }
        let reason = payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("agent reported failed status")
            .to_string();
        Err(SupervisorError::AgentExecution {
            agent_name: agent_name.to_string(),
            reason,
        })
    }

    fn abort(metadata: &mut WorkflowMetadata, order: &[String], index: usize, agent_name: &str) {
        metadata.aborted_by = Some(agent_name.to_string());
        metadata.aborted_agents = order[index + 1..].to_vec();
        warn!(
            aborted_by = %agent_name,
            aborted_agents = ?metadata.aborted_agents,
            "Critical agent did not complete - aborting workflow"
        );
    }

    async fn pace(&self, agent_name: &str, elapsed: Duration) {
        let Some(minimum) = self.config.min_agent_duration else {
            return;
        };
        if let Some(remaining) = minimum.checked_sub(elapsed) {
            if !remaining.is_zero() {
                debug!(agent_name = %agent_name, delay_ms = remaining.as_millis() as u64, "Pacing after fast agent");
                tokio::time::sleep(remaining).await;
            }
        }
    }

    async fn emit(&self, event_type: AgentEventType, run_id: &str, agent_name: &str, data: Value) {
        emit_best_effort(self.notifier.as_ref(), event_type, run_id, agent_name, data).await;
    }
}

impl std::fmt::Debug for WorkflowExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowExecutor")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
