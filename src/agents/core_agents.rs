//! # Default Agents
//!
//! The built-in agent set is a single [`PromptAgent`] type parameterised by a
//! static [`PromptAgentSpec`]. Each agent reads upstream results from its
//! child context, optionally calls one tool, asks the LLM for a JSON object
//! and stores the payload under its result key.
//!
//! LLM failures never escape an agent as errors. Depending on the agent's
//! [`FallbackPolicy`] the agent either degrades to a locally computed payload
//! or returns a logical failure (`"status": "failed"`), which the executor
//! records against the agent.

use crate::agents::base::{AgentCapabilities, AgentDependencies, SubAgent};
use crate::constants::{agents, metadata_keys, status};
use crate::error::Result;
use crate::events::{emit_best_effort, AgentEventType};
use crate::models::{ExecutionContext, Metadata};
use crate::services::extract_json_object;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// What an agent produces when the LLM call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Keyword classification of the user request
    RuleBasedTriage,
    /// Summary assembled from upstream results
    UpstreamSummary,
    /// Logical failure payload
    Fail,
}

#[derive(Debug, Clone, Copy)]
pub struct PromptAgentSpec {
    pub name: &'static str,
    pub llm_config: &'static str,
    pub result_key: &'static str,
    pub upstream_keys: &'static [&'static str],
    pub instruction: &'static str,
    pub tool: Option<&'static str>,
    pub fallback: FallbackPolicy,
}

const TRIAGE_SPEC: PromptAgentSpec = PromptAgentSpec {
    name: agents::TRIAGE,
    llm_config: "triage",
    result_key: metadata_keys::TRIAGE_RESULT,
    upstream_keys: &[],
    instruction: "Classify the request: category, priority, and the data needed to answer it.",
    tool: None,
    fallback: FallbackPolicy::RuleBasedTriage,
};

const DATA_SPEC: PromptAgentSpec = PromptAgentSpec {
    name: agents::DATA,
    llm_config: "data",
    result_key: metadata_keys::DATA_RESULT,
    upstream_keys: &[metadata_keys::TRIAGE_RESULT],
    instruction: "Analyse the available usage data and summarise the relevant metrics.",
    tool: Some("data_query"),
    fallback: FallbackPolicy::Fail,
};

const OPTIMIZATION_SPEC: PromptAgentSpec = PromptAgentSpec {
    name: agents::OPTIMIZATION,
    llm_config: "optimizations_core",
    result_key: metadata_keys::OPTIMIZATIONS_RESULT,
    upstream_keys: &[metadata_keys::TRIAGE_RESULT, metadata_keys::DATA_RESULT],
    instruction: "Propose ranked optimizations with expected impact.",
    tool: None,
    fallback: FallbackPolicy::Fail,
};

const ACTIONS_SPEC: PromptAgentSpec = PromptAgentSpec {
    name: agents::ACTIONS,
    llm_config: "actions",
    result_key: metadata_keys::ACTION_PLAN_RESULT,
    upstream_keys: &[
        metadata_keys::TRIAGE_RESULT,
        metadata_keys::DATA_RESULT,
        metadata_keys::OPTIMIZATIONS_RESULT,
    ],
    instruction: "Turn the findings into an ordered action plan.",
    tool: None,
    fallback: FallbackPolicy::Fail,
};

const REPORTING_SPEC: PromptAgentSpec = PromptAgentSpec {
    name: agents::REPORTING,
    llm_config: "reporting",
    result_key: metadata_keys::REPORT_RESULT,
    upstream_keys: &[
        metadata_keys::TRIAGE_RESULT,
        metadata_keys::DATA_RESULT,
        metadata_keys::OPTIMIZATIONS_RESULT,
        metadata_keys::ACTION_PLAN_RESULT,
    ],
    instruction: "Write the final report for the user.",
    tool: None,
    fallback: FallbackPolicy::UpstreamSummary,
};

const GOALS_TRIAGE_SPEC: PromptAgentSpec = PromptAgentSpec {
    name: agents::GOALS_TRIAGE,
    llm_config: "goals_triage",
    result_key: metadata_keys::GOAL_TRIAGE_RESULTS,
    upstream_keys: &[metadata_keys::TRIAGE_RESULT],
    instruction: "List the user's goals in priority order.",
    tool: None,
    fallback: FallbackPolicy::Fail,
};

const DATA_HELPER_SPEC: PromptAgentSpec = PromptAgentSpec {
    name: agents::DATA_HELPER,
    llm_config: "data_helper",
    result_key: metadata_keys::DATA_HELPER_RESULT,
    upstream_keys: &[metadata_keys::TRIAGE_RESULT],
    instruction: "Describe the additional data the user must provide.",
    tool: None,
    fallback: FallbackPolicy::Fail,
};

const SYNTHETIC_DATA_SPEC: PromptAgentSpec = PromptAgentSpec {
    name: agents::SYNTHETIC_DATA,
    llm_config: "synthetic_data",
    result_key: metadata_keys::SYNTHETIC_DATA_RESULT,
    upstream_keys: &[metadata_keys::TRIAGE_RESULT],
    instruction: "Describe a synthetic dataset matching the request.",
    tool: Some("synthetic_data_generator"),
    fallback: FallbackPolicy::Fail,
};

/// Specs for every agent registered by default, core agents first
pub fn default_agent_specs() -> &'static [PromptAgentSpec] {
    &[
        TRIAGE_SPEC,
        DATA_SPEC,
        OPTIMIZATION_SPEC,
        ACTIONS_SPEC,
        REPORTING_SPEC,
        GOALS_TRIAGE_SPEC,
        DATA_HELPER_SPEC,
        SYNTHETIC_DATA_SPEC,
    ]
}

/// LLM-backed agent driven by a [`PromptAgentSpec`]
pub struct PromptAgent {
    spec: PromptAgentSpec,
    deps: AgentDependencies,
}

impl PromptAgent {
    pub fn new(spec: PromptAgentSpec, deps: AgentDependencies) -> Self {
        Self { spec, deps }
    }

    pub fn shared(spec: PromptAgentSpec, deps: &AgentDependencies) -> Arc<dyn SubAgent> {
        Arc::new(Self::new(spec, deps.clone()))
    }

    pub fn spec(&self) -> &PromptAgentSpec {
        &self.spec
    }

    fn upstream_results(&self, context: &ExecutionContext) -> Metadata {
        self.spec
            .upstream_keys
            .iter()
            .filter_map(|key| {
                context
                    .metadata
                    .get(*key)
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect()
    }

    fn build_prompt(&self, user_request: &str, upstream: &Metadata) -> String {
        format!(
            "{}\n\nUser request:\n{}\n\nUpstream results:\n{}\n\nRespond with a single JSON object.",
            self.spec.instruction,
            user_request,
            Value::Object(upstream.clone())
        )
    }

    async fn run_tool(&self, context: &ExecutionContext, user_request: &str, upstream: &mut Metadata) {
        let Some(tool_name) = self.spec.tool else {
            return;
        };
        if !self.deps.tools.has_tool(tool_name) {
            debug!(agent_name = %self.spec.name, tool_name = %tool_name, "Tool not registered - skipping");
            return;
        }

        let params = json!({
            "user_id": context.user_id,
            "user_request": user_request,
        });
        match self
            .deps
            .tools
            .dispatch_tool_for(self.spec.name, tool_name, params)
            .await
        {
            Ok(result) => {
                upstream.insert("tool_result".to_string(), result);
            }
            Err(e) => {
                warn!(agent_name = %self.spec.name, tool_name = %tool_name, error = %e, "Tool call failed");
                upstream.insert("tool_error".to_string(), Value::String(e.to_string()));
            }
        }
    }

    fn fallback_payload(&self, user_request: &str, upstream: &Metadata, error: &str) -> Value {
        match self.spec.fallback {
            FallbackPolicy::RuleBasedTriage => json!({
                "category": classify_request(user_request),
                "priority": "medium",
                "confidence": 0.5,
                "fallback": true,
                "llm_error": error,
            }),
            FallbackPolicy::UpstreamSummary => json!({
                "summary": format!(
                    "Report assembled from {} upstream result(s)",
                    upstream.len()
                ),
                "sections": Value::Object(upstream.clone()),
                "fallback": true,
                "llm_error": error,
            }),
            FallbackPolicy::Fail => json!({
                "status": status::FAILED,
                "error": error,
            }),
        }
    }
}

#[async_trait]
impl SubAgent for PromptAgent {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn capabilities(&self) -> AgentCapabilities {
        let capabilities = AgentCapabilities::llm_agent();
        if self.spec.tool.is_some() {
            capabilities.with_tools()
        } else {
            capabilities
        }
    }

    async fn execute(&self, context: &mut ExecutionContext, stream_updates: bool) -> Result<Value> {
        let user_request = context
            .metadata_str(metadata_keys::USER_REQUEST)
            .unwrap_or_default()
            .to_string();
        let mut upstream = self.upstream_results(context);

        self.run_tool(context, &user_request, &mut upstream).await;

        if stream_updates {
            emit_best_effort(
                self.deps.notifier.as_ref(),
                AgentEventType::AgentThinking,
                &context.run_id,
                self.spec.name,
                json!({ "phase": "llm_request", "upstream_results": upstream.len() }),
            )
            .await;
        }

        let prompt = self.build_prompt(&user_request, &upstream);
        let payload = match self.deps.llm.ask_llm(&prompt, self.spec.llm_config).await {
            Ok(response) => {
                let mut payload = extract_json_object(&response)
                    .unwrap_or_else(|| json!({ "raw_response": response }));
                if let Value::Object(map) = &mut payload {
                    map.entry("status".to_string())
                        .or_insert_with(|| Value::String(status::COMPLETED.to_string()));
                }
                payload
            }
            Err(e) => {
                warn!(agent_name = %self.spec.name, error = %e, "LLM request failed - using fallback");
                self.fallback_payload(&user_request, &upstream, &e.to_string())
            }
        };

        if payload.get("status").and_then(Value::as_str) != Some(status::FAILED) {
            context
                .metadata
                .insert(self.spec.result_key.to_string(), payload.clone());
        }

        Ok(payload)
    }
}

/// Keyword classification used when triage cannot reach the LLM
pub fn classify_request(user_request: &str) -> &'static str {
    let request = user_request.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| request.contains(w));

    if mentions(&["cost", "spend", "budget", "price"]) {
        "cost_optimization"
    } else if mentions(&["latency", "performance", "slow", "throughput"]) {
        "performance_optimization"
    } else if mentions(&["usage", "report", "metric", "data"]) {
        "data_analysis"
    } else {
        "general_inquiry"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SupervisorError;
    use crate::events::NoopNotificationBridge;
    use crate::models::NamedDbSession;
    use crate::services::{HostState, LlmManager, RequestToolDispatcher, ToolRegistry};

    struct FixedLlm(std::result::Result<&'static str, &'static str>);

    #[async_trait]
    impl LlmManager for FixedLlm {
        async fn ask_llm(&self, _prompt: &str, _config: &str) -> Result<String> {
            self.0
                .map(str::to_string)
                .map_err(|e| SupervisorError::Llm(e.to_string()))
        }
    }

    fn deps(llm: FixedLlm) -> AgentDependencies {
        let context = ExecutionContext::new("u", "t", "r");
        AgentDependencies {
            llm: Arc::new(llm),
            tools: Arc::new(RequestToolDispatcher::build(
                &ToolRegistry::new(),
                &HostState::default(),
                Arc::new(NoopNotificationBridge),
                &context,
            )),
            notifier: Arc::new(NoopNotificationBridge),
        }
    }

    fn context() -> ExecutionContext {
        ExecutionContext::new("u", "t", "r")
            .with_db_session(NamedDbSession::handle("db"))
            .with_metadata_entry("user_request", json!("Our cloud spend doubled"))
    }

    #[tokio::test]
    async fn test_success_writes_result_key() {
        let agent = PromptAgent::new(TRIAGE_SPEC, deps(FixedLlm(Ok(r#"{"category": "cost"}"#))));
        let mut ctx = context();

        let payload = agent.execute(&mut ctx, false).await.unwrap();

        assert_eq!(payload["category"], "cost");
        assert_eq!(payload["status"], "completed");
        assert_eq!(ctx.metadata["triage_result"], payload);
    }

    #[tokio::test]
    async fn test_malformed_json_is_wrapped() {
        let agent = PromptAgent::new(DATA_SPEC, deps(FixedLlm(Ok("not json at all"))));
        let mut ctx = context();

        let payload = agent.execute(&mut ctx, false).await.unwrap();
        assert_eq!(payload["raw_response"], "not json at all");
    }

    #[tokio::test]
    async fn test_triage_falls_back_to_rules() {
        let agent = PromptAgent::new(TRIAGE_SPEC, deps(FixedLlm(Err("timeout"))));
        let mut ctx = context();

        let payload = agent.execute(&mut ctx, true).await.unwrap();
        assert_eq!(payload["category"], "cost_optimization");
        assert_eq!(payload["fallback"], true);
        assert!(ctx.metadata.contains_key("triage_result"));
    }

    #[tokio::test]
    async fn test_non_fallback_agent_reports_logical_failure() {
        let agent = PromptAgent::new(OPTIMIZATION_SPEC, deps(FixedLlm(Err("timeout"))));
        let mut ctx = context();

        let payload = agent.execute(&mut ctx, false).await.unwrap();
        assert_eq!(payload["status"], "failed");
        assert!(!ctx.metadata.contains_key("optimizations_result"));
    }

    #[test]
    fn test_default_specs_cover_core_and_optional_agents() {
        let names: Vec<&str> = default_agent_specs().iter().map(|s| s.name).collect();
        for agent in agents::CORE_AGENTS.iter().chain(agents::OPTIONAL_AGENTS.iter()) {
            assert!(names.contains(agent), "missing default agent {agent}");
        }
    }

    #[test]
    fn test_classify_request() {
        assert_eq!(classify_request("reduce my BUDGET"), "cost_optimization");
        assert_eq!(classify_request("api is slow"), "performance_optimization");
        assert_eq!(classify_request("show usage"), "data_analysis");
        assert_eq!(classify_request("hello"), "general_inquiry");
    }
}
