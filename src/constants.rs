//! # System Constants
//!
//! Agent names, the default execution order, the critical agent set and the
//! well-known metadata keys shared by the registry, executor and merge logic.

/// Names of the agents the supervisor knows how to build
pub mod agents {
    pub const TRIAGE: &str = "triage";
    pub const DATA: &str = "data";
    pub const OPTIMIZATION: &str = "optimization";
    pub const ACTIONS: &str = "actions";
    pub const REPORTING: &str = "reporting";
    pub const GOALS_TRIAGE: &str = "goals_triage";
    pub const DATA_HELPER: &str = "data_helper";
    pub const SYNTHETIC_DATA: &str = "synthetic_data";

    /// Core agents registered for every request
    pub const CORE_AGENTS: [&str; 5] = [TRIAGE, DATA, OPTIMIZATION, ACTIONS, REPORTING];

    /// Optional agents registered alongside the core set
    pub const OPTIONAL_AGENTS: [&str; 3] = [GOALS_TRIAGE, DATA_HELPER, SYNTHETIC_DATA];
}

/// Default linear execution order
pub const DEFAULT_EXECUTION_ORDER: [&str; 5] = [
    agents::TRIAGE,
    agents::DATA,
    agents::OPTIMIZATION,
    agents::ACTIONS,
    agents::REPORTING,
];

/// Agents whose failure or unmet dependencies abort the rest of the workflow
pub const DEFAULT_CRITICAL_AGENTS: [&str; 2] = [agents::TRIAGE, agents::DATA];

/// Default prerequisite table, as `(agent, prerequisites)`
pub const DEFAULT_AGENT_DEPENDENCIES: [(&str, &[&str]); 4] = [
    (agents::DATA, &[agents::TRIAGE]),
    (agents::OPTIMIZATION, &[agents::TRIAGE, agents::DATA]),
    (agents::ACTIONS, &[agents::TRIAGE, agents::DATA]),
    (agents::REPORTING, &[agents::TRIAGE, agents::DATA]),
];

/// Minimum wall-clock time per agent before the pacing delay stops applying
pub const DEFAULT_MIN_AGENT_DURATION_MS: u64 = 500;

/// Metadata keys written by the orchestration core
pub mod metadata_keys {
    pub const OPERATION_NAME: &str = "operation_name";
    pub const AGENT_NAME: &str = "agent_name";
    pub const FLOW_ID: &str = "flow_id";
    pub const PARENT_REQUEST_ID: &str = "parent_request_id";
    pub const OPERATION_DEPTH: &str = "operation_depth";
    pub const WORKFLOW_METADATA: &str = "_workflow_metadata";
    pub const USER_REQUEST: &str = "user_request";

    pub const TRIAGE_RESULT: &str = "triage_result";
    pub const GOAL_TRIAGE_RESULTS: &str = "goal_triage_results";
    pub const DATA_RESULT: &str = "data_result";
    pub const DATA_ANALYSIS_RESULT: &str = "data_analysis_result";
    pub const OPTIMIZATIONS_RESULT: &str = "optimizations_result";
    pub const OPTIMIZATION_RESULT: &str = "optimization_result";
    pub const ACTION_PLAN_RESULT: &str = "action_plan_result";
    pub const ACTIONS_RESULT: &str = "actions_result";
    pub const REPORT_RESULT: &str = "report_result";
    pub const REPORTING_RESULT: &str = "reporting_result";
    pub const DATA_HELPER_RESULT: &str = "data_helper_result";
    pub const SYNTHETIC_DATA_RESULT: &str = "synthetic_data_result";

    /// Suffixes that mark an unmapped key as an agent result
    pub const RESULT_SUFFIXES: [&str; 2] = ["_result", "_results"];
}

/// Explicit child → parent merge mapping per agent
pub fn mapped_result_keys(agent_name: &str) -> &'static [&'static str] {
    use metadata_keys::*;
    match agent_name {
        agents::TRIAGE => &[TRIAGE_RESULT, GOAL_TRIAGE_RESULTS],
        agents::DATA => &[DATA_RESULT, DATA_ANALYSIS_RESULT],
        agents::OPTIMIZATION => &[OPTIMIZATIONS_RESULT, OPTIMIZATION_RESULT],
        agents::ACTIONS => &[ACTION_PLAN_RESULT, ACTIONS_RESULT],
        agents::REPORTING => &[REPORT_RESULT, REPORTING_RESULT],
        agents::GOALS_TRIAGE => &[GOAL_TRIAGE_RESULTS],
        agents::DATA_HELPER => &[DATA_HELPER_RESULT],
        agents::SYNTHETIC_DATA => &[SYNTHETIC_DATA_RESULT],
        _ => &[],
    }
}

/// Agent result status markers found in payloads
pub mod status {
    pub const FAILED: &str = "failed";
    pub const SKIPPED: &str = "skipped";
    pub const COMPLETED: &str = "completed";
}

/// Placeholder identifiers rejected by context validation
pub const PLACEHOLDER_IDENTIFIERS: [&str; 4] = ["None", "none", "null", "undefined"];
