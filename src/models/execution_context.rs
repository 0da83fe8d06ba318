//! # Execution Context
//!
//! Per-request record of identity, session handle and metadata passed through
//! orchestration. Sub-agents never receive the request context itself: each
//! invocation gets a child derived with [`ExecutionContext::create_child_context`],
//! whose metadata is an owned copy. Results flow back into the parent only
//! through the explicit merge in `orchestration::metadata_merge`.

use crate::constants::metadata_keys;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Ordered string-keyed metadata map
pub type Metadata = Map<String, Value>;

/// Opaque database session owned by the request handler
pub trait DatabaseSession: Send + Sync + fmt::Debug {
    /// Identifier used in logs; carries no semantics for the core
    fn session_id(&self) -> &str;
}

pub type DbSessionHandle = Arc<dyn DatabaseSession>;

/// Per-request execution context
#[derive(Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub user_id: String,
    pub thread_id: String,
    /// Unique per execution attempt
    pub run_id: String,
    /// Unique per context instance; children get their own
    pub request_id: String,
    pub metadata: Metadata,
    #[serde(skip)]
    pub db_session: Option<DbSessionHandle>,
    pub websocket_connection_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("user_id", &self.user_id)
            .field("thread_id", &self.thread_id)
            .field("run_id", &self.run_id)
            .field("request_id", &self.request_id)
            .field("metadata_keys", &self.metadata.keys().collect::<Vec<_>>())
            .field(
                "db_session",
                &self.db_session.as_ref().map(|s| s.session_id().to_string()),
            )
            .field("websocket_connection_id", &self.websocket_connection_id)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl ExecutionContext {
    pub fn new(
        user_id: impl Into<String>,
        thread_id: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            request_id: Uuid::new_v4().to_string(),
            metadata: Metadata::new(),
            db_session: None,
            websocket_connection_id: None,
            created_at: Utc::now(),
        }
    }

    /// Context with a freshly generated run id
    pub fn for_new_run(user_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self::new(user_id, thread_id, Uuid::new_v4().to_string())
    }

    pub fn with_db_session(mut self, session: DbSessionHandle) -> Self {
        self.db_session = Some(session);
        self
    }

    pub fn with_websocket_connection_id(mut self, connection_id: impl Into<String>) -> Self {
        self.websocket_connection_id = Some(connection_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Nesting depth recorded by child derivation (0 for a request context)
    pub fn operation_depth(&self) -> u64 {
        self.metadata
            .get(metadata_keys::OPERATION_DEPTH)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Derive an isolated child context for one sub-operation
    ///
    /// Identity and session are shared; the metadata is a deep copy of the
    /// parent's, overlaid by `additional_metadata` and the lineage keys
    /// (`operation_name`, `agent_name`, `flow_id`, `parent_request_id`,
    /// `operation_depth`).
    pub fn create_child_context(
        &self,
        operation_name: &str,
        additional_metadata: Metadata,
    ) -> ExecutionContext {
        let agent_supplied = additional_metadata.contains_key(metadata_keys::AGENT_NAME);

        let mut metadata = self.metadata.clone();
        for (key, value) in additional_metadata {
            metadata.insert(key, value);
        }

        if !agent_supplied {
            metadata.insert(
                metadata_keys::AGENT_NAME.to_string(),
                Value::String(operation_name.to_string()),
            );
        }
        metadata
            .entry(metadata_keys::FLOW_ID.to_string())
            .or_insert(Value::Null);

        metadata.insert(
            metadata_keys::OPERATION_NAME.to_string(),
            Value::String(operation_name.to_string()),
        );
        metadata.insert(
            metadata_keys::PARENT_REQUEST_ID.to_string(),
            Value::String(self.request_id.clone()),
        );
        metadata.insert(
            metadata_keys::OPERATION_DEPTH.to_string(),
            Value::from(self.operation_depth() + 1),
        );

        ExecutionContext {
            user_id: self.user_id.clone(),
            thread_id: self.thread_id.clone(),
            run_id: self.run_id.clone(),
            request_id: Uuid::new_v4().to_string(),
            metadata,
            db_session: self.db_session.clone(),
            websocket_connection_id: self.websocket_connection_id.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Session handle used where the caller only needs a labelled placeholder
#[derive(Debug, Clone)]
pub struct NamedDbSession {
    id: String,
}

impl NamedDbSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn handle(id: impl Into<String>) -> DbSessionHandle {
        Arc::new(Self::new(id))
    }
}

impl DatabaseSession for NamedDbSession {
    fn session_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parent() -> ExecutionContext {
        ExecutionContext::new("user-1", "thread-1", "run-1")
            .with_db_session(NamedDbSession::handle("db-1"))
            .with_metadata_entry("user_request", json!("cut my cloud costs"))
            .with_metadata_entry(metadata_keys::FLOW_ID, json!("flow-1"))
    }

    #[test]
    fn test_child_shares_identity_but_not_request_id() {
        let parent = parent();
        let child = parent.create_child_context("triage", Metadata::new());

        assert_eq!(child.user_id, parent.user_id);
        assert_eq!(child.thread_id, parent.thread_id);
        assert_eq!(child.run_id, parent.run_id);
        assert_ne!(child.request_id, parent.request_id);
        assert!(child.db_session.is_some());
    }

    #[test]
    fn test_child_metadata_is_seeded_and_tagged() {
        let parent = parent();
        let mut extra = Metadata::new();
        extra.insert("agent_name".to_string(), json!("triage"));
        extra.insert("flow_id".to_string(), json!("flow-2"));

        let child = parent.create_child_context("execute_triage", extra);

        assert_eq!(child.metadata_str("user_request"), Some("cut my cloud costs"));
        assert_eq!(child.metadata_str("operation_name"), Some("execute_triage"));
        assert_eq!(child.metadata_str("agent_name"), Some("triage"));
        assert_eq!(child.metadata_str("flow_id"), Some("flow-2"));
        assert_eq!(
            child.metadata_str("parent_request_id"),
            Some(parent.request_id.as_str())
        );
        assert_eq!(child.operation_depth(), 1);
    }

    #[test]
    fn test_agent_name_defaults_to_operation_name() {
        let child = parent().create_child_context("data", Metadata::new());
        assert_eq!(child.metadata_str("agent_name"), Some("data"));
        assert_eq!(child.metadata_str("flow_id"), Some("flow-1"));
    }

    #[test]
    fn test_child_mutation_is_invisible_to_parent() {
        let parent = parent();
        let mut child = parent.create_child_context("triage", Metadata::new());

        child
            .metadata
            .insert("triage_result".to_string(), json!({"category": "cost"}));
        child
            .metadata
            .insert("user_request".to_string(), json!("changed"));

        assert!(!parent.metadata.contains_key("triage_result"));
        assert_eq!(parent.metadata_str("user_request"), Some("cut my cloud costs"));
    }

    #[test]
    fn test_grandchild_depth() {
        let child = parent().create_child_context("data", Metadata::new());
        let grandchild = child.create_child_context("data_helper", Metadata::new());
        assert_eq!(grandchild.operation_depth(), 2);
        assert_eq!(grandchild.metadata_str("agent_name"), Some("data_helper"));
    }
}
