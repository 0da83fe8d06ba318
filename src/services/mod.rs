//! # Collaborator Services
//!
//! Narrow interfaces to the services the orchestration core treats as black
//! boxes: the LLM manager, tool dispatch and the managed database session.

pub mod llm;
pub mod session;
pub mod tools;

pub use llm::{extract_json_object, LlmManager};
pub use session::{with_managed_session, PassthroughSessionProvider, SessionLease, SessionProvider};
pub use tools::{
    HostState, RequestToolDispatcher, Tool, ToolBridgeFactory, ToolDispatcher, ToolRegistry,
};
