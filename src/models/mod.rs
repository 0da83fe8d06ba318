//! # Models
//!
//! Request-scoped data carried through orchestration.

pub mod execution_context;

pub use execution_context::{
    DatabaseSession, DbSessionHandle, ExecutionContext, Metadata, NamedDbSession,
};
