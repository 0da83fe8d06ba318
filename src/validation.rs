//! Input validation for the orchestration core
//!
//! Precondition checks run at the top of every execution entry point, plus
//! size and depth bounds for caller-supplied metadata payloads.

use crate::constants::PLACEHOLDER_IDENTIFIERS;
use crate::error::{Result, SupervisorError};
use crate::models::ExecutionContext;
use serde_json::Value;

/// Maximum allowed size for a metadata payload (1MB)
const MAX_METADATA_SIZE_BYTES: usize = 1024 * 1024;

/// Maximum nesting depth for metadata objects/arrays
const MAX_METADATA_DEPTH: usize = 10;

/// Maximum number of keys in a metadata object
const MAX_METADATA_KEYS: usize = 1000;

/// Reject contexts missing identity fields or a database session
pub fn validate_user_context(context: &ExecutionContext) -> Result<()> {
    validate_identifier("user_id", &context.user_id)?;
    validate_identifier("thread_id", &context.thread_id)?;
    validate_identifier("run_id", &context.run_id)?;

    if context.db_session.is_none() {
        return Err(SupervisorError::MissingDbSession {
            user_id: context.user_id.clone(),
        });
    }

    Ok(())
}

fn validate_identifier(field: &str, value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SupervisorError::InvalidContext(format!(
            "{field} must be a non-empty string"
        )));
    }
    if PLACEHOLDER_IDENTIFIERS.contains(&trimmed) {
        return Err(SupervisorError::InvalidContext(format!(
            "{field} contains placeholder value '{trimmed}'"
        )));
    }
    Ok(())
}

/// Validate a metadata payload for size and structural constraints
pub fn validate_metadata_payload(value: &Value) -> Result<()> {
    let serialized = serde_json::to_string(value)?;

    if serialized.len() > MAX_METADATA_SIZE_BYTES {
        return Err(SupervisorError::InvalidContext(format!(
            "metadata payload too large: {} bytes (max: {})",
            serialized.len(),
            MAX_METADATA_SIZE_BYTES
        )));
    }

    validate_depth(value, 0)
}

fn validate_depth(value: &Value, current_depth: usize) -> Result<()> {
    if current_depth > MAX_METADATA_DEPTH {
        return Err(SupervisorError::InvalidContext(format!(
            "metadata nesting too deep: {current_depth} (max: {MAX_METADATA_DEPTH})"
        )));
    }

    match value {
        Value::Object(map) => {
            if map.len() > MAX_METADATA_KEYS {
                return Err(SupervisorError::InvalidContext(format!(
                    "too many metadata keys: {} (max: {})",
                    map.len(),
                    MAX_METADATA_KEYS
                )));
            }
            map.values()
                .try_for_each(|v| validate_depth(v, current_depth + 1))
        }
        Value::Array(items) => items
            .iter()
            .try_for_each(|v| validate_depth(v, current_depth + 1)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NamedDbSession;
    use serde_json::json;

    fn valid_context() -> ExecutionContext {
        ExecutionContext::new("user-1", "thread-1", "run-1")
            .with_db_session(NamedDbSession::handle("db"))
    }

    #[test]
    fn test_valid_context_passes() {
        assert!(validate_user_context(&valid_context()).is_ok());
    }

    #[test]
    fn test_empty_identifiers_rejected() {
        let mut ctx = valid_context();
        ctx.user_id = "  ".to_string();
        assert!(matches!(
            validate_user_context(&ctx),
            Err(SupervisorError::InvalidContext(msg)) if msg.contains("user_id")
        ));

        let mut ctx = valid_context();
        ctx.thread_id = String::new();
        assert!(validate_user_context(&ctx).is_err());

        let mut ctx = valid_context();
        ctx.run_id = "None".to_string();
        assert!(matches!(
            validate_user_context(&ctx),
            Err(SupervisorError::InvalidContext(msg)) if msg.contains("placeholder")
        ));
    }

    #[test]
    fn test_missing_db_session_rejected() {
        let ctx = ExecutionContext::new("user-1", "thread-1", "run-1");
        assert!(matches!(
            validate_user_context(&ctx),
            Err(SupervisorError::MissingDbSession { user_id }) if user_id == "user-1"
        ));
    }

    #[test]
    fn test_metadata_depth_limit() {
        let mut nested = json!("leaf");
        for _ in 0..12 {
            nested = json!({ "inner": nested });
        }
        assert!(validate_metadata_payload(&nested).is_err());
        assert!(validate_metadata_payload(&json!({"a": {"b": [1, 2, 3]}})).is_ok());
    }
}
