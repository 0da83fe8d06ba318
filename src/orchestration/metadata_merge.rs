//! # Metadata Merge-Back
//!
//! After an agent completes, selected keys from its child context are copied
//! into the parent so later agents can read upstream results.
//!
//! - Keys mapped to the agent (plus `{agent}_result`) always overwrite.
//! - Any other key ending in `_result` or `_results` is copied only when the
//!   parent does not have it yet.

use crate::constants::{mapped_result_keys, metadata_keys::RESULT_SUFFIXES};
use crate::models::ExecutionContext;
use tracing::debug;

/// Copy agent results from `child` into `parent`; returns the keys written
pub fn merge_child_metadata_to_parent(
    parent: &mut ExecutionContext,
    child: &ExecutionContext,
    agent_name: &str,
) -> Vec<String> {
    let generic_key = format!("{agent_name}_result");
    let mut mapped: Vec<&str> = mapped_result_keys(agent_name).to_vec();
    if !mapped.contains(&generic_key.as_str()) {
        mapped.push(&generic_key);
    }

    let mut merged = Vec::new();

    for key in &mapped {
        if let Some(value) = child.metadata.get(*key) {
            parent.metadata.insert(key.to_string(), value.clone());
            merged.push(key.to_string());
        }
    }

    for (key, value) in &child.metadata {
        if mapped.contains(&key.as_str()) || !is_result_key(key) {
            continue;
        }
        if !parent.metadata.contains_key(key) {
            parent.metadata.insert(key.clone(), value.clone());
            merged.push(key.clone());
        }
    }

    debug!(
        agent_name = %agent_name,
        run_id = %parent.run_id,
        merged_keys = ?merged,
        "Merged child metadata into parent context"
    );

    merged
}

fn is_result_key(key: &str) -> bool {
    RESULT_SUFFIXES.iter().any(|suffix| key.ends_with(suffix))
}
