//! LLM manager interface consumed by sub-agents.
//!
//! The orchestration core never calls the LLM itself; agents do, and they are
//! responsible for catching timeouts and malformed responses.

use crate::error::{Result, SupervisorError};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait LlmManager: Send + Sync {
    /// Ask the model for free-form text
    async fn ask_llm(&self, prompt: &str, llm_config_name: &str) -> Result<String>;

    /// Ask the model for a JSON object
    async fn ask_structured(&self, prompt: &str, llm_config_name: &str) -> Result<Value> {
        let response = self.ask_llm(prompt, llm_config_name).await?;
        extract_json_object(&response).ok_or_else(|| {
            SupervisorError::Llm(format!(
                "response from '{llm_config_name}' did not contain a JSON object"
            ))
        })
    }
}

/// Parse the first JSON object embedded in a model response
///
/// Handles fenced code blocks and leading prose.
pub fn extract_json_object(response: &str) -> Option<Value> {
    let trimmed = response.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&trimmed[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}
