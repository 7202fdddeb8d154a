//! Message generation: local model, cloud model, canned replies.

mod cloud;
pub mod fallback;
mod local;
mod pipeline;
mod types;


pub use cloud::CloudModelStrategy;
pub use fallback::{CannedCategory, CannedReplies};
pub use local::LocalModelStrategy;
pub use pipeline::{GenerationStrategy, MessagePipeline};
pub use types::*;

/// Pull a JSON payload out of a model completion.
///
/// Accepts raw JSON, a ```json fenced block, a bare ``` fenced block, or
/// prose surrounding a single `{...}` object.
pub(crate) fn extract_json_from_completion(completion: &str) -> Result<&str, String> {
    // Fast path: raw JSON
    let trimmed = completion.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(trimmed);
    }

    // Try ```json ... ``` blocks
    if completion.contains("```json") {
        return completion
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Found ```json block but content was empty or malformed".to_string());
    }

    // Try ``` ... ``` blocks
    if completion.contains("```") {
        return completion
            .split("```")
            .nth(1)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Found ``` block but content was empty or malformed".to_string());
    }

    // Object embedded in prose
    if let (Some(start), Some(end)) = (completion.find('{'), completion.rfind('}')) {
        if end > start {
            return Ok(&completion[start..=end]);
        }
    }

    Err(format!(
        "No JSON found in response. First 100 chars: '{}'",
        completion.chars().take(100).collect::<String>()
    ))
}
