//! Provider trait: the abstraction over the completion endpoint.
//!
//! A Provider knows how to send a message list plus tool definitions to an
//! LLM and get back one or more choices. The agent loop treats it as a
//! black-box request/response function.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ProviderError;
use crate::message::Message;

/// A single completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The conversation messages, system prompt first
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic)
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Normal completion
    Stop,
    /// The model wants one or more tools invoked
    ToolCalls,
    /// Legacy single function call
    FunctionCall,
    /// Truncated at max tokens
    Length,
    /// Filtered by the provider
    ContentFilter,
    /// Anything the provider invents later
    Other(String),
}

impl FinishReason {
    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::ToolCalls => "tool_calls",
            FinishReason::FunctionCall => "function_call",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Other(s) => s,
        }
    }
}

impl From<&str> for FinishReason {
    fn from(s: &str) -> Self {
        match s {
            "stop" => FinishReason::Stop,
            "tool_calls" => FinishReason::ToolCalls,
            "function_call" => FinishReason::FunctionCall,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FinishReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FinishReason {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FinishReason::from(s.as_str()))
    }
}

/// One candidate answer from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,

    /// The generated assistant message
    pub message: Message,

    /// Why generation stopped
    pub finish_reason: FinishReason,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Candidate answers; the agent uses the first one
    pub choices: Vec<Choice>,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    #[serde(default)]
    pub model: String,
}

impl ProviderResponse {
    /// A response with a single choice.
    pub fn single(message: Message, finish_reason: FinishReason) -> Self {
        Self {
            choices: vec![Choice {
                index: 0,
                message,
                finish_reason,
            }],
            usage: None,
            model: String::new(),
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The agent loop calls `complete()` without knowing which backend is in use.
/// Implementations must map HTTP 429 (or its equivalent) to
/// [`ProviderError::RateLimited`]; that is the only error the loop retries.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reason_parses_known_and_unknown() {
        assert_eq!(FinishReason::from("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::from("tool_calls"), FinishReason::ToolCalls);
        assert_eq!(FinishReason::from("function_call"), FinishReason::FunctionCall);
        assert_eq!(FinishReason::from("length"), FinishReason::Length);
        assert_eq!(
            FinishReason::from("eos_token"),
            FinishReason::Other("eos_token".into())
        );
    }

    #[test]
    fn finish_reason_serializes_as_wire_string() {
        let json = serde_json::to_string(&FinishReason::ToolCalls).unwrap();
        assert_eq!(json, "\"tool_calls\"");
        let parsed: FinishReason = serde_json::from_str("\"content_filter\"").unwrap();
        assert_eq!(parsed, FinishReason::ContentFilter);
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "square_root".into(),
            description: "Computes a square root".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": { "x": { "type": "number" } },
                "required": ["x"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("square_root"));
        assert!(json.contains("\"x\""));
    }

    #[test]
    fn single_choice_response() {
        let resp = ProviderResponse::single(Message::assistant("hi"), FinishReason::Stop);
        assert_eq!(resp.choices.len(), 1);
        assert_eq!(resp.choices[0].finish_reason, FinishReason::Stop);
    }
}
