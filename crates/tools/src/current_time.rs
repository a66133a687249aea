//! Current time tool: reports the local wall-clock time.

use async_trait::async_trait;
use gena_core::error::ToolError;
use gena_core::tool::{Params, Tool, ToolHandler};
use serde_json::Value;

/// Returns the current local time as an RFC 3339 string. Ignores its params.
pub struct CurrentTimeHandler;

#[async_trait]
impl ToolHandler for CurrentTimeHandler {
    async fn execute(&self, _params: Params) -> Result<Value, ToolError> {
        Ok(Value::String(chrono::Local::now().to_rfc3339()))
    }
}

pub fn tool() -> Tool {
    Tool::new("current_time")
        .with_description("Returns the current time")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {}
        }))
        .with_handler(CurrentTimeHandler)
}
