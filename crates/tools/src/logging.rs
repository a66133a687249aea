//! A middleware that logs each tool invocation and passes it on unchanged.

use async_trait::async_trait;
use gena_core::error::ToolError;
use gena_core::tool::{Params, Tool, ToolMiddleware, ToolMiddlewareResult};
use tracing::info;

pub struct LoggingMiddleware;

#[async_trait]
impl ToolMiddleware for LoggingMiddleware {
    async fn execute(&self, params: Params, tool: &Tool) -> Result<ToolMiddlewareResult, ToolError> {
        info!(
            tool = tool.name(),
            params = %serde_json::Value::Object(params.clone()),
            "Tool invoked"
        );
        Ok(ToolMiddlewareResult::Continue(params))
    }
}
