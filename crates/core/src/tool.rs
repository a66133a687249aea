//! Tools: named, schema-described capabilities the model may invoke.
//!
//! A [`Tool`] bundles a description and parameter schema (sent to the LLM)
//! with a [`ToolHandler`] and an ordered chain of [`ToolMiddleware`]s.
//! [`Tool::run`] composes the two: middlewares see and may rewrite the
//! parameters, or stop the invocation before the handler is reached.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// Untyped key/value parameters decoded from a tool call's arguments.
pub type Params = serde_json::Map<String, Value>;

/// The capability a tool executes: takes parameters, returns a result.
///
/// Business failures should be returned as [`ToolError::Execution`]; the
/// agent turns those into tool-result text so the model can react, as it does
/// for a tool registered without a handler. Any other variant aborts the
/// dispatch of the call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn execute(&self, params: Params) -> Result<Value, ToolError>;
}

/// A handler backed by a plain closure.
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(Params) -> Result<Value, ToolError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> ToolHandler for FnHandler<F>
where
    F: Fn(Params) -> Result<Value, ToolError> + Send + Sync,
{
    async fn execute(&self, params: Params) -> Result<Value, ToolError> {
        (self.f)(params)
    }
}

/// What a middleware decided.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolMiddlewareResult {
    /// Pass these (possibly rewritten) params to the next stage.
    Continue(Params),
    /// Skip the handler and every remaining middleware; this is the result.
    Stop(Value),
}

impl ToolMiddlewareResult {
    pub fn is_stop(&self) -> bool {
        matches!(self, ToolMiddlewareResult::Stop(_))
    }
}

/// A pipeline stage run before a tool's handler.
#[async_trait]
pub trait ToolMiddleware: Send + Sync {
    async fn execute(&self, params: Params, tool: &Tool) -> Result<ToolMiddlewareResult, ToolError>;
}

/// A named capability registered with an agent.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    schema: Value,
    handler: Option<Arc<dyn ToolHandler>>,
    middlewares: Vec<Arc<dyn ToolMiddleware>>,
}

impl Tool {
    /// Create a tool with an empty object schema and no handler.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            schema: serde_json::json!({ "type": "object", "properties": {} }),
            handler: None,
            middlewares: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the JSON Schema advertised to the model. Not enforced at dispatch.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_handler(mut self, handler: impl ToolHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Use a closure as the handler.
    pub fn with_handler_fn<F>(self, f: F) -> Self
    where
        F: Fn(Params) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        self.with_handler(FnHandler::new(f))
    }

    /// Append a middleware. Middlewares run in the order they were added.
    pub fn with_middleware(mut self, middleware: impl ToolMiddleware + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.schema.clone(),
        }
    }

    /// Run the middleware chain, then the handler unless a middleware stopped.
    pub async fn run(&self, params: Params) -> Result<Value, ToolError> {
        let mut params = params;
        for middleware in &self.middlewares {
            match middleware
                .execute(params, self)
                .await
                .map_err(|e| self.middleware_error(e))?
            {
                ToolMiddlewareResult::Continue(next) => params = next,
                ToolMiddlewareResult::Stop(result) => {
                    tracing::debug!(tool = %self.name, "Middleware stopped tool invocation");
                    return Ok(result);
                }
            }
        }

        let handler = self
            .handler
            .as_ref()
            .ok_or_else(|| ToolError::NoHandler(self.name.clone()))?;
        handler.execute(params).await
    }

    fn middleware_error(&self, err: ToolError) -> ToolError {
        match err {
            ToolError::Middleware { .. } => err,
            other => ToolError::Middleware {
                tool_name: self.name.clone(),
                reason: other.to_string(),
            },
        }
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("has_handler", &self.handler.is_some())
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// An ordered registry of tools.
///
/// Order is registration order; it is the order definitions are advertised
/// to the LLM. Names are unique: registering a second tool under an existing
/// name is rejected.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Fails if the name is already taken.
    pub fn register(&mut self, tool: Tool) -> Result<(), ToolError> {
        if self.get(tool.name()).is_some() {
            return Err(ToolError::Duplicate(tool.name().to_string()));
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by exact name.
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(Tool::to_definition).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(Tool::name).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo_tool() -> Tool {
        Tool::new("echo")
            .with_description("Echoes back the input")
            .with_schema(json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            }))
            .with_handler_fn(|params| Ok(params.get("text").cloned().unwrap_or(Value::Null)))
    }

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    /// Upper-cases the "text" parameter.
    struct Shout;

    #[async_trait]
    impl ToolMiddleware for Shout {
        async fn execute(
            &self,
            mut params: Params,
            _tool: &Tool,
        ) -> Result<ToolMiddlewareResult, ToolError> {
            if let Some(Value::String(s)) = params.get_mut("text") {
                *s = s.to_uppercase();
            }
            Ok(ToolMiddlewareResult::Continue(params))
        }
    }

    struct Block;

    #[async_trait]
    impl ToolMiddleware for Block {
        async fn execute(
            &self,
            _params: Params,
            tool: &Tool,
        ) -> Result<ToolMiddlewareResult, ToolError> {
            Ok(ToolMiddlewareResult::Stop(json!(format!("{} is blocked", tool.name()))))
        }
    }

    struct Failing;

    #[async_trait]
    impl ToolMiddleware for Failing {
        async fn execute(
            &self,
            _params: Params,
            _tool: &Tool,
        ) -> Result<ToolMiddlewareResult, ToolError> {
            Err(ToolError::execution("quota exceeded"))
        }
    }

    #[tokio::test]
    async fn run_calls_handler() {
        let result = echo_tool().run(params(json!({"text": "hi"}))).await.unwrap();
        assert_eq!(result, json!("hi"));
    }

    #[tokio::test]
    async fn middleware_rewrites_params() {
        let tool = echo_tool().with_middleware(Shout);
        let result = tool.run(params(json!({"text": "hi"}))).await.unwrap();
        assert_eq!(result, json!("HI"));
    }

    #[tokio::test]
    async fn middleware_stop_skips_handler_and_rest_of_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let tool = Tool::new("guarded")
            .with_handler_fn(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!("ran"))
            })
            .with_middleware(Block)
            .with_middleware(Failing);

        let result = tool.run(Params::new()).await.unwrap();
        assert_eq!(result, json!("guarded is blocked"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn middleware_error_aborts_and_is_not_recoverable() {
        let tool = echo_tool().with_middleware(Failing);
        let err = tool.run(params(json!({"text": "hi"}))).await.unwrap_err();
        assert!(matches!(err, ToolError::Middleware { ref tool_name, .. } if tool_name == "echo"));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn tool_without_handler_is_a_recoverable_error() {
        let err = Tool::new("empty").run(Params::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::NoHandler(ref n) if n == "empty"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool()).unwrap();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool()).unwrap();
        let err = registry.register(echo_tool()).unwrap_err();
        assert!(matches!(err, ToolError::Duplicate(ref n) if n == "echo"));
        assert!(!err.is_recoverable());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_definitions_keep_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Tool::new("b")).unwrap();
        registry.register(Tool::new("a")).unwrap();
        let defs = registry.definitions();
        assert_eq!(defs[0].name, "b");
        assert_eq!(defs[1].name, "a");
        assert_eq!(defs[0].parameters["type"], "object");
    }
}
