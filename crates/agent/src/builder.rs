//! Fluent construction of an [`Agent`].

use std::sync::Arc;

use gena_core::error::{Error, Result};
use gena_core::provider::Provider;
use gena_core::thread::ThreadStore;
use gena_core::tool::{Tool, ToolRegistry};
use gena_providers::{OPENAI_BASE_URL, OpenAiCompatProvider};
use gena_threads::InMemoryThreadStore;

use crate::agent::Agent;
use crate::retry::RetryPolicy;

/// Iteration cap used when none (or zero) is configured.
pub const DEFAULT_MAX_ITERATIONS: u32 = 64;

/// Temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.6;

/// Builder for [`Agent`]. Everything is optional except the model and,
/// unless a provider is injected, the API key.
pub struct AgentBuilder {
    api_key: Option<String>,
    api_url: Option<String>,
    model: Option<String>,
    system_prompt: String,
    max_tokens: Option<u32>,
    temperature: f32,
    max_iterations: u32,
    retry: RetryPolicy,
    store: Option<Arc<dyn ThreadStore>>,
    provider: Option<Arc<dyn Provider>>,
    log_dispatch: Option<tracing::Dispatch>,
    tools: Vec<Tool>,
    report_dispatch_errors: bool,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: None,
            model: None,
            system_prompt: String::new(),
            max_tokens: None,
            temperature: DEFAULT_TEMPERATURE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            retry: RetryPolicy::default(),
            store: None,
            provider: None,
            log_dispatch: None,
            tools: Vec::new(),
            report_dispatch_errors: false,
        }
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the OpenAI-compatible base URL (e.g. a local gateway).
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Completions allowed per `ask`. Zero restores the default.
    pub fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn thread_store(mut self, store: Arc<dyn ThreadStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use this provider instead of building an OpenAI client.
    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Route the agent's logs to this dispatcher instead of the global one.
    pub fn log_dispatch(mut self, dispatch: tracing::Dispatch) -> Self {
        self.log_dispatch = Some(dispatch);
        self
    }

    pub fn tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Report unknown tools, bad arguments and other dispatch failures to the
    /// model as `"error: ..."` results instead of failing the `ask`.
    pub fn report_dispatch_errors(mut self, enabled: bool) -> Self {
        self.report_dispatch_errors = enabled;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| Error::config("model is required"))?;

        let provider = match self.provider {
            Some(provider) => provider,
            None => {
                let key = self
                    .api_key
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| Error::config("api key is required"))?;
                let url = self.api_url.as_deref().unwrap_or(OPENAI_BASE_URL);
                Arc::new(OpenAiCompatProvider::new("openai", url, key))
            }
        };

        let mut tools = ToolRegistry::new();
        for tool in self.tools {
            tools
                .register(tool)
                .map_err(|e| Error::config(e.to_string()))?;
        }

        let max_iterations = match self.max_iterations {
            0 => DEFAULT_MAX_ITERATIONS,
            n => n,
        };

        Ok(Agent {
            provider,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryThreadStore::new())),
            tools,
            model,
            system_prompt: self.system_prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            max_iterations,
            retry: self.retry,
            log_dispatch: self.log_dispatch,
            report_dispatch_errors: self.report_dispatch_errors,
        })
    }
}
