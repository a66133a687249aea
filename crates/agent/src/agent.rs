//! The agent control loop.

use std::sync::Arc;

use gena_core::error::{Error, Result};
use gena_core::message::Message;
use gena_core::provider::{FinishReason, Provider, ProviderRequest};
use gena_core::thread::ThreadStore;
use gena_core::tool::ToolRegistry;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{debug, info, warn};

use crate::builder::AgentBuilder;
use crate::dispatch::{dispatch, encode_result, error_value};
use crate::retry::RetryPolicy;

/// Drives a conversation with the model until it answers.
///
/// Each completion is persisted to the thread store before it is acted on,
/// so the thread stays inspectable after a failed `ask`.
pub struct Agent {
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) store: Arc<dyn ThreadStore>,
    pub(crate) tools: ToolRegistry,
    pub(crate) model: String,
    pub(crate) system_prompt: String,
    pub(crate) temperature: f32,
    pub(crate) max_tokens: Option<u32>,
    pub(crate) max_iterations: u32,
    pub(crate) retry: RetryPolicy,
    pub(crate) log_dispatch: Option<tracing::Dispatch>,
    pub(crate) report_dispatch_errors: bool,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.names()
    }

    /// The store holding this agent's thread.
    pub fn thread_store(&self) -> Arc<dyn ThreadStore> {
        self.store.clone()
    }

    /// Append `question` to the thread and run until the model answers.
    pub async fn ask(&self, question: impl Into<String>) -> Result<String> {
        self.run(question.into(), None).await
    }

    /// Like [`Agent::ask`], but stops with [`Error::Cancelled`] once `token`
    /// fires. Provider calls and backoff sleeps are interrupted; a running
    /// tool handler is allowed to finish.
    pub async fn ask_with_cancellation(
        &self,
        question: impl Into<String>,
        token: &CancellationToken,
    ) -> Result<String> {
        self.run(question.into(), Some(token)).await
    }

    async fn run(&self, question: String, cancel: Option<&CancellationToken>) -> Result<String> {
        let fut = self.ask_loop(question, cancel);
        match &self.log_dispatch {
            Some(dispatch) => fut.with_subscriber(dispatch.clone()).await,
            None => fut.await,
        }
    }

    async fn ask_loop(&self, question: String, cancel: Option<&CancellationToken>) -> Result<String> {
        info!(model = %self.model, tools = self.tools.len(), "Agent ask started");
        self.store.add_message(Message::user(question)).await?;

        for iteration in 1..=self.max_iterations {
            debug!(iteration, "Requesting completion");

            let request = self.build_request().await?;
            let provider = &self.provider;
            let request = &request;
            let response = self
                .retry
                .run(cancel, move || provider.complete(request.clone()))
                .await?;

            let choice = response
                .choices
                .into_iter()
                .next()
                .ok_or(Error::NoChoices)?;
            let message = choice.message;
            self.store.add_message(message.clone()).await?;

            debug!(
                iteration,
                finish_reason = %choice.finish_reason,
                tool_calls = message.tool_calls.len(),
                "Completion received"
            );

            match choice.finish_reason {
                FinishReason::ToolCalls => {
                    for call in &message.tool_calls {
                        let content = self.dispatch_call(&call.name, &call.arguments).await?;
                        self.store
                            .add_message(Message::tool_result(&call.id, &call.name, content))
                            .await?;
                    }
                }
                FinishReason::FunctionCall => {
                    let call = message
                        .function_call
                        .as_ref()
                        .ok_or(Error::MissingFunctionCall)?;
                    let content = self.dispatch_call(&call.name, &call.arguments).await?;
                    self.store
                        .add_message(Message::user(format!(
                            "Function '{}' result: {}",
                            call.name, content
                        )))
                        .await?;
                }
                FinishReason::Stop => {
                    info!(iteration, "Agent ask finished");
                    return Ok(message.content);
                }
                other => {
                    info!(iteration, finish_reason = %other, "Agent ask finished");
                    if message.content.is_empty() {
                        return Ok(String::new());
                    }
                    self.store
                        .add_message(Message::assistant(message.content.clone()))
                        .await?;
                    return Ok(message.content);
                }
            }
        }

        warn!(limit = self.max_iterations, "Iteration limit reached");
        Err(Error::IterationLimit {
            limit: self.max_iterations,
        })
    }

    /// System prompt first, then the stored thread.
    async fn build_request(&self) -> Result<ProviderRequest> {
        let thread = self.store.snapshot().await?;
        let mut messages = Vec::with_capacity(thread.len() + 1);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(thread);

        Ok(ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.definitions(),
        })
    }

    async fn dispatch_call(&self, name: &str, arguments: &str) -> Result<String> {
        match dispatch(&self.tools, name, arguments).await {
            Ok(content) => Ok(content),
            Err(e) if self.report_dispatch_errors => {
                warn!(tool = name, error = %e, "Tool dispatch failed, reporting to model");
                Ok(encode_result(error_value(&e))?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("provider", &self.provider.name())
            .field("store", &self.store.name())
            .field("model", &self.model)
            .field("tools", &self.tools.names())
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}
