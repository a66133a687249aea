//! Error types for the Gena domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] is what
//! `Agent::ask` hands back to the caller.

use thiserror::Error;

/// The top-level error type for all Gena operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Thread store errors ---
    #[error("Thread store error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Loop errors ---
    #[error("No choices returned from provider")]
    NoChoices,

    #[error("Finish reason was function_call but the message carries no function call")]
    MissingFunctionCall,

    #[error("Too many iterations without a final answer (limit: {limit})")]
    IterationLimit { limit: u32 },

    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether this is an HTTP 429-equivalent response.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Failed to decode parameters: {0}")]
    Decode(String),

    #[error("No handler defined for tool: {0}")]
    NoHandler(String),

    #[error("Duplicate tool name: {0}")]
    Duplicate(String),

    #[error("Middleware failed for {tool_name}: {reason}")]
    Middleware { tool_name: String, reason: String },

    /// A business error raised by a handler. The model gets to see it.
    #[error("{0}")]
    Execution(String),
}

impl ToolError {
    /// Shorthand for a handler-level business error.
    pub fn execution(message: impl std::fmt::Display) -> Self {
        Self::Execution(message.to_string())
    }

    /// Handler errors, including a missing handler, are reported back to the
    /// model; every other variant aborts the dispatch of that call.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ToolError::Execution(_) | ToolError::NoHandler(_))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Thread store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Thread store is corrupted at line {line}: {reason}")]
    Corrupted { line: usize, reason: String },

    #[error("Failed to serialize message: {0}")]
    Serialization(String),
}
