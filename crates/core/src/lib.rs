//! # Gena Core
//!
//! Domain types, traits, and error definitions for the Gena agent runtime.
//! This crate has **no runtime or HTTP dependencies**; it defines the domain
//! model every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every pluggable piece (completion provider, thread store, tool handler,
//! tool middleware) is a trait here. Implementations live in their own
//! crates, so tests can swap in scripted stubs.

pub mod error;
pub mod handler;
pub mod message;
pub mod provider;
pub mod thread;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, StoreError, ToolError};
pub use handler::{TypedHandler, execute_typed};
pub use message::{Message, MessageToolCall, Role, Thread};
pub use provider::{Choice, FinishReason, Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use thread::ThreadStore;
pub use tool::{FnHandler, Params, Tool, ToolHandler, ToolMiddleware, ToolMiddlewareResult, ToolRegistry};
