//! The agent loop: the heart of Gena.
//!
//! An [`Agent`] follows a **Complete → Dispatch → Observe** cycle:
//!
//! 1. **Append** the user's question to the thread
//! 2. **Send** the system prompt plus the thread to the provider, retrying
//!    rate limits with backoff
//! 3. **Persist** the assistant message
//! 4. **If tool calls**: run each through the tool's middleware chain and
//!    handler, append the results, loop back to step 2
//! 5. **Otherwise**: return the answer
//!
//! The loop stops with an error once the iteration cap is reached.

pub mod agent;
pub mod builder;
pub mod cancel;
pub mod dispatch;
pub mod retry;

pub use agent::Agent;
pub use builder::{AgentBuilder, DEFAULT_MAX_ITERATIONS, DEFAULT_TEMPERATURE};
pub use cancel::{CancelAware, await_or_cancel};
pub use retry::RetryPolicy;
pub use tokio_util::sync::CancellationToken;
