//! Thread store trait: append-only conversation history.
//!
//! The agent reads a snapshot before every provider call and appends each
//! user, assistant, and tool message as it is produced. Implementations must
//! preserve insertion order exactly, and a snapshot must reflect every prior
//! successful append and nothing else.
//!
//! Implementations: in-memory (default), JSONL file. Bounding or pruning the
//! history is left to custom implementations.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::message::Message;

/// The core ThreadStore trait.
///
/// If one store is shared by concurrent `ask` calls, the store serializes
/// access itself; the agent takes no locks of its own.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "file").
    fn name(&self) -> &str;

    /// The full ordered thread.
    async fn snapshot(&self) -> Result<Vec<Message>, StoreError>;

    /// Append one message to the end of the thread.
    async fn add_message(&self, message: Message) -> Result<(), StoreError>;
}
