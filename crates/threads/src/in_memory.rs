//! In-memory thread store: the default, useful for tests and ephemeral sessions.

use async_trait::async_trait;
use gena_core::error::StoreError;
use gena_core::message::Message;
use gena_core::thread::ThreadStore;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread store that keeps messages in a Vec.
///
/// Never fails and grows without bound. Clones share the same thread.
#[derive(Clone, Default)]
pub struct InMemoryThreadStore {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing history.
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Arc::new(RwLock::new(messages)),
        }
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn snapshot(&self) -> Result<Vec<Message>, StoreError> {
        Ok(self.messages.read().await.clone())
    }

    async fn add_message(&self, message: Message) -> Result<(), StoreError> {
        self.messages.write().await.push(message);
        Ok(())
    }
}
