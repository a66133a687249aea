//! File-based thread store: persistent JSON-lines storage.
//!
//! Each line is one JSON-encoded `Message`, in thread order. The file is read
//! once on open; every append writes one line before the message becomes
//! visible in snapshots. A failed write is truncated away, so the file and the
//! thread stay unchanged.

use async_trait::async_trait;
use gena_core::error::StoreError;
use gena_core::message::Message;
use gena_core::thread::ThreadStore;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A thread store backed by a JSONL file.
pub struct FileThreadStore {
    path: PathBuf,
    state: RwLock<State>,
}

struct State {
    messages: Vec<Message>,
    /// The file ends without a newline (e.g. edited by hand), so the next
    /// line must start with one.
    open_tail: bool,
}

impl FileThreadStore {
    /// Open the thread at `path`.
    ///
    /// A missing file is an empty thread (the file is created on first
    /// append). A line that does not decode is reported as corruption.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };
        let messages = parse_lines(&content)?;
        debug!(path = %path.display(), count = messages.len(), "File thread store loaded");
        Ok(Self {
            path,
            state: RwLock::new(State {
                messages,
                open_tail: !content.is_empty() && !content.ends_with('\n'),
            }),
        })
    }

    /// Default path: `~/.gena/threads/default.jsonl`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".gena")
            .join("threads")
            .join("default.jsonl")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `bytes` to the file. On a failed write the file is cut back to
    /// its previous length.
    async fn append(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let start = file.metadata().await?.len();

        let written = async {
            file.write_all(bytes).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            if let Err(rollback) = truncate_to(&self.path, start).await {
                warn!(
                    path = %self.path.display(),
                    error = %rollback,
                    "Could not roll back a partial thread write"
                );
            }
            return Err(StoreError::Io(e));
        }
        Ok(())
    }
}

fn parse_lines(content: &str) -> Result<Vec<Message>, StoreError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<Message>(line).map_err(|e| StoreError::Corrupted {
                line: i + 1,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Cut the file at `path` back to `len` bytes.
async fn truncate_to(path: &Path, len: u64) -> std::io::Result<()> {
    let file = tokio::fs::OpenOptions::new().write(true).open(path).await?;
    file.set_len(len).await?;
    file.sync_all().await
}

#[async_trait]
impl ThreadStore for FileThreadStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn snapshot(&self) -> Result<Vec<Message>, StoreError> {
        Ok(self.state.read().await.messages.clone())
    }

    async fn add_message(&self, message: Message) -> Result<(), StoreError> {
        let line = serde_json::to_string(&message)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Held across the write so appends land in the file in thread order.
        let mut state = self.state.write().await;

        let mut bytes = Vec::with_capacity(line.len() + 2);
        if state.open_tail {
            bytes.push(b'\n');
        }
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');

        self.append(&bytes).await?;

        state.open_tail = false;
        state.messages.push(message);
        Ok(())
    }
}
