//! Conversation Stores
//!
//! [`ConversationStore`] owns every thread's history. The agent loop only ever sees
//! snapshots returned by [`ConversationStore::history`] and writes through
//! [`ConversationStore::append`], so backends can be swapped without touching it.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::thread::{Thread, ThreadId};

/// Persistence for thread histories
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create an empty thread with a fresh id
    async fn create_thread(&self) -> Result<ThreadId>;

    /// Append one message; durable once this returns
    async fn append(&self, id: &ThreadId, message: Message) -> Result<()>;

    /// Copy of the thread's history
    async fn history(&self, id: &ThreadId) -> Result<Vec<Message>>;
}

/// In-memory store (non-durable; for development and testing)
pub struct MemoryConversationStore {
    threads: RwLock<HashMap<ThreadId, Thread>>,
}

impl Default for MemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn create_thread(&self) -> Result<ThreadId> {
        let thread = Thread::new();
        let id = thread.id.clone();
        self.threads.write().await.insert(id.clone(), thread);
        Ok(id)
    }

    async fn append(&self, id: &ThreadId, message: Message) -> Result<()> {
        let mut threads = self.threads.write().await;
        let thread = threads
            .get_mut(id)
            .ok_or_else(|| AgentError::UnknownThread(id.to_string()))?;
        thread.append(message)
    }

    async fn history(&self, id: &ThreadId) -> Result<Vec<Message>> {
        let threads = self.threads.read().await;
        threads
            .get(id)
            .map(|t| t.messages().to_vec())
            .ok_or_else(|| AgentError::UnknownThread(id.to_string()))
    }
}

/// File-backed store: one JSON-lines file per thread.
///
/// Every append is flushed to disk before returning; a failed write is rolled back
/// to the previous length, and a torn final line left by a crash is dropped on load.
/// Threads written by an earlier process are loaded lazily on first access and then
/// stay cached for the life of the store.
pub struct FileConversationStore {
    dir: PathBuf,
    threads: RwLock<HashMap<ThreadId, Thread>>,
}

impl FileConversationStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "Opened file conversation store");
        Ok(Self {
            dir,
            threads: RwLock::new(HashMap::new()),
        })
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ThreadId) -> PathBuf {
        self.dir.join(format!("{}.jsonl", id))
    }

    async fn load(&self, id: &ThreadId) -> Result<Thread> {
        if !id.is_well_formed() {
            return Err(AgentError::UnknownThread(id.to_string()));
        }

        let raw = match tokio::fs::read_to_string(self.path_for(id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AgentError::UnknownThread(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut messages = Vec::new();
        let mut offset = 0usize;
        for segment in raw.split_inclusive('\n') {
            let line = segment.trim();
            if !line.is_empty() {
                match serde_json::from_str::<Message>(line) {
                    Ok(message) => messages.push(message),
                    // A final line without its newline is an append that never finished.
                    Err(e) if !segment.ends_with('\n') => {
                        tracing::warn!(thread_id = %id, error = %e, "Discarding torn final line");
                        self.truncate(id, offset as u64).await?;
                        break;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            offset += segment.len();
        }

        Thread::restore(id.clone(), messages)
            .map_err(|e| AgentError::Store(format!("thread {} is corrupt: {}", id, e)))
    }

    async fn truncate(&self, id: &ThreadId, len: u64) -> Result<()> {
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .open(self.path_for(id))
            .await?;
        file.set_len(len).await?;
        file.sync_data().await?;
        Ok(())
    }
}

async fn write_line(file: &mut tokio::fs::File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line).await?;
    file.flush().await?;
    file.sync_data().await
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn create_thread(&self) -> Result<ThreadId> {
        let thread = Thread::new();
        let id = thread.id.clone();

        tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path_for(&id))
            .await?;

        self.threads.write().await.insert(id.clone(), thread);
        Ok(id)
    }

    async fn append(&self, id: &ThreadId, message: Message) -> Result<()> {
        // The write lock spans the disk write so file and cache stay in step.
        let mut threads = self.threads.write().await;
        if !threads.contains_key(id) {
            let thread = self.load(id).await?;
            threads.insert(id.clone(), thread);
        }
        let thread = threads
            .get_mut(id)
            .ok_or_else(|| AgentError::UnknownThread(id.to_string()))?;

        thread.check_append(&message)?;

        let mut line = serde_json::to_string(&message)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(self.path_for(id))
            .await?;
        let len = file.metadata().await?.len();
        if let Err(e) = write_line(&mut file, line.as_bytes()).await {
            tracing::error!(thread_id = %id, error = %e, "Append failed, rolling back");
            if let Err(undo) = file.set_len(len).await {
                tracing::error!(thread_id = %id, error = %undo, "Rollback failed");
            }
            return Err(e.into());
        }

        thread.append(message)
    }

    async fn history(&self, id: &ThreadId) -> Result<Vec<Message>> {
        if let Some(thread) = self.threads.read().await.get(id) {
            return Ok(thread.messages().to_vec());
        }

        let loaded = self.load(id).await?;
        let mut threads = self.threads.write().await;
        let thread = threads.entry(id.clone()).or_insert(loaded);
        Ok(thread.messages().to_vec())
    }
}
