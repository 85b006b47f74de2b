//! Persistence for chat history and message bodies
//!
//! Two layers:
//! - [`KeyValueStore`]: a durable string-to-string store (files, SQLite, memory)
//! - [`ChatStorage`]: what the session store talks to; owns the serialization format
//!   and never lets a backend failure reach its caller
//!
//! Two independent blobs are kept: the chat summary list under [`CHAT_HISTORY_KEY`]
//! and the chat-id to message-list map under [`MESSAGES_KEY`]. Both are JSON and both
//! are rewritten wholesale on every save.

mod file;
mod memory;
mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::collections::BTreeMap;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;
use crate::types::{ChatSummary, Message};

/// Storage key for the chat summary list
pub const CHAT_HISTORY_KEY: &str = "armins-chat-history";

/// Storage key for the chat-id to messages map
pub const MESSAGES_KEY: &str = "armins-messages";

/// Messages for every chat, keyed by chat id
pub type MessageMap = BTreeMap<String, Vec<Message>>;

/// A durable key-value mechanism holding serialized blobs.
pub trait KeyValueStore: Send + Sync {
    /// Read the value for `key`, or None if it was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any prior value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Persistence interface used by the session store.
///
/// All methods are infallible from the caller's side: unreadable data reads as empty
/// and failed writes are logged.
pub trait ChatStorage: Send + Sync {
    /// Stored chat summaries, or an empty list if absent, corrupt, or unavailable
    fn get_chat_history(&self) -> Vec<ChatSummary>;

    /// Replace the stored chat summaries
    fn save_chat_history(&self, history: &[ChatSummary]);

    /// Drop a chat from the stored history.
    ///
    /// With `next_history` the given list is stored verbatim; otherwise the current
    /// stored list is read and filtered.
    fn delete_chat(&self, chat_id: &str, next_history: Option<&[ChatSummary]>);

    /// Stored messages for all chats, or an empty map if absent, corrupt, or unavailable
    fn load_messages(&self) -> MessageMap;

    /// Replace the stored messages for all chats
    fn save_messages(&self, messages: &MessageMap);
}

impl<T: ChatStorage + ?Sized> ChatStorage for std::sync::Arc<T> {
    fn get_chat_history(&self) -> Vec<ChatSummary> {
        (**self).get_chat_history()
    }

    fn save_chat_history(&self, history: &[ChatSummary]) {
        (**self).save_chat_history(history)
    }

    fn delete_chat(&self, chat_id: &str, next_history: Option<&[ChatSummary]>) {
        (**self).delete_chat(chat_id, next_history)
    }

    fn load_messages(&self) -> MessageMap {
        (**self).load_messages()
    }

    fn save_messages(&self, messages: &MessageMap) {
        (**self).save_messages(messages)
    }
}

/// [`ChatStorage`] over any [`KeyValueStore`], storing JSON blobs.
pub struct KvChatStorage<S> {
    store: S,
}

impl<S: KeyValueStore> KvChatStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying key-value store
    pub fn store(&self) -> &S {
        &self.store
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to read from storage");
                return None;
            }
        };

        if raw.trim().is_empty() {
            return None;
        }

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(key, error = %e, "Stored data is corrupt, treating as empty");
                None
            }
        }
    }

    fn write_json<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to serialize for storage");
                return;
            }
        };

        if let Err(e) = self.store.set(key, &raw) {
            tracing::error!(key, error = %e, "Failed to write to storage");
        }
    }
}

impl<S: KeyValueStore> ChatStorage for KvChatStorage<S> {
    fn get_chat_history(&self) -> Vec<ChatSummary> {
        self.read_json(CHAT_HISTORY_KEY).unwrap_or_default()
    }

    fn save_chat_history(&self, history: &[ChatSummary]) {
        tracing::debug!(chats = history.len(), "Saving chat history");
        self.write_json(CHAT_HISTORY_KEY, history);
    }

    fn delete_chat(&self, chat_id: &str, next_history: Option<&[ChatSummary]>) {
        match next_history {
            Some(history) => self.save_chat_history(history),
            None => {
                let remaining: Vec<ChatSummary> = self
                    .get_chat_history()
                    .into_iter()
                    .filter(|chat| chat.id != chat_id)
                    .collect();
                self.save_chat_history(&remaining);
            }
        }
    }

    fn load_messages(&self) -> MessageMap {
        self.read_json(MESSAGES_KEY).unwrap_or_default()
    }

    fn save_messages(&self, messages: &MessageMap) {
        tracing::debug!(chats = messages.len(), "Saving messages");
        self.write_json(MESSAGES_KEY, messages);
    }
}

/// Open the backend selected in configuration.
pub fn open(config: &StorageConfig) -> Result<Box<dyn ChatStorage>> {
    let storage: Box<dyn ChatStorage> = match config.backend {
        StorageBackend::File => {
            let dir = config.resolved_path();
            tracing::info!(path = %dir.display(), "Using file storage");
            Box::new(KvChatStorage::new(FileStore::open(&dir)?))
        }
        StorageBackend::Sqlite => {
            let path = config.resolved_path();
            tracing::info!(path = %path.display(), "Using SQLite storage");
            let store = SqliteStore::open(&path)?;
            store.migrate()?;
            Box::new(KvChatStorage::new(store))
        }
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage; chats will not persist");
            Box::new(KvChatStorage::new(MemoryStore::new()))
        }
    };
    Ok(storage)
}
