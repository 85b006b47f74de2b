//! In-memory chat state: summaries, per-chat message lists, and the active chat.
//!
//! [`SessionStore`] is the only thing that mutates chat and message state. Every
//! mutation is flushed through its [`ChatStorage`]; a failed flush never undoes or
//! blocks the in-memory change.
//!
//! Invariants:
//! - every id in `chats` has a (possibly empty) entry in `messages`
//! - deleting a chat removes the summary and the message list together
//! - a chat's message list only grows, except for in-place updates of assistant messages

use crate::storage::{ChatStorage, MessageMap};
use crate::types::{
    generate_id, truncate_title, ChatSummary, Message, MessageDraft, MessageUpdate,
};

/// Owns chat summaries, messages, and the active chat id.
pub struct SessionStore {
    active_chat_id: Option<String>,
    /// Newest first
    chats: Vec<ChatSummary>,
    messages: MessageMap,
    storage: Box<dyn ChatStorage>,
}

impl SessionStore {
    /// An empty store that flushes to `storage` (nothing is read from it)
    pub fn new(storage: Box<dyn ChatStorage>) -> Self {
        Self {
            active_chat_id: None,
            chats: Vec::new(),
            messages: MessageMap::new(),
            storage,
        }
    }

    /// Restore persisted state and select the most recent chat, if any.
    pub fn load(storage: Box<dyn ChatStorage>) -> Self {
        let chats = storage.get_chat_history();
        let mut messages = storage.load_messages();

        for chat in &chats {
            messages.entry(chat.id.clone()).or_default();
        }

        let active_chat_id = chats.first().map(|chat| chat.id.clone());

        tracing::info!(
            chats = chats.len(),
            active_chat = ?active_chat_id,
            "Loaded chat history"
        );

        Self {
            active_chat_id,
            chats,
            messages,
            storage,
        }
    }

    // ============================================
    // Reads
    // ============================================

    pub fn active_chat_id(&self) -> Option<&str> {
        self.active_chat_id.as_deref()
    }

    /// Chat summaries, newest first
    pub fn chats(&self) -> &[ChatSummary] {
        &self.chats
    }

    pub fn chat(&self, chat_id: &str) -> Option<&ChatSummary> {
        self.chats.iter().find(|chat| chat.id == chat_id)
    }

    /// Messages of one chat (empty for unknown ids)
    pub fn messages(&self, chat_id: &str) -> &[Message] {
        self.messages
            .get(chat_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Messages of the active chat, or empty when none is active
    pub fn current_messages(&self) -> &[Message] {
        match &self.active_chat_id {
            Some(chat_id) => self.messages(chat_id),
            None => &[],
        }
    }

    /// Whether a message list exists for `chat_id`
    pub fn has_messages_entry(&self, chat_id: &str) -> bool {
        self.messages.contains_key(chat_id)
    }

    // ============================================
    // Chat lifecycle
    // ============================================

    /// Start a chat titled "New Chat", make it active, and return its id.
    pub fn start_new_chat(&mut self) -> String {
        let chat_id = generate_id();

        self.chats.insert(0, ChatSummary::new(chat_id.clone()));
        self.messages.insert(chat_id.clone(), Vec::new());
        self.active_chat_id = Some(chat_id.clone());

        tracing::info!(chat_id = %chat_id, "Started new chat");

        self.storage.save_chat_history(&self.chats);
        chat_id
    }

    /// Remove a chat and its messages. Unknown ids are ignored.
    pub fn delete_chat(&mut self, chat_id: &str) {
        let known = self.chats.iter().any(|chat| chat.id == chat_id)
            || self.messages.contains_key(chat_id);
        if !known {
            tracing::debug!(chat_id, "Ignoring delete of unknown chat");
            return;
        }

        self.chats.retain(|chat| chat.id != chat_id);
        self.messages.remove(chat_id);

        if self.active_chat_id.as_deref() == Some(chat_id) {
            self.active_chat_id = None;
        }

        tracing::info!(chat_id, "Deleted chat");

        self.storage.delete_chat(chat_id, Some(&self.chats));
        self.storage.save_messages(&self.messages);
    }

    /// Make `chat_id` active. The id is not checked; an unknown id shows no messages.
    pub fn select_chat(&mut self, chat_id: &str) {
        self.active_chat_id = Some(chat_id.to_string());
    }

    /// Set a chat's title from its first message, truncated to 50 characters.
    pub fn update_chat_title(&mut self, chat_id: &str, text: &str) {
        if let Some(chat) = self.chats.iter_mut().find(|chat| chat.id == chat_id) {
            chat.title = truncate_title(text);
            self.storage.save_chat_history(&self.chats);
        }
    }

    // ============================================
    // Messages
    // ============================================

    /// Append a message to a chat and return its id.
    pub fn add_message(&mut self, chat_id: &str, draft: MessageDraft) -> String {
        let message = draft.into_message();
        let message_id = message.id().to_string();

        self.messages
            .entry(chat_id.to_string())
            .or_default()
            .push(message);

        self.storage.save_messages(&self.messages);
        message_id
    }

    /// Merge `update` into a message in place.
    ///
    /// Returns false, changing nothing, if the chat or message is unknown or the
    /// message is not an assistant message.
    pub fn update_message(
        &mut self,
        chat_id: &str,
        message_id: &str,
        update: MessageUpdate,
    ) -> bool {
        let Some(messages) = self.messages.get_mut(chat_id) else {
            return false;
        };
        let Some(message) = messages.iter_mut().find(|m| m.id() == message_id) else {
            return false;
        };

        if !message.apply(&update) {
            return false;
        }

        self.storage.save_messages(&self.messages);
        true
    }
}
