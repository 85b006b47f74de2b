//! Core domain types for armins
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Chat** | One independent conversation thread with its own message history and id |
//! | **ChatSummary** | The sidebar entry for a chat: id, title, creation time |
//! | **Message** | Either what the person submitted, or the assistant's reply slot |
//! | **Analysis** | What fills an assistant reply: the service's payload, or an error text |
//!
//! Stored JSON keeps the field names of the web front end (`createdAt`, `fileInfo`,
//! `isLoading`, a `type` discriminator) so blobs written by either client load in the other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title every chat starts with until its first message arrives
pub const NEW_CHAT_TITLE: &str = "New Chat";

/// Maximum title length in characters before truncation
pub const MAX_TITLE_CHARS: usize = 50;

/// Appended to titles cut at [`MAX_TITLE_CHARS`]
pub const TITLE_ELLIPSIS: &str = "...";

/// Generate a fresh chat or message id.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Apply the title length rule: at most 50 characters, then the ellipsis marker.
pub fn truncate_title(text: &str) -> String {
    if text.chars().count() <= MAX_TITLE_CHARS {
        return text.to_string();
    }
    let mut title: String = text.chars().take(MAX_TITLE_CHARS).collect();
    title.push_str(TITLE_ELLIPSIS);
    title
}

// ============================================
// Chats
// ============================================

/// Sidebar entry for one chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    /// Opaque chat id
    pub id: String,
    /// "New Chat" until the first message, then derived from it
    pub title: String,
    /// When the chat was started
    pub created_at: DateTime<Utc>,
}

impl ChatSummary {
    /// A fresh summary with the default title and the current time
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: NEW_CHAT_TITLE.to_string(),
            created_at: Utc::now(),
        }
    }
}

// ============================================
// Messages
// ============================================

/// Name and size of a file attached to a user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// File name as shown to the person
    pub name: String,
    /// Size in bytes
    pub size: u64,
}

/// What fills an assistant message once it stops loading
///
/// Stored untagged: a bare JSON string is an error text, anything else is a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Analysis {
    /// Friendly error text shown in place of a result
    Error(String),
    /// Response body from the analysis service, stored verbatim
    Result(serde_json::Value),
}

impl Analysis {
    pub fn is_error(&self) -> bool {
        matches!(self, Analysis::Error(_))
    }

    /// The error text, if this is an error
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Analysis::Error(message) => Some(message),
            Analysis::Result(_) => None,
        }
    }
}

/// A message the person submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Trimmed submitted text (may be empty when only a file was attached)
    pub text: String,
    /// Attached file, if any
    #[serde(default)]
    pub file_info: Option<FileInfo>,
}

/// The assistant's reply slot for one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// True while the request is in flight
    #[serde(default)]
    pub is_loading: bool,
    /// Result or error text once resolved
    #[serde(default)]
    pub analysis: Option<Analysis>,
}

/// One entry in a chat's message list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    User(UserMessage),
    Assistant(AssistantMessage),
}

impl Message {
    pub fn id(&self) -> &str {
        match self {
            Message::User(m) => &m.id,
            Message::Assistant(m) => &m.id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Message::User(m) => m.timestamp,
            Message::Assistant(m) => m.timestamp,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Message::User(_))
    }

    /// True for an assistant message still waiting on the service
    pub fn is_loading(&self) -> bool {
        match self {
            Message::User(_) => false,
            Message::Assistant(m) => m.is_loading,
        }
    }

    /// Merge an update into this message.
    ///
    /// Only assistant messages carry updatable fields; returns false for user messages.
    pub fn apply(&mut self, update: &MessageUpdate) -> bool {
        match self {
            Message::User(_) => false,
            Message::Assistant(m) => {
                if let Some(is_loading) = update.is_loading {
                    m.is_loading = is_loading;
                }
                if let Some(analysis) = &update.analysis {
                    m.analysis = Some(analysis.clone());
                }
                true
            }
        }
    }
}

/// Input for appending a message; id and timestamp are assigned on insert
#[derive(Debug, Clone, PartialEq)]
pub enum MessageDraft {
    User {
        text: String,
        file_info: Option<FileInfo>,
    },
    Assistant {
        /// Pre-chosen id, so the caller can update the message later
        id: Option<String>,
        is_loading: bool,
        analysis: Option<Analysis>,
    },
}

impl MessageDraft {
    /// The loading placeholder appended before a request is sent
    pub fn placeholder(id: impl Into<String>) -> Self {
        MessageDraft::Assistant {
            id: Some(id.into()),
            is_loading: true,
            analysis: None,
        }
    }

    /// Materialize the draft with a fresh id (unless one was given) and the current time.
    pub fn into_message(self) -> Message {
        let timestamp = Utc::now();
        match self {
            MessageDraft::User { text, file_info } => Message::User(UserMessage {
                id: generate_id(),
                timestamp,
                text,
                file_info,
            }),
            MessageDraft::Assistant {
                id,
                is_loading,
                analysis,
            } => Message::Assistant(AssistantMessage {
                id: id.unwrap_or_else(generate_id),
                timestamp,
                is_loading,
                analysis,
            }),
        }
    }
}

/// Partial fields merged into an existing assistant message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageUpdate {
    pub is_loading: Option<bool>,
    pub analysis: Option<Analysis>,
}

impl MessageUpdate {
    /// Loading finished with the given analysis
    pub fn resolved(analysis: Analysis) -> Self {
        Self {
            is_loading: Some(false),
            analysis: Some(analysis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_title_short_text_unchanged() {
        assert_eq!(truncate_title("Is remote work better?"), "Is remote work better?");
        let exactly_fifty = "a".repeat(50);
        assert_eq!(truncate_title(&exactly_fifty), exactly_fifty);
    }

    #[test]
    fn test_truncate_title_sixty_chars() {
        let input = "x".repeat(60);
        let title = truncate_title(&input);
        assert_eq!(title, format!("{}...", "x".repeat(50)));
        assert_eq!(title.chars().count(), 53);
    }

    #[test]
    fn test_truncate_title_counts_chars_not_bytes() {
        let input = "é".repeat(55);
        let title = truncate_title(&input);
        assert!(title.starts_with(&"é".repeat(50)));
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        assert_ne!(generate_id(), generate_id());
    }

    #[test]
    fn test_message_json_uses_front_end_field_names() {
        let message = Message::User(UserMessage {
            id: "m1".to_string(),
            timestamp: "2025-03-01T10:00:00Z".parse().unwrap(),
            text: "Cats are better than dogs".to_string(),
            file_info: Some(FileInfo {
                name: "essay.txt".to_string(),
                size: 12,
            }),
        });

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "user");
        assert_eq!(value["fileInfo"]["name"], "essay.txt");

        let summary = ChatSummary {
            id: "c1".to_string(),
            title: "New Chat".to_string(),
            created_at: "2025-03-01T10:00:00Z".parse().unwrap(),
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_analysis_round_trips_untagged() {
        let error: Analysis = serde_json::from_value(json!("service down")).unwrap();
        assert_eq!(error, Analysis::Error("service down".to_string()));

        let result: Analysis = serde_json::from_value(json!({"adus": [1, 2]})).unwrap();
        assert_eq!(result, Analysis::Result(json!({"adus": [1, 2]})));
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({"adus": [1, 2]}));
    }

    #[test]
    fn test_assistant_message_tolerates_missing_fields() {
        let raw = json!({
            "type": "assistant",
            "id": "a1",
            "timestamp": "2025-03-01T10:00:00Z",
            "analysis": null
        });
        let message: Message = serde_json::from_value(raw).unwrap();
        assert!(!message.is_loading());
        match message {
            Message::Assistant(m) => assert!(m.analysis.is_none()),
            Message::User(_) => panic!("expected assistant message"),
        }
    }

    #[test]
    fn test_apply_update_only_touches_assistant_messages() {
        let mut user = MessageDraft::User {
            text: "hello".to_string(),
            file_info: None,
        }
        .into_message();
        let update = MessageUpdate::resolved(Analysis::Error("boom".to_string()));
        assert!(!user.apply(&update));

        let mut assistant = MessageDraft::placeholder("a1").into_message();
        assert!(assistant.is_loading());
        assert!(assistant.apply(&update));
        assert!(!assistant.is_loading());
        match assistant {
            Message::Assistant(m) => {
                assert_eq!(m.id, "a1");
                assert_eq!(m.analysis, Some(Analysis::Error("boom".to_string())));
            }
            Message::User(_) => panic!("expected assistant message"),
        }
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut assistant = MessageDraft::Assistant {
            id: None,
            is_loading: true,
            analysis: Some(Analysis::Result(json!({"claims": []}))),
        }
        .into_message();

        assistant.apply(&MessageUpdate {
            is_loading: Some(false),
            analysis: None,
        });

        match assistant {
            Message::Assistant(m) => {
                assert!(!m.is_loading);
                assert_eq!(m.analysis, Some(Analysis::Result(json!({"claims": []}))));
            }
            Message::User(_) => panic!("expected assistant message"),
        }
    }
}
