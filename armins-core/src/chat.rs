//! Session state as seen by a front end
//!
//! [`ChatSession`] ties the [`SessionStore`], the [`ModelCatalog`] and an
//! [`AnalysisBackend`] together. A submission runs in three steps:
//!
//! 1. [`ChatSession::begin_send`] appends the user message and a loading placeholder,
//!    then validates the outgoing request
//! 2. [`PendingAnalysis::execute`] performs the network call
//! 3. [`ChatSession::complete`] resolves the placeholder with the result or a
//!    friendly error
//!
//! [`ChatSession::send_message`] runs all three in sequence. Callers that want
//! several submissions in flight drive the steps themselves; pending state lives on
//! the placeholder message, so completions can arrive in any order.

use std::sync::Arc;

use serde_json::Value;

use crate::api::{
    validate, AnalysisBackend, AnalysisRequest, ApiError, HttpBackend, ValidatedRequest,
    FILE_ANALYSIS_UNSUPPORTED,
};
use crate::catalog::{ModelCatalog, ModelSlot};
use crate::config::Config;
use crate::error::Result;
use crate::session::SessionStore;
use crate::storage::{self, ChatStorage};
use crate::types::{generate_id, Analysis, ChatSummary, FileInfo, Message, MessageDraft, MessageUpdate};

/// Title used when the first message of a chat is a file without text
pub const FILE_ANALYSIS_TITLE: &str = "File Analysis";

/// What the person submitted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageInput {
    pub text: Option<String>,
    pub file: Option<FileInfo>,
}

impl MessageInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            file: None,
        }
    }

    pub fn file(file: FileInfo) -> Self {
        Self {
            text: None,
            file: Some(file),
        }
    }

    fn trimmed_text(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Nothing to send: blank text and no file
    pub fn is_empty(&self) -> bool {
        self.trimmed_text().is_empty() && self.file.is_none()
    }
}

/// A submission whose placeholder is waiting for a result.
#[derive(Debug, Clone)]
pub struct PendingAnalysis {
    chat_id: String,
    message_id: String,
    request: std::result::Result<ValidatedRequest, ApiError>,
}

impl PendingAnalysis {
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Id of the loading placeholder
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// The payload to send, or why nothing will be sent
    pub fn request(&self) -> std::result::Result<&ValidatedRequest, &ApiError> {
        self.request.as_ref()
    }

    /// Send the request. Rejected submissions fail without touching the network.
    pub async fn execute(
        &self,
        backend: &dyn AnalysisBackend,
    ) -> std::result::Result<Value, ApiError> {
        let request = self.request.as_ref().map_err(Clone::clone)?;
        backend.send_chat(request).await
    }
}

/// Chat and model-selection state for one front end.
pub struct ChatSession {
    store: SessionStore,
    catalog: ModelCatalog,
    backend: Arc<dyn AnalysisBackend>,
    is_analyzing: bool,
    error: Option<String>,
    few_shot_adu: bool,
    few_shot_stance: bool,
}

impl ChatSession {
    pub fn new(store: SessionStore, backend: Arc<dyn AnalysisBackend>) -> Self {
        Self {
            store,
            catalog: ModelCatalog::new(),
            backend,
            is_analyzing: false,
            error: None,
            few_shot_adu: false,
            few_shot_stance: false,
        }
    }

    /// Open persisted state and an HTTP backend as configured.
    ///
    /// The model catalog is not fetched; call [`ChatSession::fetch_models`].
    pub fn open(config: &Config) -> Result<Self> {
        tracing::info!(
            base_url = %config.api.base_url,
            source = config.api.base_url_source.as_str(),
            "Analysis service configured"
        );

        let backend = HttpBackend::new(&config.api)?;
        let storage: Box<dyn ChatStorage> = storage::open(&config.storage)?;
        Ok(Self::new(SessionStore::load(storage), Arc::new(backend)))
    }

    // ============================================
    // Submitting messages
    // ============================================

    /// Submit a message and wait for its analysis.
    ///
    /// Blank input without a file does nothing.
    pub async fn send_message(&mut self, input: MessageInput) {
        let Some(pending) = self.begin_send(input) else {
            return;
        };
        let outcome = pending.execute(self.backend.as_ref()).await;
        self.complete(pending, outcome);
    }

    /// Record a submission and prepare its request.
    ///
    /// Creates a chat if none is active, appends the user message, names the chat
    /// after its first message, and appends a loading placeholder. Returns None
    /// without changing anything for blank input.
    pub fn begin_send(&mut self, input: MessageInput) -> Option<PendingAnalysis> {
        if input.is_empty() {
            return None;
        }

        let chat_id = match self.store.active_chat_id() {
            Some(chat_id) => chat_id.to_string(),
            None => self.store.start_new_chat(),
        };

        self.error = None;
        self.is_analyzing = true;

        let text = input.trimmed_text().to_string();
        self.store.add_message(
            &chat_id,
            MessageDraft::User {
                text: text.clone(),
                file_info: input.file.clone(),
            },
        );

        if self.store.messages(&chat_id).len() == 1 {
            let title = if !text.is_empty() {
                text.as_str()
            } else if let Some(file) = &input.file {
                file.name.as_str()
            } else {
                FILE_ANALYSIS_TITLE
            };
            self.store.update_chat_title(&chat_id, title);
        }

        let message_id = generate_id();
        self.store
            .add_message(&chat_id, MessageDraft::placeholder(message_id.clone()));

        let request = match &input.file {
            Some(file) => {
                tracing::info!(chat_id = %chat_id, file = %file.name, "Rejecting file analysis");
                Err(ApiError::Unsupported(FILE_ANALYSIS_UNSUPPORTED.to_string()))
            }
            None => validate(&self.analysis_request(&chat_id, text)).map_err(ApiError::from),
        };

        Some(PendingAnalysis {
            chat_id,
            message_id,
            request,
        })
    }

    /// Resolve a placeholder with the outcome of its request.
    ///
    /// Failures become the friendly message on the placeholder and the ambient
    /// error. The in-flight flag is cleared whatever the outcome.
    pub fn complete(
        &mut self,
        pending: PendingAnalysis,
        outcome: std::result::Result<Value, ApiError>,
    ) {
        let analysis = match outcome {
            Ok(result) => {
                tracing::info!(
                    chat_id = %pending.chat_id,
                    message_id = %pending.message_id,
                    "Analysis completed"
                );
                Analysis::Result(result)
            }
            Err(e) => {
                let message = e.user_message();
                tracing::warn!(
                    chat_id = %pending.chat_id,
                    message_id = %pending.message_id,
                    error = %e,
                    "Analysis failed"
                );
                self.error = Some(message.clone());
                Analysis::Error(message)
            }
        };

        self.store.update_message(
            &pending.chat_id,
            &pending.message_id,
            MessageUpdate::resolved(analysis),
        );
        self.is_analyzing = false;
    }

    fn analysis_request(&self, chat_id: &str, message: String) -> AnalysisRequest {
        AnalysisRequest {
            message,
            session_id: chat_id.to_string(),
            adu_classifier_model: self.catalog.selected_adu_model().map(str::to_string),
            stance_classifier_model: self.catalog.selected_stance_model().map(str::to_string),
            use_few_shot_adu: self.few_shot_adu && self.catalog.can_use_few_shot_adu(),
            use_few_shot_stance: self.few_shot_stance && self.catalog.can_use_few_shot_stance(),
        }
    }

    /// Backend handle for driving [`PendingAnalysis::execute`] outside this session
    pub fn backend(&self) -> Arc<dyn AnalysisBackend> {
        Arc::clone(&self.backend)
    }

    // ============================================
    // Models
    // ============================================

    /// Load the model catalog, falling back to the built-in list on failure.
    pub async fn fetch_models(&mut self) {
        if let Err(message) = self.catalog.fetch(self.backend.as_ref()).await {
            self.error = Some(message);
        }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Returns false if the model is not selectable.
    pub fn set_adu_model(&mut self, model_id: &str) -> bool {
        self.catalog.select(ModelSlot::Adu, model_id)
    }

    /// Returns false if the model is not selectable.
    pub fn set_stance_model(&mut self, model_id: &str) -> bool {
        self.catalog.select(ModelSlot::Stance, model_id)
    }

    pub fn selected_adu_model(&self) -> Option<&str> {
        self.catalog.selected_adu_model()
    }

    pub fn selected_stance_model(&self) -> Option<&str> {
        self.catalog.selected_stance_model()
    }

    pub fn can_use_few_shot_adu(&self) -> bool {
        self.catalog.can_use_few_shot_adu()
    }

    pub fn can_use_few_shot_stance(&self) -> bool {
        self.catalog.can_use_few_shot_stance()
    }

    /// Few-shot toggle for the ADU classifier; only honored if the model supports it
    pub fn set_few_shot_adu(&mut self, enabled: bool) {
        self.few_shot_adu = enabled;
    }

    /// Few-shot toggle for the stance classifier; only honored if the model supports it
    pub fn set_few_shot_stance(&mut self, enabled: bool) {
        self.few_shot_stance = enabled;
    }

    pub fn few_shot_adu(&self) -> bool {
        self.few_shot_adu
    }

    pub fn few_shot_stance(&self) -> bool {
        self.few_shot_stance
    }

    // ============================================
    // Chats
    // ============================================

    pub fn start_new_chat(&mut self) -> String {
        self.store.start_new_chat()
    }

    pub fn delete_chat(&mut self, chat_id: &str) {
        self.store.delete_chat(chat_id)
    }

    pub fn select_chat(&mut self, chat_id: &str) {
        self.store.select_chat(chat_id)
    }

    pub fn chats(&self) -> &[ChatSummary] {
        self.store.chats()
    }

    pub fn active_chat_id(&self) -> Option<&str> {
        self.store.active_chat_id()
    }

    pub fn current_messages(&self) -> &[Message] {
        self.store.current_messages()
    }

    pub fn messages(&self, chat_id: &str) -> &[Message] {
        self.store.messages(chat_id)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    // ============================================
    // Ambient state
    // ============================================

    /// True from submission until the most recent completion
    pub fn is_analyzing(&self) -> bool {
        self.is_analyzing
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}
