//! End-to-end tests: a chat session over on-disk storage talking to a mock service.

use std::sync::Arc;

use armins_core::api::{HttpBackend, ENDPOINT_NOT_FOUND, SERVICE_UNAVAILABLE};
use armins_core::config::{ApiConfig, BaseUrlSource, StorageBackend, StorageConfig};
use armins_core::storage;
use armins_core::{Analysis, ChatSession, Message, MessageInput, SessionStore};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn storage_config(temp: &TempDir, backend: StorageBackend) -> StorageConfig {
    StorageConfig {
        backend,
        path: Some(temp.path().join("store")),
    }
}

fn open_session(storage: &StorageConfig, base_url: &str) -> ChatSession {
    armins_core::logging::init_test();
    let mut api = ApiConfig::default();
    api.set_base_url(base_url.to_string(), BaseUrlSource::Override);
    let backend = HttpBackend::new(&api).expect("failed to create backend");
    let store = SessionStore::load(storage::open(storage).expect("failed to open storage"));
    ChatSession::new(store, Arc::new(backend))
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/models/available"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "adu_classification": [
                {"id": "gpt-4.1", "name": "GPT-4.1", "description": "OpenAI GPT-4.1",
                 "provider": "openai", "supports_few_shot": true},
                {"id": "modernbert", "name": "ModernBERT", "description": "Local BERT model",
                 "provider": "local"}
            ],
            "stance_classification": [
                {"id": "gpt-4.1", "name": "GPT-4.1", "description": "OpenAI GPT-4.1",
                 "provider": "openai", "disabled": true},
                {"id": "deberta", "name": "DeBERTa", "description": "Decoding-enhanced BERT",
                 "provider": "local", "supports_few_shot": true}
            ]
        })))
        .mount(server)
        .await;
}

fn analysis_of(message: &Message) -> Option<&Analysis> {
    match message {
        Message::Assistant(m) => m.analysis.as_ref(),
        Message::User(_) => None,
    }
}

#[tokio::test]
async fn test_send_persists_and_survives_restart() {
    let temp = TempDir::new().unwrap();
    let storage = storage_config(&temp, StorageBackend::File);
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let result = json!({"adus": [{"text": "Public transport should be free", "type": "major_claim"}]});
    Mock::given(method("POST"))
        .and(path("/chat/send"))
        .and(body_partial_json(json!({
            "message": "Public transport should be free",
            "adu_classifier_model": "gpt-4.1",
            "stance_classifier_model": "deberta",
            "use_few_shot_adu": true,
            "use_few_shot_stance": true,
            "use_few_shot": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(result.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let chat_id = {
        let mut session = open_session(&storage, &server.uri());
        session.fetch_models().await;
        assert!(session.error().is_none());
        assert_eq!(session.selected_stance_model(), Some("deberta"));

        session.set_few_shot_adu(true);
        session.set_few_shot_stance(true);
        session
            .send_message(MessageInput::text("Public transport should be free"))
            .await;
        assert!(session.error().is_none());
        session.active_chat_id().unwrap().to_string()
    };

    let reopened = open_session(&storage, &server.uri());
    assert_eq!(reopened.active_chat_id(), Some(chat_id.as_str()));
    assert_eq!(reopened.chats()[0].title, "Public transport should be free");

    let messages = reopened.current_messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].is_user());
    assert!(!messages[1].is_loading());
    assert_eq!(analysis_of(&messages[1]), Some(&Analysis::Result(result)));
}

#[tokio::test]
async fn test_http_failures_become_chat_messages() {
    let temp = TempDir::new().unwrap();
    let storage = storage_config(&temp, StorageBackend::Sqlite);
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/send"))
        .and(body_partial_json(json!({"message": "first"})))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/send"))
        .and(body_partial_json(json!({"message": "second"})))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/send"))
        .and(body_partial_json(json!({"message": "third"})))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Text is too short"})),
        )
        .mount(&server)
        .await;

    let mut session = open_session(&storage, &server.uri());
    session.send_message(MessageInput::text("first")).await;
    assert_eq!(session.error(), Some(SERVICE_UNAVAILABLE));
    session.send_message(MessageInput::text("second")).await;
    assert_eq!(session.error(), Some(ENDPOINT_NOT_FOUND));
    session.send_message(MessageInput::text("third")).await;
    assert_eq!(session.error(), Some("Text is too short"));

    let errors: Vec<_> = session
        .current_messages()
        .iter()
        .filter_map(analysis_of)
        .filter_map(Analysis::error_message)
        .collect();
    assert_eq!(
        errors,
        vec![SERVICE_UNAVAILABLE, ENDPOINT_NOT_FOUND, "Text is too short"]
    );
    assert!(!session.is_analyzing());
}

#[tokio::test]
async fn test_delete_persists_across_restart() {
    let temp = TempDir::new().unwrap();
    let storage = storage_config(&temp, StorageBackend::File);

    let (keep, doomed) = {
        let mut session = open_session(&storage, "http://127.0.0.1:1");
        let keep = session.start_new_chat();
        let doomed = session.start_new_chat();
        session.delete_chat(&doomed);
        assert!(session.active_chat_id().is_none());
        (keep, doomed)
    };

    let reopened = open_session(&storage, "http://127.0.0.1:1");
    let ids: Vec<_> = reopened.chats().iter().map(|c| c.id.clone()).collect();
    assert_eq!(ids, vec![keep.clone()]);
    assert!(reopened.messages(&doomed).is_empty());
    assert_eq!(reopened.active_chat_id(), Some(keep.as_str()));
}

#[tokio::test]
async fn test_unreachable_service_uses_fallback_catalog() {
    let temp = TempDir::new().unwrap();
    let storage = storage_config(&temp, StorageBackend::Memory);
    let mut session = open_session(&storage, "http://127.0.0.1:1");

    session.fetch_models().await;

    let available = session.catalog().available().unwrap();
    assert_eq!(available.adu_classification.len(), 6);
    assert_eq!(session.selected_adu_model(), Some("gpt-4.1"));
    assert!(!session.can_use_few_shot_adu());
    assert!(session.error().is_some());
}
