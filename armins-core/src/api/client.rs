//! HTTP client for the analysis service
//!
//! Two endpoints are used:
//! - `POST {base}/chat/send` with a [`ValidatedRequest`] body
//! - `GET {base}/models/available` returning an [`AvailableModels`] catalog

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Response;
use serde_json::Value;

use crate::catalog::AvailableModels;
use crate::config::ApiConfig;
use crate::error::{Error, Result};

use super::error::ApiError;
use super::request::ValidatedRequest;

/// Transport to the analysis service.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Submit a validated request; the decoded JSON body is the analysis result
    async fn send_chat(&self, request: &ValidatedRequest) -> std::result::Result<Value, ApiError>;

    /// Fetch the model catalog
    async fn available_models(&self) -> std::result::Result<AvailableModels, ApiError>;
}

/// [`AnalysisBackend`] over HTTP
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client from configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Turn a non-success response into [`ApiError::Status`], keeping its body.
    async fn check_status(response: Response) -> std::result::Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "Analysis service returned an error");
        Err(ApiError::Status {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn send_chat(&self, request: &ValidatedRequest) -> std::result::Result<Value, ApiError> {
        let url = format!("{}/chat/send", self.base_url);
        tracing::debug!(
            url = %url,
            session_id = %request.session_id,
            adu_model = %request.adu_classifier_model,
            stance_model = %request.stance_classifier_model,
            "Sending analysis request"
        );

        let response = self.http_client.post(&url).json(request).send().await?;
        tracing::debug!(status = response.status().as_u16(), "Analysis response received");

        let response = Self::check_status(response).await?;
        Ok(response.json::<Value>().await?)
    }

    async fn available_models(&self) -> std::result::Result<AvailableModels, ApiError> {
        let url = format!("{}/models/available", self.base_url);
        tracing::debug!(url = %url, "Fetching model catalog");

        let response = self.http_client.get(&url).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json::<AvailableModels>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::{
        CHECK_INPUT, ENDPOINT_NOT_FOUND, NOT_AUTHORIZED, SERVICE_UNAVAILABLE, SERVICE_UNREACHABLE,
        TOO_MANY_REQUESTS, UNREADABLE_RESPONSE,
    };
    use crate::config::BaseUrlSource;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(url: &str) -> HttpBackend {
        crate::logging::init_test();
        let mut config = ApiConfig::default();
        config.set_base_url(url.to_string(), BaseUrlSource::Override);
        HttpBackend::new(&config).unwrap()
    }

    fn request() -> ValidatedRequest {
        ValidatedRequest {
            message: "Nuclear power is the safest option".to_string(),
            session_id: "chat-1".to_string(),
            adu_classifier_model: "gpt-4.1".to_string(),
            stance_classifier_model: "gpt-4.1".to_string(),
            use_few_shot_adu: false,
            use_few_shot_stance: false,
            use_few_shot: None,
        }
    }

    async fn send_with_status(status: u16, body: &str) -> ApiError {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/send"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;

        backend_for(&server.uri())
            .send_chat(&request())
            .await
            .unwrap_err()
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let backend = backend_for("http://localhost:8000/");
        assert_eq!(backend.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let mut config = ApiConfig::default();
        config.set_base_url("ftp://example.com".to_string(), BaseUrlSource::Override);
        assert!(HttpBackend::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_send_chat_posts_payload_and_returns_json() {
        let server = MockServer::start().await;
        let analysis = json!({"adus": [{"text": "Nuclear power is the safest option", "type": "claim"}]});
        Mock::given(method("POST"))
            .and(path("/chat/send"))
            .and(body_json(json!({
                "message": "Nuclear power is the safest option",
                "session_id": "chat-1",
                "adu_classifier_model": "gpt-4.1",
                "stance_classifier_model": "gpt-4.1",
                "use_few_shot_adu": false,
                "use_few_shot_stance": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(analysis.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let result = backend_for(&server.uri()).send_chat(&request()).await.unwrap();
        assert_eq!(result, analysis);
    }

    #[tokio::test]
    async fn test_status_errors_map_to_messages() {
        assert_eq!(send_with_status(503, "").await.user_message(), SERVICE_UNAVAILABLE);
        assert_eq!(send_with_status(404, "").await.user_message(), ENDPOINT_NOT_FOUND);
        assert_eq!(send_with_status(429, "").await.user_message(), TOO_MANY_REQUESTS);
        assert_eq!(send_with_status(401, "").await.user_message(), NOT_AUTHORIZED);
        assert_eq!(send_with_status(400, "").await.user_message(), CHECK_INPUT);
    }

    #[tokio::test]
    async fn test_status_error_prefers_server_detail() {
        let err = send_with_status(400, r#"{"detail": "Unknown model: foo"}"#).await;
        assert_eq!(err.user_message(), "Unknown model: foo");

        let err = send_with_status(500, "classifier out of memory").await;
        assert_eq!(err.user_message(), "classifier out of memory");
    }

    #[tokio::test]
    async fn test_success_with_non_json_body_is_unreadable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/send"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let err = backend_for(&server.uri()).send_chat(&request()).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(err.user_message(), UNREADABLE_RESPONSE);
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        // Port 1 is reserved and refuses connections
        let err = backend_for("http://127.0.0.1:1")
            .send_chat(&request())
            .await
            .unwrap_err();
        assert!(err.is_network_error());
        assert_eq!(err.user_message(), SERVICE_UNREACHABLE);
    }

    #[tokio::test]
    async fn test_available_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models/available"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "adu_classification": [
                    {"id": "gpt-4.1", "name": "GPT-4.1", "description": "OpenAI GPT-4.1",
                     "provider": "openai", "supports_few_shot": true}
                ],
                "stance_classification": [
                    {"id": "modernbert", "name": "ModernBERT", "description": "Local BERT model",
                     "provider": "local", "disabled": true}
                ]
            })))
            .mount(&server)
            .await;

        let models = backend_for(&server.uri()).available_models().await.unwrap();
        assert_eq!(models.adu_classification.len(), 1);
        assert!(models.adu_classification[0].supports_few_shot());
        assert!(!models.stance_classification[0].is_enabled());
    }

    #[tokio::test]
    async fn test_available_models_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models/available"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = backend_for(&server.uri()).available_models().await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
        assert!(!err.is_network_error());
    }
}
