//! Failure classification for calls to the analysis service
//!
//! Every failure ends up as a friendly sentence via [`ApiError::user_message`]. The
//! order of precedence is: no response at all, then server-supplied detail, then the
//! generic text for the status class.

use thiserror::Error;

use super::request::ValidationError;

/// No response was received (connection refused, DNS, timeout, offline)
pub const SERVICE_UNREACHABLE: &str =
    "Cannot reach the analysis service. Check that the backend is running.";

/// 5xx responses
pub const SERVICE_UNAVAILABLE: &str =
    "The analysis service is temporarily unavailable. Please try again later.";

/// 429 responses
pub const TOO_MANY_REQUESTS: &str = "Too many requests. Please wait a moment and try again.";

/// 404 responses
pub const ENDPOINT_NOT_FOUND: &str =
    "The analysis endpoint was not found. Check the configured API URL.";

/// 401 and 403 responses
pub const NOT_AUTHORIZED: &str = "You are not authorized to use the analysis service.";

/// Any other 4xx response
pub const CHECK_INPUT: &str = "The analysis request was rejected. Please check your input.";

/// Submissions carrying a file
pub const FILE_ANALYSIS_UNSUPPORTED: &str =
    "File analysis is not supported by the current backend";

/// 2xx response whose body is not usable JSON
pub const UNREADABLE_RESPONSE: &str = "The analysis service returned an unreadable response.";

/// Why a call to the analysis service did not produce a result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The outgoing payload broke a schema rule
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The operation is refused before any network attempt
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// No HTTP response was received
    #[error("service unreachable: {0}")]
    Unreachable(String),

    /// A non-success HTTP response
    #[error("HTTP {status} {status_text}")]
    Status {
        status: u16,
        status_text: String,
        body: String,
    },

    /// A success response with a body that could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// True when no response was received at all
    pub fn is_network_error(&self) -> bool {
        matches!(self, ApiError::Unreachable(_))
    }

    /// The sentence shown to the person, both in the chat and as the ambient error.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(e) => format!("Validation error: {}", e.message),
            ApiError::Unsupported(message) => message.clone(),
            ApiError::Unreachable(_) => SERVICE_UNREACHABLE.to_string(),
            ApiError::Status {
                status,
                status_text,
                body,
            } => server_detail(body).unwrap_or_else(|| status_message(*status, status_text)),
            ApiError::Decode(_) => UNREADABLE_RESPONSE.to_string(),
        }
    }
}

/// Generic text for a non-success status code.
pub fn status_message(status: u16, status_text: &str) -> String {
    match status {
        500..=u16::MAX => SERVICE_UNAVAILABLE.to_string(),
        429 => TOO_MANY_REQUESTS.to_string(),
        404 => ENDPOINT_NOT_FOUND.to_string(),
        401 | 403 => NOT_AUTHORIZED.to_string(),
        400..=499 => CHECK_INPUT.to_string(),
        _ if !status_text.trim().is_empty() => status_text.to_string(),
        _ => format!("Analysis failed (HTTP {})", status),
    }
}

/// Message the server put in an error body, if any.
///
/// JSON bodies contribute a non-empty string `detail` or `message` field; other
/// bodies contribute their trimmed text.
pub fn server_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => ["detail", "message"].iter().find_map(|field| {
            value
                .get(field)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }),
        Err(_) => Some(body.to_string()),
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return ApiError::Decode(error.to_string());
        }
        match error.status() {
            Some(status) => ApiError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body: String::new(),
            },
            None => ApiError::Unreachable(error.to_string()),
        }
    }
}
