//! Outgoing request payloads and their validation
//!
//! Every request goes through [`validate`] before it reaches the transport, so a
//! malformed payload never leaves the process.

use serde::Serialize;
use thiserror::Error;

/// A request as assembled from session state, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Submitted text
    pub message: String,
    /// Chat id the message belongs to
    pub session_id: String,
    /// Selected ADU classifier, if any model is selectable
    pub adu_classifier_model: Option<String>,
    /// Selected stance classifier, if any model is selectable
    pub stance_classifier_model: Option<String>,
    /// Few-shot mode for the ADU classifier
    pub use_few_shot_adu: bool,
    /// Few-shot mode for the stance classifier
    pub use_few_shot_stance: bool,
}

/// The JSON body of `POST /chat/send`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedRequest {
    pub message: String,
    pub session_id: String,
    pub adu_classifier_model: String,
    pub stance_classifier_model: String,
    pub use_few_shot_adu: bool,
    pub use_few_shot_stance: bool,
    /// Older backends only understand one combined flag; sent only when both are on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_few_shot: Option<bool>,
}

/// The first rule a request broke
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Offending payload field
    pub field: &'static str,
    /// Human-readable reason
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

fn required_model(
    field: &'static str,
    model: &Option<String>,
    message: &str,
) -> Result<String, ValidationError> {
    match model.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ValidationError::new(field, message)),
    }
}

/// Check a request and produce the payload that goes on the wire.
pub fn validate(request: &AnalysisRequest) -> Result<ValidatedRequest, ValidationError> {
    if request.message.trim().is_empty() {
        return Err(ValidationError::new("message", "Message cannot be empty"));
    }
    if request.session_id.trim().is_empty() {
        return Err(ValidationError::new(
            "session_id",
            "Session id cannot be empty",
        ));
    }

    let adu_classifier_model = required_model(
        "adu_classifier_model",
        &request.adu_classifier_model,
        "An ADU classifier model must be selected",
    )?;
    let stance_classifier_model = required_model(
        "stance_classifier_model",
        &request.stance_classifier_model,
        "A stance classifier model must be selected",
    )?;

    let use_few_shot = (request.use_few_shot_adu && request.use_few_shot_stance).then_some(true);

    Ok(ValidatedRequest {
        message: request.message.clone(),
        session_id: request.session_id.clone(),
        adu_classifier_model,
        stance_classifier_model,
        use_few_shot_adu: request.use_few_shot_adu,
        use_few_shot_stance: request.use_few_shot_stance,
        use_few_shot,
    })
}
