//! Selectable analysis models and the current selection per classifier slot
//!
//! The catalog comes from `GET /models/available`. When that fails, a built-in list
//! keeps the client usable. After every catalog change the two selections are
//! repaired so they always point at an enabled model when one exists.

use serde::{Deserialize, Serialize};

use crate::api::{AnalysisBackend, ApiError};

/// Model id preferred when a selection has to be repaired
pub const DEFAULT_MODEL_ID: &str = "gpt-4.1";

/// Ambient error when the catalog fetch got no response
pub const CATALOG_UNREACHABLE: &str = "Backend unreachable. Using default models.";

/// Ambient error for any other catalog fetch failure
pub const CATALOG_LOAD_FAILED: &str = "Failed to load available models. Using defaults.";

/// Where a model runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Local,
    #[serde(rename = "openai")]
    OpenAI,
    /// Any provider tag this client does not know
    #[serde(other)]
    Other,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::OpenAI => "openai",
            Provider::Other => "other",
        }
    }
}

/// One selectable model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub provider: Provider,
    /// Whether the model accepts few-shot examples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_few_shot: Option<bool>,
    /// Listed but not selectable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

impl ModelInfo {
    fn builtin(id: &str, name: &str, description: &str, provider: Provider) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            provider,
            supports_few_shot: None,
            disabled: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled.unwrap_or(false)
    }

    pub fn supports_few_shot(&self) -> bool {
        self.supports_few_shot.unwrap_or(false)
    }
}

/// The catalog: models per classifier slot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AvailableModels {
    #[serde(default)]
    pub adu_classification: Vec<ModelInfo>,
    #[serde(default)]
    pub stance_classification: Vec<ModelInfo>,
}

impl AvailableModels {
    /// Built-in catalog used when the service cannot be asked
    pub fn fallback() -> Self {
        let models = vec![
            ModelInfo::builtin("gpt-4.1", "GPT-4.1", "OpenAI GPT-4.1", Provider::OpenAI),
            ModelInfo::builtin("gpt-5", "GPT-5", "OpenAI GPT-5", Provider::OpenAI),
            ModelInfo::builtin("gpt-5-mini", "GPT-5 Mini", "OpenAI GPT-5 Mini", Provider::OpenAI),
            ModelInfo::builtin("modernbert", "ModernBERT", "Local BERT model", Provider::Local),
            ModelInfo::builtin("tinyllama", "TinyLlama", "Lightweight LLM", Provider::Local),
            ModelInfo::builtin("deberta", "DeBERTa", "Decoding-enhanced BERT", Provider::Local),
        ];
        Self {
            adu_classification: models.clone(),
            stance_classification: models,
        }
    }

    pub fn models(&self, slot: ModelSlot) -> &[ModelInfo] {
        match slot {
            ModelSlot::Adu => &self.adu_classification,
            ModelSlot::Stance => &self.stance_classification,
        }
    }
}

/// The two independently selected classifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSlot {
    Adu,
    Stance,
}

impl ModelSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSlot::Adu => "adu",
            ModelSlot::Stance => "stance",
        }
    }
}

/// Pick the model a slot should use given the catalog.
///
/// Keeps `current` if it is listed and enabled, otherwise prefers an enabled
/// [`DEFAULT_MODEL_ID`], then the first enabled model, then nothing.
pub fn repair_selection(current: Option<&str>, models: &[ModelInfo]) -> Option<String> {
    let enabled = |id: &str| models.iter().any(|m| m.id == id && m.is_enabled());

    if let Some(current) = current {
        if enabled(current) {
            return Some(current.to_string());
        }
    }

    models
        .iter()
        .filter(|m| m.is_enabled())
        .find(|m| m.id == DEFAULT_MODEL_ID)
        .or_else(|| models.iter().find(|m| m.is_enabled()))
        .map(|m| m.id.clone())
}

/// Fetched catalog plus the current selection for each slot.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    available: Option<AvailableModels>,
    selected_adu: Option<String>,
    selected_stance: Option<String>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelCatalog {
    /// No catalog yet; both slots start on [`DEFAULT_MODEL_ID`]
    pub fn new() -> Self {
        Self {
            available: None,
            selected_adu: Some(DEFAULT_MODEL_ID.to_string()),
            selected_stance: Some(DEFAULT_MODEL_ID.to_string()),
        }
    }

    /// Most recently fetched (or fallback) catalog
    pub fn available(&self) -> Option<&AvailableModels> {
        self.available.as_ref()
    }

    pub fn selected_adu_model(&self) -> Option<&str> {
        self.selected_adu.as_deref()
    }

    pub fn selected_stance_model(&self) -> Option<&str> {
        self.selected_stance.as_deref()
    }

    pub fn selected(&self, slot: ModelSlot) -> Option<&str> {
        match slot {
            ModelSlot::Adu => self.selected_adu_model(),
            ModelSlot::Stance => self.selected_stance_model(),
        }
    }

    /// Replace the catalog and repair both selections.
    pub fn set_available(&mut self, models: AvailableModels) {
        self.selected_adu =
            repair_selection(self.selected_adu.as_deref(), &models.adu_classification);
        self.selected_stance =
            repair_selection(self.selected_stance.as_deref(), &models.stance_classification);
        self.available = Some(models);

        tracing::debug!(
            adu = ?self.selected_adu,
            stance = ?self.selected_stance,
            "Model selection repaired"
        );
    }

    /// Install the built-in catalog.
    pub fn use_fallback(&mut self) {
        self.set_available(AvailableModels::fallback());
    }

    /// Fetch the catalog from the service.
    ///
    /// On failure the built-in catalog is installed and the ambient error text is
    /// returned; it differs for "no response" and any other failure.
    pub async fn fetch(&mut self, backend: &dyn AnalysisBackend) -> Result<(), String> {
        match backend.available_models().await {
            Ok(models) => {
                tracing::info!(
                    adu_models = models.adu_classification.len(),
                    stance_models = models.stance_classification.len(),
                    "Loaded model catalog"
                );
                self.set_available(models);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch model catalog, using built-in list");
                self.use_fallback();
                Err(catalog_error_message(&e).to_string())
            }
        }
    }

    /// Select a model for a slot; returns false (changing nothing) if the model is not
    /// listed or is disabled. Any id is accepted while no catalog is known.
    pub fn select(&mut self, slot: ModelSlot, model_id: &str) -> bool {
        if let Some(available) = &self.available {
            let selectable = available
                .models(slot)
                .iter()
                .any(|m| m.id == model_id && m.is_enabled());
            if !selectable {
                tracing::warn!(slot = slot.as_str(), model_id, "Rejected model selection");
                return false;
            }
        }

        let target = match slot {
            ModelSlot::Adu => &mut self.selected_adu,
            ModelSlot::Stance => &mut self.selected_stance,
        };
        *target = Some(model_id.to_string());
        true
    }

    pub fn set_adu_model(&mut self, model_id: &str) -> bool {
        self.select(ModelSlot::Adu, model_id)
    }

    pub fn set_stance_model(&mut self, model_id: &str) -> bool {
        self.select(ModelSlot::Stance, model_id)
    }

    /// Whether the selected model in `slot` supports few-shot mode
    pub fn can_use_few_shot(&self, slot: ModelSlot) -> bool {
        let (Some(available), Some(selected)) = (&self.available, self.selected(slot)) else {
            return false;
        };
        available
            .models(slot)
            .iter()
            .find(|m| m.id == selected)
            .map(ModelInfo::supports_few_shot)
            .unwrap_or(false)
    }

    pub fn can_use_few_shot_adu(&self) -> bool {
        self.can_use_few_shot(ModelSlot::Adu)
    }

    pub fn can_use_few_shot_stance(&self) -> bool {
        self.can_use_few_shot(ModelSlot::Stance)
    }
}

fn catalog_error_message(error: &ApiError) -> &'static str {
    if error.is_network_error() {
        CATALOG_UNREACHABLE
    } else {
        CATALOG_LOAD_FAILED
    }
}
