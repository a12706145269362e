//! Prompt expansion via a local language model
//!
//! Wraps a llama.cpp-style completion server behind the `TextModel` trait.
//! Expansion never fails the pipeline: if the model is unreachable at
//! startup every call short-circuits to the original prompt, and any
//! inference error at call time degrades the same way.

use atelier_core::{AtelierError, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ModelConfig;

const SYSTEM_PROMPT: &str = "You are a creative assistant that enhances image generation prompts. \
Your task is to expand the given prompt with rich, detailed descriptions while maintaining \
the original intent. Focus on visual elements, atmosphere, and artistic style.";

const MODEL_TIMEOUT_SECS: u64 = 30;

/// Sampling parameters sent with every completion request
#[derive(Debug, Clone)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub stop: Vec<String>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: 200,
            temperature: 0.7,
            top_p: 0.9,
            stop: vec!["Original prompt:".to_string()],
        }
    }
}

impl SamplingParams {
    fn from_config(config: &ModelConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            stop: config.stop.clone(),
        }
    }
}

/// A local generative text model
pub trait TextModel: Send + Sync {
    fn complete(&self, prompt: &str, params: &SamplingParams) -> Result<String>;
}

/// Client for a llama.cpp server `/completion` endpoint
pub struct LlamaServerModel {
    endpoint: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    content: String,
}

impl LlamaServerModel {
    /// Connect to the completion server, probing it once so a missing model
    /// is detected at startup rather than on the first run.
    pub fn connect(endpoint: &str) -> Result<Self> {
        let model = Self {
            endpoint: endpoint.to_string(),
        };
        model.probe()?;
        Ok(model)
    }

    fn probe(&self) -> Result<()> {
        let health_url = self
            .endpoint
            .rsplit_once('/')
            .map(|(base, _)| format!("{}/health", base))
            .unwrap_or_else(|| format!("{}/health", self.endpoint));

        build_agent()
            .get(&health_url)
            .call()
            .map_err(|e| AtelierError::ExpansionError(format!("model unavailable: {}", e)))?;
        Ok(())
    }
}

impl TextModel for LlamaServerModel {
    fn complete(&self, prompt: &str, params: &SamplingParams) -> Result<String> {
        let payload = serde_json::json!({
            "prompt": prompt,
            "n_predict": params.max_tokens,
            "temperature": params.temperature,
            "top_p": params.top_p,
            "stop": params.stop,
        });

        let mut response = build_agent()
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .send_json(&payload)
            .map_err(|e| AtelierError::ExpansionError(format!("completion failed: {}", e)))?;

        let completion: CompletionResponse = response.body_mut().read_json().map_err(|e| {
            AtelierError::ExpansionError(format!("malformed completion response: {}", e))
        })?;

        Ok(completion.content)
    }
}

fn build_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(MODEL_TIMEOUT_SECS)))
        .build();
    config.into()
}

/// Expands short prompts into rich descriptive ones, degrading to the
/// original prompt on any model failure
pub struct PromptExpander {
    model: Option<Box<dyn TextModel>>,
    params: SamplingParams,
}

impl PromptExpander {
    /// Build an expander from config, probing the model once. A disabled or
    /// unreachable model yields an expander that passes prompts through.
    pub fn from_config(config: &ModelConfig) -> Self {
        if !config.enabled {
            info!("prompt expansion disabled by config");
            return Self::disabled();
        }

        match LlamaServerModel::connect(&config.endpoint) {
            Ok(model) => {
                info!(endpoint = %config.endpoint, "language model initialized");
                Self::with_model(Box::new(model), SamplingParams::from_config(config))
            }
            Err(e) => {
                warn!("language model unavailable, prompts will pass through: {}", e);
                Self::disabled()
            }
        }
    }

    /// Expander backed by a specific model (used by tests)
    pub fn with_model(model: Box<dyn TextModel>, params: SamplingParams) -> Self {
        Self {
            model: Some(model),
            params,
        }
    }

    /// Expander that always returns the input unchanged
    pub fn disabled() -> Self {
        Self {
            model: None,
            params: SamplingParams::default(),
        }
    }

    /// Expand a prompt. Never fails: model errors and empty completions
    /// degrade to the original prompt.
    pub fn expand(&self, prompt: &str) -> String {
        let Some(model) = &self.model else {
            return prompt.to_string();
        };

        let formatted = format!(
            "{}\n\nOriginal prompt: {}\n\nEnhanced prompt:",
            SYSTEM_PROMPT, prompt
        );

        match model.complete(&formatted, &self.params) {
            Ok(raw) => {
                let enhanced = raw
                    .trim()
                    .trim_start_matches("Enhanced prompt:")
                    .trim()
                    .to_string();
                if enhanced.is_empty() {
                    warn!("model returned empty completion, keeping original prompt");
                    prompt.to_string()
                } else {
                    info!(original = %prompt, expanded = %enhanced, "prompt expanded");
                    enhanced
                }
            }
            Err(e) => {
                warn!("prompt expansion degraded: {}", e);
                prompt.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel(&'static str);

    impl TextModel for FixedModel {
        fn complete(&self, _prompt: &str, _params: &SamplingParams) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingModel;

    impl TextModel for FailingModel {
        fn complete(&self, _prompt: &str, _params: &SamplingParams) -> Result<String> {
            Err(AtelierError::ExpansionError("inference timeout".to_string()))
        }
    }

    #[test]
    fn test_sampling_params_honor_configured_stop() {
        let config = ModelConfig {
            stop: vec!["###".to_string()],
            ..ModelConfig::default()
        };
        let params = SamplingParams::from_config(&config);
        assert_eq!(params.stop, vec!["###".to_string()]);
    }

    #[test]
    fn test_disabled_expander_is_identity() {
        let expander = PromptExpander::disabled();
        assert_eq!(expander.expand("a red fox in snow"), "a red fox in snow");
    }

    #[test]
    fn test_expansion_strips_echoed_label() {
        let expander = PromptExpander::with_model(
            Box::new(FixedModel(
                "Enhanced prompt: a red fox in deep powder snow, golden hour light",
            )),
            SamplingParams::default(),
        );
        assert_eq!(
            expander.expand("a red fox in snow"),
            "a red fox in deep powder snow, golden hour light"
        );
    }

    #[test]
    fn test_model_failure_degrades_to_original() {
        let expander =
            PromptExpander::with_model(Box::new(FailingModel), SamplingParams::default());
        assert_eq!(expander.expand("a red fox in snow"), "a red fox in snow");
    }

    #[test]
    fn test_empty_completion_degrades_to_original() {
        let expander =
            PromptExpander::with_model(Box::new(FixedModel("   ")), SamplingParams::default());
        assert_eq!(expander.expand("a red fox in snow"), "a red fox in snow");
    }

    #[test]
    fn test_nonempty_input_never_yields_empty_output() {
        for expander in [
            PromptExpander::disabled(),
            PromptExpander::with_model(Box::new(FailingModel), SamplingParams::default()),
            PromptExpander::with_model(Box::new(FixedModel("")), SamplingParams::default()),
        ] {
            assert!(!expander.expand("x").is_empty());
        }
    }
}
