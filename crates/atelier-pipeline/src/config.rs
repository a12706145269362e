//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `ATELIER_*`
//! 2. Project-local: `.atelier/config.toml`
//! 3. Global: `~/.atelier/config.toml`
//!
//! The resolved `AtelierConfig` is built once at startup and handed to the
//! pipeline read-only; a config change means building a fresh value, never
//! mutating the one in use.

use atelier_core::{AtelierError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Remote generation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Capability id for text-to-image synthesis
    #[serde(default = "default_text_to_image_id")]
    pub text_to_image_id: String,
    /// Capability id for image-to-3D synthesis
    #[serde(default = "default_image_to_3d_id")]
    pub image_to_3d_id: String,
    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_service_url(),
            api_key: None,
            text_to_image_id: default_text_to_image_id(),
            image_to_3d_id: default_image_to_3d_id(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_service_url() -> String {
    "https://api.openfabric.ai".to_string()
}
fn default_text_to_image_id() -> String {
    "f0997a01-d6d3-a5fe-53d8-561300318557".to_string()
}
fn default_image_to_3d_id() -> String {
    "69543f29-4d41-4afc-7f29-3d51591f11eb".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

/// Local language model settings for prompt expansion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// llama.cpp-server style completion endpoint
    #[serde(default = "default_model_url")]
    pub endpoint: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// Stop sequences terminating a completion
    #[serde(default = "default_stop")]
    pub stop: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_model_url(),
            enabled: true,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            stop: default_stop(),
        }
    }
}

fn default_model_url() -> String {
    "http://127.0.0.1:8080/completion".to_string()
}
fn default_true() -> bool {
    true
}
fn default_max_tokens() -> u32 {
    200
}
fn default_temperature() -> f64 {
    0.7
}
fn default_top_p() -> f64 {
    0.9
}
fn default_stop() -> Vec<String> {
    vec!["Original prompt:".to_string()]
}

/// Fixed synthesis parameters sent with every generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default = "default_image_steps")]
    pub image_steps: u32,
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f64,
    #[serde(default = "default_model_steps")]
    pub model_steps: u32,
    #[serde(default = "default_resolution")]
    pub resolution: u32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            image_steps: default_image_steps(),
            guidance_scale: default_guidance_scale(),
            model_steps: default_model_steps(),
            resolution: default_resolution(),
        }
    }
}

fn default_image_steps() -> u32 {
    50
}
fn default_guidance_scale() -> f64 {
    7.5
}
fn default_model_steps() -> u32 {
    1000
}
fn default_resolution() -> u32 {
    512
}

/// Artifact and journal storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("datastore")
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtelierConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// One config file, with every field optional.
///
/// A layer only overrides the fields it actually declares; anything it
/// omits keeps the value from the layer below.
#[derive(Debug, Default, Deserialize)]
struct ConfigLayer {
    #[serde(default)]
    service: ServiceLayer,
    #[serde(default)]
    model: ModelLayer,
    #[serde(default)]
    synthesis: SynthesisLayer,
    #[serde(default)]
    storage: StorageLayer,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceLayer {
    base_url: Option<String>,
    api_key: Option<String>,
    text_to_image_id: Option<String>,
    image_to_3d_id: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ModelLayer {
    endpoint: Option<String>,
    enabled: Option<bool>,
    max_tokens: Option<u32>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    stop: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct SynthesisLayer {
    image_steps: Option<u32>,
    guidance_scale: Option<f64>,
    model_steps: Option<u32>,
    resolution: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct StorageLayer {
    data_dir: Option<PathBuf>,
}

impl ConfigLayer {
    fn apply(self, config: &mut AtelierConfig) {
        macro_rules! take {
            ($layer:expr => $target:expr) => {
                if let Some(v) = $layer {
                    $target = v;
                }
            };
        }

        take!(self.service.base_url => config.service.base_url);
        take!(self.service.text_to_image_id => config.service.text_to_image_id);
        take!(self.service.image_to_3d_id => config.service.image_to_3d_id);
        take!(self.service.timeout_secs => config.service.timeout_secs);
        if self.service.api_key.is_some() {
            config.service.api_key = self.service.api_key;
        }

        take!(self.model.endpoint => config.model.endpoint);
        take!(self.model.enabled => config.model.enabled);
        take!(self.model.max_tokens => config.model.max_tokens);
        take!(self.model.temperature => config.model.temperature);
        take!(self.model.top_p => config.model.top_p);
        take!(self.model.stop => config.model.stop);

        take!(self.synthesis.image_steps => config.synthesis.image_steps);
        take!(self.synthesis.guidance_scale => config.synthesis.guidance_scale);
        take!(self.synthesis.model_steps => config.synthesis.model_steps);
        take!(self.synthesis.resolution => config.synthesis.resolution);

        take!(self.storage.data_dir => config.storage.data_dir);
    }
}

impl AtelierConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = AtelierConfig::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                Self::load_layer(&global_path)?.apply(&mut config);
            }
        }

        let local_path = PathBuf::from(".atelier/config.toml");
        if local_path.exists() {
            Self::load_layer(&local_path)?.apply(&mut config);
        }

        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Load config from a specific file path only (for testing)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = AtelierConfig::default();
        Self::load_layer(path)?.apply(&mut config);
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".atelier").join("config.toml"))
    }

    fn load_layer(path: &Path) -> Result<ConfigLayer> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            AtelierError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn apply_env_overrides(config: &mut AtelierConfig) {
        if let Ok(key) = std::env::var("ATELIER_API_KEY") {
            config.service.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("ATELIER_SERVICE_URL") {
            config.service.base_url = url;
        }
        if let Ok(id) = std::env::var("ATELIER_TEXT_TO_IMAGE_APP_ID") {
            config.service.text_to_image_id = id;
        }
        if let Ok(id) = std::env::var("ATELIER_IMAGE_TO_3D_APP_ID") {
            config.service.image_to_3d_id = id;
        }
        if let Ok(url) = std::env::var("ATELIER_MODEL_URL") {
            config.model.endpoint = url;
        }
    }
}
