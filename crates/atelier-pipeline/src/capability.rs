//! Capability client trait and request builders
//!
//! A capability is a named remote generation endpoint (text-to-image,
//! image-to-3D). The client surface is a single `invoke` so production and
//! mock implementations are interchangeable behind a trait object.

use atelier_core::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::config::SynthesisConfig;

/// Stable identifier for a remote generation capability
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilityId(String);

impl CapabilityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CapabilityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A capability-specific key-value payload.
///
/// The shape is owned by the capability, not by us, so this stays untyped
/// JSON; the builders below produce the two shapes the pipeline sends.
pub type GenerationRequest = serde_json::Value;

/// Build a text-to-image request from an expanded prompt
pub fn image_request(prompt: &str, synthesis: &SynthesisConfig) -> GenerationRequest {
    serde_json::json!({
        "prompt": prompt,
        "num_inference_steps": synthesis.image_steps,
        "guidance_scale": synthesis.guidance_scale,
    })
}

/// Build an image-to-3D request referencing a persisted image
pub fn model_request(image_path: &Path, synthesis: &SynthesisConfig) -> GenerationRequest {
    serde_json::json!({
        "image_path": image_path.to_string_lossy(),
        "num_steps": synthesis.model_steps,
        "resolution": synthesis.resolution,
    })
}

/// Trait implemented by each capability client (remote, mock)
///
/// `invoke` is stateless per call and performs no retries; the returned
/// bytes are opaque to the client. Retry policy, if any, belongs to the
/// caller.
pub trait CapabilityClient: Send + Sync {
    fn invoke(&self, capability: &CapabilityId, request: &GenerationRequest) -> Result<Vec<u8>>;
}
