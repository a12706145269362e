//! Atelier Pipeline - prompt-to-3D generation pipeline
//!
//! Takes a short text prompt, enriches it with a local language model,
//! synthesizes an image and a 3D model through remote capabilities, persists
//! both artifacts, and journals the run for later recall. Remote capabilities
//! are reached through a single-method client trait so tests can substitute a
//! deterministic mock.

pub mod artifact;
pub mod capability;
pub mod config;
pub mod expander;
pub mod journal;
pub mod mock;
pub mod pipeline;
pub mod remote;

pub use artifact::{ArtifactKind, ArtifactStore};
pub use capability::{image_request, model_request, CapabilityClient, CapabilityId, GenerationRequest};
pub use config::AtelierConfig;
pub use expander::{LlamaServerModel, PromptExpander, SamplingParams, TextModel};
pub use journal::{GenerationRecord, Journal};
pub use mock::MockClient;
pub use pipeline::{Pipeline, PipelineResult, StageError};
pub use remote::RemoteClient;
