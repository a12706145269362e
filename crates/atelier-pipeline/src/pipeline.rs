//! Pipeline orchestrator
//!
//! Runs one generation end to end: expand the prompt, synthesize an image,
//! persist it, synthesize a 3D model from the persisted image, persist that,
//! then journal the run. Each stage either advances the run or terminates it
//! with a classified error; nothing escapes `run` as a raw failure — callers
//! always get a structured result.
//!
//! Artifacts written before a later stage fails are left on disk. There is
//! no rollback or compensation.

use atelier_core::ContentHash;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::artifact::{ArtifactKind, ArtifactStore};
use crate::capability::{image_request, model_request, CapabilityClient, CapabilityId};
use crate::config::AtelierConfig;
use crate::expander::PromptExpander;
use crate::journal::{GenerationRecord, Journal};

/// Classified failure of a single pipeline run.
///
/// The variant name is embedded in the caller-visible error string so
/// transports can distinguish failure stages without extra structure.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("ImageSynthesisFailed: {0}")]
    ImageSynthesis(String),

    #[error("ThreeDSynthesisFailed: {0}")]
    ThreeDSynthesis(String),

    #[error("StorageError: {0}")]
    Storage(String),

    #[error("PersistenceError: {0}")]
    Persistence(String),
}

/// Caller-visible outcome of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PipelineResult {
    Success {
        original_prompt: String,
        expanded_prompt: String,
        image_path: String,
        model_path: String,
    },
    Error {
        error: String,
    },
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResult::Success { .. })
    }
}

/// Sequences a single generation run through its stages
pub struct Pipeline {
    expander: PromptExpander,
    client: Box<dyn CapabilityClient>,
    store: ArtifactStore,
    journal: Journal,
    image_capability: CapabilityId,
    model_capability: CapabilityId,
    config: AtelierConfig,
}

impl Pipeline {
    /// Build a pipeline from config. The artifact store and journal live
    /// under the configured data directory.
    pub fn new(
        config: AtelierConfig,
        client: Box<dyn CapabilityClient>,
        expander: PromptExpander,
    ) -> atelier_core::Result<Self> {
        let store = ArtifactStore::new(&config.storage.data_dir)?;
        let journal = Journal::open(config.storage.data_dir.join("journal.json"))?;

        Ok(Self {
            expander,
            client,
            store,
            journal,
            image_capability: CapabilityId::new(&config.service.text_to_image_id),
            model_capability: CapabilityId::new(&config.service.image_to_3d_id),
            config,
        })
    }

    /// Run the full pipeline for one prompt. Never panics and never returns
    /// a raw error; failures come back as `PipelineResult::Error`.
    pub fn run(&self, prompt: &str) -> PipelineResult {
        match self.execute(prompt) {
            Ok(result) => result,
            Err(e) => {
                error!("pipeline run failed: {}", e);
                PipelineResult::Error {
                    error: e.to_string(),
                }
            }
        }
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    fn execute(&self, prompt: &str) -> Result<PipelineResult, StageError> {
        // Expansion cannot fail the run; it degrades internally.
        let expanded = self.expander.expand(prompt);

        let image_bytes = self.synthesize_image(&expanded)?;
        let image_path = self
            .store
            .write(ArtifactKind::Image, &image_bytes)
            .map_err(|e| StageError::Storage(e.to_string()))?;
        info!(path = %image_path.display(), "image artifact persisted");

        let model_bytes = self.synthesize_model(&image_path)?;
        let model_path = self
            .store
            .write(ArtifactKind::Model, &model_bytes)
            .map_err(|e| StageError::Storage(e.to_string()))?;
        info!(path = %model_path.display(), "3D artifact persisted");

        let mut record = GenerationRecord::now(
            prompt,
            expanded.as_str(),
            image_path.to_string_lossy(),
            model_path.to_string_lossy(),
        );
        record.image_hash = Some(ContentHash::from_bytes(&image_bytes).to_prefixed_hex());
        record.model_hash = Some(ContentHash::from_bytes(&model_bytes).to_prefixed_hex());

        // Journal failure is fatal by policy: a run the journal cannot
        // recall is reported as failed even though its artifacts exist.
        self.journal
            .append(record)
            .map_err(|e| StageError::Persistence(e.to_string()))?;

        Ok(PipelineResult::Success {
            original_prompt: prompt.to_string(),
            expanded_prompt: expanded,
            image_path: image_path.to_string_lossy().to_string(),
            model_path: model_path.to_string_lossy().to_string(),
        })
    }

    fn synthesize_image(&self, expanded: &str) -> Result<Vec<u8>, StageError> {
        let request = image_request(expanded, &self.config.synthesis);
        let bytes = self
            .client
            .invoke(&self.image_capability, &request)
            .map_err(|e| StageError::ImageSynthesis(e.to_string()))?;
        if bytes.is_empty() {
            return Err(StageError::ImageSynthesis("empty payload".to_string()));
        }
        Ok(bytes)
    }

    fn synthesize_model(&self, image_path: &std::path::Path) -> Result<Vec<u8>, StageError> {
        let request = model_request(image_path, &self.config.synthesis);
        let bytes = self
            .client
            .invoke(&self.model_capability, &request)
            .map_err(|e| StageError::ThreeDSynthesis(e.to_string()))?;
        if bytes.is_empty() {
            return Err(StageError::ThreeDSynthesis("empty payload".to_string()));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::GenerationRequest;
    use crate::mock::MockClient;
    use atelier_core::{AtelierError, Result};
    use std::path::PathBuf;

    fn test_config() -> (AtelierConfig, PathBuf) {
        let dir =
            std::env::temp_dir().join(format!("atelier_pipeline_test_{}", uuid::Uuid::new_v4()));
        let mut config = AtelierConfig::default();
        config.storage.data_dir = dir.clone();
        config.service.text_to_image_id = "cap-image".to_string();
        config.service.image_to_3d_id = "cap-3d".to_string();
        (config, dir)
    }

    fn mock_pipeline() -> (Pipeline, PathBuf) {
        let (config, dir) = test_config();
        let client = MockClient::from_config(&config.service);
        let pipeline =
            Pipeline::new(config, Box::new(client), PromptExpander::disabled()).unwrap();
        (pipeline, dir)
    }

    /// Client that fails or returns empty payloads for selected capabilities
    struct FaultyClient {
        image: MockClient,
        fail_image: bool,
        fail_model: bool,
    }

    impl CapabilityClient for FaultyClient {
        fn invoke(
            &self,
            capability: &CapabilityId,
            request: &GenerationRequest,
        ) -> Result<Vec<u8>> {
            if capability.as_str() == "cap-image" {
                if self.fail_image {
                    return Ok(Vec::new());
                }
                return self.image.invoke(capability, request);
            }
            if self.fail_model {
                return Err(AtelierError::service("cap-3d", "service unreachable"));
            }
            self.image.invoke(capability, request)
        }
    }

    #[test]
    fn test_successful_run_shape() {
        let (pipeline, dir) = mock_pipeline();

        let result = pipeline.run("a red fox in snow");
        match &result {
            PipelineResult::Success {
                original_prompt,
                expanded_prompt,
                image_path,
                model_path,
            } => {
                assert_eq!(original_prompt, "a red fox in snow");
                assert!(!expanded_prompt.is_empty());
                assert!(image_path.ends_with(".png"));
                assert!(model_path.ends_with(".glb"));
                assert!(std::path::Path::new(image_path).exists());
                assert!(std::path::Path::new(model_path).exists());
            }
            PipelineResult::Error { error } => panic!("unexpected failure: {}", error),
        }

        assert_eq!(pipeline.journal().len().unwrap(), 1);
        let records = pipeline.journal().find("red fox").unwrap();
        assert_eq!(records[0].original_prompt, "a red fox in snow");
        assert!(records[0].image_hash.is_some());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_two_runs_distinct_artifacts_and_records() {
        let (pipeline, dir) = mock_pipeline();

        let first = pipeline.run("a red fox in snow");
        let second = pipeline.run("a red fox in snow");

        let paths = |r: &PipelineResult| match r {
            PipelineResult::Success {
                image_path,
                model_path,
                ..
            } => (image_path.clone(), model_path.clone()),
            _ => panic!("expected success"),
        };
        let (img1, mdl1) = paths(&first);
        let (img2, mdl2) = paths(&second);
        assert_ne!(img1, img2);
        assert_ne!(mdl1, mdl2);
        assert_eq!(pipeline.journal().len().unwrap(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_image_payload_fails_run() {
        let (config, dir) = test_config();
        let client = FaultyClient {
            image: MockClient::from_config(&config.service),
            fail_image: true,
            fail_model: false,
        };
        let pipeline =
            Pipeline::new(config, Box::new(client), PromptExpander::disabled()).unwrap();

        let result = pipeline.run("a red fox in snow");
        match result {
            PipelineResult::Error { error } => {
                assert!(error.contains("ImageSynthesisFailed"), "got: {}", error)
            }
            _ => panic!("expected error result"),
        }
        assert_eq!(pipeline.journal().len().unwrap(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_3d_failure_keeps_image_artifact() {
        let (config, dir) = test_config();
        let client = FaultyClient {
            image: MockClient::from_config(&config.service),
            fail_image: false,
            fail_model: true,
        };
        let pipeline =
            Pipeline::new(config, Box::new(client), PromptExpander::disabled()).unwrap();

        let result = pipeline.run("a red fox in snow");
        match result {
            PipelineResult::Error { error } => {
                assert!(error.contains("ThreeDSynthesisFailed"), "got: {}", error)
            }
            _ => panic!("expected error result"),
        }

        // The image was written before the 3D stage failed; no rollback.
        let images: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "png"))
            .collect();
        assert_eq!(images.len(), 1);
        assert_eq!(pipeline.journal().len().unwrap(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_result_json_contract() {
        let (pipeline, dir) = mock_pipeline();

        let result = pipeline.run("contract check");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["original_prompt"], "contract check");

        let error = PipelineResult::Error {
            error: "ImageSynthesisFailed: boom".to_string(),
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["status"], "error");

        std::fs::remove_dir_all(&dir).ok();
    }
}
