//! Remote capability client
//!
//! Invokes a named generation capability over HTTP. Each call is a single
//! POST of the request payload to the capability's execution endpoint; the
//! response body is returned as opaque bytes. No retries here: a failed
//! call is reported immediately and the pipeline decides what to do.

use atelier_core::{AtelierError, Result};
use std::collections::HashSet;
use std::io::Read;
use std::time::Duration;

use crate::capability::{CapabilityClient, CapabilityId, GenerationRequest};
use crate::config::ServiceConfig;

/// HTTP client for the remote generation service
pub struct RemoteClient {
    base_url: String,
    api_key: Option<String>,
    known: HashSet<CapabilityId>,
    timeout: Duration,
}

impl RemoteClient {
    /// Create a client from service config; only the configured capability
    /// ids are accepted by `invoke`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let mut known = HashSet::new();
        known.insert(CapabilityId::new(&config.text_to_image_id));
        known.insert(CapabilityId::new(&config.image_to_3d_id));

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            known,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn build_agent(&self) -> ureq::Agent {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build();
        config.into()
    }

    fn execution_url(&self, capability: &CapabilityId) -> String {
        format!("{}/{}/execution", self.base_url, capability)
    }
}

impl CapabilityClient for RemoteClient {
    fn invoke(&self, capability: &CapabilityId, request: &GenerationRequest) -> Result<Vec<u8>> {
        if !self.known.contains(capability) {
            return Err(AtelierError::UnknownCapability(capability.to_string()));
        }

        let agent = self.build_agent();
        let mut call = agent
            .post(&self.execution_url(capability))
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            call = call.header("Authorization", &format!("Bearer {}", key));
        }

        let response = call.send_json(request).map_err(|e| {
            AtelierError::service(capability.as_str(), format!("request failed: {}", e))
        })?;

        let mut reader = response.into_body().into_reader();
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(|e| {
            AtelierError::service(capability.as_str(), format!("failed to read payload: {}", e))
        })?;

        if bytes.is_empty() {
            return Err(AtelierError::service(
                capability.as_str(),
                "empty payload returned",
            ));
        }

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::image_request;
    use crate::config::SynthesisConfig;

    fn test_config() -> ServiceConfig {
        ServiceConfig {
            base_url: "https://api.example.com/".to_string(),
            api_key: Some("key".to_string()),
            text_to_image_id: "cap-image".to_string(),
            image_to_3d_id: "cap-3d".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_execution_url_strips_trailing_slash() {
        let client = RemoteClient::from_config(&test_config());
        assert_eq!(
            client.execution_url(&CapabilityId::new("cap-image")),
            "https://api.example.com/cap-image/execution"
        );
    }

    #[test]
    fn test_unknown_capability_rejected_without_network() {
        let client = RemoteClient::from_config(&test_config());
        let req = image_request("anything", &SynthesisConfig::default());
        let err = client
            .invoke(&CapabilityId::new("not-configured"), &req)
            .unwrap_err();
        assert!(matches!(err, AtelierError::UnknownCapability(_)));
    }
}
