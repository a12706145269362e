//! Generate command: run the full pipeline for one prompt

use anyhow::Result;
use atelier_pipeline::{CapabilityClient, MockClient, Pipeline, PromptExpander, RemoteClient};

pub fn run(
    prompt: &str,
    mock: bool,
    data_dir: Option<String>,
    config_path: Option<String>,
) -> Result<()> {
    let config = super::load_config(config_path, data_dir)?;

    let client: Box<dyn CapabilityClient> = if mock {
        Box::new(MockClient::from_config(&config.service))
    } else {
        Box::new(RemoteClient::from_config(&config.service))
    };

    let expander = if mock {
        PromptExpander::disabled()
    } else {
        PromptExpander::from_config(&config.model)
    };

    let pipeline = Pipeline::new(config, client, expander)?;
    let result = pipeline.run(prompt);

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
