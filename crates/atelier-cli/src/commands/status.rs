//! Status command: show resolved config and collaborator availability

use anyhow::Result;
use atelier_pipeline::LlamaServerModel;

pub fn run(config_path: Option<String>) -> Result<()> {
    let config = super::load_config(config_path, None)?;

    println!("service:");
    println!("  base_url:       {}", config.service.base_url);
    println!(
        "  api_key:        {}",
        if config.service.api_key.is_some() {
            "configured"
        } else {
            "not set"
        }
    );
    println!("  text_to_image:  {}", config.service.text_to_image_id);
    println!("  image_to_3d:    {}", config.service.image_to_3d_id);

    println!("model:");
    println!("  endpoint:       {}", config.model.endpoint);
    if config.model.enabled {
        match LlamaServerModel::connect(&config.model.endpoint) {
            Ok(_) => println!("  status:         available"),
            Err(e) => println!("  status:         unavailable ({})", e),
        }
    } else {
        println!("  status:         disabled");
    }

    println!("synthesis:");
    println!("  image_steps:    {}", config.synthesis.image_steps);
    println!("  guidance_scale: {}", config.synthesis.guidance_scale);
    println!("  model_steps:    {}", config.synthesis.model_steps);
    println!("  resolution:     {}", config.synthesis.resolution);

    println!("storage:");
    println!("  data_dir:       {}", config.storage.data_dir.display());

    Ok(())
}
