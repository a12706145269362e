//! History command: recall journal records by prompt substring

use anyhow::Result;
use atelier_pipeline::Journal;

pub fn run(substring: &str, data_dir: Option<String>, format: &str, verify: bool) -> Result<()> {
    let config = super::load_config(None, data_dir)?;
    let journal = Journal::open(config.storage.data_dir.join("journal.json"))?;
    let records = journal.find(substring)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&records)?),
        "table" => {
            if records.is_empty() {
                println!("No matching generations.");
                return Ok(());
            }
            for record in &records {
                println!("{}  {}", record.timestamp, record.original_prompt);
                println!("    image: {}", record.image_path);
                println!("    model: {}", record.model_path);
                if verify {
                    let status = if record.artifacts_intact() {
                        "intact"
                    } else {
                        "MODIFIED OR MISSING"
                    };
                    println!("    artifacts: {}", status);
                }
            }
            println!("{} generation(s).", records.len());
        }
        other => anyhow::bail!("Unknown format '{}'. Use: json, table", other),
    }

    Ok(())
}
