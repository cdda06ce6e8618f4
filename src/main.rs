use log::info;
use std::collections::HashSet;
use std::env;
use std::sync::Arc;

use recipe_import::{load_config, InMemoryRepository, RecipeImporter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Get the URLs from command-line arguments
    let urls: Vec<String> = env::args().skip(1).collect();
    if urls.is_empty() {
        return Err("Usage: recipe-import <url>...".into());
    }

    let config = load_config()?;
    let importer = RecipeImporter::from_config(&config, Arc::new(InMemoryRepository::new()))?;

    let status = importer.extraction_status();
    info!(
        "AI extraction {}",
        if status.ai_available { "enabled" } else { "disabled" }
    );

    if let [url] = urls.as_slice() {
        let result = importer.import_from_url(url, None).await;
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let results = importer.batch_import(&urls, None, None).await;
        // Print in input order, once per distinct URL
        let mut printed = HashSet::new();
        let ordered: Vec<_> = urls
            .iter()
            .filter(|url| printed.insert(url.as_str()))
            .filter_map(|url| results.get(url))
            .collect();
        println!("{}", serde_json::to_string_pretty(&ordered)?);
    }

    Ok(())
}
