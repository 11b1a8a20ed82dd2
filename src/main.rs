use std::sync::Arc;

use ttrpg_search::config::AppConfig;
use ttrpg_search::core::search::{
    Document, HashEmbedder, InMemoryVectorStore, SearchOptions, SearchService,
};

fn usage() -> String {
    format!(
        "{} v{}\n\nUsage: {} <documents.json> <query...>",
        ttrpg_search::NAME,
        ttrpg_search::VERSION,
        ttrpg_search::NAME
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(documents_path), query) = (args.next(), args.collect::<Vec<_>>().join(" ")) else {
        eprintln!("{}", usage());
        std::process::exit(2);
    };
    if query.trim().is_empty() {
        eprintln!("{}", usage());
        std::process::exit(2);
    }

    let config = AppConfig::load();
    let _log_guard = ttrpg_search::core::logging::init(&config.logging);
    log::info!("{} v{} starting", ttrpg_search::NAME, ttrpg_search::VERSION);

    let contents = std::fs::read_to_string(&documents_path)?;
    let documents: Vec<Document> = serde_json::from_str(&contents)?;

    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(InMemoryVectorStore::new(embedder.clone()));

    let collection = config
        .search
        .default_collections
        .first()
        .cloned()
        .unwrap_or_else(|| ttrpg_search::core::search::DEFAULT_COLLECTION.to_string());
    let count = store.upsert(&collection, documents).await?;
    log::info!("Loaded {} documents from {}", count, documents_path);

    let service = SearchService::new(store, embedder, config.search.clone())?;
    let response = service
        .search(&query, SearchOptions::default().in_collection(collection))
        .await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
