use anyhow::Result;
use blogcrawler_core::AppConfig;
use blogcrawler_search::{Inspector, SearchEngine};
use blogcrawler_storage::Storage;

pub async fn run(config: AppConfig, query: String, limit: i64) -> Result<()> {
    let storage = Storage::new(&config.database.postgres_url).await?;
    let search = SearchEngine::new(storage);

    let results = search.search(&query, Some(limit)).await?;
    println!("Found {} results:\n", results.len());
    for r in results {
        println!("  {} — {}", r.title, r.url);
        println!("    by {} | {}", r.author, r.date.map(|d| d.to_string()).unwrap_or_default());
        println!("    {}\n", r.summary);
    }
    Ok(())
}

pub async fn print_domains(config: AppConfig) -> Result<()> {
    let storage = Storage::new(&config.database.postgres_url).await?;
    Inspector::new(&storage).print_domains().await
}

pub async fn inspect(config: AppConfig, domain_url: String) -> Result<()> {
    let storage = Storage::new(&config.database.postgres_url).await?;
    Inspector::new(&storage).inspect_domain(&domain_url).await
}
