use anyhow::Result;
use blogcrawler_core::AppConfig;
use blogcrawler_storage::Storage;

pub async fn run(config: AppConfig) -> Result<()> {
    let storage = Storage::new(&config.database.postgres_url).await?;

    match storage.check_connectivity().await {
        Ok(()) => println!("Database: connected"),
        Err(e) => {
            println!("Database: ERROR - {e}");
            return Ok(());
        }
    }

    storage.run_migrations().await?;

    let domains = storage.domains_count().await?;
    let excluded = storage.excluded_domains_count().await?;
    let entries = storage.entries_count().await?;

    println!("\n== blogcrawler status ==");
    println!("  Domains accepted: {domains}");
    println!("  Domains excluded: {excluded}");
    println!("  Entries stored:   {entries}");

    Ok(())
}
