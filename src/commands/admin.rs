use anyhow::Result;
use blogcrawler_core::AppConfig;
use blogcrawler_storage::Storage;

pub async fn drop_all(config: AppConfig) -> Result<()> {
    let storage = Storage::new(&config.database.postgres_url).await?;
    storage.drop_all_and_recreate().await?;
    println!("dropped and recreated domains, excluded_domains, entries");
    Ok(())
}

pub async fn purge(config: AppConfig, domain_url: String) -> Result<()> {
    let storage = Storage::new(&config.database.postgres_url).await?;
    storage.purge_domain(&domain_url).await?;
    println!("purged {domain_url} from every table");
    Ok(())
}
