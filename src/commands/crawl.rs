use anyhow::{Context, Result};
use blogcrawler_core::{AlwaysYes, AppConfig, Confirmer, Prompt};
use blogcrawler_extract::{ClaudeDomainClassifier, ClaudeEntryParser};
use blogcrawler_fetch::HttpFetcher;
use blogcrawler_ingest::run_spider;
use blogcrawler_storage::Storage;

pub async fn run(config: AppConfig, seed: String, yes: bool) -> Result<()> {
    let storage = Storage::new(&config.database.postgres_url).await?;
    storage.run_migrations().await?;

    // Fetcher is acquired once before Ingest and lives for the whole run.
    let fetcher = HttpFetcher::new(config.general.page_timeout_secs)?;

    let api_key = std::env::var(&config.llm.api_key_env).with_context(|| {
        format!(
            "{} not set; required for domain classification and entry extraction",
            config.llm.api_key_env
        )
    })?;
    let classifier = ClaudeDomainClassifier::new(api_key.clone(), config.llm.classify_model.clone());
    let parser = ClaudeEntryParser::new(api_key, config.llm.parse_model.clone());

    let confirmer: Box<dyn Confirmer> = if yes { Box::new(AlwaysYes) } else { Box::new(Prompt) };

    run_spider(
        &seed,
        &storage,
        &fetcher,
        &classifier,
        &parser,
        confirmer.as_ref(),
        &config.crawl,
    )
    .await
}
