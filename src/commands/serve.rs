use anyhow::Result;
use blogcrawler_api::router;
use blogcrawler_core::AppConfig;
use blogcrawler_search::SearchEngine;
use blogcrawler_storage::Storage;
use tracing::info;

pub async fn run(config: AppConfig) -> Result<()> {
    let storage = Storage::new(&config.database.postgres_url).await?;
    storage.run_migrations().await?;

    let app = router(SearchEngine::new(storage));

    let listener = tokio::net::TcpListener::bind(&config.api.bind_addr).await?;
    info!(addr = %config.api.bind_addr, "serving search API");
    axum::serve(listener, app).await?;
    Ok(())
}
