mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing::warn;

// mimalloc avoids glibc malloc bloat under the BFS engine's per-batch
// concurrent fan-out.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use blogcrawler_core::AppConfig;

use crate::cli::{AdminCommands, Cli, Commands};

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config).unwrap_or_else(|_| {
        warn!(path = %cli.config, "config file not found, using built-in defaults");
        include_str!("../config/default.toml").to_string()
    });
    let mut config: AppConfig = toml::from_str(&config_str)?;

    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database.postgres_url = url;
    }
    if let Ok(v) = std::env::var("MAX_CRAWL_BATCH_SIZE") {
        if let Ok(n) = v.parse::<usize>() {
            config.crawl.initial_batch_size = n;
        }
    }

    match cli.command {
        Commands::Crawl { seed, yes } => {
            commands::crawl::run(config, seed, yes).await?;
        }
        Commands::Search { query, limit } => {
            commands::search::run(config, query, limit).await?;
        }
        Commands::PrintDomains => {
            commands::search::print_domains(config).await?;
        }
        Commands::Inspect { domain_url } => {
            commands::search::inspect(config, domain_url).await?;
        }
        Commands::Status => {
            commands::status::run(config).await?;
        }
        Commands::Serve => {
            commands::serve::run(config).await?;
        }
        Commands::Admin(AdminCommands::DropAll) => {
            commands::admin::drop_all(config).await?;
        }
        Commands::Admin(AdminCommands::Purge { domain_url }) => {
            commands::admin::purge(config, domain_url).await?;
        }
    }

    Ok(())
}
