use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blogcrawler", about = "Discovers and indexes personal technical blogs")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a seed URL, then its one-hop external-domain neighbors
    Crawl {
        /// Seed URL to start from
        seed: String,

        /// Skip the interactive Y/N confirmation prompt (treat every
        /// classified blog as confirmed)
        #[arg(long)]
        yes: bool,
    },
    /// Full-text search over stored entries
    Search {
        /// Phrase query
        query: String,

        /// Max results
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },
    /// Print every accepted and excluded domain
    PrintDomains,
    /// Print one domain's record and its entries
    Inspect {
        /// Canonical domain_url
        domain_url: String,
    },
    /// Print row counts for each table
    Status,
    /// Serve the HTTP search API
    Serve,
    /// Administrative operations
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Drop and recreate every table
    DropAll,
    /// Remove a domain from every table (entries, domain, excluded row)
    Purge {
        /// Canonical domain_url
        domain_url: String,
    },
}
