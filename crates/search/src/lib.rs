//! Search/Inspect query layer: full-text search over entries, plus the
//! domain inspection views used by the CLI.

use anyhow::Result;
use blogcrawler_storage::{SearchHit, Storage};
use serde::Serialize;

const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResultRow {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub author: String,
    pub topics: Vec<String>,
    pub date: Option<chrono::NaiveDate>,
    pub url: String,
}

impl From<SearchHit> for SearchResultRow {
    fn from(hit: SearchHit) -> Self {
        SearchResultRow {
            id: hit.id,
            title: hit.title,
            summary: hit.summary,
            author: hit.author,
            topics: hit.topics,
            date: hit.date_published,
            url: hit.entry_url,
        }
    }
}

pub struct SearchEngine {
    storage: Storage,
}

impl SearchEngine {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// English phrase query over `title ‖ summary ‖ topics ‖ author`. No
    /// pagination guarantee beyond `limit`.
    pub async fn search(&self, phrase: &str, limit: Option<i64>) -> Result<Vec<SearchResultRow>> {
        let hits = self
            .storage
            .entries_search(phrase, limit.unwrap_or(DEFAULT_LIMIT))
            .await?;
        Ok(hits.into_iter().map(Into::into).collect())
    }
}

/// CLI inspector views (`--print_domains`, `--inspect <domain_url>`).
pub struct Inspector<'a> {
    storage: &'a Storage,
}

impl<'a> Inspector<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn print_domains(&self) -> Result<()> {
        let domains = self.storage.domains_get_all().await?;
        println!("Domains ({}):", domains.len());
        for d in &domains {
            println!("  {} [{}] {}", d.domain_url, d.entity, d.name);
        }

        let excluded = self.storage.excluded_domains_get_all().await?;
        println!("\nExcludedDomains ({}):", excluded.len());
        for e in &excluded {
            println!("  {} [{}] \u{2014} {}", e.domain_url, e.entity, e.reason);
        }
        Ok(())
    }

    pub async fn inspect_domain(&self, domain_url: &str) -> Result<()> {
        let Some(domain) = self.storage.domains_get(domain_url).await? else {
            println!("no such domain: {domain_url}");
            return Ok(());
        };

        println!("{} [{}] {}", domain.domain_url, domain.entity, domain.name);
        println!("  last scraped: {}", domain.date_last_scraped);
        println!("  external domains: {}", domain.external_domains.len());
        println!("  external links: {}", domain.external_links.len());
        println!("  target internal links: {}", domain.target_internal_links.len());
        println!(
            "  nontarget internal links: {}",
            domain.nontarget_internal_links.len()
        );

        let entries = self.storage.entries_get_for_domain(domain_url).await?;
        println!();
        println!("{:<62}{:<62}{:<30}", "title", "entry_url", "author");
        for entry in &entries {
            println!(
                "{:<62}{:<62}{:<30}",
                truncate(&entry.title, 60),
                truncate(&entry.entry_url, 60),
                truncate(&entry.author, 60),
            );
        }
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_strings_alone() {
        assert_eq!(truncate("hello", 60), "hello");
    }

    #[test]
    fn truncate_cuts_long_strings_at_60_chars() {
        let long = "a".repeat(100);
        assert_eq!(truncate(&long, 60).chars().count(), 60);
    }
}
