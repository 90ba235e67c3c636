use std::collections::BTreeSet;

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use blogcrawler_core::{Domain, ExcludedDomain, Entry};

/// Single data-access layer grouping the three repositories named in the
/// persistence contract (Domains, ExcludedDomains, Entries) over one pool.
#[derive(Clone)]
pub struct Storage {
    pool: PgPool,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::with_pool_size(database_url, 10).await
    }

    pub async fn with_pool_size(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::raw_sql(include_str!("../migrations/001_init.sql"))
            .execute(&self.pool)
            .await?;
        info!("migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ---- Domains ----

    pub async fn domains_contains(&self, domain_url: &str) -> Result<bool> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM domains WHERE domain_url = $1)")
                .bind(domain_url)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    /// Fails (unique violation surfaced as an error) if `domain_url` already
    /// exists.
    pub async fn domains_add(&self, domain: &Domain) -> Result<()> {
        sqlx::query(
            "INSERT INTO domains
                (domain_url, entity, name, alias_domains, external_domains, external_links,
                 target_internal_links, nontarget_internal_links, date_last_scraped)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&domain.domain_url)
        .bind(domain.entity.as_str())
        .bind(&domain.name)
        .bind(set_to_vec(&domain.alias_domains))
        .bind(set_to_vec(&domain.external_domains))
        .bind(set_to_vec(&domain.external_links))
        .bind(set_to_vec(&domain.target_internal_links))
        .bind(set_to_vec(&domain.nontarget_internal_links))
        .bind(domain.date_last_scraped)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn domains_get(&self, domain_url: &str) -> Result<Option<Domain>> {
        let row: Option<DomainRow> = sqlx::query_as("SELECT * FROM domains WHERE domain_url = $1")
            .bind(domain_url)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    pub async fn domains_get_all(&self) -> Result<Vec<Domain>> {
        let rows: Vec<DomainRow> = sqlx::query_as("SELECT * FROM domains ORDER BY domain_url")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn domains_remove(&self, domain_url: &str) -> Result<()> {
        sqlx::query("DELETE FROM domains WHERE domain_url = $1")
            .bind(domain_url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn domains_add_alias(&self, domain_url: &str, alias: &str) -> Result<()> {
        sqlx::query(
            "UPDATE domains SET alias_domains = array_append(alias_domains, $2)
             WHERE domain_url = $1 AND NOT ($2 = ANY(alias_domains))",
        )
        .bind(domain_url)
        .bind(alias)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replaces all link sets and `date_last_scraped` in one statement.
    #[allow(clippy::too_many_arguments)]
    pub async fn domains_update_crawl_result(
        &self,
        domain_url: &str,
        external_domains: &BTreeSet<String>,
        external_links: &BTreeSet<String>,
        target_internal_links: &BTreeSet<String>,
        nontarget_internal_links: &BTreeSet<String>,
        date_last_scraped: NaiveDate,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE domains SET
                external_domains = $2,
                external_links = $3,
                target_internal_links = $4,
                nontarget_internal_links = $5,
                date_last_scraped = $6
             WHERE domain_url = $1",
        )
        .bind(domain_url)
        .bind(set_to_vec(external_domains))
        .bind(set_to_vec(external_links))
        .bind(set_to_vec(target_internal_links))
        .bind(set_to_vec(nontarget_internal_links))
        .bind(date_last_scraped)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ---- ExcludedDomains ----

    pub async fn excluded_domains_contains(&self, domain_url: &str) -> Result<bool> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM excluded_domains WHERE domain_url = $1)")
                .bind(domain_url)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    pub async fn excluded_domains_add(&self, excluded: &ExcludedDomain) -> Result<()> {
        sqlx::query(
            "INSERT INTO excluded_domains (domain_url, entity, alias_domains, reason)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&excluded.domain_url)
        .bind(excluded.entity.as_str())
        .bind(set_to_vec(&excluded.alias_domains))
        .bind(&excluded.reason)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn excluded_domains_get_all(&self) -> Result<Vec<ExcludedDomain>> {
        let rows: Vec<ExcludedDomainRow> =
            sqlx::query_as("SELECT * FROM excluded_domains ORDER BY domain_url")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn excluded_domains_remove(&self, domain_url: &str) -> Result<()> {
        sqlx::query("DELETE FROM excluded_domains WHERE domain_url = $1")
            .bind(domain_url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn excluded_domains_add_alias(&self, domain_url: &str, alias: &str) -> Result<()> {
        sqlx::query(
            "UPDATE excluded_domains SET alias_domains = array_append(alias_domains, $2)
             WHERE domain_url = $1 AND NOT ($2 = ANY(alias_domains))",
        )
        .bind(domain_url)
        .bind(alias)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ---- Entries ----

    /// Inserts the whole batch inside one transaction — a domain's entries
    /// land atomically with each other (and, at the Ingest call site, right
    /// after `domains_add` for the same domain).
    pub async fn entries_add_entries(&self, entries: &[Entry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for entry in entries {
            sqlx::query(
                "INSERT INTO entries
                    (domain_url, entry_url, title, summary, author, topics, date_published, alias_urls, links)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(&entry.domain_url)
            .bind(&entry.entry_url)
            .bind(&entry.title)
            .bind(&entry.summary)
            .bind(&entry.author)
            .bind(&entry.topics)
            .bind(entry.date_published)
            .bind(set_to_vec(&entry.alias_urls))
            .bind(set_to_vec(&entry.links))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn entries_get_for_domain(&self, domain_url: &str) -> Result<Vec<Entry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT domain_url, entry_url, title, summary, author, topics, date_published, alias_urls, links
             FROM entries WHERE domain_url = $1 ORDER BY id",
        )
        .bind(domain_url)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn entries_get_entries_linking_to(&self, target_url: &str) -> Result<Vec<Entry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT domain_url, entry_url, title, summary, author, topics, date_published, alias_urls, links
             FROM entries WHERE $1 = ANY(links)",
        )
        .bind(target_url)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn entries_remove_for_domain(&self, domain_url: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM entries WHERE domain_url = $1")
            .bind(domain_url)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// English phrase-query full-text search over the generated
    /// `title ‖ summary ‖ topics ‖ author` vector. No pagination guarantee;
    /// callers (the HTTP API) impose their own cap.
    pub async fn entries_search(&self, phrase: &str, limit: i64) -> Result<Vec<SearchHit>> {
        let rows: Vec<SearchHitRow> = sqlx::query_as(
            "SELECT id, title, summary, author, topics, date_published, entry_url
             FROM entries
             WHERE search_vector @@ phraseto_tsquery('english', $1)
             ORDER BY ts_rank(search_vector, phraseto_tsquery('english', $1)) DESC
             LIMIT $2",
        )
        .bind(phrase)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn entries_count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn domains_count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM domains")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn excluded_domains_count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM excluded_domains")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Cheap liveness probe used by `status`; also validates the pool.
    pub async fn check_connectivity(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ---- Administrative ----

    pub async fn drop_all_and_recreate(&self) -> Result<()> {
        sqlx::raw_sql("DROP TABLE IF EXISTS entries, excluded_domains, domains CASCADE")
            .execute(&self.pool)
            .await?;
        self.run_migrations().await
    }

    /// Removes entries, then the domain row, then any excluded-domain row —
    /// in that order, so the foreign key from `entries` never dangles.
    pub async fn purge_domain(&self, domain_url: &str) -> Result<()> {
        self.entries_remove_for_domain(domain_url).await?;
        self.domains_remove(domain_url).await?;
        self.excluded_domains_remove(domain_url).await?;
        Ok(())
    }
}

fn set_to_vec(set: &BTreeSet<String>) -> Vec<String> {
    set.iter().cloned().collect()
}

#[derive(sqlx::FromRow)]
struct DomainRow {
    domain_url: String,
    entity: String,
    name: String,
    alias_domains: Vec<String>,
    external_domains: Vec<String>,
    external_links: Vec<String>,
    target_internal_links: Vec<String>,
    nontarget_internal_links: Vec<String>,
    date_last_scraped: NaiveDate,
}

impl TryFrom<DomainRow> for Domain {
    type Error = anyhow::Error;

    fn try_from(row: DomainRow) -> Result<Self, Self::Error> {
        Ok(Domain {
            domain_url: row.domain_url,
            entity: row.entity.parse()?,
            name: row.name,
            alias_domains: row.alias_domains.into_iter().collect(),
            external_domains: row.external_domains.into_iter().collect(),
            external_links: row.external_links.into_iter().collect(),
            target_internal_links: row.target_internal_links.into_iter().collect(),
            nontarget_internal_links: row.nontarget_internal_links.into_iter().collect(),
            date_last_scraped: row.date_last_scraped,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ExcludedDomainRow {
    domain_url: String,
    entity: String,
    alias_domains: Vec<String>,
    reason: String,
}

impl TryFrom<ExcludedDomainRow> for ExcludedDomain {
    type Error = anyhow::Error;

    fn try_from(row: ExcludedDomainRow) -> Result<Self, Self::Error> {
        Ok(ExcludedDomain {
            domain_url: row.domain_url,
            entity: row.entity.parse()?,
            alias_domains: row.alias_domains.into_iter().collect(),
            reason: row.reason,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    domain_url: String,
    entry_url: String,
    title: String,
    summary: String,
    author: String,
    topics: Vec<String>,
    date_published: Option<NaiveDate>,
    alias_urls: Vec<String>,
    links: Vec<String>,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        Entry {
            title: row.title,
            summary: row.summary,
            author: row.author,
            topics: row.topics,
            date_published: row.date_published,
            entry_url: row.entry_url,
            alias_urls: row.alias_urls.into_iter().collect(),
            links: row.links.into_iter().collect(),
            domain_url: row.domain_url,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SearchHitRow {
    id: i64,
    title: String,
    summary: String,
    author: String,
    topics: Vec<String>,
    date_published: Option<NaiveDate>,
    entry_url: String,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub author: String,
    pub topics: Vec<String>,
    pub date_published: Option<NaiveDate>,
    pub entry_url: String,
}

impl From<SearchHitRow> for SearchHit {
    fn from(row: SearchHitRow) -> Self {
        SearchHit {
            id: row.id,
            title: row.title,
            summary: row.summary,
            author: row.author,
            topics: row.topics,
            date_published: row.date_published,
            entry_url: row.entry_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_to_vec_preserves_all_members() {
        let mut set = BTreeSet::new();
        set.insert("b.com".to_string());
        set.insert("a.com".to_string());
        assert_eq!(set_to_vec(&set), vec!["a.com".to_string(), "b.com".to_string()]);
    }
}
