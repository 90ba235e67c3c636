//! Domain Ingest state machine and the Spider driver that walks the
//! external-domain graph one hop out from a seed.

use std::collections::BTreeSet;

use blogcrawler_canon::{get_domain, sanitize_url};
use blogcrawler_core::{
    Confirmer, CrawlConfig, Domain, Entity, ExcludedDomain, ExcludedReason, IngestError, SkipReason,
};
use blogcrawler_crawl::crawl_domain_with_retries_and_limits;
use blogcrawler_extract::{DomainClassifier, EntryParser};
use blogcrawler_fetch::Fetcher;
use blogcrawler_storage::Storage;
use chrono::Utc;
use tracing::{info, warn};

/// Runs one URL through every ingest state in order, up to `STORED` or an
/// early exit. Never re-enters a state; alias recording is the only write
/// that can touch an already-existing row.
#[allow(clippy::too_many_arguments)]
pub async fn ingest(
    u: &str,
    storage: &Storage,
    fetcher: &dyn Fetcher,
    classifier: &dyn DomainClassifier,
    parser: &dyn EntryParser,
    confirmer: &dyn Confirmer,
    crawl_limits: &CrawlConfig,
) -> Result<Domain, IngestError> {
    // CANONICALIZED
    let u = sanitize_url(u);
    let d0 = get_domain(&u);

    // PRE-REDIRECT-CHECK: no alias possible yet, there's no post-redirect key.
    if storage.domains_contains(&d0).await.map_err(IngestError::Fatal)?
        || storage
            .excluded_domains_contains(&d0)
            .await
            .map_err(IngestError::Fatal)?
    {
        return Err(IngestError::Skip {
            domain_url: d0,
            reason: SkipReason::AlreadyKnown,
        });
    }

    // FETCHED: failure here is reported to the caller untouched — whether a
    // row gets written for it depends on whether `u` was the seed or a
    // neighbor, a distinction only the Spider driver knows.
    let fetched = fetcher
        .fetch(&u)
        .await
        .map_err(|e| IngestError::Fatal(anyhow::anyhow!("fetching {u}: {e}")))?;

    let d1 = get_domain(&fetched.redirected_url);

    // POST-REDIRECT-CHECK
    let alias = if d1 != d0 {
        if storage.domains_contains(&d1).await.map_err(IngestError::Fatal)? {
            storage
                .domains_add_alias(&d1, &d0)
                .await
                .map_err(IngestError::Fatal)?;
            return Err(IngestError::Skip {
                domain_url: d1,
                reason: SkipReason::AliasRecorded,
            });
        }
        if storage
            .excluded_domains_contains(&d1)
            .await
            .map_err(IngestError::Fatal)?
        {
            storage
                .excluded_domains_add_alias(&d1, &d0)
                .await
                .map_err(IngestError::Fatal)?;
            return Err(IngestError::Skip {
                domain_url: d1,
                reason: SkipReason::AliasRecorded,
            });
        }
        Some(d0.clone())
    } else {
        None
    };

    // CLASSIFIED
    let classified = classifier
        .classify(&u, &fetched.cleaned_html)
        .await
        .map_err(|e| IngestError::Fatal(anyhow::anyhow!("classifying {d1}: {e}")))?;

    if !classified.is_individual_blog() {
        let entity = fallback_entity(classified.entity_kind());
        write_excluded(storage, &d1, entity, None, ExcludedReason::NotBlogOrPerson).await?;
        return Err(IngestError::Skip {
            domain_url: d1,
            reason: SkipReason::NotBlogOrPerson,
        });
    }
    let entity = fallback_entity(classified.entity_kind());

    // CONFIRMED
    if !confirmer.confirm(&d1).await {
        write_excluded(storage, &d1, entity, None, ExcludedReason::NotBlogOrPerson).await?;
        return Err(IngestError::Skip {
            domain_url: d1,
            reason: SkipReason::OperatorDeclined,
        });
    }

    // CRAWLED
    let domain_shell = Domain::new_empty(d1.clone(), entity, classified.name.clone());
    match crawl_domain_with_retries_and_limits(&domain_shell, fetcher, parser, crawl_limits).await {
        Ok(outcome) => {
            let mut domain = domain_shell;
            domain.external_domains = outcome.external_domains;
            domain.external_links = outcome.external_links;
            domain.target_internal_links = outcome.target_internal_links;
            domain.nontarget_internal_links = outcome.nontarget_internal_links;
            domain.date_last_scraped = Utc::now().date_naive();
            if let Some(a) = &alias {
                domain.alias_domains.insert(a.clone());
            }

            storage.domains_add(&domain).await.map_err(IngestError::Fatal)?;
            storage
                .entries_add_entries(&outcome.entries)
                .await
                .map_err(IngestError::Fatal)?;

            info!(domain_url = %d1, entries = outcome.entries.len(), "domain stored");
            Ok(domain)
        }
        Err(reason) => {
            write_excluded(storage, &d1, entity, alias, reason).await?;
            Err(IngestError::Fatal(anyhow::anyhow!(
                "crawl failed for {d1}: {reason}"
            )))
        }
    }
}

/// `classify_domain` doesn't always echo back a parseable entity kind even
/// when the blog/person check passes — default to `Person`, the modal case
/// for an accepted individual blog.
fn fallback_entity(parsed: Option<Entity>) -> Entity {
    parsed.unwrap_or(Entity::Person)
}

async fn write_excluded(
    storage: &Storage,
    domain_url: &str,
    entity: Entity,
    alias: Option<String>,
    reason: ExcludedReason,
) -> Result<(), IngestError> {
    let mut alias_domains = BTreeSet::new();
    if let Some(a) = alias {
        alias_domains.insert(a);
    }
    storage
        .excluded_domains_add(&ExcludedDomain {
            domain_url: domain_url.to_string(),
            entity,
            alias_domains,
            reason: reason.to_string(),
        })
        .await
        .map_err(IngestError::Fatal)
}

/// Walks one hop out from `seed_url`: ingest the seed, then ingest every
/// external domain it discovered. A fatal error on the seed terminates the
/// whole run; a fatal error on a neighbor is absorbed and logged.
#[allow(clippy::too_many_arguments)]
pub async fn run_spider(
    seed_url: &str,
    storage: &Storage,
    fetcher: &dyn Fetcher,
    classifier: &dyn DomainClassifier,
    parser: &dyn EntryParser,
    confirmer: &dyn Confirmer,
    crawl_limits: &CrawlConfig,
) -> anyhow::Result<()> {
    let domain = match ingest(
        seed_url, storage, fetcher, classifier, parser, confirmer, crawl_limits,
    )
    .await
    {
        Ok(domain) => domain,
        Err(IngestError::Skip { domain_url, reason }) => {
            info!(domain_url, %reason, "skipping seed");
            return Ok(());
        }
        Err(IngestError::Fatal(e)) => {
            // Seed case is special: the run terminates without writing an
            // ExcludedDomain row here — any row that needed writing (classify
            // rejection, operator decline, crawl failure) was already written
            // by `ingest` itself before it returned.
            return Err(e.context("fatal error ingesting seed, terminating spider run"));
        }
    };

    for neighbor in domain.external_domains.clone() {
        if storage.domains_contains(&neighbor).await? {
            info!(domain = %neighbor, "neighbor already known, skipping");
            continue;
        }

        match ingest(
            &neighbor, storage, fetcher, classifier, parser, confirmer, crawl_limits,
        )
        .await
        {
            Ok(_) => {}
            Err(IngestError::Skip { domain_url, reason }) => {
                info!(domain_url, %reason, "skipping neighbor");
            }
            Err(IngestError::Fatal(e)) => {
                warn!(domain = %neighbor, error = %e, "fatal error ingesting neighbor, excluding");
                // `ingest` already wrote the row for classify/confirm/crawl
                // failures; this only fires for a bare fetch failure, which
                // never gets one. A duplicate-key error here (the row did
                // turn out to exist already) is swallowed — the row is what
                // we wanted either way.
                let _ = write_excluded(
                    storage,
                    &neighbor,
                    Entity::Organization,
                    None,
                    ExcludedReason::OtherError,
                )
                .await;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_entity_defaults_to_person() {
        assert_eq!(fallback_entity(None), Entity::Person);
        assert_eq!(fallback_entity(Some(Entity::Company)), Entity::Company);
    }
}
