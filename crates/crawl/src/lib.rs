//! BFS Crawl Engine: bounded-batch concurrent breadth-first crawl over a
//! domain's internal links, with adaptive batch-size retry against
//! timeouts and a hard cap on pending queue size.

use std::collections::{BTreeSet, HashSet, VecDeque};

use blogcrawler_canon::{get_domain, is_valid_internal_link, sanitize_url};
use blogcrawler_core::{CrawlConfig, Domain, EngineError, Entry, ExcludedReason};
use blogcrawler_extract::{EntryParser, ExtractError};
use blogcrawler_fetch::{FetchError, Fetcher};
use futures::future::join_all;
use tracing::{info, warn};

/// Fallback values when no [`CrawlConfig`] is supplied — mirrors
/// `config/default.toml`'s `[crawl]` table.
pub const INITIAL_BATCH_SIZE: usize = 25;
const RETRY_PATIENCE: u32 = 3;
const MAX_QUEUE_SIZE: usize = 1000;
const TIMEOUT_RATIO_THRESHOLD: f64 = 0.20;

fn default_limits() -> CrawlConfig {
    CrawlConfig {
        initial_batch_size: INITIAL_BATCH_SIZE,
        retry_patience: RETRY_PATIENCE,
        max_queue_size: MAX_QUEUE_SIZE,
        timeout_ratio_threshold: TIMEOUT_RATIO_THRESHOLD,
    }
}

#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub entries: Vec<Entry>,
    pub external_domains: BTreeSet<String>,
    pub external_links: BTreeSet<String>,
    pub target_internal_links: BTreeSet<String>,
    pub nontarget_internal_links: BTreeSet<String>,
}

struct ParsedPage {
    entry: Entry,
    should_pursue: bool,
    internal: BTreeSet<String>,
    external: BTreeSet<String>,
}

#[derive(Debug, thiserror::Error)]
enum ParseTaskError {
    /// Folded in regardless of the underlying fetch error's own message —
    /// only the `Timeout` variant itself counts toward the ratio check.
    #[error("Timeout: request exceeded")]
    Timeout,

    #[error("redirected out of domain: {0}")]
    RedirectedOutOfDomain(String),

    #[error("redirected to already-visited page: {0}")]
    RedirectedToVisited(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<FetchError> for ParseTaskError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Timeout(_) => ParseTaskError::Timeout,
            other => ParseTaskError::Other(other.into()),
        }
    }
}

impl From<ExtractError> for ParseTaskError {
    fn from(e: ExtractError) -> Self {
        ParseTaskError::Other(e.into())
    }
}

enum TaskOutcome {
    Parsed(ParsedPage),
    Timeout,
    RedirectedToVisited(String),
    Other,
}

/// Runs one full BFS pass over `domain`'s internal links at a fixed batch
/// size. Restarted from scratch by [`crawl_domain_with_retries`] on a
/// recoverable failure; never persists partial progress.
pub async fn run_bfs(
    domain: &Domain,
    fetcher: &dyn Fetcher,
    parser: &dyn EntryParser,
    batch_size: usize,
    limits: &CrawlConfig,
) -> Result<CrawlOutcome, EngineError> {
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(sanitize_url(&domain.domain_url));
    let mut visited: HashSet<String> = HashSet::new();

    let mut outcome = CrawlOutcome::default();
    let mut timeout_count: usize = 0;

    loop {
        let batch = draw_batch(&mut queue, &visited, &domain.domain_url, batch_size);
        if batch.is_empty() {
            break;
        }

        info!(
            domain = %domain.domain_url,
            batch_len = batch.len(),
            queue_remaining = queue.len(),
            "fetching batch"
        );

        let results = join_all(batch.iter().map(|url| {
            parse_url_to_entry(
                url.clone(),
                domain.domain_url.clone(),
                fetcher,
                parser,
                &visited,
            )
        }))
        .await;

        let mut next_internal: BTreeSet<String> = BTreeSet::new();

        for (url, result) in batch.iter().zip(results.into_iter()) {
            let task_outcome = match result {
                Ok(parsed) => TaskOutcome::Parsed(parsed),
                Err(ParseTaskError::Timeout) => TaskOutcome::Timeout,
                Err(ParseTaskError::RedirectedToVisited(x)) => TaskOutcome::RedirectedToVisited(x),
                Err(e) => {
                    warn!(url, error = %e, "page fetch/parse failed");
                    TaskOutcome::Other
                }
            };

            match task_outcome {
                TaskOutcome::Timeout => {
                    timeout_count += 1;
                    warn!(url, "page fetch timed out");
                }
                TaskOutcome::RedirectedToVisited(x) => {
                    // Not committed as a task-local mutation: folded in here,
                    // between batches, same as every other accumulator.
                    visited.insert(x);
                }
                TaskOutcome::Other => {}
                TaskOutcome::Parsed(parsed) => {
                    debug_assert_eq!(&sanitize_url(url), url);
                    debug_assert!(!visited.contains(url));

                    visited.insert(parsed.entry.entry_url.clone());
                    for alias in &parsed.entry.alias_urls {
                        visited.insert(alias.clone());
                    }

                    if parsed.should_pursue {
                        outcome
                            .target_internal_links
                            .insert(parsed.entry.entry_url.clone());
                        outcome.entries.push(parsed.entry);
                    } else {
                        outcome
                            .nontarget_internal_links
                            .insert(parsed.entry.entry_url.clone());
                    }

                    for link in &parsed.external {
                        outcome.external_links.insert(link.clone());
                        outcome.external_domains.insert(get_domain(link));
                    }
                    next_internal.extend(parsed.internal);
                }
            }
        }

        merge_distinct(&mut queue, next_internal);

        if !visited.is_empty()
            && (timeout_count as f64 / visited.len() as f64) > limits.timeout_ratio_threshold
        {
            return Err(EngineError::TooManyTimeouts(domain.domain_url.clone()));
        }
        if queue.len() > limits.max_queue_size {
            return Err(EngineError::TooManyInternalLinks(domain.domain_url.clone()));
        }
    }

    Ok(outcome)
}

/// Pops from the front until `batch_size` URLs pass both predicates or the
/// queue runs out. URLs failing either predicate are discarded, not
/// re-queued — if every candidate is discarded the returned batch is empty
/// and the queue ends up empty too, which is exactly the loop's exit
/// condition.
fn draw_batch(
    queue: &mut VecDeque<String>,
    visited: &HashSet<String>,
    domain_url: &str,
    batch_size: usize,
) -> Vec<String> {
    let mut batch = Vec::with_capacity(batch_size);
    while !queue.is_empty() && batch.len() < batch_size {
        let candidate = queue.pop_front().expect("queue checked non-empty");
        if !visited.contains(&candidate) && is_valid_internal_link(domain_url, &candidate) {
            batch.push(candidate);
        }
    }
    batch
}

fn merge_distinct(queue: &mut VecDeque<String>, new_links: BTreeSet<String>) {
    let mut seen: HashSet<String> = queue.iter().cloned().collect();
    for link in new_links {
        if seen.insert(link.clone()) {
            queue.push_back(link);
        }
    }
}

async fn parse_url_to_entry(
    x: String,
    domain_url: String,
    fetcher: &dyn Fetcher,
    parser: &dyn EntryParser,
    visited: &HashSet<String>,
) -> Result<ParsedPage, ParseTaskError> {
    let result = fetcher.fetch(&x).await?;

    let x_prime = sanitize_url(&result.redirected_url);
    let mut alias = None;

    if x_prime != x {
        if !is_valid_internal_link(&domain_url, &x_prime) {
            return Err(ParseTaskError::RedirectedOutOfDomain(x.clone()));
        }
        if visited.contains(&x_prime) {
            return Err(ParseTaskError::RedirectedToVisited(x.clone()));
        }
        alias = Some(x.clone());
    }

    let internal: BTreeSet<String> = result
        .links
        .internal
        .iter()
        .map(|l| sanitize_url(&l.href))
        .collect();
    let external: BTreeSet<String> = result
        .links
        .external
        .iter()
        .map(|l| sanitize_url(&l.href))
        .collect();

    let parsed = parser.parse(&x_prime, &result.cleaned_html).await?;

    let mut alias_urls = BTreeSet::new();
    if let Some(a) = alias {
        alias_urls.insert(a);
    }

    let entry = Entry {
        title: strip_nul(&parsed.title),
        summary: strip_nul(&parsed.summary),
        author: strip_nul(&parsed.author),
        topics: parsed.topics,
        date_published: parse_date(&parsed.date_published),
        entry_url: x_prime,
        alias_urls,
        links: internal.union(&external).cloned().collect(),
        domain_url,
    };

    Ok(ParsedPage {
        should_pursue: parsed.should_pursue,
        entry,
        internal,
        external,
    })
}

fn strip_nul(s: &str) -> String {
    if s.contains('\0') {
        s.replace('\0', "")
    } else {
        s.to_string()
    }
}

fn parse_date(s: &str) -> Option<chrono::NaiveDate> {
    if s.is_empty() {
        return None;
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Retry wrapper: halves the batch size on a timeout-ratio failure, up to
/// three attempts total; terminal on any other failure.
pub async fn crawl_domain_with_retries(
    domain: &Domain,
    fetcher: &dyn Fetcher,
    parser: &dyn EntryParser,
) -> Result<CrawlOutcome, ExcludedReason> {
    crawl_domain_with_retries_and_limits(domain, fetcher, parser, &default_limits()).await
}

/// Same as [`crawl_domain_with_retries`] but with the `[crawl]` config table
/// threaded through instead of the built-in defaults.
pub async fn crawl_domain_with_retries_and_limits(
    domain: &Domain,
    fetcher: &dyn Fetcher,
    parser: &dyn EntryParser,
    limits: &CrawlConfig,
) -> Result<CrawlOutcome, ExcludedReason> {
    let mut batch_size = limits.initial_batch_size;
    let mut patience = limits.retry_patience;

    loop {
        match run_bfs(domain, fetcher, parser, batch_size, limits).await {
            Ok(outcome) => return Ok(outcome),
            Err(EngineError::TooManyTimeouts(_)) => {
                patience -= 1;
                if patience == 0 {
                    warn!(domain = %domain.domain_url, "exhausted retries on timeouts");
                    return Err(ExcludedReason::TooManyTimeouts);
                }
                batch_size /= 2;
                warn!(
                    domain = %domain.domain_url,
                    new_batch_size = batch_size,
                    patience,
                    "too many crawling timeouts, retrying with a smaller batch"
                );
            }
            Err(EngineError::TooManyInternalLinks(_)) => {
                return Err(ExcludedReason::TooManyInternalLinks);
            }
            Err(EngineError::Other(e)) => {
                warn!(domain = %domain.domain_url, error = %e, "crawl failed");
                return Err(ExcludedReason::OtherError);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use blogcrawler_core::Entity;
    use blogcrawler_extract::ParseEntryOutput;
    use blogcrawler_fetch::{CrawlResult, Link, LinkSet};

    use super::*;

    struct FixtureFetcher {
        pages: HashMap<String, CrawlResult>,
    }

    #[async_trait]
    impl Fetcher for FixtureFetcher {
        async fn fetch(&self, url: &str) -> Result<CrawlResult, FetchError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Network(format!("no fixture for {url}")))
        }
    }

    struct AlwaysTimeoutFetcher;

    #[async_trait]
    impl Fetcher for AlwaysTimeoutFetcher {
        async fn fetch(&self, _url: &str) -> Result<CrawlResult, FetchError> {
            Err(FetchError::Timeout(5))
        }
    }

    struct FixtureParser {
        outputs: HashMap<String, ParseEntryOutput>,
    }

    #[async_trait]
    impl EntryParser for FixtureParser {
        async fn parse(&self, url: &str, _html: &str) -> Result<ParseEntryOutput, ExtractError> {
            self.outputs
                .get(url)
                .cloned()
                .ok_or_else(|| ExtractError::Malformed(format!("no fixture for {url}")))
        }
    }

    fn page(
        url: &str,
        internal: &[&str],
        external: &[&str],
    ) -> (String, CrawlResult) {
        (
            url.to_string(),
            CrawlResult {
                url: url.to_string(),
                redirected_url: url.to_string(),
                cleaned_html: format!("<html>{url}</html>"),
                links: LinkSet {
                    internal: internal
                        .iter()
                        .map(|h| Link { href: h.to_string() })
                        .collect(),
                    external: external
                        .iter()
                        .map(|h| Link { href: h.to_string() })
                        .collect(),
                },
            },
        )
    }

    fn entry_output(should_pursue: bool, title: &str) -> ParseEntryOutput {
        ParseEntryOutput {
            should_pursue,
            title: title.to_string(),
            summary: "summary".to_string(),
            topics: vec!["misc".to_string()],
            author: "Jane".to_string(),
            date_published: "2024-01-01".to_string(),
        }
    }

    fn test_domain() -> Domain {
        Domain::new_empty(
            "example.com".to_string(),
            Entity::Person,
            "Jane".to_string(),
        )
    }

    #[tokio::test]
    async fn bfs_visits_every_internal_page_and_collects_external_domains() {
        let pages = HashMap::from([
            page(
                "https://example.com",
                &["https://example.com/a", "https://example.com/b"],
                &["https://other.com/x"],
            ),
            page("https://example.com/a", &[], &[]),
            page("https://example.com/b", &[], &[]),
        ]);
        let outputs = HashMap::from([
            ("https://example.com".to_string(), entry_output(true, "Home")),
            ("https://example.com/a".to_string(), entry_output(true, "Post A")),
            ("https://example.com/b".to_string(), entry_output(false, "")),
        ]);

        let fetcher = FixtureFetcher { pages };
        let parser = FixtureParser { outputs };

        let outcome = run_bfs(&test_domain(), &fetcher, &parser, 3, &default_limits())
            .await
            .unwrap();

        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.target_internal_links.len(), 2);
        assert_eq!(outcome.nontarget_internal_links.len(), 1);
        assert_eq!(outcome.external_domains, BTreeSet::from(["other.com".to_string()]));
        assert_eq!(
            outcome.external_links,
            BTreeSet::from(["https://other.com/x".to_string()])
        );
    }

    #[tokio::test]
    async fn persistent_timeouts_exhaust_retries_and_exclude_the_domain() {
        let parser = FixtureParser {
            outputs: HashMap::new(),
        };

        let result =
            crawl_domain_with_retries(&test_domain(), &AlwaysTimeoutFetcher, &parser).await;

        assert_eq!(result.unwrap_err(), ExcludedReason::TooManyTimeouts);
    }
}
