use thiserror::Error;

/// Shared error role for the low-level adapters (fetch, storage, config).
/// Crate-specific errors (`FetchError`, `ExtractError`, `EngineError`,
/// `IngestError`) wrap or convert into this where they cross a boundary.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("network error: {0}")]
    Network(String),

    #[error("timeout after {0}s")]
    Timeout(u64),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Why a candidate domain was excluded without ever reaching the BFS engine,
/// or rejected by it after exhausting retries. The `Display` impl produces
/// the exact reason strings `ExcludedDomains.reason` stores — a stable
/// vocabulary inspector tooling depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcludedReason {
    NotBlogOrPerson,
    ManuallyExcluded,
    TooManyTimeouts,
    TooManyInternalLinks,
    OtherError,
}

impl ExcludedReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExcludedReason::NotBlogOrPerson => {
                "Excluded b/c website was not a blog run by an individual"
            }
            ExcludedReason::ManuallyExcluded => "Excluded manually via the CLI",
            ExcludedReason::TooManyTimeouts => {
                "Excluded b/c website could not be scraped due to too many timeouts"
            }
            ExcludedReason::TooManyInternalLinks => {
                "Excluded b/c too many internal links to process."
            }
            ExcludedReason::OtherError => {
                "Excluded b/c website could not be scraped due to an error"
            }
        }
    }
}

impl std::fmt::Display for ExcludedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised while draining a domain's BFS queue.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("too many crawling timeouts: {0}")]
    TooManyTimeouts(String),

    #[error("too many internal links: {0}")]
    TooManyInternalLinks(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why ingest stopped short of storing a new `Domain`, without that being an
/// error for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyKnown,
    AliasRecorded,
    NotBlogOrPerson,
    OperatorDeclined,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::AlreadyKnown => write!(f, "already present in Domains or ExcludedDomains"),
            SkipReason::AliasRecorded => write!(f, "redirected domain already known, alias recorded"),
            SkipReason::NotBlogOrPerson => write!(f, "classified as not a blog run by an individual"),
            SkipReason::OperatorDeclined => write!(f, "operator declined to scrape"),
        }
    }
}

/// Outcome of `ingest()`. `Skip` is not an error for the run — the spider
/// driver logs it and continues; `Fatal` terminates the whole run when it
/// happens on the seed, and is absorbed (logged) for one-hop neighbors.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("skipping domain {domain_url}: {reason}")]
    Skip {
        domain_url: String,
        reason: SkipReason,
    },

    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}
